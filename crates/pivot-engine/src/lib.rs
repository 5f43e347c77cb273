//! Query orchestration for the Pivot enrichment service
//!
//! A single indicator query fans out to every eligible integration source:
//! cache hits short-circuit, misses share one in-flight fetch per cache key
//! system-wide, drivers run under a bounded concurrency limiter with
//! per-source timeouts, and outcomes stream back in completion order with
//! link visibility filtered per requesting user.

/// Result merger and role-gated visibility filter
pub mod filter;
/// Link group store capability
pub mod link_store;
/// Fan-out, in-flight dedup, timeouts, failure isolation
pub mod orchestrator;
/// Integration source contract and the static registry
pub mod registry;
/// Per-user integration settings and their store capability
pub mod settings;

pub use filter::VisibilityFilter;
pub use link_store::{LinkGroupStore, MemoryLinkGroupStore, StoreError};
pub use orchestrator::{Orchestrator, QueryRequest};
pub use registry::{FetchError, IntegrationSource, Registry, SourceDescriptor};
pub use settings::{MemorySettingsStore, SettingsStore, UserIntegrationSettings};
