//! HTTP boundary for the Pivot enrichment service
//!
//! Thin glue over `pivot-engine`: route table, auth capability, error
//! mapping, and the NDJSON streaming of query outcomes. No enrichment
//! logic lives here.

/// Auth capability and the header/anonymous implementations
pub mod auth;
/// Built-in local sources registered by the binary
pub mod builtin;
/// API error type and status mapping
pub mod error;
/// Integration listing, search, and user settings endpoints
pub mod integration_api;
/// Role-gated link group CRUD endpoints
pub mod link_group_api;
/// Shared application state and the router
pub mod state;

pub use auth::{Auth, HeaderAuth};
pub use error::ApiError;
pub use state::{router, AppState};
