//! Core domain types for the Pivot enrichment service
//!
//! This crate sits at the bottom of the workspace: indicator classification
//! and normalization, per-source outcome records, role-gated link groups,
//! the shared error taxonomy, and the typed startup configuration. It has no
//! async machinery and no I/O beyond reading the config file.

/// Typed startup configuration loaded once from a toml file
pub mod config;
/// Shared error taxonomy
pub mod error;
/// Indicator types, classification, and normalization
pub mod indicator;
/// Role-gated link group definitions
pub mod link_group;
/// Per-source outcome records for an orchestrated query
pub mod outcome;
/// Roles and the requesting-user view
pub mod roles;

pub use config::{CacheSection, Config, ServiceConfig};
pub use error::{PivotError, Result};
pub use indicator::{Indicator, IndicatorType};
pub use link_group::{LinkDefinition, LinkGroup};
pub use outcome::{OutcomeStatus, SourceOutcome};
pub use roles::{Role, User, ASSIGNABLE_ROLES};
