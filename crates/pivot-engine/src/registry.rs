//! Integration source contract and the static registry
//!
//! The registry is built once at startup and immutable for the process
//! lifetime; the orchestrator holds it behind an `Arc` and never mutates it.

use crate::settings::UserIntegrationSettings;
use async_trait::async_trait;
use pivot_core::{Indicator, IndicatorType, PivotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

/// A driver call failed before producing a payload
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream service answered with an error or unusable data
    #[error("upstream: {0}")]
    Upstream(String),

    /// The stored credential was missing, unreadable, or rejected
    #[error("credentials: {0}")]
    Credentials(String),
}

/// Static capabilities and limits a source declares at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique source id
    pub id: String,
    /// Indicator types this source can answer for
    pub supported_types: HashSet<IndicatorType>,
    /// Whether successful results may be cached
    pub cacheable: bool,
    /// Per-call timeout
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Fan-out ordering; lower runs first, ties keep registration order
    pub priority: u32,
    /// Driver options that change what a lookup returns, folded into the
    /// cache key so reconfiguring a source never serves results computed
    /// under the old options
    #[serde(default)]
    pub cache_params: Vec<(String, String)>,
    /// Schema of the per-user configuration this source accepts
    pub config_schema: Value,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// A pluggable driver that can answer queries about one or more indicator
/// types. Implementations own their transport; the orchestrator only sees
/// this contract.
#[async_trait]
pub trait IntegrationSource: Send + Sync {
    /// The source's declared capabilities and limits
    fn descriptor(&self) -> &SourceDescriptor;

    /// Perform one lookup. `secret` is the caller's per-source credential,
    /// already opened; it must not be logged or stored.
    async fn fetch(
        &self,
        indicator: &Indicator,
        secret: Option<Zeroizing<String>>,
    ) -> std::result::Result<Value, FetchError>;
}

/// Static-at-runtime catalogue of registered sources
#[derive(Default)]
pub struct Registry {
    sources: Vec<Arc<dyn IntegrationSource>>,
    by_id: HashMap<String, usize>,
}

impl Registry {
    /// Empty registry; populate with [`Registry::register`] before serving
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a source. A second registration under the same id is fatal.
    pub fn register(&mut self, source: Arc<dyn IntegrationSource>) -> Result<()> {
        let id = source.descriptor().id.clone();
        if self.by_id.contains_key(&id) {
            return Err(PivotError::DuplicateSource { id });
        }
        self.by_id.insert(id, self.sources.len());
        self.sources.push(source);
        Ok(())
    }

    /// Look up a source by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn IntegrationSource>> {
        self.by_id.get(id).map(|&idx| self.sources[idx].clone())
    }

    /// Declared capabilities of every registered source, in registration
    /// order, for the listing API
    pub fn descriptors(&self) -> Vec<&SourceDescriptor> {
        self.sources.iter().map(|s| s.descriptor()).collect()
    }

    /// Sources eligible for an indicator type under the user's settings:
    /// supported type, enabled for the user (absent settings enable all),
    /// ordered by priority with registration order breaking ties.
    pub fn sources_for(
        &self,
        itype: IndicatorType,
        settings: Option<&UserIntegrationSettings>,
    ) -> Vec<Arc<dyn IntegrationSource>> {
        let mut eligible: Vec<Arc<dyn IntegrationSource>> = self
            .sources
            .iter()
            .filter(|s| s.descriptor().supported_types.contains(&itype))
            .filter(|s| settings.map_or(true, |st| st.is_enabled(&s.descriptor().id)))
            .cloned()
            .collect();
        eligible.sort_by_key(|s| s.descriptor().priority);
        eligible
    }
}
