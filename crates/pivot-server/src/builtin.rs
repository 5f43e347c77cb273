//! Built-in local sources registered by the binary
//!
//! External lookup drivers are plugged in separately; the one source that
//! ships in-process answers from local computation only, so a fresh install
//! has something to stream before any driver is configured.

use async_trait::async_trait;
use pivot_core::{Indicator, IndicatorType};
use pivot_engine::{FetchError, IntegrationSource, SourceDescriptor};
use serde_json::{json, Value};
use std::time::Duration;
use zeroize::Zeroizing;

/// Echoes the parsed indicator back with its classification metadata
pub struct OverviewSource {
    descriptor: SourceDescriptor,
}

impl OverviewSource {
    /// Descriptor: supports every type, never cached (it is free to
    /// recompute), first in fan-out order
    pub fn new() -> Self {
        OverviewSource {
            descriptor: SourceDescriptor {
                id: "overview".into(),
                supported_types: IndicatorType::ALL.into_iter().collect(),
                cacheable: false,
                timeout: Duration::from_millis(100),
                priority: 0,
                cache_params: vec![],
                config_schema: json!({}),
            },
        }
    }
}

impl Default for OverviewSource {
    fn default() -> Self {
        OverviewSource::new()
    }
}

#[async_trait]
impl IntegrationSource for OverviewSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(
        &self,
        indicator: &Indicator,
        _secret: Option<Zeroizing<String>>,
    ) -> Result<Value, FetchError> {
        Ok(json!({
            "indicator": indicator.value,
            "type": indicator.itype.as_str(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_for_any_type() {
        let source = OverviewSource::new();
        let indicator = Indicator::new(IndicatorType::Domain, "Example.COM").unwrap();
        let value = source.fetch(&indicator, None).await.unwrap();
        assert_eq!(value["indicator"], json!("example.com"));
        assert_eq!(value["type"], json!("domain"));
    }
}
