//! End-to-end fan-out: registry eligibility, cache population, and
//! per-user link visibility across a full query.

use async_trait::async_trait;
use pivot_cache::MemoryCache;
use pivot_core::{Indicator, IndicatorType, LinkGroup, OutcomeStatus, Role, User};
use pivot_crypto::SecretCodec;
use pivot_engine::{
    FetchError, IntegrationSource, Orchestrator, QueryRequest, Registry, SourceDescriptor,
    VisibilityFilter,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use zeroize::Zeroizing;

struct LinkingSource {
    descriptor: SourceDescriptor,
}

impl LinkingSource {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(LinkingSource {
            descriptor: SourceDescriptor {
                id: id.into(),
                supported_types: [IndicatorType::Ip, IndicatorType::Domain].into(),
                cacheable: true,
                timeout: Duration::from_secs(1),
                priority: 0,
                cache_params: vec![],
                config_schema: json!({}),
            },
        })
    }
}

#[async_trait]
impl IntegrationSource for LinkingSource {
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
            "links": [
                { "group": "internal", "url": format!("https://internal/{}", indicator.value) },
                { "group": "public", "url": format!("https://public/{}", indicator.value) },
            ],
        }))
    }
}

fn link_group(id: &str, view_role: &str) -> LinkGroup {
    LinkGroup {
        id: id.into(),
        name: id.into(),
        creator: "system".into(),
        links: vec![],
        view_roles: [Role::from(view_role)].into(),
        edit_roles: HashSet::new(),
    }
}

fn build_orchestrator() -> Orchestrator {
    let mut registry = Registry::new();
    registry.register(LinkingSource::new("pdns")).unwrap();
    Orchestrator::new(
        Arc::new(registry),
        Arc::new(MemoryCache::new(100, Duration::from_secs(60))),
        Arc::new(SecretCodec::new("master")),
        4,
    )
}

fn request(user: User) -> QueryRequest {
    QueryRequest {
        indicator: Indicator::new(IndicatorType::Ip, "8.8.8.8").unwrap(),
        user,
        settings: None,
        sources: None,
    }
}

#[tokio::test]
async fn analyst_only_sees_links_their_roles_allow() {
    let orchestrator = build_orchestrator();
    let filter = VisibilityFilter::new([
        link_group("internal", "admin"),
        link_group("public", "analyst"),
    ]);

    let analyst = User::new("alice", [Role::from("analyst")]);
    let outcomes: Vec<_> = orchestrator
        .orchestrate(request(analyst.clone()))
        .map(|o| filter.filter(o, &analyst))
        .collect()
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, OutcomeStatus::Success);
    let links = outcomes[0].payload.as_ref().unwrap()["links"].clone();
    assert_eq!(
        links,
        json!([{ "group": "public", "url": "https://public/8.8.8.8" }])
    );
}

#[tokio::test]
async fn visibility_applies_to_cached_outcomes_too() {
    let orchestrator = build_orchestrator();
    let filter = VisibilityFilter::new([
        link_group("internal", "admin"),
        link_group("public", "analyst"),
    ]);
    let analyst = User::new("alice", [Role::from("analyst")]);

    // Prime the cache, then query again
    let _: Vec<_> = orchestrator
        .orchestrate(request(analyst.clone()))
        .collect()
        .await;
    let outcomes: Vec<_> = orchestrator
        .orchestrate(request(analyst.clone()))
        .map(|o| filter.filter(o, &analyst))
        .collect()
        .await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Cached);
    let links = outcomes[0].payload.as_ref().unwrap()["links"].clone();
    assert_eq!(links.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn roleless_user_gets_no_links_at_all() {
    let orchestrator = build_orchestrator();
    let filter = VisibilityFilter::new([
        link_group("internal", "admin"),
        link_group("public", "analyst"),
    ]);
    let nobody = User::new("guest", std::iter::empty());

    let outcomes: Vec<_> = orchestrator
        .orchestrate(request(nobody.clone()))
        .map(|o| filter.filter(o, &nobody))
        .collect()
        .await;

    let links = outcomes[0].payload.as_ref().unwrap()["links"].clone();
    assert_eq!(links, json!([]));
    // The rest of the payload is intact
    assert_eq!(
        outcomes[0].payload.as_ref().unwrap()["indicator"],
        json!("8.8.8.8")
    );
}
