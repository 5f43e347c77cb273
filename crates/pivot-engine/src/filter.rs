//! Result merger and role-gated visibility filter
//!
//! Source payloads are heterogeneous JSON; the one shape this component
//! cares about is a top-level `"links"` array whose members name their
//! owning link group. Links the requesting user cannot view are removed
//! here, before the outcome ever reaches the transport layer. Everything
//! else passes through untouched. The filter is pure given the link-group
//! snapshot it was built over.

use pivot_core::{LinkGroup, SourceOutcome, User};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Removes links the requesting user is not permitted to see
pub struct VisibilityFilter {
    groups: HashMap<String, LinkGroup>,
}

impl VisibilityFilter {
    /// Build a filter over a snapshot of link groups
    pub fn new(groups: impl IntoIterator<Item = LinkGroup>) -> Self {
        VisibilityFilter {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    /// Filter one outcome for one user. Payloads without links come back
    /// unchanged (and unallocated).
    pub fn filter(&self, mut outcome: SourceOutcome, user: &User) -> SourceOutcome {
        let Some(payload) = outcome.payload.take() else {
            return outcome;
        };

        let has_links = payload
            .get("links")
            .map_or(false, |links| links.is_array());
        if !has_links {
            outcome.payload = Some(payload);
            return outcome;
        }

        let mut value = (*payload).clone();
        if let Some(links) = value.get_mut("links").and_then(Value::as_array_mut) {
            links.retain(|link| self.link_viewable(link, user));
        }
        outcome.payload = Some(Arc::new(value));
        outcome
    }

    /// Fail closed: a link without a resolvable owning group is never shown
    fn link_viewable(&self, link: &Value, user: &User) -> bool {
        link.get("group")
            .and_then(Value::as_str)
            .and_then(|id| self.groups.get(id))
            .map_or(false, |group| group.can_view(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_core::{OutcomeStatus, Role};
    use serde_json::json;
    use std::collections::HashSet;

    fn group(id: &str, view: &[&str]) -> LinkGroup {
        LinkGroup {
            id: id.into(),
            name: id.into(),
            creator: "system".into(),
            links: vec![],
            view_roles: view.iter().map(|r| Role::from(*r)).collect(),
            edit_roles: HashSet::new(),
        }
    }

    fn outcome_with_links(links: Value) -> SourceOutcome {
        SourceOutcome::success(
            "whois",
            Arc::new(json!({ "registrar": "example", "links": links })),
        )
    }

    #[test]
    fn links_without_a_matching_view_role_are_removed() {
        let filter = VisibilityFilter::new([group("secret", &["admin"]), group("open", &["analyst"])]);
        let user = User::new("alice", [Role::from("analyst")]);

        let outcome = outcome_with_links(json!([
            { "group": "secret", "url": "https://internal/x" },
            { "group": "open", "url": "https://public/x" },
        ]));
        let filtered = filter.filter(outcome, &user);

        let links = filtered.payload.unwrap().get("links").unwrap().clone();
        assert_eq!(links, json!([{ "group": "open", "url": "https://public/x" }]));
    }

    #[test]
    fn unknown_group_fails_closed() {
        let filter = VisibilityFilter::new(std::iter::empty());
        let user = User::new("alice", [Role::from("analyst")]);

        let outcome = outcome_with_links(json!([{ "group": "ghost", "url": "https://x" }]));
        let filtered = filter.filter(outcome, &user);
        let links = filtered.payload.unwrap().get("links").unwrap().clone();
        assert_eq!(links, json!([]));
    }

    #[test]
    fn non_link_fields_pass_through_unchanged() {
        let filter = VisibilityFilter::new([group("open", &["analyst"])]);
        let user = User::new("alice", [Role::from("analyst")]);

        let outcome = outcome_with_links(json!([{ "group": "open", "url": "https://x" }]));
        let filtered = filter.filter(outcome, &user);
        let payload = filtered.payload.unwrap();
        assert_eq!(payload.get("registrar"), Some(&json!("example")));
        assert_eq!(filtered.status, OutcomeStatus::Success);
    }

    #[test]
    fn payloads_without_links_are_untouched() {
        let filter = VisibilityFilter::new(std::iter::empty());
        let user = User::new("alice", [Role::from("analyst")]);

        let payload = Arc::new(json!({ "asn": 15169 }));
        let outcome = SourceOutcome::success("geo", payload.clone());
        let filtered = filter.filter(outcome, &user);
        // Same allocation: nothing was rewritten
        assert!(Arc::ptr_eq(&filtered.payload.unwrap(), &payload));
    }

    #[test]
    fn malformed_link_entries_are_removed() {
        let filter = VisibilityFilter::new([group("open", &["analyst"])]);
        let user = User::new("alice", [Role::from("analyst")]);

        let outcome = outcome_with_links(json!([
            { "url": "https://no-group" },
            "not-an-object",
            { "group": "open", "url": "https://ok" },
        ]));
        let filtered = filter.filter(outcome, &user);
        let links = filtered.payload.unwrap().get("links").unwrap().clone();
        assert_eq!(links, json!([{ "group": "open", "url": "https://ok" }]));
    }
}
