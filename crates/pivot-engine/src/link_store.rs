//! Link group store capability
//!
//! Role-gated CRUD over link group documents. Production deployments back
//! this with the external document store; the in-memory implementation
//! serves tests and single-node installs. Edit checks live here so no
//! caller can skip them.

use async_trait::async_trait;
use parking_lot::RwLock;
use pivot_core::{LinkGroup, PivotError, User};
use thiserror::Error;

/// Failures from link group operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// No group with the given id
    #[error("unknown link group: {0}")]
    NotFound(String),

    /// The caller lacks an edit role for the group
    #[error("no edit permission on link group {0}")]
    Forbidden(String),

    /// A group with this id already exists
    #[error("link group already exists: {0}")]
    Duplicate(String),
}

impl From<StoreError> for PivotError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Forbidden(id) => {
                PivotError::Authorization(format!("link group {id}: edit denied"))
            }
            other => PivotError::Validation(other.to_string()),
        }
    }
}

/// Db capability over link group documents
#[async_trait]
pub trait LinkGroupStore: Send + Sync {
    /// Every stored group, for building a visibility snapshot
    async fn all(&self) -> Result<Vec<LinkGroup>, StoreError>;

    /// Groups the user may view
    async fn viewable(&self, user: &User) -> Result<Vec<LinkGroup>, StoreError>;

    /// Groups the user may edit
    async fn editable(&self, user: &User) -> Result<Vec<LinkGroup>, StoreError>;

    /// Store a new group
    async fn create(&self, group: LinkGroup) -> Result<(), StoreError>;

    /// Replace a group the user can edit
    async fn update(&self, id: &str, group: LinkGroup, user: &User) -> Result<(), StoreError>;

    /// Delete a group the user can edit
    async fn delete(&self, id: &str, user: &User) -> Result<(), StoreError>;
}

/// In-process link group store, insertion ordered
#[derive(Default)]
pub struct MemoryLinkGroupStore {
    groups: RwLock<Vec<LinkGroup>>,
}

impl MemoryLinkGroupStore {
    /// Empty store
    pub fn new() -> Self {
        MemoryLinkGroupStore::default()
    }
}

#[async_trait]
impl LinkGroupStore for MemoryLinkGroupStore {
    async fn all(&self) -> Result<Vec<LinkGroup>, StoreError> {
        Ok(self.groups.read().clone())
    }

    async fn viewable(&self, user: &User) -> Result<Vec<LinkGroup>, StoreError> {
        Ok(self
            .groups
            .read()
            .iter()
            .filter(|g| g.can_view(user))
            .cloned()
            .collect())
    }

    async fn editable(&self, user: &User) -> Result<Vec<LinkGroup>, StoreError> {
        Ok(self
            .groups
            .read()
            .iter()
            .filter(|g| g.can_edit(user))
            .cloned()
            .collect())
    }

    async fn create(&self, group: LinkGroup) -> Result<(), StoreError> {
        let mut groups = self.groups.write();
        if groups.iter().any(|g| g.id == group.id) {
            return Err(StoreError::Duplicate(group.id));
        }
        groups.push(group);
        Ok(())
    }

    async fn update(&self, id: &str, group: LinkGroup, user: &User) -> Result<(), StoreError> {
        let mut groups = self.groups.write();
        let existing = groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !existing.can_edit(user) {
            return Err(StoreError::Forbidden(id.to_string()));
        }
        let mut group = group;
        group.id = id.to_string();
        *existing = group;
        Ok(())
    }

    async fn delete(&self, id: &str, user: &User) -> Result<(), StoreError> {
        let mut groups = self.groups.write();
        let Some(pos) = groups.iter().position(|g| g.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if !groups[pos].can_edit(user) {
            return Err(StoreError::Forbidden(id.to_string()));
        }
        groups.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_core::Role;
    use std::collections::HashSet;

    fn group(id: &str, creator: &str, view: &[&str], edit: &[&str]) -> LinkGroup {
        LinkGroup {
            id: id.into(),
            name: id.into(),
            creator: creator.into(),
            links: vec![],
            view_roles: view.iter().map(|r| Role::from(*r)).collect(),
            edit_roles: edit.iter().map(|r| Role::from(*r)).collect(),
        }
    }

    #[tokio::test]
    async fn viewable_and_editable_respect_roles() {
        let store = MemoryLinkGroupStore::new();
        store
            .create(group("a", "carol", &["analyst"], &["admin"]))
            .await
            .unwrap();
        store
            .create(group("b", "carol", &["admin"], &["admin"]))
            .await
            .unwrap();

        let analyst = User::new("alice", [Role::from("analyst")]);
        let viewable = store.viewable(&analyst).await.unwrap();
        assert_eq!(viewable.len(), 1);
        assert_eq!(viewable[0].id, "a");
        assert!(store.editable(&analyst).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_without_edit_role_is_forbidden() {
        let store = MemoryLinkGroupStore::new();
        store
            .create(group("a", "carol", &["analyst"], &["admin"]))
            .await
            .unwrap();

        let analyst = User::new("alice", [Role::from("analyst")]);
        let err = store
            .update("a", group("a", "carol", &[], &[]), &analyst)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        assert!(matches!(
            PivotError::from(err),
            PivotError::Authorization(_)
        ));
    }

    #[tokio::test]
    async fn creator_can_delete() {
        let store = MemoryLinkGroupStore::new();
        store
            .create(group("a", "carol", &["analyst"], &["admin"]))
            .await
            .unwrap();

        let carol = User::new("carol", std::iter::empty());
        store.delete("a", &carol).await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryLinkGroupStore::new();
        let admin = User::new("root", [Role::admin()]);
        let err = store.delete("ghost", &admin).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let store = MemoryLinkGroupStore::new();
        store
            .create(group("a", "carol", &[], &[]))
            .await
            .unwrap();
        let err = store
            .create(group("a", "dave", &[], &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }
}
