//! Per-user integration settings and their store capability
//!
//! Settings carry which sources a user has enabled and their per-source
//! credentials. Credentials are held only in sealed form; opening them is
//! the orchestrator's job at the moment of driver dispatch, and the API
//! surface only ever sees the masked view.

use async_trait::async_trait;
use parking_lot::RwLock;
use pivot_core::Result;
use pivot_crypto::SecretCodec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What the settings API returns in place of a sealed secret
pub const MASKED_SECRET: &str = "********";

/// One user's integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIntegrationSettings {
    /// Owning user
    pub user_id: String,
    /// Sources the user has enabled; `None` means all sources
    pub enabled_sources: Option<HashSet<String>>,
    /// Per-source credentials, sealed by the secret codec
    pub secrets: HashMap<String, String>,
}

impl UserIntegrationSettings {
    /// Settings for a user who has customized nothing
    pub fn defaults(user_id: impl Into<String>) -> Self {
        UserIntegrationSettings {
            user_id: user_id.into(),
            enabled_sources: None,
            secrets: HashMap::new(),
        }
    }

    /// True unless the user has an enable list that omits this source
    pub fn is_enabled(&self, source_id: &str) -> bool {
        match &self.enabled_sources {
            None => true,
            Some(enabled) => enabled.contains(source_id),
        }
    }

    /// Seal and store a credential for a source
    pub fn set_secret(
        &mut self,
        codec: &SecretCodec,
        source_id: &str,
        plaintext: &str,
    ) -> Result<()> {
        let sealed = codec
            .seal(plaintext)
            .map_err(|e| pivot_core::PivotError::Validation(format!("sealing secret: {e}")))?;
        self.secrets.insert(source_id.to_string(), sealed);
        Ok(())
    }

    /// Sealed credential for a source, if one is stored
    pub fn sealed_secret(&self, source_id: &str) -> Option<&str> {
        self.secrets.get(source_id).map(String::as_str)
    }

    /// Copy with every secret replaced by [`MASKED_SECRET`], for the API
    pub fn masked(&self) -> Self {
        UserIntegrationSettings {
            user_id: self.user_id.clone(),
            enabled_sources: self.enabled_sources.clone(),
            secrets: self
                .secrets
                .keys()
                .map(|k| (k.clone(), MASKED_SECRET.to_string()))
                .collect(),
        }
    }
}

/// Db capability over user integration settings documents
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Settings for a user, if any were saved
    async fn get(&self, user_id: &str) -> Result<Option<UserIntegrationSettings>>;

    /// Persist a user's settings
    async fn set(&self, settings: UserIntegrationSettings) -> Result<()>;
}

/// In-process settings store; production deployments back this capability
/// with the external document store
#[derive(Default)]
pub struct MemorySettingsStore {
    docs: RwLock<HashMap<String, UserIntegrationSettings>>,
}

impl MemorySettingsStore {
    /// Empty store
    pub fn new() -> Self {
        MemorySettingsStore::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserIntegrationSettings>> {
        Ok(self.docs.read().get(user_id).cloned())
    }

    async fn set(&self, settings: UserIntegrationSettings) -> Result<()> {
        self.docs.write().insert(settings.user_id.clone(), settings);
        Ok(())
    }
}
