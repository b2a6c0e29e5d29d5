//! crates/jaison_core/src/api_keys.rs
//!
//! API-key management with a local cache of the user's keys.
//! Secrets are handed out exactly once, at creation, and never cached.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{ApiKey, ApiKeyRequest, IssuedApiKey};
use crate::ports::{ApiKeyService, PortError, PortResult};

pub struct ApiKeyManager {
    service: Arc<dyn ApiKeyService>,
    keys: RwLock<Vec<ApiKey>>,
}

impl ApiKeyManager {
    pub fn new(service: Arc<dyn ApiKeyService>) -> Self {
        Self {
            service,
            keys: RwLock::new(Vec::new()),
        }
    }

    /// Reloads the cache from the backend.
    pub async fn refresh(&self) -> PortResult<Vec<ApiKey>> {
        let keys: Vec<ApiKey> = self
            .service
            .list_keys()
            .await?
            .iter()
            .map(ApiKey::without_secret)
            .collect();
        *self.keys.write().await = keys.clone();
        Ok(keys)
    }

    /// The cached keys, optionally limited to active ones.
    pub async fn keys(&self, active_only: bool) -> Vec<ApiKey> {
        self.keys
            .read()
            .await
            .iter()
            .filter(|key| !active_only || key.is_active)
            .cloned()
            .collect()
    }

    pub async fn create(&self, name: &str, expires_in_days: Option<u32>) -> PortResult<IssuedApiKey> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PortError::Validation("Key name is required".to_string()));
        }

        let request = ApiKeyRequest {
            name: name.to_string(),
            expires_in_days,
        };
        let created = self.service.create_key(&request).await?;
        let secret = created.key.clone().ok_or_else(|| {
            PortError::Unexpected("API key response did not include the key secret".to_string())
        })?;
        let key = created.without_secret();

        info!("Created API key '{}' ({:?})", key.name, key.identifier());
        self.keys.write().await.insert(0, key.clone());
        Ok(IssuedApiKey { key, secret })
    }

    pub async fn get(&self, key_id: &str) -> PortResult<ApiKey> {
        let key = self.service.get_key(key_id).await?.without_secret();
        self.replace_cached(key_id, key.clone()).await;
        Ok(key)
    }

    /// Revokes a key and drops it from the cache.
    pub async fn revoke(&self, key_id: &str) -> PortResult<()> {
        self.service.revoke_key(key_id).await?;
        self.keys
            .write()
            .await
            .retain(|key| key.identifier() != Some(key_id));
        info!("Revoked API key {}", key_id);
        Ok(())
    }

    pub async fn set_active(&self, key_id: &str, active: bool) -> PortResult<ApiKey> {
        let key = self
            .service
            .set_key_active(key_id, active)
            .await?
            .without_secret();
        self.replace_cached(key_id, key.clone()).await;
        info!(
            "API key {} {}",
            key_id,
            if active { "activated" } else { "deactivated" }
        );
        Ok(key)
    }

    async fn replace_cached(&self, key_id: &str, key: ApiKey) {
        let mut keys = self.keys.write().await;
        match keys.iter_mut().find(|k| k.identifier() == Some(key_id)) {
            Some(slot) => *slot = key,
            None => keys.push(key),
        }
    }
}
