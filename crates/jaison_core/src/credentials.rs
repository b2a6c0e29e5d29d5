//! crates/jaison_core/src/credentials.rs
//!
//! Token persistence policy, an in-memory credential store, and the two named
//! credential providers: the session bearer token for dashboard management calls
//! and the API key for OCR data-plane calls.

use std::sync::{Arc, RwLock};

use crate::ports::{Credential, CredentialProvider, CredentialStore, PortError, PortResult};

/// How long a saved token should outlive the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Survives restarts ("remember me").
    Durable,
    /// Lives only as long as the running application.
    Ephemeral,
}

impl Persistence {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Persistence::Durable
        } else {
            Persistence::Ephemeral
        }
    }
}

fn poisoned<T>(_: T) -> PortError {
    PortError::Unexpected("credential lock poisoned".to_string())
}

//=========================================================================================
// In-memory store
//=========================================================================================

/// Keeps the token in process memory only, regardless of the requested policy.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> PortResult<Option<String>> {
        Ok(self.token.read().map_err(poisoned)?.clone())
    }

    fn save(&self, token: &str, _policy: Persistence) -> PortResult<()> {
        *self.token.write().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        *self.token.write().map_err(poisoned)? = None;
        Ok(())
    }
}

//=========================================================================================
// Providers
//=========================================================================================

/// Attaches the session token from a `CredentialStore`.
pub struct BearerTokenProvider {
    store: Arc<dyn CredentialStore>,
}

impl BearerTokenProvider {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

impl CredentialProvider for BearerTokenProvider {
    fn name(&self) -> &'static str {
        "bearer-token"
    }

    fn credential(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(token) => token.map(Credential::Bearer),
            Err(e) => {
                tracing::warn!("Could not read the session token: {}", e);
                None
            }
        }
    }
}

/// Attaches the data-plane API key. The key can be swapped at runtime.
#[derive(Default)]
pub struct ApiKeyProvider {
    key: RwLock<Option<String>>,
}

impl ApiKeyProvider {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key.filter(|k| !k.trim().is_empty())),
        }
    }

    pub fn set_key(&self, key: Option<String>) {
        match self.key.write() {
            Ok(mut guard) => *guard = key.filter(|k| !k.trim().is_empty()),
            Err(_) => tracing::error!("API key lock poisoned; key not updated"),
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.read().map(|k| k.is_some()).unwrap_or(false)
    }
}

impl CredentialProvider for ApiKeyProvider {
    fn name(&self) -> &'static str {
        "api-key"
    }

    fn credential(&self) -> Option<Credential> {
        self.key.read().ok()?.clone().map(Credential::ApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_provider_follows_the_store() {
        let store = Arc::new(MemoryCredentialStore::new());
        let provider = BearerTokenProvider::new(store.clone());
        assert!(provider.credential().is_none());

        store.save("tok-1", Persistence::Ephemeral).unwrap();
        assert_eq!(provider.credential(), Some(Credential::Bearer("tok-1".into())));

        store.clear().unwrap();
        assert!(provider.credential().is_none());
    }

    #[test]
    fn api_key_provider_ignores_blank_keys() {
        let provider = ApiKeyProvider::new(Some("  ".into()));
        assert!(!provider.has_key());

        provider.set_key(Some("jk_live".into()));
        assert_eq!(provider.credential(), Some(Credential::ApiKey("jk_live".into())));
    }

    #[test]
    fn remember_me_selects_durable_storage() {
        assert_eq!(Persistence::from_remember_me(true), Persistence::Durable);
        assert_eq!(Persistence::from_remember_me(false), Persistence::Ephemeral);
    }
}
