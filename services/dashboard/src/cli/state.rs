//! services/dashboard/src/cli/state.rs
//!
//! The application state, created once at startup and shared by every command.

use std::sync::Arc;

use jaison_core::api_keys::ApiKeyManager;
use jaison_core::credentials::{ApiKeyProvider, BearerTokenProvider};
use jaison_core::ports::{CredentialStore, HealthCheck};
use jaison_core::processing::ProcessingOrchestrator;
use jaison_core::session::SessionManager;
use tracing::info;

use crate::adapters::{AdminApiAdapter, FileCredentialStore, HttpClient, OcrApiAdapter};
use crate::config::Config;
use crate::error::DashboardError;

pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionManager,
    pub api_keys: ApiKeyManager,
    pub processing: ProcessingOrchestrator,
    pub api_key: Arc<ApiKeyProvider>,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl AppState {
    /// Wires the adapters and managers from the configuration.
    ///
    /// Management calls carry the session bearer token; OCR calls carry the API
    /// key. Each `HttpClient` gets exactly one of the two providers.
    pub fn new(config: Arc<Config>) -> Result<Self, DashboardError> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        let bearer = Arc::new(BearerTokenProvider::new(store.clone()));
        let api_key = Arc::new(ApiKeyProvider::new(config.api_key.clone()));

        let admin = Arc::new(AdminApiAdapter::new(HttpClient::new(
            &config.admin_api_url,
            config.request_timeout,
            bearer,
        )?));
        let ocr = Arc::new(OcrApiAdapter::new(HttpClient::new(
            &config.ocr_api_url,
            config.request_timeout,
            api_key.clone(),
        )?));

        let session = SessionManager::new(admin.clone(), store);
        let api_keys = ApiKeyManager::new(admin.clone());
        let processing =
            ProcessingOrchestrator::with_limits(ocr.clone(), config.poll_interval, config.max_upload_bytes);

        let health_checks = vec![admin as Arc<dyn HealthCheck>, ocr];

        info!(
            admin = %config.admin_api_url,
            ocr = %config.ocr_api_url,
            "Application state initialised"
        );

        Ok(Self {
            config,
            session,
            api_keys,
            processing,
            api_key,
            health_checks,
        })
    }

    /// Stops any background polling. Called once before the process exits.
    pub fn shutdown(self) {
        self.processing.shutdown();
        self.session.close();
    }
}
