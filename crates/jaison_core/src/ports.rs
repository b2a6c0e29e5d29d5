//! crates/jaison_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the HTTP transport and of where credentials are kept.

use async_trait::async_trait;

use crate::credentials::Persistence;
use crate::domain::{
    ApiKey, ApiKeyRequest, DocumentFile, HealthStatus, LoginRequest, LoginResponse,
    PasswordResetConfirm, ProcessingJob, ProcessingRequest, RegisterRequest, UploadResult, User,
    UserUpdate,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// Detected on the client before any network call was made.
    #[error("{0}")]
    Validation(String),
    /// No response was received from the backend.
    #[error("Cannot connect to the API server: {0}")]
    Transport(String),
    /// The backend answered with a structured error.
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Item not found: {0}")]
    NotFound(String),
    /// 401 or 403, with the backend's reason when it gave one.
    #[error("{}", .0.as_deref().unwrap_or("Unauthorized"))]
    Unauthorized(Option<String>),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Credential Ports
//=========================================================================================

/// A credential ready to be attached to an outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// Sent as `X-API-Key: <key>`.
    ApiKey(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Supplies the credential for one trust domain, read fresh for every request.
pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn credential(&self) -> Option<Credential>;
}

/// Where the session bearer token is kept between requests and restarts.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> PortResult<Option<String>>;
    /// Saves the token under `policy`, replacing whatever any location held.
    fn save(&self, token: &str, policy: Persistence) -> PortResult<()>;
    /// Removes the token from every location.
    fn clear(&self) -> PortResult<()>;
}

//=========================================================================================
// Backend Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> PortResult<LoginResponse>;

    async fn register(&self, request: &RegisterRequest) -> PortResult<User>;

    /// Resolves the user owning the current bearer token.
    async fn current_user(&self) -> PortResult<User>;

    async fn update_profile(&self, patch: &UserUpdate) -> PortResult<User>;

    async fn request_password_reset(&self, email: &str) -> PortResult<()>;

    async fn confirm_password_reset(&self, request: &PasswordResetConfirm) -> PortResult<()>;
}

#[async_trait]
pub trait ApiKeyService: Send + Sync {
    async fn create_key(&self, request: &ApiKeyRequest) -> PortResult<ApiKey>;

    async fn list_keys(&self) -> PortResult<Vec<ApiKey>>;

    async fn get_key(&self, key_id: &str) -> PortResult<ApiKey>;

    async fn revoke_key(&self, key_id: &str) -> PortResult<()>;

    /// Activates or deactivates a key without deleting it.
    async fn set_key_active(&self, key_id: &str, active: bool) -> PortResult<ApiKey>;
}

#[async_trait]
pub trait OcrService: Send + Sync {
    async fn upload(&self, file: &DocumentFile) -> PortResult<UploadResult>;

    async fn process(&self, request: &ProcessingRequest) -> PortResult<ProcessingJob>;

    async fn status(&self, request_id: &str) -> PortResult<ProcessingJob>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// A short label for the checked service, used in reports.
    fn service_name(&self) -> &'static str;

    async fn health(&self) -> PortResult<HealthStatus>;
}
