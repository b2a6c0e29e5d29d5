pub mod api_keys;
pub mod credentials;
pub mod domain;
pub mod ports;
pub mod processing;
pub mod result;
pub mod session;

pub use api_keys::ApiKeyManager;
pub use credentials::{ApiKeyProvider, BearerTokenProvider, MemoryCredentialStore, Persistence};
pub use domain::{
    ApiKey, DocumentFile, DocumentType, HealthStatus, IssuedApiKey, JobStatus, ProcessingJob,
    UploadResult, User, UserUpdate,
};
pub use ports::{
    ApiKeyService, AuthService, Credential, CredentialProvider, CredentialStore, HealthCheck,
    OcrService, PortError, PortResult,
};
pub use processing::{ExtractionOptions, JobPhase, PollHandle, PollOutcome, ProcessingOrchestrator};
pub use session::{SessionError, SessionManager, SessionPhase, SessionState};
