//! In-memory fakes for the core ports, shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use jaison_core::domain::{
    ApiKey, ApiKeyRequest, DocumentFile, LoginRequest, LoginResponse, PasswordResetConfirm,
    ProcessingJob, ProcessingRequest, RegisterRequest, UploadResult, User, UserUpdate,
};
use jaison_core::ports::{ApiKeyService, AuthService, OcrService, PortError, PortResult};
use jaison_core::JobStatus;
use tokio::time::Instant;

pub fn user(email: &str) -> User {
    User {
        id: format!("user-{}", email),
        email: email.to_string(),
        name: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn job(request_id: &str, status: JobStatus) -> ProcessingJob {
    ProcessingJob {
        request_id: request_id.to_string(),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: None,
        completed_at: None,
        result: None,
        raw_content: None,
        error: None,
        model_used: None,
        processing_time: None,
        credits_used: None,
    }
}

pub fn file(name: &str, content_type: &str, size: usize) -> DocumentFile {
    DocumentFile {
        filename: name.to_string(),
        content_type: content_type.to_string(),
        bytes: Bytes::from(vec![0u8; size]),
    }
}

pub fn api_key(key_id: Option<&str>, id: Option<&str>, name: &str) -> ApiKey {
    ApiKey {
        key_id: key_id.map(String::from),
        id: id.map(String::from),
        key: None,
        name: name.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        expires_at: None,
        is_active: true,
        last_used: None,
    }
}

//=========================================================================================
// Auth
//=========================================================================================

/// Accepts one password for every account and records every call.
pub struct FakeAuth {
    pub valid_password: String,
    pub token: String,
    pub fail_register: bool,
    pub fail_current_user: bool,
    pub fail_reset_request: bool,
    pub fail_reset_confirm: bool,
    pub fail_update: bool,
    pub logins: Mutex<Vec<(String, String, bool)>>,
    pub registrations: Mutex<Vec<RegisterRequest>>,
    pub reset_requests: Mutex<Vec<String>>,
}

impl FakeAuth {
    pub fn new(valid_password: &str) -> Self {
        Self {
            valid_password: valid_password.to_string(),
            token: "token-abc".to_string(),
            fail_register: false,
            fail_current_user: false,
            fail_reset_request: false,
            fail_reset_confirm: false,
            fail_update: false,
            logins: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
            reset_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn login_calls(&self) -> Vec<(String, String, bool)> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn login(&self, request: &LoginRequest) -> PortResult<LoginResponse> {
        self.logins.lock().unwrap().push((
            request.email.clone(),
            request.password.clone(),
            request.remember_me,
        ));
        if request.password != self.valid_password {
            return Err(PortError::Backend {
                status: 401,
                message: "No account for that email".to_string(),
            });
        }
        Ok(LoginResponse {
            access_token: self.token.clone(),
            token_type: Some("bearer".to_string()),
            expires_at: None,
            user: user(&request.email),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> PortResult<User> {
        self.registrations.lock().unwrap().push(request.clone());
        if self.fail_register {
            return Err(PortError::Backend {
                status: 400,
                message: "Email already registered".to_string(),
            });
        }
        Ok(user(&request.email))
    }

    async fn current_user(&self) -> PortResult<User> {
        if self.fail_current_user {
            return Err(PortError::Unauthorized(None));
        }
        Ok(user("restored@example.com"))
    }

    async fn update_profile(&self, patch: &UserUpdate) -> PortResult<User> {
        if self.fail_update {
            return Err(PortError::Backend {
                status: 422,
                message: "Email is invalid".to_string(),
            });
        }
        let mut updated = user("restored@example.com");
        updated.name = patch.name.clone();
        Ok(updated)
    }

    async fn request_password_reset(&self, email: &str) -> PortResult<()> {
        self.reset_requests.lock().unwrap().push(email.to_string());
        if self.fail_reset_request {
            return Err(PortError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn confirm_password_reset(&self, _request: &PasswordResetConfirm) -> PortResult<()> {
        if self.fail_reset_confirm {
            return Err(PortError::Backend {
                status: 400,
                message: "Token expired".to_string(),
            });
        }
        Ok(())
    }
}

//=========================================================================================
// OCR
//=========================================================================================

/// Replays scripted status responses and records when each was requested.
pub struct FakeOcr {
    pub upload_calls: Mutex<u32>,
    pub process_requests: Mutex<Vec<ProcessingRequest>>,
    pub initial_status: JobStatus,
    pub fail_process: bool,
    /// How long each status request takes to answer.
    pub status_delay: Duration,
    pub statuses: Mutex<VecDeque<PortResult<ProcessingJob>>>,
    pub status_times: Mutex<Vec<Instant>>,
}

impl FakeOcr {
    pub fn with_statuses(statuses: Vec<PortResult<ProcessingJob>>) -> Self {
        Self {
            upload_calls: Mutex::new(0),
            process_requests: Mutex::new(Vec::new()),
            initial_status: JobStatus::Pending,
            fail_process: false,
            status_delay: Duration::ZERO,
            statuses: Mutex::new(statuses.into()),
            status_times: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> u32 {
        *self.upload_calls.lock().unwrap()
    }

    pub fn status_calls(&self) -> Vec<Instant> {
        self.status_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrService for FakeOcr {
    async fn upload(&self, file: &DocumentFile) -> PortResult<UploadResult> {
        *self.upload_calls.lock().unwrap() += 1;
        Ok(UploadResult {
            file_id: format!("file-{}", file.filename),
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
            upload_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
    }

    async fn process(&self, request: &ProcessingRequest) -> PortResult<ProcessingJob> {
        self.process_requests.lock().unwrap().push(request.clone());
        if self.fail_process {
            return Err(PortError::Backend {
                status: 404,
                message: "File not found".to_string(),
            });
        }
        Ok(job("req-1", self.initial_status))
    }

    async fn status(&self, request_id: &str) -> PortResult<ProcessingJob> {
        self.status_times.lock().unwrap().push(Instant::now());
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(job(request_id, JobStatus::Processing)))
    }
}

//=========================================================================================
// API keys
//=========================================================================================

pub struct FakeApiKeys {
    pub listed: Vec<ApiKey>,
    pub revoked: Mutex<Vec<String>>,
}

impl FakeApiKeys {
    pub fn new(listed: Vec<ApiKey>) -> Self {
        Self {
            listed,
            revoked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ApiKeyService for FakeApiKeys {
    async fn create_key(&self, request: &ApiKeyRequest) -> PortResult<ApiKey> {
        let mut key = api_key(None, Some("new-id"), &request.name);
        key.key = Some("jk_secret_value".to_string());
        Ok(key)
    }

    async fn list_keys(&self) -> PortResult<Vec<ApiKey>> {
        Ok(self.listed.clone())
    }

    async fn get_key(&self, key_id: &str) -> PortResult<ApiKey> {
        self.listed
            .iter()
            .find(|k| k.identifier() == Some(key_id))
            .cloned()
            .ok_or_else(|| PortError::NotFound(key_id.to_string()))
    }

    async fn revoke_key(&self, key_id: &str) -> PortResult<()> {
        self.revoked.lock().unwrap().push(key_id.to_string());
        Ok(())
    }

    async fn set_key_active(&self, key_id: &str, active: bool) -> PortResult<ApiKey> {
        let mut key = self.get_key(key_id).await?;
        key.is_active = active;
        Ok(key)
    }
}
