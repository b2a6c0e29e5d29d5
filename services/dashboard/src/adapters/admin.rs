//! services/dashboard/src/adapters/admin.rs
//!
//! This module contains the adapter for the Jaison Admin API (accounts and API
//! keys). It implements the `AuthService`, `ApiKeyService` and `HealthCheck`
//! ports from the `core` crate.

use async_trait::async_trait;
use jaison_core::domain::{
    ApiKey, ApiKeyRequest, HealthStatus, LoginRequest, LoginResponse, PasswordResetConfirm,
    PasswordResetRequest, RegisterRequest, User, UserUpdate,
};
use jaison_core::ports::{ApiKeyService, AuthService, HealthCheck, PortResult};
use reqwest::Method;

use crate::adapters::http::HttpClient;

const AUTH: &str = "/api/v1/auth";
const API_KEYS: &str = "/api/v1/api-keys";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the Admin API with the session bearer token.
#[derive(Clone)]
pub struct AdminApiAdapter {
    http: HttpClient,
}

impl AdminApiAdapter {
    /// Creates a new `AdminApiAdapter`. `http` should carry the bearer-token provider.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for AdminApiAdapter {
    async fn login(&self, request: &LoginRequest) -> PortResult<LoginResponse> {
        let builder = self
            .http
            .public_request(Method::POST, &format!("{}/login", AUTH))
            .json(request);
        self.http.send_json(builder).await
    }

    async fn register(&self, request: &RegisterRequest) -> PortResult<User> {
        let builder = self
            .http
            .public_request(Method::POST, &format!("{}/register", AUTH))
            .json(request);
        self.http.send_json(builder).await
    }

    async fn current_user(&self) -> PortResult<User> {
        let builder = self.http.request(Method::GET, &format!("{}/me", AUTH));
        self.http.send_json(builder).await
    }

    async fn update_profile(&self, patch: &UserUpdate) -> PortResult<User> {
        let builder = self
            .http
            .request(Method::PUT, &format!("{}/me", AUTH))
            .json(patch);
        self.http.send_json(builder).await
    }

    async fn request_password_reset(&self, email: &str) -> PortResult<()> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        let builder = self
            .http
            .public_request(Method::POST, &format!("{}/password-reset/request", AUTH))
            .json(&body);
        self.http.send_empty(builder).await
    }

    async fn confirm_password_reset(&self, request: &PasswordResetConfirm) -> PortResult<()> {
        let builder = self
            .http
            .public_request(Method::POST, &format!("{}/password-reset/confirm", AUTH))
            .json(request);
        self.http.send_empty(builder).await
    }
}

//=========================================================================================
// `ApiKeyService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ApiKeyService for AdminApiAdapter {
    async fn create_key(&self, request: &ApiKeyRequest) -> PortResult<ApiKey> {
        let builder = self.http.request(Method::POST, API_KEYS).json(request);
        self.http.send_json(builder).await
    }

    async fn list_keys(&self) -> PortResult<Vec<ApiKey>> {
        let builder = self.http.request(Method::GET, API_KEYS);
        self.http.send_json(builder).await
    }

    async fn get_key(&self, key_id: &str) -> PortResult<ApiKey> {
        let builder = self.http.request(Method::GET, &format!("{}/{}", API_KEYS, key_id));
        self.http.send_json(builder).await
    }

    async fn revoke_key(&self, key_id: &str) -> PortResult<()> {
        let builder = self
            .http
            .request(Method::DELETE, &format!("{}/{}", API_KEYS, key_id));
        self.http.send_empty(builder).await
    }

    async fn set_key_active(&self, key_id: &str, active: bool) -> PortResult<ApiKey> {
        let action = if active { "activate" } else { "deactivate" };
        let builder = self
            .http
            .request(Method::PATCH, &format!("{}/{}/{}", API_KEYS, key_id, action));
        self.http.send_json(builder).await
    }
}

#[async_trait]
impl HealthCheck for AdminApiAdapter {
    fn service_name(&self) -> &'static str {
        "Admin API"
    }

    async fn health(&self) -> PortResult<HealthStatus> {
        let builder = self.http.public_request(Method::GET, "/api/v1/health");
        self.http.send_json(builder).await
    }
}
