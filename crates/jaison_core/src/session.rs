//! crates/jaison_core/src/session.rs
//!
//! The session manager: holds the authentication state, exposes the account
//! operations, and persists the bearer token through a `CredentialStore`.
//!
//! State is published on a `watch` channel so any number of observers can follow
//! `loading -> {authenticated, anonymous}` transitions.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::credentials::Persistence;
use crate::domain::{LoginRequest, PasswordResetConfirm, RegisterRequest, User, UserUpdate};
use crate::ports::{AuthService, CredentialStore, PortError, PortResult};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login failed. The backend's reason is deliberately not surfaced.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password reset failed. Please try again.")]
    PasswordResetFailed,
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated,
    Anonymous,
}

/// A snapshot of the client-held session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub token: Option<String>,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
            token: None,
        }
    }

    fn anonymous() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
            token: Some(token),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated {
            SessionPhase::Authenticated
        } else if self.is_loading {
            SessionPhase::Loading
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// Checks a registration password against its confirmation before any request.
pub fn check_password_confirmation(password: &str, confirmation: &str) -> PortResult<()> {
    if password != confirmation {
        return Err(PortError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

//=========================================================================================
// SessionManager
//=========================================================================================

pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Creates a manager in the `loading` state. Call `bootstrap` to resolve it.
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self { auth, store, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Restores a session from a persisted token, if one exists.
    ///
    /// Any failure to validate the token clears it and leaves the session anonymous.
    pub async fn bootstrap(&self) -> SessionState {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the persisted session token: {}", e);
                None
            }
        };

        let next = match token {
            None => SessionState::anonymous(),
            Some(token) => match self.auth.current_user().await {
                Ok(user) => {
                    info!("Restored session for user {}", user.id);
                    SessionState::authenticated(user, token)
                }
                Err(e) => {
                    warn!("Persisted session token was rejected: {}", e);
                    self.clear_store();
                    SessionState::anonymous()
                }
            },
        };

        self.state.send_replace(next.clone());
        next
    }

    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> SessionResult<User> {
        self.begin_operation();

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            remember_me,
        };

        let grant = match self.auth.login(&request).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!("Login failed: {}", e);
                return Err(self.fail(SessionError::InvalidCredentials));
            }
        };

        if let Err(e) = self
            .store
            .save(&grant.access_token, Persistence::from_remember_me(remember_me))
        {
            return Err(self.fail(e.into()));
        }

        info!("User {} logged in", grant.user.id);
        let user = grant.user.clone();
        self.state
            .send_replace(SessionState::authenticated(grant.user, grant.access_token));
        Ok(user)
    }

    /// Registers an account and then logs into it with the same credentials.
    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> SessionResult<User> {
        self.begin_operation();

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.unwrap_or_default().to_string(),
        };

        if let Err(e) = self.auth.register(&request).await {
            warn!("Registration failed: {}", e);
            return Err(self.fail(e.into()));
        }

        info!("Registered {}; logging in", email);
        self.login(email, password, false).await
    }

    /// Drops the session locally. There is no server round-trip to wait for.
    pub fn logout(&self) {
        self.clear_store();
        self.state.send_replace(SessionState::anonymous());
        info!("Logged out");
    }

    /// Always succeeds from the caller's point of view, so the outcome never
    /// reveals whether the address belongs to an account.
    pub async fn request_password_reset(&self, email: &str) -> SessionResult<()> {
        self.begin_operation();
        if let Err(e) = self.auth.request_password_reset(email).await {
            warn!("Password reset request failed: {}", e);
        }
        self.end_operation();
        Ok(())
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> SessionResult<()> {
        self.begin_operation();
        let request = PasswordResetConfirm {
            token: token.to_string(),
            password: new_password.to_string(),
        };
        match self.auth.confirm_password_reset(&request).await {
            Ok(()) => {
                self.end_operation();
                Ok(())
            }
            Err(e) => {
                warn!("Password reset confirmation failed: {}", e);
                Err(self.fail(SessionError::PasswordResetFailed))
            }
        }
    }

    pub async fn update_profile(&self, patch: &UserUpdate) -> SessionResult<User> {
        self.begin_operation();
        match self.auth.update_profile(patch).await {
            Ok(user) => {
                let updated = user.clone();
                self.state.send_modify(|state| {
                    state.user = Some(updated);
                    state.is_loading = false;
                });
                Ok(user)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Tears the manager down; subscribers observe the channel closing.
    pub fn close(self) {
        info!("Session manager closed");
    }

    fn begin_operation(&self) {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });
    }

    fn end_operation(&self) {
        self.state.send_modify(|state| state.is_loading = false);
    }

    fn fail(&self, error: SessionError) -> SessionError {
        let message = error.to_string();
        self.state.send_modify(|state| {
            state.is_loading = false;
            state.error = Some(message);
        });
        error
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Could not clear the persisted session token: {}", e);
        }
    }
}
