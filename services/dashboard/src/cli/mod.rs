//! services/dashboard/src/cli/mod.rs
//!
//! Command dispatch. Every command error is returned to the caller, which prints
//! it; nothing here ends the process.

pub mod commands;
pub mod files;
pub mod render;
pub mod shell;
pub mod state;

use jaison_core::domain::UserUpdate;
use jaison_core::processing::{ExtractionOptions, PollHandle, PollOutcome};
use jaison_core::result::interpret_result;
use jaison_core::session::check_password_confirmation;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::commands::{AuthAction, Commands, ExtractionArgs, KeyAction, OcrAction};
use crate::cli::state::AppState;
use crate::error::DashboardError;

/// Runs one command against the shared state. `shell` is handled by the caller.
pub async fn execute(command: Commands, state: &AppState) -> Result<(), DashboardError> {
    match command {
        Commands::Health => health(state).await,
        Commands::Auth { action } => auth(action, state).await,
        Commands::Keys { action } => keys(action, state).await,
        Commands::Ocr { action } => ocr(action, state).await,
        Commands::Shell => {
            println!("Already in the shell.");
            Ok(())
        }
    }
}

async fn health(state: &AppState) -> Result<(), DashboardError> {
    let mut healthy = true;
    for check in &state.health_checks {
        match check.health().await {
            Ok(status) if status.is_ok() => {
                println!("{:<10} ok (version {})", check.service_name(), status.version)
            }
            Ok(status) => {
                healthy = false;
                println!("{:<10} {}", check.service_name(), status.status);
            }
            Err(e) => {
                healthy = false;
                println!("{:<10} {}", check.service_name(), e);
            }
        }
    }
    if healthy {
        Ok(())
    } else {
        Err(DashboardError::Unhealthy)
    }
}

//=========================================================================================
// Account
//=========================================================================================

async fn auth(action: AuthAction, state: &AppState) -> Result<(), DashboardError> {
    match action {
        AuthAction::Login {
            email,
            password,
            remember_me,
        } => {
            let user = state.session.login(&email, &password, remember_me).await?;
            println!("Logged in as {}", user.email);
        }
        AuthAction::Register {
            email,
            password,
            confirm_password,
            name,
        } => {
            if let Some(confirmation) = confirm_password {
                check_password_confirmation(&password, &confirmation)?;
            }
            let user = state.session.register(&email, &password, name.as_deref()).await?;
            println!("Registered and logged in as {}", user.email);
        }
        AuthAction::Logout => {
            state.session.logout();
            println!("Logged out.");
        }
        AuthAction::Whoami => {
            let snapshot = state.session.snapshot();
            match snapshot.user {
                Some(user) if snapshot.is_authenticated => render::user(&user),
                _ => return Err(DashboardError::NotLoggedIn),
            }
        }
        AuthAction::Update {
            name,
            email,
            password,
        } => {
            require_login(state)?;
            let patch = UserUpdate {
                name,
                email,
                password,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            let user = state.session.update_profile(&patch).await?;
            render::user(&user);
        }
        AuthAction::ResetRequest { email } => {
            state.session.request_password_reset(&email).await?;
            println!("If an account exists for {}, a password reset link has been sent.", email);
        }
        AuthAction::ResetConfirm { token, password } => {
            state.session.confirm_password_reset(&token, &password).await?;
            println!("Password updated. You can now log in.");
        }
    }
    Ok(())
}

fn require_login(state: &AppState) -> Result<(), DashboardError> {
    if state.session.snapshot().is_authenticated {
        Ok(())
    } else {
        Err(DashboardError::NotLoggedIn)
    }
}

//=========================================================================================
// API keys
//=========================================================================================

async fn keys(action: KeyAction, state: &AppState) -> Result<(), DashboardError> {
    if let KeyAction::Use { secret } = action {
        state.api_key.set_key(Some(secret));
        if state.api_key.has_key() {
            println!("OCR commands will use the given API key.");
        } else {
            println!("The API key is blank; OCR commands have no key.");
        }
        return Ok(());
    }

    require_login(state)?;
    match action {
        KeyAction::List { active } => {
            state.api_keys.refresh().await?;
            render::key_table(&state.api_keys.keys(active).await);
        }
        KeyAction::Show { id } => {
            let key = state.api_keys.get(&id).await?;
            render::key_table(std::slice::from_ref(&key));
        }
        KeyAction::Create {
            name,
            expires_in_days,
        } => {
            let issued = state.api_keys.create(&name, expires_in_days).await?;
            render::issued_key(&issued);
        }
        KeyAction::Revoke { id } => {
            state.api_keys.revoke(&id).await?;
            println!("Revoked API key {}", id);
        }
        KeyAction::Activate { id } => {
            let key = state.api_keys.set_active(&id, true).await?;
            render::key_table(std::slice::from_ref(&key));
        }
        KeyAction::Deactivate { id } => {
            let key = state.api_keys.set_active(&id, false).await?;
            render::key_table(std::slice::from_ref(&key));
        }
        KeyAction::Use { .. } => {}
    }
    Ok(())
}

//=========================================================================================
// OCR
//=========================================================================================

async fn ocr(action: OcrAction, state: &AppState) -> Result<(), DashboardError> {
    if !state.api_key.has_key() {
        return Err(DashboardError::MissingApiKey);
    }

    match action {
        OcrAction::Upload { path } => {
            let file = files::load_document(&path).await?;
            let upload = state.processing.upload(file).await?;
            render::upload(&upload);
        }
        OcrAction::Process { options } => {
            let upload = state
                .processing
                .snapshot()
                .upload
                .ok_or_else(|| DashboardError::Processing("Please upload a file first".to_string()))?;
            let options = extraction_options(options).await?;
            let handle = state.processing.process(&upload, options).await?;
            let data = settle(follow(state, handle).await?)?;
            render::json(&data)?;
        }
        OcrAction::Status { request_id } => {
            let job = state.processing.status(&request_id).await?;
            render::job(&job);
        }
        OcrAction::Run { path, options } => {
            let options = extraction_options(options).await?;
            let file = files::load_document(&path).await?;
            let upload = state.processing.upload(file).await?;
            eprintln!("Uploaded {} as {}", upload.filename, upload.file_id);
            let handle = state.processing.process(&upload, options).await?;
            let data = settle(follow(state, handle).await?)?;
            render::json(&data)?;
        }
    }
    Ok(())
}

async fn extraction_options(args: ExtractionArgs) -> Result<ExtractionOptions, DashboardError> {
    let output_schema = match &args.schema {
        Some(path) => Some(files::load_schema(path).await?),
        None => None,
    };
    Ok(ExtractionOptions {
        document_type: args.document_type,
        prompt: args.prompt,
        model: args.model,
        output_schema,
    })
}

/// Waits for a poll task, echoing status changes to stderr. Ctrl-C abandons the
/// job locally; the backend keeps processing it.
async fn follow(state: &AppState, handle: PollHandle) -> Result<PollOutcome, DashboardError> {
    eprintln!("Processing request {}", handle.request_id());
    let mut updates = state.processing.subscribe();
    let mut last_status = None;
    let mut watching = true;
    let mut interrupted = false;

    let outcome = handle.wait();
    tokio::pin!(outcome);

    loop {
        tokio::select! {
            result = &mut outcome => return Ok(result?),
            changed = updates.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                    continue;
                }
                let status = updates.borrow_and_update().job.as_ref().map(|job| job.status);
                if status != last_status {
                    if let Some(status) = status {
                        eprintln!("  status: {}", status);
                    }
                    last_status = status;
                }
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    warn!("Interrupted; no longer polling");
                    state.processing.reset();
                }
            }
        }
    }
}

fn settle(outcome: PollOutcome) -> Result<Value, DashboardError> {
    match outcome {
        PollOutcome::Completed(job) => {
            info!("Job {} completed", job.request_id);
            Ok(interpret_result(&job)?)
        }
        PollOutcome::Failed(job) => Err(DashboardError::Processing(format!(
            "Processing failed: {}",
            job.error.unwrap_or_else(|| "unknown error".to_string())
        ))),
        PollOutcome::Abandoned { error, .. } => Err(DashboardError::Processing(format!(
            "Failed to get processing status: {}",
            error
        ))),
        PollOutcome::Cancelled(job) => Err(DashboardError::Processing(format!(
            "Stopped waiting for {}",
            job.request_id
        ))),
    }
}
