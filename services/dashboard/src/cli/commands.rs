use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jaison_core::domain::DocumentType;
use jaison_core::processing::DEFAULT_EXTRACTION_PROMPT;

#[derive(Parser, Debug)]
#[command(name = "jaison", version, about = "Jaison OCR dashboard client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that both backend APIs are reachable
    Health,

    /// Manage the dashboard account session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Manage OCR API keys
    Keys {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Upload and process documents
    Ocr {
        #[command(subcommand)]
        action: OcrAction,
    },

    /// Enter an interactive shell that keeps one session between commands
    Shell,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Keep the session token on disk for later runs
        #[arg(long)]
        remember_me: bool,
    },

    /// Create an account and log into it
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password; must match when given
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Forget the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Update the profile of the logged-in user
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Ask for a password reset email
    ResetRequest {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password using the token from the reset email
    ResetConfirm {
        #[arg(short, long)]
        token: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// List API keys
    List {
        /// Only show active keys
        #[arg(long)]
        active: bool,
    },

    /// Show one API key
    Show { id: String },

    /// Create an API key; the secret is shown once
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        expires_in_days: Option<u32>,
    },

    /// Revoke an API key
    Revoke { id: String },

    /// Re-enable a deactivated API key
    Activate { id: String },

    /// Disable an API key without revoking it
    Deactivate { id: String },

    /// Use an API key secret for OCR commands for the rest of this process
    Use { secret: String },
}

#[derive(Subcommand, Debug)]
pub enum OcrAction {
    /// Upload an image or PDF
    Upload { path: PathBuf },

    /// Process the last uploaded file and wait for the result
    Process {
        #[command(flatten)]
        options: ExtractionArgs,
    },

    /// Fetch the status of a processing request once
    Status { request_id: String },

    /// Upload, process and wait in one step
    Run {
        path: PathBuf,
        #[command(flatten)]
        options: ExtractionArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ExtractionArgs {
    /// receipt, invoice, id_card, business_card, ticket, coupon or generic
    #[arg(short = 't', long = "type", default_value = "receipt")]
    pub document_type: DocumentType,

    /// Leave empty to use the backend's template for the document type
    #[arg(short, long, default_value = DEFAULT_EXTRACTION_PROMPT)]
    pub prompt: String,

    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to a JSON schema for the extracted data
    #[arg(short, long)]
    pub schema: Option<PathBuf>,
}
