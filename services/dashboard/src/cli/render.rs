//! Plain-text and JSON output for command results. Everything here writes to
//! stdout; logs go to stderr.

use chrono::{DateTime, Utc};
use jaison_core::domain::{ApiKey, IssuedApiKey, ProcessingJob, UploadResult, User};
use serde::Serialize;

use crate::error::DashboardError;

pub fn json<T: Serialize>(value: &T) -> Result<(), DashboardError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn date(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn optional_date(value: Option<&DateTime<Utc>>, empty: &str) -> String {
    value.map(date).unwrap_or_else(|| empty.to_string())
}

pub fn user(user: &User) {
    println!("ID:      {}", user.id);
    println!("Email:   {}", user.email);
    println!("Name:    {}", user.name.as_deref().unwrap_or("-"));
    println!("Created: {}", date(&user.created_at));
}

pub fn key_table(keys: &[ApiKey]) {
    if keys.is_empty() {
        println!("No API keys found.");
        return;
    }
    println!(
        "{:<38} | {:<20} | {:<8} | {:<16} | {:<16} | {}",
        "ID", "Name", "Status", "Created", "Expires", "Last used"
    );
    println!("{:-<38}-+-{:-<20}-+-{:-<8}-+-{:-<16}-+-{:-<16}-+-{:-<16}", "", "", "", "", "", "");
    for key in keys {
        println!(
            "{:<38} | {:<20} | {:<8} | {:<16} | {:<16} | {}",
            key.identifier().unwrap_or("-"),
            key.name,
            if key.is_active { "active" } else { "inactive" },
            date(&key.created_at),
            optional_date(key.expires_at.as_ref(), "never"),
            optional_date(key.last_used.as_ref(), "never"),
        );
    }
}

pub fn issued_key(issued: &IssuedApiKey) {
    println!("Created API key '{}' ({})", issued.key.name, issued.key.identifier().unwrap_or("-"));
    println!();
    println!("  {}", issued.secret);
    println!();
    println!("Copy this key now. It will not be shown again.");
}

pub fn upload(upload: &UploadResult) {
    println!(
        "Uploaded {} ({}, {} bytes) as {}",
        upload.filename, upload.content_type, upload.size, upload.file_id
    );
}

pub fn job(job: &ProcessingJob) {
    println!("Request: {}", job.request_id);
    println!("Status:  {}", job.status);
    if let Some(model) = &job.model_used {
        println!("Model:   {}", model);
    }
    if let Some(seconds) = job.processing_time {
        println!("Time:    {:.2}s", seconds);
    }
    if let Some(credits) = job.credits_used {
        println!("Credits: {}", credits);
    }
    if let Some(error) = &job.error {
        println!("Error:   {}", error);
    }
}
