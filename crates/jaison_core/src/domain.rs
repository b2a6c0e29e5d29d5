//! crates/jaison_core/src/domain.rs
//!
//! Defines the core data structures exchanged with the Jaison backends.
//! The serde attributes describe the wire format of the Admin and OCR APIs.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Accounts
//=========================================================================================

/// A dashboard user. Owned by the backend; the client only caches a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Partial profile patch sent to `PUT /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// The token grant returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password: String,
}

//=========================================================================================
// API keys
//=========================================================================================

/// An API key record as listed by the Admin API.
///
/// Older backends report the identifier as `key_id`, newer ones as `id`.
/// The raw `key` secret is only ever present in the creation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// The key's identifier: `key_id` when present, otherwise `id`.
    pub fn identifier(&self) -> Option<&str> {
        self.key_id.as_deref().or(self.id.as_deref())
    }

    /// Returns a copy of this record with the secret removed.
    pub fn without_secret(&self) -> Self {
        Self {
            key: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyRequest {
    pub name: String,
    pub expires_in_days: Option<u32>,
}

/// A freshly created API key together with its one-time secret.
#[derive(Clone)]
pub struct IssuedApiKey {
    pub key: ApiKey,
    pub secret: String,
}

impl fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

//=========================================================================================
// OCR data plane
//=========================================================================================

/// A local file selected for upload.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl DocumentFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The backend's acknowledgement of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub file_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    #[serde(with = "timestamp")]
    pub upload_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Receipt,
    Invoice,
    IdCard,
    BusinessCard,
    Ticket,
    Coupon,
    Generic,
}

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        DocumentType::Receipt,
        DocumentType::Invoice,
        DocumentType::IdCard,
        DocumentType::BusinessCard,
        DocumentType::Ticket,
        DocumentType::Coupon,
        DocumentType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Receipt => "receipt",
            DocumentType::Invoice => "invoice",
            DocumentType::IdCard => "id_card",
            DocumentType::BusinessCard => "business_card",
            DocumentType::Ticket => "ticket",
            DocumentType::Coupon => "coupon",
            DocumentType::Generic => "generic",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        DocumentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DocumentType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown document type '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingRequest {
    pub file_id: String,
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// True while the backend is still working on the job.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_flight()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A server-side OCR job, as reported by `/process` and `/status/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub request_id: String,
    pub status: JobStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_used: Option<f64>,
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

//=========================================================================================
// Timestamp wire format
//=========================================================================================

/// The backends emit RFC 3339 timestamps or naive ISO-8601 ones (implicitly UTC).
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn parses_naive_and_offset_timestamps() {
        let naive = timestamp::parse("2024-03-01T10:15:30.123456").unwrap();
        assert_eq!((naive.year(), naive.hour(), naive.minute()), (2024, 10, 15));

        let offset = timestamp::parse("2024-03-01T12:15:30+02:00").unwrap();
        assert_eq!(offset.hour(), 10);

        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn api_key_identifier_prefers_key_id() {
        let mut key: ApiKey = serde_json::from_value(json!({
            "id": "row-1",
            "key_id": "key-1",
            "name": "ci",
            "created_at": "2024-01-01T00:00:00",
            "is_active": true
        }))
        .unwrap();
        assert_eq!(key.identifier(), Some("key-1"));

        key.key_id = None;
        assert_eq!(key.identifier(), Some("row-1"));
    }

    #[test]
    fn job_deserializes_with_raw_content_and_nullable_fields() {
        let job: ProcessingJob = serde_json::from_value(json!({
            "request_id": "req-9",
            "status": "completed",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:03",
            "completed_at": null,
            "raw_content": "{}",
            "processing_time": 2.5
        }))
        .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.status.is_terminal());
        assert!(job.completed_at.is_none());
        assert_eq!(job.raw_content.as_deref(), Some("{}"));
    }

    #[test]
    fn document_type_parses_cli_spellings() {
        assert_eq!("id-card".parse::<DocumentType>().unwrap(), DocumentType::IdCard);
        assert_eq!("Receipt".parse::<DocumentType>().unwrap(), DocumentType::Receipt);
        assert!("passport".parse::<DocumentType>().is_err());
    }
}
