//! crates/jaison_core/src/result.rs
//!
//! Reads the extracted data out of a completed job. The payload normally sits
//! under `result`; older backends sometimes only return the model output as a
//! `raw_content` string, possibly wrapped in a markdown code fence.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::ProcessingJob;

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$").expect("valid code fence pattern")
});

#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    #[error("No valid result found in response")]
    Missing,
    #[error("Failed to parse response: {0}")]
    Unparseable(#[from] serde_json::Error),
}

/// Returns the job's extracted data, falling back to parsing `raw_content`.
pub fn interpret_result(job: &ProcessingJob) -> Result<Value, ResultError> {
    if let Some(result) = &job.result {
        return Ok(result.clone());
    }
    match &job.raw_content {
        Some(raw) => parse_raw_content(raw),
        None => Err(ResultError::Missing),
    }
}

/// Parses `raw` as JSON, unwrapping a surrounding code fence first if there is one.
pub fn parse_raw_content(raw: &str) -> Result<Value, ResultError> {
    let body = strip_code_fence(raw);
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use chrono::Utc;
    use serde_json::json;

    fn completed(result: Option<Value>, raw_content: Option<&str>) -> ProcessingJob {
        ProcessingJob {
            request_id: "req-1".into(),
            status: JobStatus::Completed,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: Some(Utc::now()),
            result,
            raw_content: raw_content.map(String::from),
            error: None,
            model_used: None,
            processing_time: None,
            credits_used: None,
        }
    }

    #[test]
    fn unwraps_fenced_raw_content() {
        let job = completed(None, Some("```json\n{\"a\":1}\n```"));
        assert_eq!(interpret_result(&job).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn accepts_bare_fence_and_plain_json() {
        let fenced = completed(None, Some("```\n[1, 2]\n```"));
        assert_eq!(interpret_result(&fenced).unwrap(), json!([1, 2]));

        let plain = completed(None, Some("  {\"total\": 12.5}  "));
        assert_eq!(interpret_result(&plain).unwrap(), json!({"total": 12.5}));
    }

    #[test]
    fn result_field_wins_over_raw_content() {
        let job = completed(Some(json!({"store": "ACME"})), Some("not json"));
        assert_eq!(interpret_result(&job).unwrap(), json!({"store": "ACME"}));
    }

    #[test]
    fn reports_missing_and_garbled_payloads() {
        assert!(matches!(
            interpret_result(&completed(None, None)),
            Err(ResultError::Missing)
        ));
        assert!(matches!(
            interpret_result(&completed(None, Some("```json\n{oops\n```"))),
            Err(ResultError::Unparseable(_))
        ));
    }
}
