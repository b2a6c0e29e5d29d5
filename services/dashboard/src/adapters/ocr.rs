//! services/dashboard/src/adapters/ocr.rs
//!
//! This module contains the adapter for the Jaison OCR API (the data plane).
//! It implements the `OcrService` and `HealthCheck` ports from the `core` crate.

use async_trait::async_trait;
use jaison_core::domain::{DocumentFile, HealthStatus, ProcessingJob, ProcessingRequest, UploadResult};
use jaison_core::ports::{HealthCheck, OcrService, PortError, PortResult};
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::adapters::http::HttpClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the OCR API with the data-plane API key.
#[derive(Clone)]
pub struct OcrApiAdapter {
    http: HttpClient,
}

impl OcrApiAdapter {
    /// Creates a new `OcrApiAdapter`. `http` should carry the API-key provider.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

//=========================================================================================
// `OcrService` Trait Implementation
//=========================================================================================

#[async_trait]
impl OcrService for OcrApiAdapter {
    /// Uploads the file as the `file` part of a multipart form.
    async fn upload(&self, file: &DocumentFile) -> PortResult<UploadResult> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| PortError::Validation(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let builder = self
            .http
            .request(Method::POST, "/api/v1/upload")
            .multipart(form);
        self.http.send_json(builder).await
    }

    async fn process(&self, request: &ProcessingRequest) -> PortResult<ProcessingJob> {
        let builder = self
            .http
            .request(Method::POST, "/api/v1/process")
            .json(request);
        self.http.send_json(builder).await
    }

    async fn status(&self, request_id: &str) -> PortResult<ProcessingJob> {
        let builder = self
            .http
            .request(Method::GET, &format!("/api/v1/status/{}", request_id));
        self.http.send_json(builder).await
    }
}

#[async_trait]
impl HealthCheck for OcrApiAdapter {
    fn service_name(&self) -> &'static str {
        "OCR API"
    }

    async fn health(&self) -> PortResult<HealthStatus> {
        let builder = self.http.public_request(Method::GET, "/api/v1/health");
        self.http.send_json(builder).await
    }
}
