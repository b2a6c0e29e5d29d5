//! crates/jaison_core/src/processing.rs
//!
//! Drives the three-step OCR interaction: upload a file, request processing,
//! and poll the job until it settles.
//!
//! Polling runs as a spawned task owned by a `PollHandle`. The task is cancelled
//! through a `CancellationToken` when the handle is dropped, when a newer job
//! replaces it, or when the orchestrator shuts down.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{DocumentFile, DocumentType, JobStatus, ProcessingJob, ProcessingRequest, UploadResult};
use crate::ports::{OcrService, PortError, PortResult};
use crate::result::interpret_result;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_EXTRACTION_PROMPT: &str = "Extract all information from this document.";

//=========================================================================================
// State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Submitting,
    Polling,
    Completed,
    Failed,
    /// A status request errored and polling was given up.
    Abandoned,
}

/// The orchestrator's published state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingState {
    pub phase: JobPhase,
    pub upload: Option<UploadResult>,
    pub job: Option<ProcessingJob>,
    pub error: Option<String>,
    generation: u64,
}

/// What to extract from an uploaded document.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub document_type: DocumentType,
    pub prompt: String,
    pub model: Option<String>,
    pub output_schema: Option<Value>,
}

impl ExtractionOptions {
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            prompt: DEFAULT_EXTRACTION_PROMPT.to_string(),
            model: None,
            output_schema: None,
        }
    }
}

/// How a poll task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(ProcessingJob),
    Failed(ProcessingJob),
    Abandoned { job: ProcessingJob, error: String },
    Cancelled(ProcessingJob),
}

impl PollOutcome {
    pub fn job(&self) -> &ProcessingJob {
        match self {
            PollOutcome::Completed(job)
            | PollOutcome::Failed(job)
            | PollOutcome::Abandoned { job, .. }
            | PollOutcome::Cancelled(job) => job,
        }
    }
}

/// Checks a file against the client-side upload rules.
pub fn validate_upload(file: &DocumentFile, max_bytes: u64) -> PortResult<()> {
    let content_type = file.content_type.to_ascii_lowercase();
    if !(content_type.starts_with("image/") || content_type == "application/pdf") {
        return Err(PortError::Validation(format!(
            "Unsupported file type '{}': only images and PDF documents are accepted",
            file.content_type
        )));
    }
    if file.size() > max_bytes {
        return Err(PortError::Validation(format!(
            "File is too large: {} bytes exceeds the {} byte limit",
            file.size(),
            max_bytes
        )));
    }
    Ok(())
}

//=========================================================================================
// PollHandle
//=========================================================================================

/// Owns a running poll task. Dropping the handle stops further polling.
pub struct PollHandle {
    request_id: String,
    token: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Stops future status requests. An in-flight request is not aborted, but
    /// its response will be discarded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the poll task to finish.
    pub async fn wait(mut self) -> PortResult<PollOutcome> {
        let task = self
            .task
            .take()
            .ok_or_else(|| PortError::Unexpected("poll task already awaited".to_string()))?;
        task.await
            .map_err(|e| PortError::Unexpected(format!("poll task failed: {}", e)))
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

//=========================================================================================
// ProcessingOrchestrator
//=========================================================================================

struct Shared {
    ocr: Arc<dyn OcrService>,
    poll_interval: Duration,
    state: watch::Sender<ProcessingState>,
}

impl Shared {
    /// Applies `update` only while `generation` is still the current job.
    fn update_if_current(&self, generation: u64, update: impl FnOnce(&mut ProcessingState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            update(state);
            true
        })
    }
}

pub struct ProcessingOrchestrator {
    shared: Arc<Shared>,
    max_upload_bytes: u64,
    root: CancellationToken,
    active: Mutex<Option<CancellationToken>>,
}

impl ProcessingOrchestrator {
    pub fn new(ocr: Arc<dyn OcrService>) -> Self {
        Self::with_limits(ocr, DEFAULT_POLL_INTERVAL, DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_limits(ocr: Arc<dyn OcrService>, poll_interval: Duration, max_upload_bytes: u64) -> Self {
        let (state, _) = watch::channel(ProcessingState::default());
        Self {
            shared: Arc::new(Shared {
                ocr,
                poll_interval,
                state,
            }),
            max_upload_bytes,
            root: CancellationToken::new(),
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> ProcessingState {
        self.shared.state.borrow().clone()
    }

    /// Validates and uploads a file. Invalid files never reach the network.
    ///
    /// A rejected file only records the error; the current job is left alone.
    /// An accepted file replaces the current job and stops its polling.
    pub async fn upload(&self, file: DocumentFile) -> PortResult<UploadResult> {
        if let Err(e) = validate_upload(&file, self.max_upload_bytes) {
            warn!("Rejected upload of '{}': {}", file.filename, e);
            self.shared.state.send_modify(|state| state.error = Some(e.to_string()));
            return Err(e);
        }

        self.cancel_active();
        let generation = self.start_generation(|state| {
            state.phase = JobPhase::Uploading;
            state.upload = None;
            state.job = None;
        });

        info!("Uploading '{}' ({} bytes)", file.filename, file.size());
        match self.shared.ocr.upload(&file).await {
            Ok(upload) => {
                info!("Uploaded '{}' as {}", upload.filename, upload.file_id);
                self.shared.update_if_current(generation, |state| {
                    state.phase = JobPhase::Uploaded;
                    state.upload = Some(upload.clone());
                });
                Ok(upload)
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.shared.update_if_current(generation, |state| {
                    state.phase = JobPhase::Idle;
                    state.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    /// Submits a processing request for the last uploaded file and starts polling.
    pub async fn process(&self, upload: &UploadResult, options: ExtractionOptions) -> PortResult<PollHandle> {
        let current_upload = self.snapshot().upload;
        if current_upload.as_ref().map(|u| &u.file_id) != Some(&upload.file_id) {
            let e = PortError::Validation("Please upload a file first".to_string());
            self.shared.state.send_modify(|state| state.error = Some(e.to_string()));
            return Err(e);
        }

        let generation = self.start_generation(|state| {
            state.phase = JobPhase::Submitting;
            state.job = None;
        });

        let prompt = options.prompt.trim();
        let request = ProcessingRequest {
            file_id: upload.file_id.clone(),
            document_type: options.document_type,
            extraction_prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
            model: options.model,
            output_schema: options.output_schema,
        };

        let job = match self.shared.ocr.process(&request).await {
            Ok(job) => job,
            Err(e) => {
                warn!("Processing request for {} failed: {}", upload.file_id, e);
                self.shared.update_if_current(generation, |state| {
                    state.phase = JobPhase::Uploaded;
                    state.error = Some(e.to_string());
                });
                return Err(e);
            }
        };

        info!("Job {} submitted with status {}", job.request_id, job.status);
        let token = self.root.child_token();
        if let Some(previous) = self.active_token().replace(token.clone()) {
            previous.cancel();
        }

        let accepted = self.shared.update_if_current(generation, |state| {
            state.phase = phase_for(job.status);
            state.job = Some(job.clone());
        });
        if !accepted {
            token.cancel();
        }

        let request_id = job.request_id.clone();
        let task = tokio::spawn(poll_until_settled(
            self.shared.clone(),
            job,
            generation,
            token.clone(),
        ));

        Ok(PollHandle {
            request_id,
            token,
            task: Some(task),
        })
    }

    /// Uploads, processes and waits for a document, returning the extracted data.
    pub async fn extract(&self, file: DocumentFile, options: ExtractionOptions) -> PortResult<Value> {
        let upload = self.upload(file).await?;
        let handle = self.process(&upload, options).await?;
        match handle.wait().await? {
            PollOutcome::Completed(job) => {
                interpret_result(&job).map_err(|e| PortError::Unexpected(e.to_string()))
            }
            PollOutcome::Failed(job) => Err(PortError::Unexpected(format!(
                "Processing failed: {}",
                job.error.unwrap_or_else(|| "unknown error".to_string())
            ))),
            PollOutcome::Abandoned { error, .. } => Err(PortError::Unexpected(format!(
                "Failed to get processing status: {}",
                error
            ))),
            PollOutcome::Cancelled(job) => Err(PortError::Unexpected(format!(
                "Polling for {} was cancelled",
                job.request_id
            ))),
        }
    }

    /// Fetches a job's status once, outside of any poll loop.
    pub async fn status(&self, request_id: &str) -> PortResult<ProcessingJob> {
        self.shared.ocr.status(request_id).await
    }

    /// Cancels any polling and returns to `idle`.
    pub fn reset(&self) {
        self.cancel_active();
        self.start_generation(|state| {
            state.phase = JobPhase::Idle;
            state.upload = None;
            state.job = None;
        });
    }

    /// Cancels every poll task started by this orchestrator.
    pub fn shutdown(&self) {
        self.root.cancel();
        info!("Processing orchestrator shut down");
    }

    fn cancel_active(&self) {
        if let Some(token) = self.active_token().take() {
            token.cancel();
        }
    }

    /// The active poll token. A poisoned lock still holds a valid token.
    fn active_token(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(|poisoned| {
            warn!("Poll token lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Bumps the job generation, clears the error and applies `update`.
    fn start_generation(&self, update: impl FnOnce(&mut ProcessingState)) -> u64 {
        let mut generation = 0;
        self.shared.state.send_modify(|state| {
            state.generation += 1;
            state.error = None;
            update(state);
            generation = state.generation;
        });
        generation
    }
}

impl Drop for ProcessingOrchestrator {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

fn phase_for(status: JobStatus) -> JobPhase {
    match status {
        JobStatus::Pending | JobStatus::Processing => JobPhase::Polling,
        JobStatus::Completed => JobPhase::Completed,
        JobStatus::Failed => JobPhase::Failed,
    }
}

/// Re-requests the job status every poll interval until it settles.
///
/// Requests are strictly serialised: the next wait starts only after the
/// previous response has been applied.
async fn poll_until_settled(
    shared: Arc<Shared>,
    mut job: ProcessingJob,
    generation: u64,
    token: CancellationToken,
) -> PollOutcome {
    let mut sequence: u64 = 0;

    while job.status.is_in_flight() {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Polling for {} cancelled", job.request_id);
                return PollOutcome::Cancelled(job);
            }
            _ = tokio::time::sleep(shared.poll_interval) => {}
        }

        sequence += 1;
        debug!(request_id = %job.request_id, sequence, "Requesting job status");
        let response = shared.ocr.status(&job.request_id).await;

        if token.is_cancelled() {
            debug!(request_id = %job.request_id, sequence, "Discarding status response received after cancellation");
            return PollOutcome::Cancelled(job);
        }

        match response {
            Ok(next) => {
                job = next;
                let applied = shared.update_if_current(generation, |state| {
                    state.phase = phase_for(job.status);
                    state.job = Some(job.clone());
                });
                if !applied {
                    debug!(request_id = %job.request_id, "Job superseded; stopping poll");
                    return PollOutcome::Cancelled(job);
                }
            }
            Err(e) => {
                warn!("Status request for {} failed; giving up: {}", job.request_id, e);
                let message = e.to_string();
                shared.update_if_current(generation, |state| {
                    state.phase = JobPhase::Abandoned;
                    state.error = Some(message.clone());
                });
                return PollOutcome::Abandoned { job, error: message };
            }
        }
    }

    info!("Job {} settled as {}", job.request_id, job.status);
    match job.status {
        JobStatus::Failed => PollOutcome::Failed(job),
        _ => PollOutcome::Completed(job),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Offline;

    #[async_trait]
    impl OcrService for Offline {
        async fn upload(&self, _file: &DocumentFile) -> PortResult<UploadResult> {
            Err(PortError::Transport("offline".to_string()))
        }

        async fn process(&self, _request: &ProcessingRequest) -> PortResult<ProcessingJob> {
            Err(PortError::Transport("offline".to_string()))
        }

        async fn status(&self, _request_id: &str) -> PortResult<ProcessingJob> {
            Err(PortError::Transport("offline".to_string()))
        }
    }

    #[test]
    fn reset_cancels_the_poll_even_after_a_panic_poisoned_the_lock() {
        let orchestrator = ProcessingOrchestrator::new(Arc::new(Offline));
        let token = CancellationToken::new();
        *orchestrator.active_token() = Some(token.clone());

        std::thread::scope(|scope| {
            let poisoned = scope
                .spawn(|| {
                    let _guard = orchestrator.active.lock().unwrap();
                    panic!("poisoning the poll token lock");
                })
                .join();
            assert!(poisoned.is_err());
        });
        assert!(orchestrator.active.is_poisoned());

        orchestrator.reset();
        assert!(token.is_cancelled());
        assert!(orchestrator.active_token().is_none());
        assert_eq!(orchestrator.snapshot().phase, JobPhase::Idle);
    }
}
