//! # Upload Orchestrator
//!
//! Drives a batch of attached files through encrypt-then-upload with a
//! bounded worker pool.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          UPLOAD PIPELINE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  AttachedFile ──► [semaphore: N workers] ──► encrypt? ──► transport    │
//! │                                                │                        │
//! │       Queued ──► Uploading ──► Uploaded        │ provider error or     │
//! │                          └───► Failed          │ non-encrypting        │
//! │                                                ▼                        │
//! │                                       upload ORIGINAL bytes,           │
//! │                                       is_encrypted stays false         │
//! │                                                                         │
//! │  Per-file timeout and a batch-wide cancel handle; a timed-out or       │
//! │  cancelled file lands in Failed without poisoning the batch.           │
//! │  No automatic retry anywhere.                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Encryption is best-effort: the batch never blocks on it. The summary
//! separates encrypted from plaintext successes so callers can surface
//! the difference instead of implying everything was sealed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Semaphore};
use uuid::Uuid;

use crate::api::{ApiClient, EncryptionKeys, UploadResponse};
use crate::config::ClientConfig;
use crate::crypto::{provider_for, CryptoProvider};
use crate::error::{Error, Result};

/// Filename suffix for sealed-envelope payloads.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// One file queued for upload. UI-local; never persisted.
#[derive(Debug, Clone)]
pub struct AttachedFile {
    /// Local identifier for progress tracking.
    pub id: Uuid,
    /// Original filename.
    pub name: String,
    /// Size of the original bytes.
    pub size: u64,
    /// MIME type of the original bytes.
    pub content_type: String,
    /// The file contents.
    pub data: Vec<u8>,
}

impl AttachedFile {
    /// Attach a file with an explicit content type.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size: data.len() as u64,
            content_type: content_type.into(),
            data,
        }
    }

    /// Attach a file, guessing the content type from the extension.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(name, content_type, data)
    }
}

/// Per-file upload state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Waiting for a worker slot.
    Queued,
    /// Encrypting or transferring.
    Uploading,
    /// Backend acknowledged the upload.
    Uploaded,
    /// Terminal failure. Manual re-trigger only.
    Failed,
}

impl UploadStatus {
    /// Whether `next` is a legal transition from this state.
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Queued, UploadStatus::Uploading)
                | (UploadStatus::Queued, UploadStatus::Failed)
                | (UploadStatus::Uploading, UploadStatus::Uploaded)
                | (UploadStatus::Uploading, UploadStatus::Failed)
        )
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Uploaded | UploadStatus::Failed)
    }
}

/// Progress event emitted as a file moves through its state machine.
#[derive(Debug, Clone)]
pub struct UploadEvent {
    /// Which attached file.
    pub file_id: Uuid,
    /// New state.
    pub status: UploadStatus,
}

/// Terminal outcome for one file.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Stored by the backend.
    Uploaded {
        /// Backend-assigned content identifier.
        cid: String,
        /// On-chain digest, when the backend anchors uploads.
        transaction_digest: Option<String>,
        /// Whether the stored payload is a sealed envelope.
        is_encrypted: bool,
        /// Keys for the envelope, attached client-side. The backend
        /// never saw the secret key.
        encryption_keys: Option<EncryptionKeys>,
    },
    /// Upload failed; encryption state is irrelevant.
    Failed(Error),
}

/// Result record for one file in a batch.
#[derive(Debug)]
pub struct FileUploadResult {
    /// Local id of the attached file.
    pub file_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// What happened.
    pub outcome: UploadOutcome,
}

impl FileUploadResult {
    /// Whether this file made it to the backend.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Uploaded { .. })
    }
}

/// Aggregate counts for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files in the batch.
    pub total: usize,
    /// Files the backend acknowledged.
    pub succeeded: usize,
    /// Files that failed, timed out, or were cancelled.
    pub failed: usize,
    /// Successes whose payload was a sealed envelope.
    pub encrypted: usize,
    /// Successes uploaded as original bytes.
    pub plaintext: usize,
}

/// Where the orchestrator sends bytes. Seam for tests.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Store one payload under the given name and content type.
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse>;
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse> {
        self.upload_file(filename, content_type, data).await
    }
}

/// Handle for cancelling an in-flight batch.
///
/// Cancellation is cooperative: files already accepted by the backend
/// stay uploaded; everything else lands in `Failed`.
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    /// Cancel the batch.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether cancel was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Batch upload orchestrator.
pub struct Uploader {
    transport: Arc<dyn UploadTransport>,
    crypto: Arc<dyn CryptoProvider>,
    concurrency: usize,
    timeout: Duration,
    cancel: CancelHandle,
    cancel_rx: watch::Receiver<bool>,
    progress: Option<mpsc::UnboundedSender<UploadEvent>>,
}

impl Uploader {
    /// Build an uploader from configuration, with the crypto provider
    /// the configuration selects.
    pub fn new(config: &ClientConfig, transport: Arc<dyn UploadTransport>) -> Self {
        Self::with_crypto(config, transport, provider_for(config.crypto_backend))
    }

    /// Build an uploader with an explicit crypto provider.
    pub fn with_crypto(
        config: &ClientConfig,
        transport: Arc<dyn UploadTransport>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        let (cancel, cancel_rx) = CancelHandle::new();
        Self {
            transport,
            crypto,
            concurrency: config.upload_concurrency.max(1),
            timeout: Duration::from_millis(config.upload_timeout_ms),
            cancel,
            cancel_rx,
            progress: None,
        }
    }

    /// Subscribe to per-file state transitions.
    pub fn progress_events(&mut self) -> mpsc::UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress = Some(tx);
        rx
    }

    /// Handle for cancelling this uploader's batches.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Upload a batch. Returns one result per file, input order, plus
    /// aggregate counts.
    pub async fn upload_batch(
        &self,
        files: Vec<AttachedFile>,
    ) -> (Vec<FileUploadResult>, BatchSummary) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            self.emit(file.id, UploadStatus::Queued);

            let semaphore = Arc::clone(&semaphore);
            let transport = Arc::clone(&self.transport);
            let crypto = Arc::clone(&self.crypto);
            let timeout = self.timeout;
            let mut cancel_rx = self.cancel_rx.clone();
            let progress = self.progress.clone();

            handles.push(tokio::spawn(async move {
                let file_id = file.id;
                let filename = file.name.clone();

                // Hold the slot for the whole encrypt+upload cycle
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    _ = wait_cancelled(&mut cancel_rx) => {
                        return failed(file_id, filename, Error::UploadCancelled, &progress);
                    }
                };
                let _permit = match permit {
                    Ok(p) => p,
                    Err(_) => {
                        return failed(file_id, filename, Error::UploadCancelled, &progress)
                    }
                };

                if let Some(tx) = &progress {
                    let _ = tx.send(UploadEvent {
                        file_id,
                        status: UploadStatus::Uploading,
                    });
                }

                let work = upload_single(transport, crypto, file);
                let outcome = tokio::select! {
                    result = tokio::time::timeout(timeout, work) => match result {
                        Ok(outcome) => outcome,
                        Err(_) => UploadOutcome::Failed(Error::UploadTimeout(
                            timeout.as_millis() as u64,
                        )),
                    },
                    _ = wait_cancelled(&mut cancel_rx) => {
                        UploadOutcome::Failed(Error::UploadCancelled)
                    }
                };

                if let Some(tx) = &progress {
                    let status = if matches!(outcome, UploadOutcome::Uploaded { .. }) {
                        UploadStatus::Uploaded
                    } else {
                        UploadStatus::Failed
                    };
                    let _ = tx.send(UploadEvent { file_id, status });
                }

                FileUploadResult {
                    file_id,
                    filename,
                    outcome,
                }
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Upload worker panicked: {}", e);
                }
            }
        }

        let summary = summarize(&results);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            encrypted = summary.encrypted,
            "Upload batch finished"
        );
        (results, summary)
    }

    fn emit(&self, file_id: Uuid, status: UploadStatus) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(UploadEvent { file_id, status });
        }
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone; nobody can cancel anymore
            std::future::pending::<()>().await;
        }
    }
}

fn failed(
    file_id: Uuid,
    filename: String,
    error: Error,
    progress: &Option<mpsc::UnboundedSender<UploadEvent>>,
) -> FileUploadResult {
    if let Some(tx) = progress {
        let _ = tx.send(UploadEvent {
            file_id,
            status: UploadStatus::Failed,
        });
    }
    FileUploadResult {
        file_id,
        filename,
        outcome: UploadOutcome::Failed(error),
    }
}

/// One file's encrypt+upload cycle.
///
/// Encryption is attempted only with an encrypting provider; on any
/// provider failure the original bytes go up instead and the result is
/// not marked encrypted.
async fn upload_single(
    transport: Arc<dyn UploadTransport>,
    crypto: Arc<dyn CryptoProvider>,
    file: AttachedFile,
) -> UploadOutcome {
    let mut payload = file.data;
    let mut upload_name = file.name.clone();
    let mut content_type = file.content_type;
    let mut keys = None;

    if crypto.is_encrypting() {
        match crypto.encrypt_file(&file.name, &payload) {
            Ok(encrypted) => {
                payload = encrypted.data;
                upload_name = format!("{}{}", file.name, ENCRYPTED_SUFFIX);
                content_type = "application/octet-stream".to_string();
                keys = Some(EncryptionKeys {
                    public_key: encrypted.public_key,
                    secret_key: encrypted.secret_key,
                });
            }
            Err(e) => {
                tracing::warn!(filename = %file.name, "Encryption failed, uploading original bytes: {}", e);
            }
        }
    }

    match transport.upload(&upload_name, &content_type, payload).await {
        Ok(response) => UploadOutcome::Uploaded {
            cid: response.file_cid,
            transaction_digest: response.transaction_digest,
            is_encrypted: keys.is_some(),
            encryption_keys: keys,
        },
        Err(e) => UploadOutcome::Failed(e),
    }
}

fn summarize(results: &[FileUploadResult]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: results.len(),
        ..BatchSummary::default()
    };
    for result in results {
        match &result.outcome {
            UploadOutcome::Uploaded { is_encrypted, .. } => {
                summary.succeeded += 1;
                if *is_encrypted {
                    summary.encrypted += 1;
                } else {
                    summary.plaintext += 1;
                }
            }
            UploadOutcome::Failed(_) => summary.failed += 1,
        }
    }
    summary
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CryptoBackend;
    use crate::crypto::{EncryptedFile, FileEnvelope};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct RecordedUpload {
        filename: String,
        data: Vec<u8>,
    }

    /// Transport stub that records every call and always succeeds.
    struct StubTransport {
        calls: Mutex<Vec<RecordedUpload>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl StubTransport {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl UploadTransport for StubTransport {
        async fn upload(
            &self,
            filename: &str,
            _content_type: &str,
            data: Vec<u8>,
        ) -> Result<UploadResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().push(RecordedUpload {
                filename: filename.to_string(),
                data,
            });
            Ok(UploadResponse {
                file_cid: format!("cid-{}", filename),
                transaction_digest: None,
            })
        }
    }

    /// Transport that never completes, for timeout/cancel tests.
    struct HangingTransport;

    #[async_trait]
    impl UploadTransport for HangingTransport {
        async fn upload(&self, _: &str, _: &str, _: Vec<u8>) -> Result<UploadResponse> {
            std::future::pending().await
        }
    }

    /// Provider that claims to encrypt but always fails.
    struct BrokenCrypto;

    impl CryptoProvider for BrokenCrypto {
        fn algorithm(&self) -> &'static str {
            "broken"
        }
        fn is_encrypting(&self) -> bool {
            true
        }
        fn encrypt_file(&self, _: &str, _: &[u8]) -> Result<EncryptedFile> {
            Err(Error::EncryptionFailed("no entropy".into()))
        }
        fn decrypt_file(&self, _: &[u8], _: &str) -> Result<Vec<u8>> {
            Err(Error::DecryptionFailed("no entropy".into()))
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:3000")
    }

    #[tokio::test]
    async fn test_encrypted_batch_attaches_keys() {
        let transport = Arc::new(StubTransport::new());
        let uploader = Uploader::new(
            &config().with_crypto_backend(CryptoBackend::Envelope),
            transport.clone(),
        );

        let files = vec![AttachedFile::new("doc.txt", "text/plain", b"hello".to_vec())];
        let (results, summary) = uploader.upload_batch(files).await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.encrypted, 1);
        match &results[0].outcome {
            UploadOutcome::Uploaded {
                is_encrypted,
                encryption_keys,
                ..
            } => {
                assert!(is_encrypted);
                let keys = encryption_keys.as_ref().unwrap();
                assert_eq!(keys.public_key.len(), 64);

                // What went over the wire is an envelope, suffixed
                let calls = transport.calls.lock();
                assert_eq!(calls[0].filename, "doc.txt.enc");
                let envelope = FileEnvelope::from_bytes(&calls[0].data).unwrap();
                assert!(envelope.is_encrypted());
            }
            other => panic!("expected Uploaded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_on_encryption_failure() {
        let transport = Arc::new(StubTransport::new());
        let uploader =
            Uploader::with_crypto(&config(), transport.clone(), Arc::new(BrokenCrypto));

        let files = vec![AttachedFile::new("doc.txt", "text/plain", b"hello".to_vec())];
        let (results, summary) = uploader.upload_batch(files).await;

        // Still uploaded, with the ORIGINAL bytes, not marked encrypted
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.plaintext, 1);
        assert_eq!(summary.encrypted, 0);
        match &results[0].outcome {
            UploadOutcome::Uploaded {
                is_encrypted,
                encryption_keys,
                ..
            } => {
                assert!(!is_encrypted);
                assert!(encryption_keys.is_none());
            }
            other => panic!("expected Uploaded, got {:?}", other),
        }
        let calls = transport.calls.lock();
        assert_eq!(calls[0].filename, "doc.txt");
        assert_eq!(calls[0].data, b"hello");
    }

    #[tokio::test]
    async fn test_passthrough_uploads_original_bytes() {
        let transport = Arc::new(StubTransport::new());
        let uploader = Uploader::new(
            &config().with_crypto_backend(CryptoBackend::Passthrough),
            transport.clone(),
        );

        let files = vec![AttachedFile::new("a.bin", "application/octet-stream", vec![1, 2, 3])];
        let (_, summary) = uploader.upload_batch(files).await;

        assert_eq!(summary.plaintext, 1);
        let calls = transport.calls.lock();
        assert_eq!(calls[0].filename, "a.bin");
        assert_eq!(calls[0].data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let transport = Arc::new(StubTransport::with_delay(Duration::from_millis(20)));
        let uploader = Uploader::new(
            &config()
                .with_upload_concurrency(2)
                .with_crypto_backend(CryptoBackend::Passthrough),
            transport.clone(),
        );

        let files: Vec<_> = (0..6)
            .map(|i| AttachedFile::new(format!("f{}.bin", i), "application/octet-stream", vec![0]))
            .collect();
        let (_, summary) = uploader.upload_batch(files).await;

        assert_eq!(summary.succeeded, 6);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_timeout_fails_file_without_poisoning_batch() {
        struct MixedTransport(StubTransport);

        #[async_trait]
        impl UploadTransport for MixedTransport {
            async fn upload(
                &self,
                filename: &str,
                content_type: &str,
                data: Vec<u8>,
            ) -> Result<UploadResponse> {
                if filename.starts_with("slow") {
                    std::future::pending().await
                } else {
                    self.0.upload(filename, content_type, data).await
                }
            }
        }

        let transport = Arc::new(MixedTransport(StubTransport::new()));
        let uploader = Uploader::new(
            &config()
                .with_upload_timeout_ms(50)
                .with_crypto_backend(CryptoBackend::Passthrough),
            transport,
        );

        let files = vec![
            AttachedFile::new("slow.bin", "application/octet-stream", vec![0]),
            AttachedFile::new("fast.bin", "application/octet-stream", vec![1]),
        ];
        let (results, summary) = uploader.upload_batch(files).await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        let slow = results.iter().find(|r| r.filename == "slow.bin").unwrap();
        match &slow.outcome {
            UploadOutcome::Failed(Error::UploadTimeout(ms)) => assert_eq!(*ms, 50),
            other => panic!("expected UploadTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_fails_pending_files() {
        let uploader = Uploader::new(
            &config().with_crypto_backend(CryptoBackend::Passthrough),
            Arc::new(HangingTransport),
        );
        let cancel = uploader.cancel_handle();

        let files = vec![AttachedFile::new("a.bin", "application/octet-stream", vec![0])];
        let batch = uploader.upload_batch(files);

        let (results, summary) = tokio::join!(batch, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
        .0;
        let _ = results;

        assert_eq!(summary.failed, 1);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_progress_events_follow_state_machine() {
        let transport = Arc::new(StubTransport::new());
        let mut uploader = Uploader::new(
            &config().with_crypto_backend(CryptoBackend::Passthrough),
            transport,
        );
        let mut events = uploader.progress_events();

        let file = AttachedFile::new("a.txt", "text/plain", b"x".to_vec());
        let file_id = file.id;
        let (_, _) = uploader.upload_batch(vec![file]).await;
        drop(uploader);

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            assert_eq!(event.file_id, file_id);
            seen.push(event.status);
        }
        assert_eq!(
            seen,
            vec![
                UploadStatus::Queued,
                UploadStatus::Uploading,
                UploadStatus::Uploaded
            ]
        );
        for pair in seen.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
    }

    #[test]
    fn test_status_transitions() {
        assert!(UploadStatus::Queued.can_transition_to(UploadStatus::Uploading));
        assert!(UploadStatus::Uploading.can_transition_to(UploadStatus::Failed));
        assert!(!UploadStatus::Uploaded.can_transition_to(UploadStatus::Uploading));
        assert!(!UploadStatus::Failed.can_transition_to(UploadStatus::Uploading));
        assert!(UploadStatus::Uploaded.is_terminal());
        assert!(!UploadStatus::Queued.is_terminal());
    }

    #[test]
    fn test_content_type_guessing() {
        let file = AttachedFile::from_bytes("photo.png", vec![0]);
        assert_eq!(file.content_type, "image/png");

        let file = AttachedFile::from_bytes("mystery", vec![0]);
        assert_eq!(file.content_type, "application/octet-stream");
    }
}
