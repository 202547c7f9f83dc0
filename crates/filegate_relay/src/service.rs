#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use filegate_contracts::relay::{FilePart, KeyIssued, RelayError, UploadAccepted, UploadInput};
use filegate_contracts::AccessKey;
use filegate_core::{
    AdmissionRuntime, BlobStore, IssueAdmission, KeyMinter, Ledger, UploadAdmission,
};
use tokio::sync::Mutex;

use crate::lifecycle::ShutdownHandle;

/// Request-handling surface. Validates typed inputs, drives admission, and
/// completes accepted uploads against the blob-storage capability.
///
/// Handlers take already-decoded inputs so the HTTP framing stays a thin
/// adapter (and tests exercise the pipeline without a listener).
pub struct RelayService {
    ledger: Arc<Mutex<Ledger>>,
    admission: AdmissionRuntime,
    minter: Arc<dyn KeyMinter>,
    blob_store: Arc<dyn BlobStore>,
    shutdown_secret: String,
    shutdown: ShutdownHandle,
    shutdown_ack_delay: Duration,
}

impl RelayService {
    pub fn new(
        ledger: Arc<Mutex<Ledger>>,
        admission: AdmissionRuntime,
        minter: Arc<dyn KeyMinter>,
        blob_store: Arc<dyn BlobStore>,
        shutdown_secret: String,
        shutdown: ShutdownHandle,
        shutdown_ack_delay: Duration,
    ) -> Self {
        Self {
            ledger,
            admission,
            minter,
            blob_store,
            shutdown_secret,
            shutdown,
            shutdown_ack_delay,
        }
    }

    /// Upload pipeline. The quota slot is consumed before the provider
    /// call: a failed relay still costs one slot (fail-closed).
    pub async fn handle_upload(&self, input: UploadInput) -> Result<UploadAccepted, RelayError> {
        let file = match input.file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err(RelayError::NoFile),
        };
        let key = match input.key.as_deref() {
            None | Some("") => return Err(RelayError::NoKey),
            Some(raw) => AccessKey::new(raw).map_err(|_| RelayError::KeyUnknown)?,
        };

        // The guard covers exactly the check-and-increment; the provider
        // call below runs with the ledger released.
        {
            let mut ledger = self.ledger.lock().await;
            match self.admission.try_register_upload(&mut ledger, &key) {
                UploadAdmission::Admitted => {}
                UploadAdmission::UnknownKey => return Err(RelayError::KeyUnknown),
                UploadAdmission::QuotaExhausted => return Err(RelayError::UploadQuotaExceeded),
            }
        }

        let blob_store = self.blob_store.clone();
        let FilePart {
            name,
            declared_size,
            bytes,
        } = file;
        let stored =
            tokio::task::spawn_blocking(move || blob_store.store(&name, declared_size, &bytes))
                .await
                .map_err(|err| {
                    RelayError::StorageProviderError(format!("provider call aborted: {err}"))
                })?;
        match stored {
            Ok(url) => Ok(UploadAccepted { url }),
            Err(err) => Err(RelayError::StorageProviderError(err.to_string())),
        }
    }

    pub async fn handle_issue_key(&self, key: Option<String>) -> Result<KeyIssued, RelayError> {
        let key = match key.as_deref() {
            None | Some("") => return Err(RelayError::NoKey),
            Some(raw) => AccessKey::new(raw).map_err(|_| RelayError::KeyUnknown)?,
        };
        let mut ledger = self.ledger.lock().await;
        match self
            .admission
            .try_issue_key(&mut ledger, &key, self.minter.as_ref())
        {
            IssueAdmission::Issued(new_key) => Ok(KeyIssued {
                new_key: new_key.as_str().to_string(),
            }),
            IssueAdmission::UnknownKey => Err(RelayError::KeyUnknown),
            IssueAdmission::QuotaExhausted => Err(RelayError::KeyQuotaExceeded),
        }
    }

    /// Acknowledges immediately and schedules the drain after the ack
    /// delay, leaving in-flight requests a grace window.
    pub async fn handle_shutdown(
        &self,
        supplied_secret: Option<String>,
    ) -> Result<String, RelayError> {
        let authorized = supplied_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty() && secret == self.shutdown_secret);
        if !authorized {
            return Err(RelayError::Unauthorized);
        }
        let delay = self.shutdown_ack_delay;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shutdown.trigger();
        });
        Ok(format!("shutting down in {} seconds", delay.as_secs()))
    }
}
