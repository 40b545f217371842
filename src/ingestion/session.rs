//! One upload slot of the wizard.
//!
//! A new upload replaces the one before it: [`UploadSession::submit`] aborts whatever ingestion
//! the session still has in flight, and the stale [`PendingIngestion`] resolves to `None` rather
//! than delivering a result for a file the user already replaced.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{IngestionError, IngestionResult};

use super::unified::{DocumentIngestor, IngestionOutput, IngestionRequest};

/// Runs at most one live ingestion at a time.
#[derive(Debug)]
pub struct UploadSession {
    ingestor: DocumentIngestor,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl UploadSession {
    pub fn new(ingestor: DocumentIngestor) -> Self {
        Self {
            ingestor,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    pub fn ingestor(&self) -> &DocumentIngestor {
        &self.ingestor
    }

    /// Start ingesting `request`, superseding any ingestion still in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: IngestionRequest) -> PendingIngestion {
        // Held across the generation bump so concurrent submissions retire in order.
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }

        let ingestor = self.ingestor.clone();
        let handle = tokio::spawn(async move { request.run(&ingestor).await });
        *in_flight = Some(handle.abort_handle());

        PendingIngestion {
            handle,
            generation,
            current: Arc::clone(&self.generation),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Abandon the in-flight ingestion, if any.
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
    }
}

/// Handle to an ingestion started by [`UploadSession::submit`].
#[derive(Debug)]
pub struct PendingIngestion {
    handle: JoinHandle<IngestionResult<IngestionOutput>>,
    generation: u64,
    current: Arc<AtomicU64>,
    cancelled: AtomicBool,
}

impl PendingIngestion {
    /// `true` once a later submission or a [`UploadSession::cancel`] replaced this one.
    pub fn is_superseded(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    /// Abort this ingestion. [`Self::outcome`] then resolves to `None`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    /// Wait for the result.
    ///
    /// `None` when the ingestion was cancelled or superseded, even if decoding had already
    /// finished.
    pub async fn outcome(self) -> Option<IngestionResult<IngestionOutput>> {
        let Self {
            handle,
            generation,
            current,
            cancelled,
        } = self;
        let joined = handle.await;
        if cancelled.load(Ordering::SeqCst) || current.load(Ordering::SeqCst) != generation {
            return None;
        }
        match joined {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(Err(IngestionError::Task(e.to_string()))),
        }
    }
}
