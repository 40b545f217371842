use std::fmt;
use std::sync::Arc;

use crate::error::IngestionError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// The upload decoded, but content was dropped (markup conversion warnings).
    Warning,
    /// Error-level event (the upload could not be decoded).
    Error,
    /// Critical error (I/O failures, decode task torn down).
    Critical,
}

/// Which ingestion operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FirstSheet,
    AllSheets,
    Sheet,
    SheetNames,
    Markup,
    Text,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// File name hint of the upload, if the caller supplied one.
    pub file_name: Option<String>,
    /// Operation that was requested.
    pub operation: Operation,
    /// Size of the upload in bytes.
    pub bytes: usize,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Records produced (tabular operations).
    pub records: usize,
    /// Sheets read (tabular operations).
    pub sheets: usize,
    /// Characters of markup or text produced (document operations).
    pub characters: usize,
    /// Conversion warnings (markup operations).
    pub warnings: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called after [`Self::on_success`] when the conversion reported warnings.
    fn on_warning(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_warning(&self, ctx: &IngestionContext, severity: IngestionSeverity, stats: IngestionStats) {
        for o in &self.observers {
            o.on_warning(ctx, severity, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion events as `tracing` events under the `tour_ingest` target.
///
/// Successes are logged at `INFO`, conversion warnings and failures at `WARN` (critical failures
/// at `ERROR`), alerts at `ERROR`. Install a subscriber in the host application to see them.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            target: "tour_ingest",
            operation = ?ctx.operation,
            file = ctx.file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = ctx.bytes,
            records = stats.records,
            sheets = stats.sheets,
            characters = stats.characters,
            warnings = stats.warnings,
            "ingest ok"
        );
    }

    fn on_warning(&self, ctx: &IngestionContext, severity: IngestionSeverity, stats: IngestionStats) {
        tracing::warn!(
            target: "tour_ingest",
            ?severity,
            operation = ?ctx.operation,
            file = ctx.file_name.as_deref().unwrap_or("<unnamed>"),
            warnings = stats.warnings,
            "ingest dropped content"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        let file = ctx.file_name.as_deref().unwrap_or("<unnamed>");
        if severity >= IngestionSeverity::Critical {
            tracing::error!(
                target: "tour_ingest",
                operation = ?ctx.operation,
                file,
                bytes = ctx.bytes,
                kind = ?error.kind(),
                %error,
                "ingest failed"
            );
        } else {
            tracing::warn!(
                target: "tour_ingest",
                operation = ?ctx.operation,
                file,
                bytes = ctx.bytes,
                kind = ?error.kind(),
                %error,
                "ingest failed"
            );
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            target: "tour_ingest",
            alert = true,
            ?severity,
            operation = ?ctx.operation,
            file = ctx.file_name.as_deref().unwrap_or("<unnamed>"),
            kind = ?error.kind(),
            %error,
            "ingest alert"
        );
    }
}
