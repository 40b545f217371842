//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`DocumentIngestor`] (from [`unified`]) which:
//!
//! - decodes uploads on tokio's blocking pool, optionally bounded by
//!   [`IngestionOptions::max_in_flight`]
//! - maps workbooks to [`crate::types::Record`]s and documents to markup or text
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Synchronous, format-specific functions are also available under:
//! - [`workbook`]
//! - [`docx`]

pub mod docx;
pub mod observability;
pub mod session;
pub mod sniff;
pub mod unified;
pub mod workbook;

pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, Operation,
    TracingObserver,
};
pub use session::{PendingIngestion, UploadSession};
pub use unified::{DocumentIngestor, IngestionOptions, IngestionOutput, IngestionRequest, Representation};
pub use workbook::{DateRepresentation, TabularOptions};
