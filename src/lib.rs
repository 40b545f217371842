//! `tour-ingest` turns files uploaded to the tour-planning wizard into structured data: venue and
//! schedule workbooks become lists of [`types::Record`]s, riders and contracts become markup or
//! plain text.
//!
//! The primary entrypoint is [`ingestion::DocumentIngestor`]. Every operation takes an
//! [`types::UploadedFile`] (raw bytes plus an optional name hint) and either returns the decoded
//! value or a single [`IngestionError`].
//!
//! ## What you can ingest
//!
//! **Workbooks:** `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`. The container is detected from the
//! bytes, not the name. The first row of a sheet is its header row; each following row becomes a
//! record keyed by header label.
//!
//! **Documents:** `.docx`. Legacy binary `.doc` files are rejected with
//! [`ErrorKind::UnsupportedFormat`].
//!
//! ## Cell values
//!
//! Record values are typed [`types::CellValue`]s:
//!
//! - [`types::CellValue::Text`]
//! - [`types::CellValue::Number`]
//! - [`types::CellValue::Bool`]
//! - [`types::CellValue::Date`] (by default; see [`ingestion::DateRepresentation`])
//!
//! Empty cells are left out of the record entirely, so a short row simply has fewer keys.
//!
//! ## Quick examples
//!
//! ```no_run
//! use tour_ingest::ingestion::{DocumentIngestor, IngestionOptions};
//! use tour_ingest::types::UploadedFile;
//!
//! # async fn run() -> Result<(), tour_ingest::IngestionError> {
//! let ingestor = DocumentIngestor::new(IngestionOptions::default());
//! let file = UploadedFile::from_path("schedule.xlsx").await?;
//! let sheets = ingestor.read_tabular_all_sheets(file).await?;
//! for (name, records) in sheets.iter() {
//!     println!("{name}: {} rows", records.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The synchronous decoders can be called directly when no runtime is around:
//!
//! ```no_run
//! use tour_ingest::ingestion::docx;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("rider.docx")?;
//! let conversion = docx::convert_to_markup(&bytes)?;
//! for message in &conversion.messages {
//!     eprintln!("{}", message.message);
//! }
//! println!("{}", conversion.value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: async entrypoints, upload sessions and the format-specific decoders
//! - [`types`]: uploads, records, sheet sets and conversion results
//! - [`error`]: error types used across ingestion

pub mod error;
pub mod ingestion;
pub mod types;

pub use error::{ErrorKind, IngestionError, IngestionResult};
