//! Unified, async ingestion entry point.
//!
//! Most callers should hold one [`DocumentIngestor`] and call the operation matching the picker
//! the upload came from:
//!
//! - [`DocumentIngestor::read_tabular_first_sheet`] / [`DocumentIngestor::read_tabular_all_sheets`]
//!   for workbooks
//! - [`DocumentIngestor::read_document_as_markup`] / [`DocumentIngestor::read_document_as_text`]
//!   for documents
//!
//! or [`DocumentIngestor::ingest`] with a [`Representation`] when the choice is data-driven.
//!
//! Decoding runs on tokio's blocking pool. Dropping the returned future abandons the result; the
//! decode itself runs to completion in the background, keeping its `max_in_flight` slot until it
//! ends, and touches no shared state.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DocumentConversion, DocumentFamily, Record, SheetSet, UploadedFile};

use super::docx;
use super::observability::{
    IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, Operation,
};
use super::workbook::{self, TabularOptions};

/// What to produce from an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// Records of the workbook's first sheet.
    FirstSheet,
    /// Records of every sheet, keyed by sheet name.
    AllSheets,
    /// Records of one named sheet.
    Sheet(String),
    /// Document as markup.
    Markup,
    /// Document as markup, with conversion warnings.
    MarkupWithMessages,
    /// Document as plain text.
    Text,
}

impl Representation {
    /// The representation a plain upload of `family` gets by default.
    pub fn default_for(family: DocumentFamily) -> Self {
        match family {
            DocumentFamily::Workbook => Self::FirstSheet,
            DocumentFamily::Document => Self::Markup,
        }
    }

    /// Container family this representation decodes.
    pub fn family(&self) -> DocumentFamily {
        match self {
            Self::FirstSheet | Self::AllSheets | Self::Sheet(_) => DocumentFamily::Workbook,
            Self::Markup | Self::MarkupWithMessages | Self::Text => DocumentFamily::Document,
        }
    }
}

/// Result of [`DocumentIngestor::ingest`].
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionOutput {
    Records(Vec<Record>),
    Sheets(SheetSet),
    Markup(String),
    Conversion(DocumentConversion),
    Text(String),
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Sheet-to-record mapping options.
    pub tabular: TabularOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
    /// Upper bound on concurrently running decodes. `None` means unbounded.
    pub max_in_flight: Option<usize>,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("tabular", &self.tabular)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            tabular: TabularOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
            max_in_flight: None,
        }
    }
}

/// Async front end over the workbook and document decoders.
///
/// Cheap to clone; clones share the in-flight limit (if any) and nothing else. Each call owns
/// its upload and decode state exclusively.
///
/// # Examples
///
/// ```no_run
/// use tour_ingest::ingestion::{DocumentIngestor, IngestionOptions};
/// use tour_ingest::types::UploadedFile;
///
/// # async fn run() -> Result<(), tour_ingest::IngestionError> {
/// let ingestor = DocumentIngestor::new(IngestionOptions::default());
///
/// let venues = UploadedFile::from_path("venues.xlsx").await?;
/// for record in ingestor.read_tabular_first_sheet(venues).await? {
///     println!("{:?}", record.get("Capacity"));
/// }
///
/// let rider = UploadedFile::from_path("rider.docx").await?;
/// let html = ingestor.read_document_as_markup(rider).await?;
/// println!("{html}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct DocumentIngestor {
    options: IngestionOptions,
    limiter: Option<Arc<Semaphore>>,
}

impl DocumentIngestor {
    /// # Panics
    ///
    /// Panics if `options.max_in_flight == Some(0)`.
    pub fn new(options: IngestionOptions) -> Self {
        if let Some(n) = options.max_in_flight {
            assert!(n > 0, "max_in_flight must be > 0 when set");
        }
        let limiter = options.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        Self { options, limiter }
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Records of the first sheet. Fails with [`IngestionError::MissingSheet`] when the workbook
    /// has no sheets.
    pub async fn read_tabular_first_sheet(&self, file: UploadedFile) -> IngestionResult<Vec<Record>> {
        let tabular = self.options.tabular.clone();
        self.run(
            file,
            Operation::FirstSheet,
            move |bytes| workbook::read_first_sheet(bytes, &tabular),
            |records| IngestionStats {
                records: records.len(),
                sheets: 1,
                ..Default::default()
            },
        )
        .await
    }

    /// Records of every sheet, in workbook order.
    pub async fn read_tabular_all_sheets(&self, file: UploadedFile) -> IngestionResult<SheetSet> {
        let tabular = self.options.tabular.clone();
        self.run(
            file,
            Operation::AllSheets,
            move |bytes| workbook::read_all_sheets(bytes, &tabular),
            |sheets| IngestionStats {
                records: sheets.record_count(),
                sheets: sheets.len(),
                ..Default::default()
            },
        )
        .await
    }

    /// Records of the sheet called `name`.
    pub async fn read_tabular_sheet(
        &self,
        file: UploadedFile,
        name: impl Into<String>,
    ) -> IngestionResult<Vec<Record>> {
        let tabular = self.options.tabular.clone();
        let name = name.into();
        self.run(
            file,
            Operation::Sheet,
            move |bytes| workbook::read_sheet(bytes, &name, &tabular),
            |records| IngestionStats {
                records: records.len(),
                sheets: 1,
                ..Default::default()
            },
        )
        .await
    }

    /// Sheet names in workbook order.
    pub async fn sheet_names(&self, file: UploadedFile) -> IngestionResult<Vec<String>> {
        self.run(file, Operation::SheetNames, workbook::sheet_names, |names| {
            IngestionStats {
                sheets: names.len(),
                ..Default::default()
            }
        })
        .await
    }

    /// The document as markup.
    pub async fn read_document_as_markup(&self, file: UploadedFile) -> IngestionResult<String> {
        self.read_document_as_markup_with_messages(file)
            .await
            .map(|conversion| conversion.value)
    }

    /// The document as markup, plus warnings about styles and parts that were dropped.
    pub async fn read_document_as_markup_with_messages(
        &self,
        file: UploadedFile,
    ) -> IngestionResult<DocumentConversion> {
        self.run(file, Operation::Markup, docx::convert_to_markup, |conversion| {
            IngestionStats {
                characters: conversion.value.chars().count(),
                warnings: conversion.messages.len(),
                ..Default::default()
            }
        })
        .await
    }

    /// The document as plain text, one paragraph per line.
    pub async fn read_document_as_text(&self, file: UploadedFile) -> IngestionResult<String> {
        self.run(file, Operation::Text, docx::extract_raw_text, |text| {
            IngestionStats {
                characters: text.chars().count(),
                ..Default::default()
            }
        })
        .await
    }

    /// Produce `representation` from `file`.
    pub async fn ingest(
        &self,
        file: UploadedFile,
        representation: Representation,
    ) -> IngestionResult<IngestionOutput> {
        match representation {
            Representation::FirstSheet => self
                .read_tabular_first_sheet(file)
                .await
                .map(IngestionOutput::Records),
            Representation::AllSheets => self
                .read_tabular_all_sheets(file)
                .await
                .map(IngestionOutput::Sheets),
            Representation::Sheet(name) => self
                .read_tabular_sheet(file, name)
                .await
                .map(IngestionOutput::Records),
            Representation::Markup => self
                .read_document_as_markup(file)
                .await
                .map(IngestionOutput::Markup),
            Representation::MarkupWithMessages => self
                .read_document_as_markup_with_messages(file)
                .await
                .map(IngestionOutput::Conversion),
            Representation::Text => self
                .read_document_as_text(file)
                .await
                .map(IngestionOutput::Text),
        }
    }

    async fn run<T, F, S>(
        &self,
        file: UploadedFile,
        operation: Operation,
        decode: F,
        stats: S,
    ) -> IngestionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&[u8]) -> IngestionResult<T> + Send + 'static,
        S: FnOnce(&T) -> IngestionStats,
    {
        let ctx = IngestionContext {
            file_name: file.name().map(str::to_string),
            operation,
            bytes: file.len(),
        };

        let permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| IngestionError::Task(e.to_string()))?,
            ),
            None => None,
        };

        let bytes = file.into_bytes();
        let task = tokio::task::spawn_blocking(move || {
            // The slot stays taken until decoding ends, even if the caller stopped waiting.
            let _permit = permit;
            decode(&bytes)
        });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(IngestionError::Task(e.to_string())),
        };

        if let Some(obs) = self.options.observer.as_ref() {
            match &result {
                Ok(value) => {
                    let stats = stats(value);
                    obs.on_success(&ctx, stats);
                    if stats.warnings > 0 {
                        obs.on_warning(&ctx, IngestionSeverity::Warning, stats);
                    }
                }
                Err(e) => {
                    let sev = severity_for_error(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.options.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }

        result
    }
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Task(_) => IngestionSeverity::Critical,
        IngestionError::Workbook(_)
        | IngestionError::Archive(_)
        | IngestionError::Document(_)
        | IngestionError::Malformed { .. }
        | IngestionError::MissingSheet { .. }
        | IngestionError::UnsupportedFormat { .. } => IngestionSeverity::Error,
    }
}

/// Convenience helper for callers that want an owned request object.
///
/// This can be useful if you want to hand ingestion work to another task, see
/// [`super::session::UploadSession`].
#[derive(Clone, Debug)]
pub struct IngestionRequest {
    /// The upload.
    pub file: UploadedFile,
    /// What to produce from it.
    pub representation: Representation,
}

impl IngestionRequest {
    pub fn new(file: UploadedFile, representation: Representation) -> Self {
        Self {
            file,
            representation,
        }
    }

    /// Request the default representation for the upload's family hint.
    ///
    /// Returns `None` when the file name does not identify a family.
    pub fn from_hint(file: UploadedFile) -> Option<Self> {
        let family = file.family_hint()?;
        Some(Self::new(file, Representation::default_for(family)))
    }

    /// Execute the request by calling [`DocumentIngestor::ingest`].
    pub async fn run(self, ingestor: &DocumentIngestor) -> IngestionResult<IngestionOutput> {
        ingestor.ingest(self.file, self.representation).await
    }
}
