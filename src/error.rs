use thiserror::Error;

use crate::types::DocumentFamily;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across workbook and document ingestion. Use
/// [`IngestionError::kind`] to branch on the failure category rather than matching variants.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found). Only produced by path-based helpers.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook decoder rejected the container.
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// The ZIP archive backing an OOXML/ODF container is corrupt or truncated.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The `.docx` reader rejected the package: a required part is missing or one of its XML
    /// parts does not parse.
    #[error("document error: {0}")]
    Document(#[from] docx_rs::ReaderError),

    /// The bytes are not a well-formed instance of the declared container.
    #[error("malformed {family} container: {message}")]
    Malformed {
        family: DocumentFamily,
        message: String,
    },

    /// The workbook decodes but the requested sheet does not exist.
    ///
    /// `sheet` is `None` when the workbook has no sheets at all.
    #[error("{}", missing_sheet_message(.sheet))]
    MissingSheet { sheet: Option<String> },

    /// The bytes belong to a recognised sub-format that is not supported.
    #[error("unsupported {family} format: {message}")]
    UnsupportedFormat {
        family: DocumentFamily,
        message: String,
    },

    /// The background decode task panicked or was torn down by the runtime.
    #[error("ingestion task failed: {0}")]
    Task(String),
}

fn missing_sheet_message(sheet: &Option<String>) -> String {
    match sheet {
        Some(name) => format!("workbook has no sheet named '{name}'"),
        None => "workbook contains no sheets".to_string(),
    }
}

/// Coarse failure category, enough for a caller to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Container bytes are malformed, truncated or structurally wrong.
    Parse,
    /// Sub-kind of [`ErrorKind::Parse`]: the container has no (matching) sheet.
    MissingSheet,
    /// Recognised but unsupported sub-format.
    UnsupportedFormat,
    /// Reading the upload from disk failed.
    Io,
    /// The decode task did not complete.
    Task,
}

impl IngestionError {
    pub(crate) fn malformed(family: DocumentFamily, message: impl Into<String>) -> Self {
        Self::Malformed {
            family,
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Workbook(_)
            | Self::Archive(_)
            | Self::Document(_)
            | Self::Malformed { .. } => ErrorKind::Parse,
            Self::MissingSheet { .. } => ErrorKind::MissingSheet,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Task(_) => ErrorKind::Task,
        }
    }

    /// `true` for every decode failure, including the [`ErrorKind::MissingSheet`] sub-kind.
    pub fn is_parse_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::MissingSheet)
    }
}
