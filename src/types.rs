//! Core data model types for ingestion.
//!
//! Workbooks ingest into ordered [`Record`]s of typed [`CellValue`]s (grouped per sheet in a
//! [`SheetSet`]); word-processing documents ingest into a markup or plain-text string, optionally
//! with the [`ConversionMessage`]s collected along the way.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// The two container families an upload can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFamily {
    /// Spreadsheet workbook (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
    Workbook,
    /// Word-processing document (`.docx`).
    Document,
}

impl DocumentFamily {
    /// Infer the family from a file extension (case-insensitive).
    ///
    /// `.doc` maps to [`DocumentFamily::Document`] so that the decoder can reject it with a
    /// precise "unsupported" error instead of a generic parse failure.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "docx" | "doc" => Some(Self::Document),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workbook => f.write_str("workbook"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// An uploaded file: the raw bytes plus the file name the user picked, if known.
///
/// Immutable once constructed. Ingestion operations take it by value, so a buffer is owned by
/// exactly one call.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wrap raw bytes with no name hint.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            bytes: bytes.into(),
        }
    }

    /// Wrap raw bytes together with the original file name.
    pub fn named(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Some(name.into()),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The file name becomes the name hint.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string);
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lower-cased extension of the name hint, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let (_, ext) = name.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Family suggested by the name hint. Callers normally know the family from the picker that
    /// produced the upload; this is only a fallback.
    pub fn family_hint(&self) -> Option<DocumentFamily> {
        self.extension()
            .as_deref()
            .and_then(DocumentFamily::from_extension)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A single typed, non-empty worksheet cell.
///
/// Empty cells have no `CellValue`: they are left out of the [`Record`] altogether.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Text cell (also used for error cells such as `#DIV/0!`).
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date or date-time cell.
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as an integer, when it has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

pub(crate) const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format(ISO_DATETIME)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(d) => serializer.collect_str(&d.format(ISO_DATETIME)),
        }
    }
}

/// One data row: an ordered mapping from column header to cell value.
///
/// Keys are unique and appear in column order. A cell that is empty (or absent because the row is
/// shorter than the header row) has no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Headers are made unique before records are built, so no lookup is done.
    pub(crate) fn push(&mut self, key: impl Into<String>, value: CellValue) {
        self.fields.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.push(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records of every sheet in a workbook, keyed by sheet name in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetSet {
    sheets: Vec<(String, Vec<Record>)>,
}

impl SheetSet {
    pub(crate) fn from_sheets(sheets: Vec<(String, Vec<Record>)>) -> Self {
        Self { sheets }
    }

    pub fn get(&self, name: &str) -> Option<&[Record]> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, records)| records.as_slice())
    }

    /// Sheet names in workbook order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.sheets
            .iter()
            .map(|(n, records)| (n.as_str(), records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Total number of records across all sheets.
    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|(_, records)| records.len()).sum()
    }
}

impl IntoIterator for SheetSet {
    type Item = (String, Vec<Record>);
    type IntoIter = std::vec::IntoIter<(String, Vec<Record>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.into_iter()
    }
}

impl Serialize for SheetSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for (name, records) in &self.sheets {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

/// Severity of a [`ConversionMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Something in the source could not be represented and was dropped.
    Warning,
}

/// A note produced while converting a document to markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionMessage {
    pub kind: MessageKind,
    pub message: String,
}

impl ConversionMessage {
    pub(crate) fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            message: message.into(),
        }
    }
}

/// Markup produced from a document together with the warnings collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentConversion {
    /// The rendered markup.
    pub value: String,
    /// Dropped styles and unresolvable parts, in document order, without duplicates.
    pub messages: Vec<ConversionMessage>,
}
