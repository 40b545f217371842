//! Container signature detection.
//!
//! The ingestor trusts the family the caller declared; sniffing only exists to turn obviously
//! wrong bytes into a precise error before a decoder sees them, and to pick the right workbook
//! decoder for a ZIP or OLE container.

use std::io::Cursor;

use zip::ZipArchive;

use crate::error::{IngestionError, IngestionResult};
use crate::types::DocumentFamily;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const OLE_COMPOUND_FILE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const ODS_MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

/// Outer container recognised from the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// ZIP archive (OOXML and OpenDocument containers).
    Zip,
    /// OLE2 compound file (legacy `.xls` / `.doc`).
    Ole,
    /// Nothing we know.
    Unknown,
}

/// Classify `bytes` by their leading magic number.
pub fn sniff(bytes: &[u8]) -> Signature {
    if bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE) {
        Signature::Zip
    } else if bytes.starts_with(OLE_COMPOUND_FILE) {
        Signature::Ole
    } else {
        Signature::Unknown
    }
}

/// Concrete workbook encoding, used to select the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFlavor {
    /// Office Open XML (`.xlsx`, `.xlsm`).
    Xlsx,
    /// Excel binary workbook (`.xlsb`).
    Xlsb,
    /// BIFF8 workbook inside an OLE compound file (`.xls`).
    Xls,
    /// OpenDocument spreadsheet (`.ods`).
    Ods,
}

/// Work out which workbook decoder can read `bytes`.
///
/// Fails with a parse-kind error when the bytes are not a workbook container at all, including
/// the case of a well-formed ZIP that holds some other kind of document.
pub fn workbook_flavor(bytes: &[u8]) -> IngestionResult<WorkbookFlavor> {
    match sniff(bytes) {
        Signature::Ole => Ok(WorkbookFlavor::Xls),
        Signature::Zip => {
            let archive = ZipArchive::new(Cursor::new(bytes))?;
            zip_workbook_flavor(archive)
        }
        Signature::Unknown => Err(unrecognised(DocumentFamily::Workbook, bytes)),
    }
}

fn zip_workbook_flavor(mut archive: ZipArchive<Cursor<&[u8]>>) -> IngestionResult<WorkbookFlavor> {
    if archive.index_for_name("xl/workbook.xml").is_some() {
        return Ok(WorkbookFlavor::Xlsx);
    }
    if archive.index_for_name("xl/workbook.bin").is_some() {
        return Ok(WorkbookFlavor::Xlsb);
    }
    if archive.index_for_name("content.xml").is_some() {
        let mimetype = match archive.by_name("mimetype") {
            Ok(mut entry) => {
                let mut s = String::new();
                std::io::Read::read_to_string(&mut entry, &mut s)
                    .map_err(|e| IngestionError::malformed(DocumentFamily::Workbook, e.to_string()))?;
                s
            }
            Err(_) => String::new(),
        };
        if mimetype.trim() == ODS_MIMETYPE {
            return Ok(WorkbookFlavor::Ods);
        }
        return Err(IngestionError::malformed(
            DocumentFamily::Workbook,
            format!("OpenDocument archive is not a spreadsheet (mimetype '{}')", mimetype.trim()),
        ));
    }
    if archive.index_for_name("word/document.xml").is_some() {
        return Err(IngestionError::malformed(
            DocumentFamily::Workbook,
            "archive is a word-processing document, not a workbook",
        ));
    }
    Err(IngestionError::malformed(
        DocumentFamily::Workbook,
        "archive does not contain a workbook part",
    ))
}

/// Reject anything that cannot be a `.docx` before opening it as one.
///
/// A legacy binary `.doc` is recognised and reported as unsupported rather than malformed.
pub fn check_document_signature(bytes: &[u8]) -> IngestionResult<()> {
    match sniff(bytes) {
        Signature::Zip => Ok(()),
        Signature::Ole => Err(IngestionError::UnsupportedFormat {
            family: DocumentFamily::Document,
            message: "legacy binary (OLE compound file) documents are not supported; save as .docx"
                .to_string(),
        }),
        Signature::Unknown => Err(unrecognised(DocumentFamily::Document, bytes)),
    }
}

fn unrecognised(family: DocumentFamily, bytes: &[u8]) -> IngestionError {
    if bytes.is_empty() {
        IngestionError::malformed(family, "upload is empty")
    } else {
        IngestionError::malformed(family, "unrecognised container signature")
    }
}
