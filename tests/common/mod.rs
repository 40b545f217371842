#![allow(dead_code)]

use std::io::{Cursor, Write};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Two sheets: "Venues" (3 rows, the last one short) and "Crew" (1 row).
pub fn venues_xlsx() -> Vec<u8> {
    let mut wb = Workbook::new();

    let ws = wb.add_worksheet();
    ws.set_name("Venues").unwrap();
    ws.write_string(0, 0, "Name").unwrap();
    ws.write_string(0, 1, "Qty").unwrap();
    ws.write_string(0, 2, "Indoor").unwrap();
    ws.write_string(1, 0, "Widget").unwrap();
    ws.write_number(1, 1, 5).unwrap();
    ws.write_boolean(1, 2, true).unwrap();
    ws.write_string(2, 0, "Paradiso").unwrap();
    ws.write_number(2, 1, 1500).unwrap();
    ws.write_boolean(2, 2, false).unwrap();
    ws.write_string(3, 0, "Annex").unwrap();
    ws.write_number(3, 1, 80.5).unwrap();

    let ws2 = wb.add_worksheet();
    ws2.set_name("Crew").unwrap();
    ws2.write_string(0, 0, "Role").unwrap();
    ws2.write_string(0, 1, "Count").unwrap();
    ws2.write_string(1, 0, "Rigger").unwrap();
    ws2.write_number(1, 1, 4).unwrap();

    wb.save_to_buffer().unwrap()
}

/// One sheet "Schedule" with a date column formatted as a date.
pub fn schedule_xlsx() -> Vec<u8> {
    let mut wb = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let ws = wb.add_worksheet();
    ws.set_name("Schedule").unwrap();
    ws.write_string(0, 0, "City").unwrap();
    ws.write_string(0, 1, "Date").unwrap();
    ws.write_string(1, 0, "Utrecht").unwrap();
    let date = ExcelDateTime::from_ymd(2025, 6, 14).unwrap();
    ws.write_datetime_with_format(1, 1, &date, &date_format).unwrap();

    wb.save_to_buffer().unwrap()
}

/// One sheet whose header row repeats labels and has a gap.
pub fn duplicate_headers_xlsx() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Name").unwrap();
    ws.write_string(0, 1, "Name").unwrap();
    ws.write_string(0, 3, "Name").unwrap();
    ws.write_string(1, 0, "a").unwrap();
    ws.write_string(1, 1, "b").unwrap();
    ws.write_string(1, 2, "c").unwrap();
    ws.write_string(1, 3, "d").unwrap();
    wb.save_to_buffer().unwrap()
}

/// A structurally valid `.xlsx` package that declares no sheets.
pub fn sheetless_xlsx() -> Vec<u8> {
    zip_bytes(&[
        (
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#,
        ),
        (
            "_rels/.rels",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets/>
</workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
</Relationships>"#,
        ),
    ])
}

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Builds minimal `.docx` packages.
#[derive(Default)]
pub struct Docx {
    body: String,
    styles: Option<String>,
    numbering: Option<String>,
    relationships: Vec<String>,
    media: Vec<(String, Vec<u8>)>,
    document: Option<String>,
}

impl Docx {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Default::default()
        }
    }

    /// `styles` holds `<w:style>` elements.
    pub fn styles(mut self, styles: &str) -> Self {
        self.styles = Some(styles.to_string());
        self
    }

    /// `numbering` holds `<w:abstractNum>` and `<w:num>` elements.
    pub fn numbering(mut self, numbering: &str) -> Self {
        self.numbering = Some(numbering.to_string());
        self
    }

    /// Replace the generated `word/document.xml` with `xml`, verbatim.
    pub fn document_xml(mut self, xml: &str) -> Self {
        self.document = Some(xml.to_string());
        self
    }

    pub fn hyperlink(mut self, id: &str, target: &str) -> Self {
        self.relationships.push(format!(
            r#"<Relationship Id="{id}" Type="{R_NS}/hyperlink" Target="{target}" TargetMode="External"/>"#
        ));
        self
    }

    pub fn image(mut self, id: &str, name: &str, bytes: &[u8]) -> Self {
        self.relationships.push(format!(
            r#"<Relationship Id="{id}" Type="{R_NS}/image" Target="media/{name}"/>"#
        ));
        self.media.push((format!("word/media/{name}"), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;
        let root_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="{R_NS}/officeDocument" Target="word/document.xml"/>
</Relationships>"#
        );
        let document = self.document.unwrap_or_else(|| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                self.body
            )
        });

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), content_types.as_bytes().to_vec()),
            ("_rels/.rels".to_string(), root_rels.into_bytes()),
            ("word/document.xml".to_string(), document.into_bytes()),
        ];
        let mut relationships = self.relationships;
        if let Some(styles) = self.styles {
            relationships.push(format!(
                r#"<Relationship Id="rIdStyles" Type="{R_NS}/styles" Target="styles.xml"/>"#
            ));
            parts.push((
                "word/styles.xml".to_string(),
                format!(r#"<w:styles xmlns:w="{W_NS}">{styles}</w:styles>"#).into_bytes(),
            ));
        }
        if let Some(numbering) = self.numbering {
            relationships.push(format!(
                r#"<Relationship Id="rIdNumbering" Type="{R_NS}/numbering" Target="numbering.xml"/>"#
            ));
            parts.push((
                "word/numbering.xml".to_string(),
                format!(r#"<w:numbering xmlns:w="{W_NS}">{numbering}</w:numbering>"#).into_bytes(),
            ));
        }
        parts.push((
            "word/_rels/document.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                relationships.concat()
            )
            .into_bytes(),
        ));
        parts.extend(self.media);

        let entries: Vec<(&str, &[u8])> = parts
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_slice()))
            .collect();
        zip_bytes(&entries)
    }
}

pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
}

pub fn styled_paragraph(style_id: &str, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"{style_id}\"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"
    )
}

pub fn list_item(num_id: u32, level: u32, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:numPr><w:ilvl w:val=\"{level}\"/><w:numId w:val=\"{num_id}\"/></w:numPr></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"
    )
}

/// A plain document with one paragraph.
pub fn hello_docx() -> Vec<u8> {
    Docx::new(&paragraph("Hello world")).build()
}

/// A minimal OpenDocument spreadsheet with one sheet, "Cities".
pub fn cities_ods() -> Vec<u8> {
    let cell = |value: &str| {
        format!(
            r#"<table:table-cell office:value-type="string"><text:p>{value}</text:p></table:table-cell>"#
        )
    };
    let number = |value: f64| {
        format!(
            r#"<table:table-cell office:value-type="float" office:value="{value}"><text:p>{value}</text:p></table:table-cell>"#
        )
    };
    let row = |cells: &[String]| format!("<table:table-row>{}</table:table-row>", cells.concat());
    let content = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2">
<office:body><office:spreadsheet><table:table table:name="Cities">{}{}{}</table:table></office:spreadsheet></office:body>
</office:document-content>"#,
        row(&[cell("City"), cell("Capacity")]),
        row(&[cell("Utrecht"), number(1500.0)]),
        row(&[cell("Gent")]),
    );
    zip_bytes(&[
        ("mimetype", b"application/vnd.oasis.opendocument.spreadsheet"),
        (
            "META-INF/manifest.xml",
            br#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#,
        ),
        ("content.xml", content.as_bytes()),
    ])
}

/// An OLE compound file header, as found at the start of legacy `.doc`/`.xls` files.
pub fn ole_header() -> Vec<u8> {
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.resize(512, 0);
    bytes
}
