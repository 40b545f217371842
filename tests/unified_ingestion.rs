mod common;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tour_ingest::ingestion::{
    DocumentIngestor, IngestionOptions, IngestionOutput, IngestionRequest, Representation,
};
use tour_ingest::types::{CellValue, DocumentFamily, UploadedFile};
use tour_ingest::ErrorKind;

use common::{hello_docx, schedule_xlsx, venues_xlsx, Docx};

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tour-ingest-{name}-{nanos}.{ext}"))
}

fn ingestor() -> DocumentIngestor {
    DocumentIngestor::new(IngestionOptions::default())
}

#[tokio::test]
async fn tabular_operations_dispatch() {
    let ingestor = ingestor();

    let records = ingestor
        .read_tabular_first_sheet(UploadedFile::named("venues.xlsx", venues_xlsx()))
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get("Qty"), Some(&CellValue::Number(5.0)));

    let sheets = ingestor
        .read_tabular_all_sheets(UploadedFile::new(venues_xlsx()))
        .await
        .unwrap();
    assert_eq!(sheets.names().collect::<Vec<_>>(), vec!["Venues", "Crew"]);

    let crew = ingestor
        .read_tabular_sheet(UploadedFile::new(venues_xlsx()), "Crew")
        .await
        .unwrap();
    assert_eq!(crew.len(), 1);

    let names = ingestor
        .sheet_names(UploadedFile::new(schedule_xlsx()))
        .await
        .unwrap();
    assert_eq!(names, vec!["Schedule"]);
}

#[tokio::test]
async fn document_operations_dispatch() {
    let ingestor = ingestor();

    let text = ingestor
        .read_document_as_text(UploadedFile::named("rider.docx", hello_docx()))
        .await
        .unwrap();
    assert_eq!(text, "Hello world");

    let html = ingestor
        .read_document_as_markup(UploadedFile::new(hello_docx()))
        .await
        .unwrap();
    assert!(html.contains("<p>Hello world</p>"));

    let styled = Docx::new(&common::styled_paragraph("Contract", "Fee")).build();
    let conversion = ingestor
        .read_document_as_markup_with_messages(UploadedFile::new(styled))
        .await
        .unwrap();
    assert_eq!(conversion.value, "<p>Fee</p>");
    assert_eq!(conversion.messages.len(), 1);
}

#[tokio::test]
async fn ingest_by_representation() {
    let ingestor = ingestor();

    match ingestor
        .ingest(UploadedFile::new(venues_xlsx()), Representation::AllSheets)
        .await
        .unwrap()
    {
        IngestionOutput::Sheets(sheets) => assert_eq!(sheets.len(), 2),
        other => panic!("unexpected output: {other:?}"),
    }

    match ingestor
        .ingest(
            UploadedFile::new(venues_xlsx()),
            Representation::Sheet("Crew".to_string()),
        )
        .await
        .unwrap()
    {
        IngestionOutput::Records(records) => assert_eq!(records.len(), 1),
        other => panic!("unexpected output: {other:?}"),
    }

    let out = ingestor
        .ingest(UploadedFile::new(hello_docx()), Representation::Text)
        .await
        .unwrap();
    assert_eq!(out, IngestionOutput::Text("Hello world".to_string()));

    let req = IngestionRequest::from_hint(UploadedFile::named("rider.docx", hello_docx())).unwrap();
    assert_eq!(req.representation.family(), DocumentFamily::Document);
    match req.run(&ingestor).await.unwrap() {
        IngestionOutput::Markup(html) => assert!(html.contains("Hello world")),
        other => panic!("unexpected output: {other:?}"),
    }
}

#[tokio::test]
async fn random_bytes_fail_every_operation_with_parse_kind() {
    let ingestor = ingestor();
    let garbage: Vec<u8> = (0..2048u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();

    for representation in [
        Representation::FirstSheet,
        Representation::AllSheets,
        Representation::Sheet("Sheet1".to_string()),
        Representation::Markup,
        Representation::MarkupWithMessages,
        Representation::Text,
    ] {
        let err = ingestor
            .ingest(UploadedFile::new(garbage.clone()), representation.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "{representation:?}: {err}");
    }
}

#[tokio::test]
async fn repeated_ingestion_is_deterministic() {
    let ingestor = ingestor();
    let bytes = venues_xlsx();

    let a = ingestor
        .read_tabular_all_sheets(UploadedFile::new(bytes.clone()))
        .await
        .unwrap();
    let b = ingestor
        .read_tabular_all_sheets(UploadedFile::new(bytes))
        .await
        .unwrap();
    assert_eq!(a, b);

    let doc = hello_docx();
    let first = ingestor
        .read_document_as_markup(UploadedFile::new(doc.clone()))
        .await
        .unwrap();
    let second = ingestor
        .read_document_as_markup(UploadedFile::new(doc))
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingestions_are_independent() {
    let ingestor = DocumentIngestor::new(IngestionOptions {
        max_in_flight: Some(2),
        ..Default::default()
    });

    let mut handles = Vec::new();
    for i in 0..8 {
        let ingestor = ingestor.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let records = ingestor
                    .read_tabular_first_sheet(UploadedFile::new(venues_xlsx()))
                    .await
                    .unwrap();
                IngestionOutput::Records(records)
            } else {
                let text = ingestor
                    .read_document_as_text(UploadedFile::new(hello_docx()))
                    .await
                    .unwrap();
                IngestionOutput::Text(text)
            }
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await.unwrap() {
            IngestionOutput::Records(records) => {
                assert_eq!(i % 2, 0);
                assert_eq!(records.len(), 3);
            }
            IngestionOutput::Text(text) => {
                assert_eq!(i % 2, 1);
                assert_eq!(text, "Hello world");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }
}

#[tokio::test]
async fn uploads_read_from_disk_keep_their_name() {
    let path = tmp_file("venues", "xlsx");
    std::fs::write(&path, venues_xlsx()).unwrap();

    let file = UploadedFile::from_path(&path).await.unwrap();
    assert_eq!(file.family_hint(), Some(DocumentFamily::Workbook));
    assert!(file.name().unwrap().starts_with("tour-ingest-venues-"));

    let records = ingestor().read_tabular_first_sheet(file).await.unwrap();
    assert_eq!(records.len(), 3);

    let _ = std::fs::remove_file(&path);
}
