use std::path::Path;

use chrono::NaiveDate;
use labrec_extract::extract_record;
use labrec_ingest::{
    DocumentSource, IngestError, PdfTextSource, expand_inputs, load_csv_records,
    read_document_text,
};
use labrec_model::DEFAULT_FIELDS;
use lopdf::dictionary;
use lopdf::{Document, Object, Stream};
use tempfile::TempDir;

/// Builds a one-page PDF whose text layer is `text`.
fn make_test_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn pdf_text_layer_feeds_extraction() {
    let bytes = make_test_pdf("Glucose 142 mg/dL Received On : 01/09/2025");
    let text = PdfTextSource.extract_text(&bytes).unwrap();
    assert!(text.contains("Glucose"), "unexpected text: {text:?}");

    let record = extract_record("generated.pdf", &text, &["Glucose"]);
    assert_eq!(record.numeric("Glucose"), Some(142.0));
    assert_eq!(record.observed_date(), NaiveDate::from_ymd_opt(2025, 9, 1));
}

#[test]
fn pdf_file_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, make_test_pdf("HbA1c 6.8 %")).unwrap();

    let text = read_document_text(&path).unwrap();
    let record = extract_record(&path.display().to_string(), &text, DEFAULT_FIELDS);
    assert_eq!(record.numeric("HbA1c"), Some(6.8));
}

#[test]
fn corrupt_pdf_is_reported_not_panicked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();
    let err = read_document_text(&path).unwrap_err();
    assert!(matches!(err, IngestError::ExtractionUnavailable { .. }));
}

#[test]
fn directory_inputs_expand_in_name_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("2025-09.txt"), "HbA1c 6.8").unwrap();
    std::fs::write(dir.path().join("2025-08.txt"), "HbA1c 6.1").unwrap();
    std::fs::write(dir.path().join("values.csv"), "01/08/2025,6.1").unwrap();

    let documents = expand_inputs(&[dir.path().to_path_buf()]).unwrap();
    let texts: Vec<String> = documents
        .iter()
        .map(|path| read_document_text(path).unwrap())
        .collect();
    assert_eq!(texts, vec!["HbA1c 6.1", "HbA1c 6.8"]);
}

#[test]
fn csv_file_import() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.csv");
    std::fs::write(
        &path,
        "Date,HbA1c,Glucose\n01/08/2025,6.1,118\n01/09/2025,6.8,142\nbad,1,2\n",
    )
    .unwrap();

    let import = load_csv_records(&path).unwrap();
    assert_eq!(import.records.len(), 2);
    assert_eq!(import.records[1].source_id(), "history.csv:3");
    assert_eq!(import.skipped.len(), 1);
    assert_eq!(import.skipped[0].line, 4);
}

#[test]
fn nonexistent_input_is_kept_as_a_document() {
    let documents = expand_inputs(&[Path::new("/nonexistent/report.pdf").to_path_buf()]).unwrap();
    assert_eq!(documents.len(), 1);
    assert!(matches!(
        read_document_text(&documents[0]),
        Err(IngestError::FileRead { .. })
    ));
}
