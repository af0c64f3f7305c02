//! Tests for the CreateML JSON format.

use std::path::Path;

use crate::format::formats::CreateMlFormat;
use crate::format::traits::{AnnotationCodec, CodecContext};
use crate::format::{FormatError, LabelFormat};
use crate::model::{AnnotationRecord, BoundingBox};

#[test]
fn test_createml_format_metadata() {
    let format = CreateMlFormat;

    assert_eq!(format.format(), LabelFormat::CreateMl);
    assert_eq!(format.display_name(), "CreateML (JSON)");
    assert!(!format.preserves_difficult());
    assert!(!format.preserves_verified());
}

#[test]
fn test_createml_encode_structure() {
    let context = CodecContext::new().image_path(Path::new("/imgs/street.jpg"));
    let record = AnnotationRecord::rectangle("car", BoundingBox::new(10.0, 20.0, 50.0, 80.0));

    let bytes = CreateMlFormat.encode(&[record], &context).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["image"], "street.jpg");

    let boxes = entries[0]["annotations"].as_array().unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0]["label"], "car");
    assert_eq!(boxes[0]["x"].as_f64(), Some(30.0));
    assert_eq!(boxes[0]["y"].as_f64(), Some(50.0));
    assert_eq!(boxes[0]["width"].as_f64(), Some(40.0));
    assert_eq!(boxes[0]["height"].as_f64(), Some(60.0));
}

#[test]
fn test_createml_decode_selects_image_entry() {
    let json = r#"[
        {"image": "a.jpg", "annotations": [{"label": "cat", "x": 10, "y": 10, "width": 4, "height": 6}]},
        {"image": "b.jpg", "annotations": [
            {"label": "dog", "x": 50, "y": 40, "width": 20, "height": 10},
            {"label": "dog", "x": 5, "y": 5, "width": 2, "height": 2}
        ]}
    ]"#;

    let context = CodecContext::new().image_path(Path::new("dir/b.jpg"));
    let decoded = CreateMlFormat.decode(json.as_bytes(), &context).unwrap();

    assert_eq!(decoded.records.len(), 2);
    assert!(!decoded.verified);
    assert_eq!(decoded.image_path.as_deref(), Some(Path::new("b.jpg")));
    assert_eq!(
        decoded.records[0].bounding_box(),
        Some(BoundingBox::new(40.0, 35.0, 60.0, 45.0))
    );

    // Without an image path the first entry is used
    let first = CreateMlFormat.decode(json.as_bytes(), &CodecContext::new()).unwrap();
    assert_eq!(first.records.len(), 1);
    assert_eq!(first.records[0].label, "cat");

    // No entry for the image means no annotations
    let missing = CodecContext::new().image_path(Path::new("c.jpg"));
    let none = CreateMlFormat.decode(json.as_bytes(), &missing).unwrap();
    assert!(none.records.is_empty());
}

#[test]
fn test_createml_encode_merges_existing_document() {
    let existing = br#"[
        {"image": "a.jpg", "annotations": [{"label": "cat", "x": 10, "y": 10, "width": 4, "height": 6}]},
        {"image": "b.jpg", "annotations": [{"label": "old", "x": 1, "y": 1, "width": 1, "height": 1}]}
    ]"#;
    let record = AnnotationRecord::rectangle("new", BoundingBox::new(0.0, 0.0, 10.0, 10.0));

    // Replace b.jpg, keep a.jpg
    let context = CodecContext::new()
        .image_path(Path::new("b.jpg"))
        .existing_document(existing);
    let bytes = CreateMlFormat.encode(&[record.clone()], &context).unwrap();

    let a = CreateMlFormat
        .decode(&bytes, &CodecContext::new().image_path(Path::new("a.jpg")))
        .unwrap();
    let b = CreateMlFormat
        .decode(&bytes, &CodecContext::new().image_path(Path::new("b.jpg")))
        .unwrap();
    assert_eq!(a.records[0].label, "cat");
    assert_eq!(b.records.len(), 1);
    assert_eq!(b.records[0].label, "new");

    // A new image is appended
    let context = CodecContext::new()
        .image_path(Path::new("c.jpg"))
        .existing_document(existing);
    let bytes = CreateMlFormat.encode(&[record], &context).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(3));
}

#[test]
fn test_createml_encode_rejects_malformed_existing_document() {
    let context = CodecContext::new()
        .image_path(Path::new("b.jpg"))
        .existing_document(b"not json");

    let result = CreateMlFormat.encode(&[], &context);
    assert!(matches!(result, Err(FormatError::Json(_))));
}

#[test]
fn test_createml_decode_malformed() {
    let cases: &[&[u8]] = &[
        b"",
        b"{}",
        br#"[{"annotations": []}]"#,
        br#"[{"image": "a.jpg", "annotations": [{"label": "x", "x": 1}]}]"#,
    ];

    for bytes in cases {
        let result = CreateMlFormat.decode(bytes, &CodecContext::new());
        match result {
            Err(FormatError::Decode { message }) => {
                assert!(message.starts_with("invalid CreateML JSON"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
