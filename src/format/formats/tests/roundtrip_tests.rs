//! Round-trip tests through every codec.
//!
//! Labels always survive. Geometry survives as a bounding box within one
//! pixel. Only Pascal VOC keeps `difficult` and `verified`.

use std::path::Path;

use crate::format::{CodecContext, FormatRegistry, ImageSize, LabelFormat};
use crate::model::{AnnotationRecord, BoundingBox, Point};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn class_names() -> Vec<String> {
    vec!["person".into(), "vehicle".into(), "building".into()]
}

fn records() -> Vec<AnnotationRecord> {
    vec![
        AnnotationRecord::rectangle("person", BoundingBox::new(100.0, 200.0, 250.0, 470.0))
            .with_difficult(true),
        AnnotationRecord::rectangle("vehicle", BoundingBox::new(13.3, 7.8, 401.6, 99.2)),
        AnnotationRecord::new(
            "building",
            vec![
                Point::new(300.0, 50.0),
                Point::new(600.0, 80.0),
                Point::new(550.0, 300.0),
                Point::new(320.0, 250.0),
            ],
        ),
    ]
}

fn assert_bounds_close(original: &AnnotationRecord, decoded: &AnnotationRecord, tolerance: f32) {
    let a = original.bounding_box().unwrap();
    let b = decoded.bounding_box().unwrap();
    for (x, y) in [
        (a.min_x, b.min_x),
        (a.min_y, b.min_y),
        (a.max_x, b.max_x),
        (a.max_y, b.max_y),
    ] {
        assert!(
            (x - y).abs() <= tolerance,
            "{}: {x} vs {y} exceeds {tolerance}",
            original.label
        );
    }
}

#[test]
fn test_roundtrip_all_formats() {
    let registry = FormatRegistry::new();
    let classes = class_names();
    let context = CodecContext::new()
        .image_size(ImageSize::new(WIDTH, HEIGHT))
        .image_path(Path::new("scene.jpg"))
        .class_names(&classes)
        .verified(true);
    let originals = records();

    for format in LabelFormat::ALL {
        let codec = registry.get(format).unwrap();
        let bytes = codec.encode(&originals, &context).unwrap();
        let decoded = codec.decode(&bytes, &context).unwrap();

        assert_eq!(decoded.records.len(), originals.len(), "{format}");
        assert_eq!(decoded.verified, codec.preserves_verified(), "{format}");

        for (original, record) in originals.iter().zip(&decoded.records) {
            assert_eq!(record.label, original.label, "{format}");
            assert_eq!(record.points.len(), 4, "{format}: decode yields rectangles");
            assert_bounds_close(original, record, 1.0);
        }
    }
}

#[test]
fn test_difficult_survives_only_voc() {
    let registry = FormatRegistry::new();
    let classes = class_names();
    let context = CodecContext::new()
        .image_size(ImageSize::new(WIDTH, HEIGHT))
        .image_path(Path::new("scene.jpg"))
        .class_names(&classes);
    let record = AnnotationRecord::rectangle("person", BoundingBox::new(10.0, 10.0, 50.0, 50.0))
        .with_difficult(true);

    let voc = registry.get(LabelFormat::PascalVoc).unwrap();
    let bytes = voc.encode(std::slice::from_ref(&record), &context).unwrap();
    assert!(voc.decode(&bytes, &context).unwrap().records[0].difficult);

    // The other two formats drop the flag
    for format in [LabelFormat::Yolo, LabelFormat::CreateMl] {
        let codec = registry.get(format).unwrap();
        let bytes = codec.encode(std::slice::from_ref(&record), &context).unwrap();
        let decoded = codec.decode(&bytes, &context).unwrap();
        assert!(!decoded.records[0].difficult, "{format} kept difficult");
    }
}

#[test]
fn test_voc_roundtrip_pixel_precision() {
    let registry = FormatRegistry::new();
    let voc = registry.get(LabelFormat::PascalVoc).unwrap();
    let context = CodecContext::new().image_size(ImageSize::new(WIDTH, HEIGHT));

    let corners = [
        (0.0, 0.0, 1.0, 1.0),
        (0.4, 0.6, 639.5, 479.4),
        (123.456, 78.9, 124.1, 300.0),
    ];
    for (x1, y1, x2, y2) in corners {
        let record = AnnotationRecord::rectangle("box", BoundingBox::new(x1, y1, x2, y2));
        let bytes = voc.encode(std::slice::from_ref(&record), &context).unwrap();
        let decoded = voc.decode(&bytes, &context).unwrap();
        assert_bounds_close(&record, &decoded.records[0], 1.0);
    }
}

#[test]
fn test_yolo_roundtrip_normalized_precision() {
    let registry = FormatRegistry::new();
    let yolo = registry.get(LabelFormat::Yolo).unwrap();
    let classes = class_names();
    let context = CodecContext::new()
        .image_size(ImageSize::new(WIDTH, HEIGHT))
        .class_names(&classes);

    let record = AnnotationRecord::rectangle("building", BoundingBox::new(100.0, 100.0, 200.0, 160.0));
    let bytes = yolo.encode(std::slice::from_ref(&record), &context).unwrap();
    let decoded = yolo.decode(&bytes, &context).unwrap();

    // Normalized values must agree within one pixel's fraction of the image
    let a = record.bounding_box().unwrap();
    let b = decoded.records[0].bounding_box().unwrap();
    let width = WIDTH as f32;
    let height = HEIGHT as f32;
    assert!((a.min_x / width - b.min_x / width).abs() <= 1.0 / width);
    assert!((a.max_x / width - b.max_x / width).abs() <= 1.0 / width);
    assert!((a.min_y / height - b.min_y / height).abs() <= 1.0 / height);
    assert!((a.max_y / height - b.max_y / height).abs() <= 1.0 / height);
}

#[test]
fn test_convert_voc_to_yolo_to_createml() {
    let registry = FormatRegistry::new();
    let classes = class_names();
    let context = CodecContext::new()
        .image_size(ImageSize::new(WIDTH, HEIGHT))
        .image_path(Path::new("scene.jpg"))
        .class_names(&classes);
    let originals = records();

    let voc = registry.get(LabelFormat::PascalVoc).unwrap();
    let yolo = registry.get(LabelFormat::Yolo).unwrap();
    let json = registry.get(LabelFormat::CreateMl).unwrap();

    let from_voc = voc.decode(&voc.encode(&originals, &context).unwrap(), &context).unwrap();
    let from_yolo = yolo
        .decode(&yolo.encode(&from_voc.records, &context).unwrap(), &context)
        .unwrap();
    let from_json = json
        .decode(&json.encode(&from_yolo.records, &context).unwrap(), &context)
        .unwrap();

    for (original, record) in originals.iter().zip(&from_json.records) {
        assert_eq!(record.label, original.label);
        assert_bounds_close(original, record, 1.5);
        assert!(!record.difficult);
    }
}
