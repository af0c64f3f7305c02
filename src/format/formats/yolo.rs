//! YOLO TXT format implementation.
//!
//! One text file per image, one line per object:
//! `class_index cx cy w h` with all four coordinates normalized to `[0, 1]`
//! by the image size. Class names live in a separate `classes.txt`.

use crate::format::error::FormatError;
use crate::format::registry::LabelFormat;
use crate::format::traits::{AnnotationCodec, CodecContext, DecodedAnnotations, record_bounds};
use crate::model::{AnnotationRecord, BoundingBox};

/// YOLO TXT format.
///
/// Supports:
/// - Bounding boxes only (normalized center coordinates)
/// - Class indices resolved against an external class list
///
/// Does not support:
/// - Polygons (reduced to their bounds)
/// - `difficult` and `verified` flags
/// - Image embedding
pub struct YoloFormat;

impl AnnotationCodec for YoloFormat {
    fn format(&self) -> LabelFormat {
        LabelFormat::Yolo
    }

    fn display_name(&self) -> &'static str {
        "YOLO (TXT)"
    }

    fn preserves_difficult(&self) -> bool {
        false
    }

    fn preserves_verified(&self) -> bool {
        false
    }

    fn embeds_image(&self) -> bool {
        false
    }

    fn encode(
        &self,
        records: &[AnnotationRecord],
        context: &CodecContext<'_>,
    ) -> Result<Vec<u8>, FormatError> {
        let size = context.require_image_size(LabelFormat::Yolo)?;
        let classes = context.class_names.ok_or(FormatError::MissingClassFile)?;
        let width = size.width as f32;
        let height = size.height as f32;

        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            let class_idx = classes
                .iter()
                .position(|c| !c.is_empty() && c == &record.label)
                .ok_or_else(|| FormatError::UnknownLabel {
                    label: record.label.clone(),
                })?;

            let bbox = record_bounds(record)?;
            let center = bbox.center();
            let cx = center.x / width;
            let cy = center.y / height;
            let nw = bbox.width() / width;
            let nh = bbox.height() / height;

            lines.push(format!(
                "{} {:.6} {:.6} {:.6} {:.6}",
                class_idx, cx, cy, nw, nh
            ));
        }

        if records.iter().any(|r| r.difficult) {
            log::debug!("YOLO cannot store the difficult flag, dropping it");
        }
        log::debug!("Encoded {} YOLO lines", records.len());
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn decode(
        &self,
        bytes: &[u8],
        context: &CodecContext<'_>,
    ) -> Result<DecodedAnnotations, FormatError> {
        let size = context.require_image_size(LabelFormat::Yolo)?;
        let classes = context.class_names.ok_or(FormatError::MissingClassFile)?;
        let content = std::str::from_utf8(bytes)
            .map_err(|_| FormatError::decode("YOLO file is not valid UTF-8"))?;

        let width = size.width as f32;
        let height = size.height as f32;

        let mut records = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let entry = parse_yolo_line(line).ok_or_else(|| {
                FormatError::decode(format!("line {}: expected 'class cx cy w h'", line_idx + 1))
            })?;

            let label = classes
                .get(entry.class_idx)
                .ok_or(FormatError::UnknownClassIndex {
                    index: entry.class_idx,
                    class_count: classes.len(),
                })?;
            if label.is_empty() {
                return Err(FormatError::decode(format!(
                    "line {}: class index {} has no name",
                    line_idx + 1,
                    entry.class_idx
                )));
            }

            let bbox = BoundingBox::from_center(
                entry.cx * width,
                entry.cy * height,
                entry.w * width,
                entry.h * height,
            );
            records.push(AnnotationRecord::rectangle(label.clone(), bbox));
        }

        log::debug!("Decoded {} YOLO lines", records.len());
        Ok(DecodedAnnotations {
            image_size: Some(size),
            ..DecodedAnnotations::new(records)
        })
    }
}

/// One parsed YOLO line, coordinates still normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
struct YoloEntry {
    class_idx: usize,
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
}

/// Parse a single YOLO annotation line.
///
/// Exactly five fields are expected. Coordinates are clamped to `[0, 1]`.
fn parse_yolo_line(line: &str) -> Option<YoloEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }

    let normalized = |s: &str| -> Option<f32> {
        let v: f32 = s.parse().ok()?;
        v.is_finite().then(|| v.clamp(0.0, 1.0))
    };

    Some(YoloEntry {
        class_idx: parts[0].parse().ok()?,
        cx: normalized(parts[1])?,
        cy: normalized(parts[2])?,
        w: normalized(parts[3])?,
        h: normalized(parts[4])?,
    })
}
