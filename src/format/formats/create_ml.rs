//! CreateML JSON format implementation.
//!
//! A single JSON array holds one entry per image. Each entry names the image
//! and lists its boxes as `{label, x, y, width, height}` in absolute pixels,
//! with `(x, y)` at the box center.

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::registry::LabelFormat;
use crate::format::traits::{AnnotationCodec, CodecContext, DecodedAnnotations, record_bounds};
use crate::model::{AnnotationRecord, BoundingBox};

/// CreateML JSON format.
///
/// Supports:
/// - Bounding boxes (center-anchored, absolute pixels)
/// - Several images in one file; encoding merges into an existing document
///
/// Does not support:
/// - Polygons (reduced to their bounds)
/// - `difficult` and `verified` flags
/// - Image embedding (only the image file name is stored)
pub struct CreateMlFormat;

/// One image entry in the JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ImageEntry {
    image: String,
    #[serde(default)]
    annotations: Vec<BoxEntry>,
}

/// One center-anchored box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BoxEntry {
    label: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl BoxEntry {
    fn from_record(record: &AnnotationRecord) -> Result<Self, FormatError> {
        let bbox = record_bounds(record)?;
        let center = bbox.center();
        Ok(Self {
            label: record.label.clone(),
            x: center.x,
            y: center.y,
            width: bbox.width(),
            height: bbox.height(),
        })
    }

    fn to_record(&self) -> AnnotationRecord {
        let bbox = BoundingBox::from_center(self.x, self.y, self.width.abs(), self.height.abs());
        AnnotationRecord::rectangle(self.label.clone(), bbox)
    }
}

impl AnnotationCodec for CreateMlFormat {
    fn format(&self) -> LabelFormat {
        LabelFormat::CreateMl
    }

    fn display_name(&self) -> &'static str {
        "CreateML (JSON)"
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
        let image = context.image_file_name().unwrap_or_else(|| {
            log::warn!("Encoding CreateML entry without an image path");
            String::new()
        });

        let annotations = records
            .iter()
            .map(BoxEntry::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = parse_document(context.existing_document)?;
        let entry = ImageEntry { image, annotations };

        match entries.iter_mut().find(|e| e.image == entry.image) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }

        log::debug!(
            "Encoded {} CreateML boxes into a document of {} images",
            records.len(),
            entries.len()
        );
        Ok(serde_json::to_vec_pretty(&entries)?)
    }

    fn decode(
        &self,
        bytes: &[u8],
        context: &CodecContext<'_>,
    ) -> Result<DecodedAnnotations, FormatError> {
        let entries: Vec<ImageEntry> = serde_json::from_slice(bytes)
            .map_err(|e| FormatError::decode(format!("invalid CreateML JSON: {e}")))?;

        let entry = match context.image_file_name() {
            Some(name) => entries.iter().find(|e| e.image == name),
            None => entries.first(),
        };

        let Some(entry) = entry else {
            log::debug!("No CreateML entry for {:?}", context.image_path);
            return Ok(DecodedAnnotations::default());
        };

        let records: Vec<AnnotationRecord> =
            entry.annotations.iter().map(BoxEntry::to_record).collect();

        log::debug!("Decoded {} CreateML boxes for '{}'", records.len(), entry.image);
        Ok(DecodedAnnotations {
            image_path: (!entry.image.is_empty()).then(|| entry.image.clone().into()),
            ..DecodedAnnotations::new(records)
        })
    }
}

/// Parse an existing document, treating missing or blank content as empty.
fn parse_document(bytes: Option<&[u8]>) -> Result<Vec<ImageEntry>, FormatError> {
    match bytes {
        Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
            Ok(serde_json::from_slice(bytes)?)
        }
        _ => Ok(Vec::new()),
    }
}
