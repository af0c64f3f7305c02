//! Trait definitions for annotation format implementations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::registry::LabelFormat;
use crate::model::{AnnotationRecord, BoundingBox};

/// Trait for annotation codec implementations.
///
/// Each on-disk format implements this trait to convert between
/// [`AnnotationRecord`]s and bytes. Codecs are stateless: everything they need
/// besides the records arrives through [`CodecContext`].
pub trait AnnotationCodec: Send + Sync {
    /// The format tag this codec is registered under.
    fn format(&self) -> LabelFormat;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// Whether the per-annotation "difficult" flag survives a round trip.
    fn preserves_difficult(&self) -> bool;

    /// Whether the document-level verified flag survives a round trip.
    fn preserves_verified(&self) -> bool;

    /// Whether image bytes can be embedded in the document.
    fn embeds_image(&self) -> bool;

    /// Encode records into a document.
    ///
    /// Every record is reduced to its bounding box first.
    fn encode(
        &self,
        records: &[AnnotationRecord],
        context: &CodecContext<'_>,
    ) -> Result<Vec<u8>, FormatError>;

    /// Decode a document into records.
    ///
    /// Every decoded record is a four-vertex rectangle.
    fn decode(
        &self,
        bytes: &[u8],
        context: &CodecContext<'_>,
    ) -> Result<DecodedAnnotations, FormatError>;
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    /// Number of color channels (3 for RGB, 1 for grayscale).
    pub depth: u32,
}

impl ImageSize {
    /// RGB image size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 3,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Whether both sides are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Everything besides the records that a codec may need.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecContext<'a> {
    /// Size of the annotated image.
    pub image_size: Option<ImageSize>,

    /// Path of the annotated image.
    pub image_path: Option<&'a Path>,

    /// Ordered class names for formats that store class indices.
    pub class_names: Option<&'a [String]>,

    /// Document verified flag to encode.
    pub verified: bool,

    /// Image bytes to embed, for formats that support it.
    pub image_data: Option<&'a [u8]>,

    /// Current content of the target file, for formats that share one file
    /// between several images.
    pub existing_document: Option<&'a [u8]>,
}

impl<'a> CodecContext<'a> {
    /// Create a new context with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.image_size = Some(size);
        self
    }

    pub fn image_path(mut self, path: &'a Path) -> Self {
        self.image_path = Some(path);
        self
    }

    pub fn class_names(mut self, names: &'a [String]) -> Self {
        self.class_names = Some(names);
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn image_data(mut self, data: &'a [u8]) -> Self {
        self.image_data = Some(data);
        self
    }

    pub fn existing_document(mut self, bytes: &'a [u8]) -> Self {
        self.existing_document = Some(bytes);
        self
    }

    /// File name of the image, if a path was supplied.
    pub fn image_file_name(&self) -> Option<String> {
        self.image_path
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Image size, or the format's dimension error.
    pub fn require_image_size(&self, format: LabelFormat) -> Result<ImageSize, FormatError> {
        self.image_size
            .filter(ImageSize::is_valid)
            .ok_or_else(|| FormatError::missing_dimensions(format.id()))
    }
}

/// Result of decoding a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedAnnotations {
    pub records: Vec<AnnotationRecord>,
    pub verified: bool,
    /// Image path stored in the document, if any.
    pub image_path: Option<PathBuf>,
    /// Image size stored in the document, if any.
    pub image_size: Option<ImageSize>,
    /// Embedded image bytes, if any.
    pub image_data: Option<Vec<u8>>,
}

impl DecodedAnnotations {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}

/// Reduce a record to its bounding box, the only geometry any format keeps.
pub(crate) fn record_bounds(record: &AnnotationRecord) -> Result<BoundingBox, FormatError> {
    record.bounding_box().ok_or_else(|| FormatError::EmptyShape {
        label: record.label.clone(),
    })
}
