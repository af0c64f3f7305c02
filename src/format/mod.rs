//! Annotation format encode/decode system.
//!
//! Three stateless codecs convert between [`AnnotationRecord`]s and bytes.
//! Every format keeps only the axis-aligned bounding box of a shape, so
//! decoding always yields four-vertex rectangles.
//!
//! ## Supported Formats
//!
//! - **Pascal VOC XML**: absolute pixels, keeps `difficult` and `verified`,
//!   may embed the image bytes
//! - **YOLO TXT**: normalized center boxes plus a `classes.txt` class list
//! - **CreateML JSON**: absolute center boxes in a per-image JSON array
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imglabel::format::{CodecContext, FormatRegistry, ImageSize, LabelFormat};
//!
//! let registry = FormatRegistry::new();
//! let codec = registry.get(LabelFormat::Yolo).unwrap();
//! let context = CodecContext::new()
//!     .image_size(ImageSize::new(640, 480))
//!     .class_names(&classes);
//! let bytes = codec.encode(&records, &context)?;
//! ```
//!
//! [`AnnotationRecord`]: crate::model::AnnotationRecord

mod error;
pub mod formats;
mod registry;
mod traits;

pub use error::FormatError;
pub use registry::{FormatRegistry, LabelFormat};
pub use traits::{AnnotationCodec, CodecContext, DecodedAnnotations, ImageSize};
