//! Error types for annotation format operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encoding or decoding annotations.
///
/// Any decode error aborts the whole load: codecs never return a partial
/// record list.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Embedded image data is not valid base64
    #[error("Invalid embedded image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Malformed structure or content
    #[error("Malformed annotation data: {message}")]
    Decode {
        /// Description of what could not be parsed
        message: String,
    },

    /// Normalized-text decode without a class list
    #[error("No class list available to resolve class indices")]
    MissingClassFile,

    /// Image dimensions required but not available
    #[error("Image dimensions required for format '{format}' but not available")]
    ImageDimensionUnavailable {
        /// The format requiring dimensions
        format: String,
    },

    /// Class index outside the class list
    #[error("Class index {index} out of range for {class_count} known classes")]
    UnknownClassIndex {
        /// The index found in the file
        index: usize,
        /// Number of classes in the list
        class_count: usize,
    },

    /// Label missing from the class list during encode
    #[error("Label '{label}' is not in the class list")]
    UnknownLabel {
        /// The unregistered label
        label: String,
    },

    /// Record without any points
    #[error("Annotation '{label}' has no points")]
    EmptyShape {
        /// Label of the offending record
        label: String,
    },

    /// Path suffix does not match any known format
    #[error("Not an annotation file: {path:?}")]
    UnsupportedExtension {
        /// The rejected path
        path: PathBuf,
    },
}

impl FormatError {
    /// Create a decode error with a message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a missing dimensions error.
    pub fn missing_dimensions(format: impl Into<String>) -> Self {
        Self::ImageDimensionUnavailable {
            format: format.into(),
        }
    }
}
