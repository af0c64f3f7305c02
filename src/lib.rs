//! imglabel - image annotation core
//!
//! Shape geometry, the canvas interaction state machine, and label file
//! persistence in Pascal VOC XML, YOLO TXT and CreateML JSON.
//!
//! - [`model`]: points, boxes, shapes and the session class list
//! - [`canvas`]: pointer and key events turned into shape edits
//! - [`format`]: stateless codecs between records and bytes
//! - [`label_file`]: one image's annotations on disk

pub mod canvas;
pub mod color_utils;
pub mod config;
mod constants;
pub mod format;
pub mod label_file;
pub mod model;
mod persist;

pub use canvas::{Canvas, CanvasConfig, CanvasEvent, CanvasKey, CreateMode, InteractionState};
pub use config::{AppConfig, ConfigError, LogLevel};
pub use format::{FormatError, ImageSize, LabelFormat};
pub use label_file::{LabelFile, LabelFileError, LoadOptions};
pub use model::{AnnotationRecord, ClassRegistry, GeometryError, Point, Shape, ShapeId, ShapeStyle};
