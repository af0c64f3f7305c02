//! Annotation codec implementations.

mod create_ml;
mod pascal_voc;
mod yolo;

#[cfg(test)]
mod tests;

pub use create_ml::CreateMlFormat;
pub use pascal_voc::PascalVocFormat;
pub use yolo::YoloFormat;
