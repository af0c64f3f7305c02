//! One annotation document: the records of a single image plus its metadata.
//!
//! [`LabelFile`] picks the codec from the file suffix, owns the verified flag
//! and any embedded image bytes, and performs the actual disk I/O.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::CLASSES_FILENAME;
use crate::format::{CodecContext, FormatError, FormatRegistry, ImageSize, LabelFormat};
use crate::model::{AnnotationRecord, ClassRegistry, ShapeStyle};
use crate::persist::write_atomic;

/// Errors from loading or saving a label file. Both carry the file path.
#[derive(Error, Debug)]
pub enum LabelFileError {
    #[error("Failed to load {path:?}: {source}")]
    Load { path: PathBuf, source: FormatError },

    #[error("Failed to save {path:?}: {source}")]
    FileSave { path: PathBuf, source: FormatError },
}

impl LabelFileError {
    fn load(path: &Path, source: impl Into<FormatError>) -> Self {
        Self::Load {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    fn save(path: &Path, source: impl Into<FormatError>) -> Self {
        Self::FileSave {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// The underlying codec or I/O error.
    pub fn format_error(&self) -> &FormatError {
        match self {
            Self::Load { source, .. } | Self::FileSave { source, .. } => source,
        }
    }
}

/// Image information a caller can supply when loading.
///
/// Normalized-text files cannot be decoded without the image size and a class
/// list. Values given here take precedence over what the document already
/// knows.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub image_path: Option<PathBuf>,
    pub image_size: Option<ImageSize>,
    pub class_names: Option<Vec<String>>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.image_size = Some(size);
        self
    }

    pub fn class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = Some(names);
        self
    }
}

/// An annotation document for one image.
///
/// Exactly one `LabelFile` is live per open image. It performs blocking I/O
/// and has no internal locking: callers must not run [`save`](Self::save)
/// concurrently with another `save` or [`decode_from`](Self::decode_from) on
/// the same instance.
#[derive(Debug)]
pub struct LabelFile {
    /// Records of the last load or save.
    pub shapes: Vec<AnnotationRecord>,
    pub verified: bool,
    pub image_path: Option<PathBuf>,
    pub image_size: Option<ImageSize>,
    /// Image bytes embedded in the document, if the format carries them.
    pub image_data: Option<Vec<u8>>,
    /// Format of the last load or save.
    pub format: LabelFormat,
    /// Where the document was last loaded from or saved to.
    pub file_path: Option<PathBuf>,
    /// Session class list, used for class indices.
    pub classes: ClassRegistry,
    /// Document colors given to the last save.
    pub style: ShapeStyle,
    registry: FormatRegistry,
}

impl LabelFile {
    /// Create an empty, unverified document.
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            verified: false,
            image_path: None,
            image_size: None,
            image_data: None,
            format: LabelFormat::default(),
            file_path: None,
            classes: ClassRegistry::new(),
            style: ShapeStyle::default(),
            registry: FormatRegistry::new(),
        }
    }

    /// Create an empty document for an image.
    pub fn for_image(image_path: impl Into<PathBuf>, image_size: ImageSize) -> Self {
        let mut file = Self::new();
        file.image_path = Some(image_path.into());
        file.image_size = Some(image_size);
        file
    }

    pub fn with_classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_format(mut self, format: LabelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Open and decode a label file.
    pub fn open(path: &Path, options: &LoadOptions) -> Result<Self, LabelFileError> {
        let mut file = Self::new();
        file.decode_from(path, options)?;
        Ok(file)
    }

    /// Whether the path has one of the known annotation suffixes.
    ///
    /// Only the name is inspected; the file is not opened.
    pub fn is_label_file(path: &Path) -> bool {
        LabelFormat::from_path(path).is_some()
    }

    /// Find an existing annotation file for an image.
    ///
    /// Looks in `save_dir` first, then beside the image, and prefers XML over
    /// TXT over JSON when several exist.
    pub fn find_for_image(image_path: &Path, save_dir: Option<&Path>) -> Option<PathBuf> {
        let stem = image_path.file_stem()?.to_string_lossy().into_owned();
        let stem = stem.as_str();
        let image_dir = image_path.parent().unwrap_or(Path::new(""));

        save_dir
            .into_iter()
            .chain(std::iter::once(image_dir))
            .flat_map(|dir| {
                LabelFormat::ALL
                    .into_iter()
                    .map(move |format| dir.join(format!("{}.{}", stem, format.extension())))
            })
            .find(|candidate| candidate.is_file())
    }

    /// Load the document at `path`, replacing this document's content.
    ///
    /// The codec is picked by the path suffix. For YOLO files without a class
    /// list in `options`, `classes.txt` beside the file is read, falling back
    /// to the session classes. On any error the document is left unchanged.
    pub fn decode_from(&mut self, path: &Path, options: &LoadOptions) -> Result<(), LabelFileError> {
        let format = LabelFormat::from_path(path).ok_or_else(|| {
            LabelFileError::load(
                path,
                FormatError::UnsupportedExtension {
                    path: path.to_path_buf(),
                },
            )
        })?;
        let codec = self.registry.get(format).ok_or_else(|| {
            LabelFileError::load(
                path,
                FormatError::UnsupportedExtension {
                    path: path.to_path_buf(),
                },
            )
        })?;

        let bytes = std::fs::read(path).map_err(|e| LabelFileError::load(path, e))?;

        let class_list = match (&options.class_names, format) {
            (Some(names), _) => Some(ClassRegistry::from_positions(names)),
            (None, LabelFormat::Yolo) => {
                let classes_path = classes_path_for(path);
                match read_class_lines(&classes_path).map_err(|e| LabelFileError::load(path, e))? {
                    Some(file) => Some(file),
                    None if !self.classes.is_empty() => Some(self.classes.clone()),
                    None => None,
                }
            }
            (None, _) => None,
        };
        let image_path = options.image_path.clone().or_else(|| self.image_path.clone());
        let image_size = options.image_size.or(self.image_size);

        let mut context = CodecContext::new();
        if let Some(size) = image_size {
            context = context.image_size(size);
        }
        if let Some(image_path) = image_path.as_deref() {
            context = context.image_path(image_path);
        }
        if let Some(list) = &class_list {
            context = context.class_names(list.names());
        }

        let decoded = codec
            .decode(&bytes, &context)
            .map_err(|e| LabelFileError::load(path, e))?;

        match class_list {
            // indices in the file refer to this layout, keep it for the next save
            Some(list) if format == LabelFormat::Yolo => self.classes.rebase(list),
            Some(list) => {
                for name in list.names() {
                    self.classes.register(name);
                }
            }
            None => {}
        }
        for record in &decoded.records {
            self.classes.register(&record.label);
        }

        log::info!(
            "Loaded {} annotations from {:?} ({}, verified: {})",
            decoded.records.len(),
            path,
            format,
            decoded.verified
        );

        self.shapes = decoded.records;
        self.verified = decoded.verified;
        self.image_data = decoded.image_data;
        self.image_size = decoded.image_size.or(image_size);
        self.image_path = image_path.or(decoded.image_path);
        self.format = format;
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Flip the verified flag. Nothing is written until the next save.
    pub fn toggle_verify(&mut self) {
        self.verified = !self.verified;
        log::debug!("Verified set to {}", self.verified);
    }

    /// Save `records` to `path`.
    ///
    /// The codec is picked by the path suffix; a path without a known suffix
    /// gets the suffix of the document's current format appended. An empty
    /// record list is valid. The file is written to a temporary sibling and
    /// atomically renamed over the target, so a failed save never leaves a
    /// truncated file. YOLO saves also rewrite `classes.txt` next to the
    /// target, registering any new labels first.
    ///
    /// Returns the path actually written.
    pub fn save(
        &mut self,
        path: &Path,
        records: &[AnnotationRecord],
        image_path: Option<&Path>,
        image_data: Option<&[u8]>,
        style: Option<ShapeStyle>,
    ) -> Result<PathBuf, LabelFileError> {
        let format = LabelFormat::from_path(path).unwrap_or(self.format);
        let target = format.ensure_extension(path);
        let codec = self.registry.get(format).ok_or_else(|| {
            LabelFileError::save(
                &target,
                FormatError::UnsupportedExtension {
                    path: target.clone(),
                },
            )
        })?;

        let image_path = image_path.or(self.image_path.as_deref());
        let image_data = image_data.or(self.image_data.as_deref());

        let mut classes = self.classes.clone();
        if format == LabelFormat::Yolo {
            for record in records {
                classes.register(&record.label);
            }
        }

        let existing = if format == LabelFormat::CreateMl {
            read_existing(&target).map_err(|e| LabelFileError::save(&target, e))?
        } else {
            None
        };

        let mut context = CodecContext::new()
            .verified(self.verified)
            .class_names(classes.names());
        if let Some(size) = self.image_size {
            context = context.image_size(size);
        }
        if let Some(image_path) = image_path {
            context = context.image_path(image_path);
        }
        if let Some(data) = image_data.filter(|_| codec.embeds_image()) {
            context = context.image_data(data);
        }
        if let Some(existing) = existing.as_deref() {
            context = context.existing_document(existing);
        }

        let bytes = codec
            .encode(records, &context)
            .map_err(|e| LabelFileError::save(&target, e))?;

        if format == LabelFormat::Yolo {
            let classes_path = classes_path_for(&target);
            classes
                .save(&classes_path)
                .map_err(|e| LabelFileError::save(&classes_path, e))?;
        }
        write_atomic(&target, &bytes).map_err(|e| LabelFileError::save(&target, e))?;

        log::info!(
            "Saved {} annotations to {:?} ({}, verified: {})",
            records.len(),
            target,
            format,
            self.verified
        );

        self.image_path = image_path.map(Path::to_path_buf);
        self.image_data = image_data.map(<[u8]>::to_vec);
        if let Some(style) = style {
            self.style = style;
        }
        self.classes = classes;
        self.shapes = records.to_vec();
        self.format = format;
        self.file_path = Some(target.clone());
        Ok(target)
    }
}

impl Default for LabelFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of the class file for an annotation file.
fn classes_path_for(annotation_path: &Path) -> PathBuf {
    annotation_path
        .parent()
        .unwrap_or(Path::new(""))
        .join(CLASSES_FILENAME)
}

/// Read a class file keeping line positions, `None` if it does not exist.
fn read_class_lines(path: &Path) -> std::io::Result<Option<ClassRegistry>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(ClassRegistry::from_lines(&text))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Current content of a file, `None` if it does not exist.
fn read_existing(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
