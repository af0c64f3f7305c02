//! Format tags and the registry that maps them to codecs.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::formats::{CreateMlFormat, PascalVocFormat, YoloFormat};
use crate::format::traits::AnnotationCodec;

/// The closed set of supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// Absolute-pixel XML, one file per image.
    #[default]
    #[serde(rename = "voc")]
    PascalVoc,
    /// Normalized text lines plus a class file.
    Yolo,
    /// JSON array of per-image entries.
    CreateMl,
}

impl LabelFormat {
    /// Discovery priority when several annotation files exist for one image.
    pub const ALL: [LabelFormat; 3] = [LabelFormat::PascalVoc, LabelFormat::Yolo, LabelFormat::CreateMl];

    /// Unique identifier for this format.
    pub fn id(&self) -> &'static str {
        match self {
            LabelFormat::PascalVoc => "voc",
            LabelFormat::Yolo => "yolo",
            LabelFormat::CreateMl => "createml",
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            LabelFormat::PascalVoc => "xml",
            LabelFormat::Yolo => "txt",
            LabelFormat::CreateMl => "json",
        }
    }

    /// Look up a format by extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Classify a path by its suffix. Never touches the file system.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Append this format's suffix unless the path already ends with it.
    pub fn ensure_extension(&self, path: &Path) -> PathBuf {
        if Self::from_path(path) == Some(*self) {
            return path.to_path_buf();
        }
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }

    /// Parse a format id as used in configuration and on the command line.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.id() == id)
    }
}

impl fmt::Display for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Registry of available annotation codecs, keyed by format tag.
pub struct FormatRegistry {
    codecs: HashMap<LabelFormat, Box<dyn AnnotationCodec>>,
}

impl FormatRegistry {
    /// Create a new registry with all built-in codecs registered.
    pub fn new() -> Self {
        let mut registry = Self {
            codecs: HashMap::new(),
        };

        registry.register(Box::new(PascalVocFormat));
        registry.register(Box::new(YoloFormat));
        registry.register(Box::new(CreateMlFormat));

        registry
    }

    /// Register a codec, replacing any codec with the same tag.
    pub fn register(&mut self, codec: Box<dyn AnnotationCodec>) {
        self.codecs.insert(codec.format(), codec);
    }

    /// Get the codec for a format.
    pub fn get(&self, format: LabelFormat) -> Option<&dyn AnnotationCodec> {
        self.codecs.get(&format).map(|c| c.as_ref())
    }

    /// Get the codec matching a path's suffix.
    pub fn for_path(&self, path: &Path) -> Option<&dyn AnnotationCodec> {
        LabelFormat::from_path(path).and_then(|format| self.get(format))
    }

    /// Registered formats, in discovery priority.
    pub fn formats(&self) -> Vec<LabelFormat> {
        LabelFormat::ALL
            .into_iter()
            .filter(|f| self.codecs.contains_key(f))
            .collect()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_formats() {
        let registry = FormatRegistry::new();

        for format in LabelFormat::ALL {
            assert_eq!(registry.get(format).map(|c| c.format()), Some(format));
        }
        assert_eq!(registry.formats(), LabelFormat::ALL.to_vec());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(LabelFormat::from_path(Path::new("a/b.xml")), Some(LabelFormat::PascalVoc));
        assert_eq!(LabelFormat::from_path(Path::new("b.TXT")), Some(LabelFormat::Yolo));
        assert_eq!(LabelFormat::from_path(Path::new("b.json")), Some(LabelFormat::CreateMl));
        assert_eq!(LabelFormat::from_path(Path::new("b.png")), None);
        assert_eq!(LabelFormat::from_path(Path::new("xml")), None);
    }

    #[test]
    fn test_for_path() {
        let registry = FormatRegistry::new();
        let codec = registry.for_path(Path::new("img_001.txt")).unwrap();
        assert_eq!(codec.format(), LabelFormat::Yolo);
        assert!(registry.for_path(Path::new("img_001.jpg")).is_none());
    }

    #[test]
    fn test_ensure_extension() {
        let voc = LabelFormat::PascalVoc;
        assert_eq!(voc.ensure_extension(Path::new("out/img")), PathBuf::from("out/img.xml"));
        assert_eq!(voc.ensure_extension(Path::new("out/img.XML")), PathBuf::from("out/img.XML"));
        assert_eq!(
            LabelFormat::Yolo.ensure_extension(Path::new("out/img.xml")),
            PathBuf::from("out/img.xml.txt")
        );
    }

    #[test]
    fn test_format_ids() {
        for format in LabelFormat::ALL {
            assert_eq!(LabelFormat::from_id(format.id()), Some(format));
        }
        assert_eq!(LabelFormat::from_id("coco"), None);
    }

    #[test]
    fn test_serde_name_matches_id() {
        for format in LabelFormat::ALL {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.id()));
            let parsed: LabelFormat = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn test_lossy_capabilities() {
        let registry = FormatRegistry::new();
        let voc = registry.get(LabelFormat::PascalVoc).unwrap();
        let yolo = registry.get(LabelFormat::Yolo).unwrap();
        let json = registry.get(LabelFormat::CreateMl).unwrap();

        assert!(voc.preserves_difficult() && voc.preserves_verified() && voc.embeds_image());
        assert!(!yolo.preserves_difficult() && !yolo.preserves_verified() && !yolo.embeds_image());
        assert!(!json.preserves_difficult() && !json.preserves_verified() && !json.embeds_image());
    }
}
