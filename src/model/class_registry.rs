//! Ordered list of known class names for a labelling session.

use std::path::Path;

use crate::persist::write_atomic;

/// Known labels, in first-seen order.
///
/// The position of a name is its class index in the normalized-text format,
/// so names are only ever appended. A class file read with
/// [`ClassRegistry::from_lines`] may hold empty placeholders for blank lines;
/// they keep later names at their index and are written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRegistry {
    names: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from names, dropping blanks and duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(name.as_ref());
        }
        registry
    }

    /// Parse a class file: one name per line.
    pub fn parse(text: &str) -> Self {
        Self::from_names(text.lines())
    }

    /// Parse a class file keeping line positions: blank lines become
    /// placeholders that own their index but never match a label.
    pub fn from_lines(text: &str) -> Self {
        Self::from_positions(text.lines())
    }

    /// Build a registry where each name keeps its position as its index.
    pub fn from_positions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .collect(),
        }
    }

    /// Adopt `file` as the index layout, then append any of this registry's
    /// names it does not already hold.
    pub fn rebase(&mut self, file: ClassRegistry) {
        let previous = std::mem::replace(self, file);
        for name in previous.names {
            self.register(&name);
        }
    }

    /// Seed from a predefined-classes file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let registry = Self::parse(&text);
        log::debug!("Loaded {} classes from {:?}", registry.len(), path);
        Ok(registry)
    }

    /// Write the class file, one name per line, replacing it atomically.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        write_atomic(path, self.to_text().as_bytes())?;
        log::debug!("Saved {} classes to {:?}", self.len(), path);
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut text = self.names.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Register a label and return its index. Known labels keep their index.
    ///
    /// Surrounding whitespace is ignored. Blank names are not registered and
    /// return `None`.
    pub fn register(&mut self, name: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(index) = self.index_of(name) {
            return Some(index);
        }
        self.names.push(name.to_string());
        Some(self.names.len() - 1)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.names.iter().position(|n| n == name)
    }

    /// Name at `index`; `None` for placeholders and out-of-range indices.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
