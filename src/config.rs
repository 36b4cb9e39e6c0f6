//! Configuration of the tree files of a voice.
//!
//! ```toml
//! read_strategy = "in_memory"   # optional: buffered, in_memory, automatic
//! dur = "tree-dur.inf"
//! lf0 = "tree-lf0.inf"
//! mcp = "tree-mgc.inf"
//! str = "tree-str.inf"          # optional
//! # mag omitted: skipped when loading
//! ```
//!
//! Relative paths in a file loaded with [TreeFiles::from_file] are relative
//! to the directory of that file.

use crate::error::LoadError;
use crate::model::ModelType;
use crate::tree_file::ReadStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Tree file paths per model type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeFiles {
    pub dur: Option<PathBuf>,
    pub lf0: Option<PathBuf>,
    pub mcp: Option<PathBuf>,
    pub str: Option<PathBuf>,
    pub mag: Option<PathBuf>,
    #[serde(default)]
    pub read_strategy: ReadStrategy,
}

impl TreeFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of `model_type`.
    pub fn with_path<P: Into<PathBuf>>(mut self, model_type: ModelType, path: P) -> Self {
        *self.slot(model_type) = Some(path.into());
        self
    }

    pub fn with_read_strategy(mut self, read_strategy: ReadStrategy) -> Self {
        self.read_strategy = read_strategy;
        self
    }

    /// Configured path of `model_type`, `None` if absent.
    pub fn path(&self, model_type: ModelType) -> Option<&Path> {
        match model_type {
            ModelType::Dur => self.dur.as_deref(),
            ModelType::Lf0 => self.lf0.as_deref(),
            ModelType::Mcp => self.mcp.as_deref(),
            ModelType::Str => self.str.as_deref(),
            ModelType::Mag => self.mag.as_deref(),
        }
    }

    fn slot(&mut self, model_type: ModelType) -> &mut Option<PathBuf> {
        match model_type {
            ModelType::Dur => &mut self.dur,
            ModelType::Lf0 => &mut self.lf0,
            ModelType::Mcp => &mut self.mcp,
            ModelType::Str => &mut self.str,
            ModelType::Mag => &mut self.mag,
        }
    }

    /// Parses a TOML configuration. Paths are taken as written.
    pub fn from_toml_str(input: &str) -> Result<TreeFiles, LoadError> {
        Ok(toml::from_str(input)?)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    /// [LoadError::Io] if the file cannot be read,
    /// [LoadError::Config] if it is not a valid configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TreeFiles, LoadError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut files = Self::from_toml_str(&input)?;

        if let Some(base) = path.parent() {
            for slot in [
                &mut files.dur,
                &mut files.lf0,
                &mut files.mcp,
                &mut files.str,
                &mut files.mag,
            ] {
                if let Some(p) = slot.as_mut().filter(|p| p.is_relative()) {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_toml_str() {
        let files = TreeFiles::from_toml_str(
            r#"
            read_strategy = "buffered"
            dur = "dur.tree"
            lf0 = "lf0.tree"
            mcp = "/voices/mcp.tree"
            "#,
        )
        .unwrap();

        assert_eq!(files.path(ModelType::Dur), Some(Path::new("dur.tree")));
        assert_eq!(files.path(ModelType::Mcp), Some(Path::new("/voices/mcp.tree")));
        assert_eq!(files.path(ModelType::Str), None);
        assert_eq!(files.read_strategy, ReadStrategy::Buffered);
    }

    #[test]
    fn test_default_strategy_and_unknown_key() {
        let files = TreeFiles::from_toml_str("dur = \"d\"").unwrap();
        assert_eq!(files.read_strategy, ReadStrategy::Automatic);

        let err = TreeFiles::from_toml_str("duration = \"d\"").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dur = \"dur.tree\"\nlf0 = \"/abs/lf0.tree\"").unwrap();

        let files = TreeFiles::from_file(file.path()).unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(files.path(ModelType::Dur), Some(base.join("dur.tree").as_path()));
        assert_eq!(files.path(ModelType::Lf0), Some(Path::new("/abs/lf0.tree")));
    }

    #[test]
    fn test_with_path() {
        let files = TreeFiles::new()
            .with_path(ModelType::Mag, "mag.tree")
            .with_read_strategy(ReadStrategy::InMemory);
        assert_eq!(files.path(ModelType::Mag), Some(Path::new("mag.tree")));
        assert_eq!(files.read_strategy, ReadStrategy::InMemory);
    }
}
