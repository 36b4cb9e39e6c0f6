//! Tree families of a voice, one per model type.
//!
//! A [TreeSet] holds a [TreeFamily] for each [ModelType]. Families are
//! loaded independently and never changed by searches, so a loaded set can
//! be shared between threads.

use crate::config::TreeFiles;
use crate::error::{LoadError, LookupError};
use crate::model::feature::{FeatureRegistry, FeatureVector, ValueNormalizer};
use crate::model::{Question, Tree};
use crate::parser::ParsingErrorType;
use crate::search::{NO_LEAF, search_tree, search_tree_general};
use crate::tree_file::{
    FeatureTestResolver, QuestionTestResolver, ReadStrategy, TestResolver, TreeFileParser,
    TreeFileReader,
};
use serde::Deserialize;
use std::path::Path;
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

// =#========================================================================#=
// MODEL TYPE
// =#========================================================================$=
/// Kind of acoustic parameter a tree family clusters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Duration
    Dur,
    /// Log F0
    Lf0,
    /// Spectrum (mel-cepstrum)
    Mcp,
    /// Band-aperiodicity strength
    Str,
    /// Fourier magnitude
    Mag,
}

impl ModelType {
    /// Returns whether a voice cannot be loaded without this model type.
    pub fn is_required(self) -> bool {
        matches!(self, ModelType::Dur | ModelType::Lf0 | ModelType::Mcp)
    }
}

// =#========================================================================#=
// TREE FAMILY
// =#========================================================================$=
/// Trees of one model type in file order, plus the questions they refer to
/// (legacy scheme only).
#[derive(Debug, Clone, Default)]
pub struct TreeFamily {
    trees: Vec<Tree>,
    questions: Vec<Question>,
}

impl TreeFamily {
    pub fn new(trees: Vec<Tree>, questions: Vec<Question>) -> Self {
        TreeFamily { trees, questions }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// First tree in file order.
    pub fn head(&self) -> Option<&Tree> {
        self.trees.first()
    }

    /// Last tree in file order.
    pub fn tail(&self) -> Option<&Tree> {
        self.trees.last()
    }

    /// First tree of `state` in file order.
    pub fn tree_for_state(&self, state: usize) -> Option<&Tree> {
        self.trees.iter().find(|tree| tree.state() == state)
    }
}

// =#========================================================================#=
// TREE SET
// =#========================================================================$=
/// Tree families of all model types of a voice.
///
/// # Example
/// ```no_run
/// use htstree::config::TreeFiles;
/// use htstree::model::{ModelType, TreeSet};
///
/// let files = TreeFiles::from_file("voice/trees.toml")?;
/// let mut set = TreeSet::new();
/// set.load_legacy(&files)?;
/// let leaf = set.search_state_legacy(ModelType::Dur, 2, "a^b-c+d=e");
/// # Ok::<(), htstree::error::LoadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeSet {
    families: [TreeFamily; ModelType::COUNT],
}

impl TreeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(&self, model_type: ModelType) -> &TreeFamily {
        &self.families[model_type as usize]
    }

    pub fn trees(&self, model_type: ModelType) -> &[Tree] {
        self.family(model_type).trees()
    }

    pub fn num_trees(&self, model_type: ModelType) -> usize {
        self.family(model_type).num_trees()
    }

    pub fn tree_head(&self, model_type: ModelType) -> Option<&Tree> {
        self.family(model_type).head()
    }

    pub fn tree_tail(&self, model_type: ModelType) -> Option<&Tree> {
        self.family(model_type).tail()
    }

    pub fn questions(&self, model_type: ModelType) -> &[Question] {
        self.family(model_type).questions()
    }

    /// Returns whether trees are loaded for `model_type`.
    pub fn is_loaded(&self, model_type: ModelType) -> bool {
        !self.family(model_type).is_empty()
    }

    /// Looks up a question of `model_type` by name.
    pub fn find_question(
        &self,
        model_type: ModelType,
        name: &str,
    ) -> Result<&Question, LookupError> {
        self.questions(model_type)
            .iter()
            .find(|question| question.name() == name)
            .ok_or_else(|| LookupError::QuestionNotFound {
                model_type,
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------
    /// Loads all configured model types with inline feature tests.
    ///
    /// # Errors
    /// [LoadError::MissingRequired] if a required model type has no path,
    /// otherwise the first error of [TreeSet::load_model_type].
    pub fn load<R, N>(
        &mut self,
        files: &TreeFiles,
        registry: &R,
        normalizer: &N,
    ) -> Result<(), LoadError>
    where
        R: FeatureRegistry + ?Sized,
        N: ValueNormalizer + ?Sized,
    {
        for model_type in ModelType::iter() {
            if let Some(path) = configured_path(files, model_type)? {
                self.load_model_type(model_type, path, files.read_strategy, registry, normalizer)?;
            }
        }
        Ok(())
    }

    /// Loads all configured model types with question-based tests.
    ///
    /// # Errors
    /// See [TreeSet::load].
    pub fn load_legacy(&mut self, files: &TreeFiles) -> Result<(), LoadError> {
        for model_type in ModelType::iter() {
            if let Some(path) = configured_path(files, model_type)? {
                self.load_model_type_legacy(model_type, path, files.read_strategy)?;
            }
        }
        Ok(())
    }

    /// Loads the trees of one model type with inline feature tests,
    /// replacing any trees loaded before.
    ///
    /// On error the family of `model_type` is left empty.
    pub fn load_model_type<P, R, N>(
        &mut self,
        model_type: ModelType,
        path: P,
        strategy: ReadStrategy,
        registry: &R,
        normalizer: &N,
    ) -> Result<(), LoadError>
    where
        P: AsRef<Path>,
        R: FeatureRegistry + ?Sized,
        N: ValueNormalizer + ?Sized,
    {
        let resolver = FeatureTestResolver::new(registry, normalizer);
        self.load_family(model_type, path.as_ref(), strategy, resolver, |_| Vec::new())
    }

    /// Loads the trees and questions of one model type with question-based
    /// tests, replacing anything loaded before.
    ///
    /// On error the family of `model_type` is left empty.
    pub fn load_model_type_legacy<P: AsRef<Path>>(
        &mut self,
        model_type: ModelType,
        path: P,
        strategy: ReadStrategy,
    ) -> Result<(), LoadError> {
        self.load_family(
            model_type,
            path.as_ref(),
            strategy,
            QuestionTestResolver::new(),
            QuestionTestResolver::into_questions,
        )
    }

    fn load_family<T: TestResolver>(
        &mut self,
        model_type: ModelType,
        path: &Path,
        strategy: ReadStrategy,
        resolver: T,
        questions_of: impl FnOnce(T) -> Vec<Question>,
    ) -> Result<(), LoadError> {
        self.families[model_type as usize] = TreeFamily::default();

        let reader = TreeFileReader::open(path, strategy).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut parser = TreeFileParser::new(resolver);
        let trees = reader.parse_with(&mut parser).map_err(|source| match source.kind() {
            ParsingErrorType::IoError(kind, message) => LoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(*kind, message.clone()),
            },
            _ => LoadError::Parse {
                path: path.to_path_buf(),
                model_type,
                source,
            },
        })?;
        let family = TreeFamily::new(trees, questions_of(parser.into_resolver()));

        info!(
            %model_type,
            path = %path.display(),
            trees = family.num_trees(),
            questions = family.questions().len(),
            "loaded tree file"
        );
        self.families[model_type as usize] = family;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------
    /// Searches the tree of `state` of `model_type` with byte features.
    ///
    /// Returns [NO_LEAF] if no tree of that state is loaded.
    pub fn search_state<V: FeatureVector + ?Sized>(
        &self,
        model_type: ModelType,
        state: usize,
        vector: &V,
    ) -> i32 {
        self.family(model_type)
            .tree_for_state(state)
            .map_or(NO_LEAF, |tree| search_tree_general(tree, vector))
    }

    /// Searches the tree of `state` of `model_type` with a unit name.
    ///
    /// Returns [NO_LEAF] if no tree of that state is loaded.
    pub fn search_state_legacy(&self, model_type: ModelType, state: usize, name: &str) -> i32 {
        let family = self.family(model_type);
        family
            .tree_for_state(state)
            .map_or(NO_LEAF, |tree| search_tree(tree, family.questions(), name))
    }
}

/// Path of `model_type`, `None` for a skipped optional type.
fn configured_path(files: &TreeFiles, model_type: ModelType) -> Result<Option<&Path>, LoadError> {
    match files.path(model_type) {
        Some(path) => Ok(Some(path)),
        None if model_type.is_required() => Err(LoadError::MissingRequired(model_type)),
        None => {
            warn!(%model_type, "no tree file configured, skipping");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureDefinition, Verbatim};
    use rstest::rstest;
    use std::io::Write;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    fn tree_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const GENDER_TREES: &str = "\
{*}[2]
{
 0 gender=male \"dur_s2_12\" \"dur_s2_7\"
}
{*}[3]
{
 0 gender=female \"dur_s3_1\" \"dur_s3_2\"
}
";

    #[rstest]
    #[case(ModelType::Dur, "dur", true)]
    #[case(ModelType::Lf0, "lf0", true)]
    #[case(ModelType::Mcp, "mcp", true)]
    #[case(ModelType::Str, "str", false)]
    #[case(ModelType::Mag, "mag", false)]
    fn test_model_type(#[case] model_type: ModelType, #[case] name: &str, #[case] required: bool) {
        assert_eq!(model_type.to_string(), name);
        assert_eq!(ModelType::from_str(name), Ok(model_type));
        assert_eq!(model_type.is_required(), required);
    }

    #[test]
    fn test_load_and_search_model_type() {
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
        let file = tree_file(GENDER_TREES);
        let mut set = TreeSet::new();
        set.load_model_type(
            ModelType::Dur,
            file.path(),
            ReadStrategy::Automatic,
            &features,
            &Verbatim,
        )
        .unwrap();

        assert!(set.is_loaded(ModelType::Dur));
        assert!(!set.is_loaded(ModelType::Lf0));
        assert_eq!(set.num_trees(ModelType::Dur), 2);
        assert_eq!(set.tree_head(ModelType::Dur).unwrap().state(), 2);
        assert_eq!(set.tree_tail(ModelType::Dur).unwrap().state(), 3);

        let male = features.encode(&[("gender", "male")]).unwrap();
        assert_eq!(set.search_state(ModelType::Dur, 2, &male), 7);
        assert_eq!(set.search_state(ModelType::Dur, 3, &male), 1);
        assert_eq!(set.search_state(ModelType::Dur, 4, &male), NO_LEAF);
        assert_eq!(set.search_state(ModelType::Lf0, 2, &male), NO_LEAF);
    }

    #[test]
    fn test_failed_load_leaves_family_empty() {
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
        let good = tree_file(GENDER_TREES);
        let bad = tree_file("{*}[2]\n{\n 0 gender=male -1 \"dur_s2_7\"\n-2 gender=male \"x_1\" \"x_2\"\n}\n");
        let mut set = TreeSet::new();

        set.load_model_type(ModelType::Dur, good.path(), ReadStrategy::InMemory, &features, &Verbatim)
            .unwrap();
        let err = set
            .load_model_type(ModelType::Dur, bad.path(), ReadStrategy::InMemory, &features, &Verbatim)
            .unwrap_err();

        assert!(matches!(err, LoadError::Parse { model_type: ModelType::Dur, .. }));
        assert!(!set.is_loaded(ModelType::Dur));
    }

    #[test]
    fn test_legacy_find_question() {
        let file = tree_file(
            "QS C-Vowel { \"-a+\",\"-i+\" }\nQS Q-gender { \"m_\" }\n{*}[2]\n{\n 0 C-Vowel \"lf0_s2_1\" \"lf0_s2_2\"\n}\n",
        );
        let mut set = TreeSet::new();
        set.load_model_type_legacy(ModelType::Lf0, file.path(), ReadStrategy::Buffered)
            .unwrap();

        assert_eq!(set.questions(ModelType::Lf0).len(), 2);
        assert_eq!(
            set.find_question(ModelType::Lf0, "Q-gender").unwrap().patterns(),
            &["m_".to_string()]
        );
        assert_eq!(
            set.find_question(ModelType::Lf0, "C-Nasal"),
            Err(LookupError::QuestionNotFound {
                model_type: ModelType::Lf0,
                name: "C-Nasal".to_string()
            })
        );
        assert_eq!(set.search_state_legacy(ModelType::Lf0, 2, "x-a+y"), 2);
        assert_eq!(set.search_state_legacy(ModelType::Lf0, 2, "x-o+y"), 1);
    }

    #[test]
    fn test_load_requires_required_types() {
        let file = tree_file(GENDER_TREES);
        let files = TreeFiles::new()
            .with_path(ModelType::Dur, file.path())
            .with_path(ModelType::Lf0, file.path());
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);

        let err = TreeSet::new().load(&files, &features, &Verbatim).unwrap_err();
        assert!(matches!(err, LoadError::MissingRequired(ModelType::Mcp)));
    }

    #[test]
    fn test_load_skips_absent_optional_types() {
        let file = tree_file(GENDER_TREES);
        let files = TreeFiles::new()
            .with_path(ModelType::Dur, file.path())
            .with_path(ModelType::Lf0, file.path())
            .with_path(ModelType::Mcp, file.path());
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);

        let mut set = TreeSet::new();
        set.load(&files, &features, &Verbatim).unwrap();
        for model_type in ModelType::iter() {
            assert_eq!(set.is_loaded(model_type), model_type.is_required());
        }
    }

    #[test]
    fn test_configured_but_missing_file_is_io_error() {
        let mut set = TreeSet::new();
        let err = set
            .load_model_type_legacy(ModelType::Str, "does/not/exist.tree", ReadStrategy::Automatic)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[rstest]
    #[case(ReadStrategy::Buffered)]
    #[case(ReadStrategy::InMemory)]
    fn test_unreadable_file_is_io_error(#[case] strategy: ReadStrategy) {
        let dir = tempfile::TempDir::new().unwrap();
        let mut set = TreeSet::new();
        let err = set
            .load_model_type_legacy(ModelType::Dur, dir.path(), strategy)
            .unwrap_err();
        match err {
            LoadError::Io { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected an IO error, got {other}"),
        }
        assert!(!set.is_loaded(ModelType::Dur));
    }
}
