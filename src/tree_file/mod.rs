//! Reading of tree description files.
//!
//! This module provides the [TreeFileParser] and the [TestResolver]s that
//! decide how node tests are interpreted:
//! * [FeatureTestResolver] - inline `name=value` byte-feature tests (primary)
//! * [QuestionTestResolver] - named questions declared by `QS` lines (legacy)
//!
//! # Quick API
//! For simple use cases:
//! * [`parse_file`] / [`parse_str`] - primary scheme, returns the trees
//! * [`parse_legacy_file`] / [`parse_legacy_str`] - legacy scheme,
//!   returns the trees together with the declared questions
//!
//! # Full API
//! Configure a [TreeFileParser] with a resolver and pass it a
//! [ByteParser](crate::parser::ByteParser), or open a file with a
//! [ReadStrategy] through [`TreeFileReader::open`].
//!
//! See [TreeFileParser] for the file format.

mod defs;
mod parser;

pub use self::parser::{FeatureTestResolver, QuestionTestResolver, TestResolver, TreeFileParser};

use crate::model::feature::{FeatureRegistry, ValueNormalizer};
use crate::model::{Question, Tree};
use crate::parser::buffered_byte_source::BufferedByteSource;
use crate::parser::byte_parser::ByteParser;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use crate::parser::ParsingError;
use serde::Deserialize;
use std::path::Path;

/// Files up to this size are read into memory by [ReadStrategy::Automatic].
pub const AUTO_IN_MEMORY_THRESHOLD: u64 = 64 * 1024 * 1024;

// =#========================================================================#=
// READ STRATEGY
// =#========================================================================$=
/// How a tree file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Stream the file through a buffered reader
    Buffered,
    /// Read the whole file into memory first
    InMemory,
    /// In memory up to [AUTO_IN_MEMORY_THRESHOLD] bytes, buffered above
    #[default]
    Automatic,
}

impl ReadStrategy {
    /// Replaces [ReadStrategy::Automatic] by a concrete strategy for the file at `path`.
    ///
    /// # Errors
    /// Returns an I/O error if the file metadata cannot be read.
    pub fn resolve<P: AsRef<Path>>(self, path: P) -> std::io::Result<ReadStrategy> {
        match self {
            ReadStrategy::Automatic => {
                let size = std::fs::metadata(path)?.len();
                Ok(if size <= AUTO_IN_MEMORY_THRESHOLD {
                    ReadStrategy::InMemory
                } else {
                    ReadStrategy::Buffered
                })
            }
            concrete => Ok(concrete),
        }
    }
}

// =#========================================================================#=
// TREE FILE READER
// =#========================================================================$=
/// An opened tree file, ready to be parsed.
///
/// Opening and parsing are separate steps so callers can tell I/O errors
/// from format errors.
pub enum TreeFileReader {
    InMemory(ByteParser<InMemoryByteSource>),
    Buffered(ByteParser<BufferedByteSource>),
}

impl TreeFileReader {
    /// Opens the file at `path` using the given strategy.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened or read.
    pub fn open<P: AsRef<Path>>(path: P, strategy: ReadStrategy) -> std::io::Result<Self> {
        let path = path.as_ref();
        match strategy.resolve(path)? {
            ReadStrategy::InMemory => Ok(TreeFileReader::InMemory(
                ByteParser::from_file_in_memory(path)?,
            )),
            _ => Ok(TreeFileReader::Buffered(ByteParser::from_file_buffered(
                path,
            )?)),
        }
    }

    /// Parses all trees of the file with `parser`, consuming the reader.
    pub fn parse_with<T: TestResolver>(
        self,
        parser: &mut TreeFileParser<T>,
    ) -> Result<Vec<Tree>, ParsingError> {
        match self {
            TreeFileReader::InMemory(byte_parser) => parser.parse_all(byte_parser),
            TreeFileReader::Buffered(byte_parser) => parser.parse_all(byte_parser),
        }
    }
}

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a tree file with inline feature tests.
///
/// # Arguments
/// * `path` - Path to the tree file
/// * `registry` - Resolves feature names and values to indices and byte codes
/// * `normalizer` - Unescapes punctuation and phone values before lookup
///
/// # Returns
/// * `Ok(Vec<Tree>)` - All trees in file order
/// * `Err(ParsingError)` - If the file cannot be read, is malformed or a
///   feature test cannot be resolved
///
/// # Example
/// ```no_run
/// use htstree::model::{FeatureDefinition, Verbatim};
/// use htstree::tree_file::parse_file;
///
/// let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
/// let trees = parse_file("dur.tree", &features, &Verbatim)?;
/// println!("{} trees", trees.len());
/// # Ok::<(), htstree::parser::ParsingError>(())
/// ```
pub fn parse_file<P, R, N>(path: P, registry: &R, normalizer: &N) -> Result<Vec<Tree>, ParsingError>
where
    P: AsRef<Path>,
    R: FeatureRegistry + ?Sized,
    N: ValueNormalizer + ?Sized,
{
    let mut parser = TreeFileParser::new(FeatureTestResolver::new(registry, normalizer));
    TreeFileReader::open(path, ReadStrategy::default())?.parse_with(&mut parser)
}

/// Parses tree descriptions with inline feature tests from a string.
///
/// See [`parse_file`].
pub fn parse_str<R, N>(input: &str, registry: &R, normalizer: &N) -> Result<Vec<Tree>, ParsingError>
where
    R: FeatureRegistry + ?Sized,
    N: ValueNormalizer + ?Sized,
{
    let mut parser = TreeFileParser::new(FeatureTestResolver::new(registry, normalizer));
    parser.parse_all(ByteParser::for_str(input))
}

/// Parses a tree file whose node tests name questions declared in the file.
///
/// # Returns
/// * `Ok((Vec<Tree>, Vec<Question>))` - All trees and the declared questions
/// * `Err(ParsingError)` - If the file cannot be read, is malformed, or a
///   node names an undeclared question
pub fn parse_legacy_file<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<Tree>, Vec<Question>), ParsingError> {
    let mut parser = TreeFileParser::new(QuestionTestResolver::new());
    let trees = TreeFileReader::open(path, ReadStrategy::default())?.parse_with(&mut parser)?;
    Ok((trees, parser.into_resolver().into_questions()))
}

/// Parses question-based tree descriptions from a string.
///
/// # Example
/// ```
/// use htstree::search::search_tree;
/// use htstree::tree_file::parse_legacy_str;
///
/// let input = r#"
/// QS Q-gender { "m_","male_" }
/// {*}[2]
/// {
///    0 Q-gender "dur_s2_12" "dur_s2_7"
/// }
/// "#;
/// let (trees, questions) = parse_legacy_str(input).unwrap();
/// assert_eq!(search_tree(&trees[0], &questions, "m_1"), 7);
/// ```
pub fn parse_legacy_str(input: &str) -> Result<(Vec<Tree>, Vec<Question>), ParsingError> {
    let mut parser = TreeFileParser::new(QuestionTestResolver::new());
    let trees = parser.parse_all(ByteParser::for_str(input))?;
    Ok((trees, parser.into_resolver().into_questions()))
}
