//! Htstree is a library to load and search the context clustering decision
//! trees of HMM-based speech synthesis voices.
//!
//! A voice has one family of trees per [model type](ModelType) (duration,
//! log F0, spectrum, band-aperiodicity strength, Fourier magnitude) and one
//! tree per HMM state in each family. Searching a tree with the linguistic
//! features of a unit yields the leaf (PDF) id of its parameter set.
//! Core functionality provided:
//! - Parser for tree description files ([crate::tree_file]), with node ids
//!   resolved through a registry, forward references and checks for
//!   undefined, duplicate and cyclic nodes.
//! - Two node test schemes:
//!   - inline `name=value` byte-feature tests, resolved at load time through
//!     a [FeatureRegistry](model::FeatureRegistry),
//!   - named `QS` questions matched as substrings of a unit name (legacy).
//! - Search ([crate::search]) through one traversal with a pluggable branch
//!   decider. Searches return [NO_LEAF](search::NO_LEAF) if no leaf is reached.
//! - [TreeSet] with per model type loading; `dur`, `lf0` and `mcp` are
//!   required, `str` and `mag` may be absent.
//! - Configuration from TOML ([TreeFiles]) and buffered or in-memory reading.
//!
//! # Usage patterns
//! 1. Quick functions with default settings: [load_tree_set],
//!    [load_tree_set_legacy], and [crate::tree_file]'s `parse_*` functions.
//! 2. A [TreeSet] loaded type by type, or a
//!    [TreeFileParser](tree_file::TreeFileParser) with your own
//!    [TestResolver](tree_file::TestResolver).
//!
//! ## Example
//! ```
//! use htstree::model::{FeatureDefinition, Verbatim};
//! use htstree::search::search_tree_general;
//! use htstree::tree_file::parse_str;
//!
//! let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
//! let input = "\
//! {*}[2]
//! {
//!    0 gender=male \"dur_s2_12\" \"dur_s2_7\"
//! }
//! ";
//! let trees = parse_str(input, &features, &Verbatim)?;
//!
//! let female = features.encode(&[("gender", "female")]).unwrap();
//! assert_eq!(search_tree_general(&trees[0], &female), 12);
//! # Ok::<(), htstree::parser::ParsingError>(())
//! ```
//!
//! ## Example Tree Set
//! ```no_run
//! use htstree::load_tree_set_legacy;
//! use htstree::model::ModelType;
//!
//! let set = load_tree_set_legacy("voice/trees.toml")?;
//! println!("{} duration trees", set.num_trees(ModelType::Dur));
//! # Ok::<(), htstree::error::LoadError>(())
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod search;
pub mod tree_file;

pub use crate::config::TreeFiles;
pub use crate::error::{LoadError, LookupError};
pub use crate::model::{ModelType, Tree, TreeSet};

use crate::model::feature::{FeatureRegistry, ValueNormalizer};
use std::path::Path;

// ============================================================================
// Quick Tree Set API
// ============================================================================
/// Loads all tree files configured in `files` with inline feature tests.
///
/// See [`TreeSet::load`] for details.
pub fn load_tree_set<R, N>(files: &TreeFiles, registry: &R, normalizer: &N) -> Result<TreeSet, LoadError>
where
    R: FeatureRegistry + ?Sized,
    N: ValueNormalizer + ?Sized,
{
    let mut set = TreeSet::new();
    set.load(files, registry, normalizer)?;
    Ok(set)
}

/// Reads a TOML configuration and loads all tree files it names with
/// question-based tests.
///
/// See [`TreeFiles::from_file`] and [`TreeSet::load_legacy`] for details.
pub fn load_tree_set_legacy<P: AsRef<Path>>(config: P) -> Result<TreeSet, LoadError> {
    let files = TreeFiles::from_file(config)?;
    let mut set = TreeSet::new();
    set.load_legacy(&files)?;
    Ok(set)
}
