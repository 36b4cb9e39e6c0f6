//! Collaborators used to resolve and evaluate feature tests.
//!
//! The tree loader depends on three capabilities it does not implement itself:
//! - [FeatureRegistry]: maps feature names to indices and categorical values to byte codes,
//! - [ValueNormalizer]: undoes the escaping of punctuation and phone symbols in tree files,
//! - [FeatureVector]: byte-coded feature values of one synthesis unit, read during search.
//!
//! Simple implementations are provided: [FeatureDefinition], [EscapeTables]
//! (with [SymbolTable]) and [Verbatim], and [FeatureVector] for byte slices.

use std::collections::HashMap;

// =#========================================================================#=
// FEATURE REGISTRY
// =#========================================================================T=
/// Registry of the features a voice was trained with.
pub trait FeatureRegistry {
    /// Index of the feature called `name`, or `None` if unknown.
    fn feature_index(&self, name: &str) -> Option<usize>;

    /// Returns whether the feature at `index` is a bounded categorical (byte) feature.
    fn is_byte_feature(&self, index: usize) -> bool;

    /// Byte code of `value` for the byte feature at `index`, or `None` if unknown.
    fn byte_value(&self, index: usize, value: &str) -> Option<u8>;
}

// =#========================================================================#=
// FEATURE VECTOR
// =#========================================================================T=
/// Byte-coded feature values of one synthesis unit.
pub trait FeatureVector {
    /// Byte value of the feature at `index`, or `None` if the vector is
    /// too short.
    fn byte_feature(&self, index: usize) -> Option<u8>;
}

impl FeatureVector for [u8] {
    #[inline]
    fn byte_feature(&self, index: usize) -> Option<u8> {
        self.get(index).copied()
    }
}

impl FeatureVector for Vec<u8> {
    #[inline]
    fn byte_feature(&self, index: usize) -> Option<u8> {
        self.as_slice().byte_feature(index)
    }
}

// =#========================================================================#=
// VALUE NORMALIZER
// =#========================================================================T=
/// Undoes the escaping of feature values written to tree files.
///
/// Symbols that collide with the tree file syntax (punctuation marks,
/// some phone symbols) are stored under an alias.
pub trait ValueNormalizer {
    /// Original value of a punctuation-class feature value.
    fn unescape_punctuation(&self, value: &str) -> String;

    /// Original value of a phone-class feature value.
    fn unescape_phone(&self, value: &str) -> String;
}

/// Escaping class of a feature, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
    Punctuation,
    Phone,
    Other,
}

impl FeatureClass {
    /// Classifies a feature by name.
    ///
    /// # Example
    /// ```
    /// use htstree::model::FeatureClass;
    ///
    /// assert_eq!(FeatureClass::of("next_punctuation"), FeatureClass::Punctuation);
    /// assert_eq!(FeatureClass::of("prev_phoneme"), FeatureClass::Phone);
    /// assert_eq!(FeatureClass::of("gender"), FeatureClass::Other);
    /// ```
    pub fn of(name: &str) -> Self {
        if name.contains("sentence_punc")
            || name.contains("prev_punctuation")
            || name.contains("next_punctuation")
        {
            FeatureClass::Punctuation
        } else if name.contains("phoneme") {
            FeatureClass::Phone
        } else {
            FeatureClass::Other
        }
    }
}

/// Normalizes `value` of feature `name` according to its [FeatureClass].
pub fn normalize_value<N: ValueNormalizer + ?Sized>(
    normalizer: &N,
    name: &str,
    value: &str,
) -> String {
    match FeatureClass::of(name) {
        FeatureClass::Punctuation => normalizer.unescape_punctuation(value),
        FeatureClass::Phone => normalizer.unescape_phone(value),
        FeatureClass::Other => value.to_string(),
    }
}

/// [ValueNormalizer] that leaves every value as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl ValueNormalizer for Verbatim {
    fn unescape_punctuation(&self, value: &str) -> String {
        value.to_string()
    }

    fn unescape_phone(&self, value: &str) -> String {
        value.to_string()
    }
}

// =#========================================================================#=
// SYMBOL TABLE
// =#========================================================================$=
/// Mapping from escaped aliases to original symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    originals: HashMap<String, String>,
}

impl SymbolTable {
    /// Creates a table from `(alias, original)` pairs.
    pub fn from_pairs<I, A, O>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, O)>,
        A: Into<String>,
        O: Into<String>,
    {
        SymbolTable {
            originals: pairs
                .into_iter()
                .map(|(a, o)| (a.into(), o.into()))
                .collect(),
        }
    }

    /// Aliases used for punctuation marks in tree files.
    pub fn punctuation() -> Self {
        Self::from_pairs([
            ("pt", "."),
            ("cm", ","),
            ("op", "("),
            ("cp", ")"),
            ("in", "?"),
            ("ex", "!"),
            ("sc", ";"),
            ("cl", ":"),
            ("dq", "\""),
            ("qt", "'"),
            ("dt", "-"),
        ])
    }

    /// Parses a table from text with one `alias original` pair per line.
    ///
    /// Blank lines and lines starting with `#` are skipped, as are lines
    /// with fewer than two fields.
    pub fn parse(text: &str) -> Self {
        Self::from_pairs(text.lines().filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut fields = line.split_whitespace();
            Some((fields.next()?, fields.next()?))
        }))
    }

    /// Original symbol for `alias`, or `alias` itself if it is not in the table.
    pub fn unescape(&self, alias: &str) -> String {
        self.originals
            .get(alias)
            .cloned()
            .unwrap_or_else(|| alias.to_string())
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }
}

/// [ValueNormalizer] backed by one [SymbolTable] per escaping class.
#[derive(Debug, Clone, PartialEq)]
pub struct EscapeTables {
    pub punctuation: SymbolTable,
    pub phones: SymbolTable,
}

impl EscapeTables {
    /// Default punctuation aliases plus the given phone aliases.
    pub fn with_phones(phones: SymbolTable) -> Self {
        EscapeTables {
            punctuation: SymbolTable::punctuation(),
            phones,
        }
    }
}

impl Default for EscapeTables {
    fn default() -> Self {
        Self::with_phones(SymbolTable::default())
    }
}

impl ValueNormalizer for EscapeTables {
    fn unescape_punctuation(&self, value: &str) -> String {
        self.punctuation.unescape(value)
    }

    fn unescape_phone(&self, value: &str) -> String {
        self.phones.unescape(value)
    }
}

// =#========================================================================#=
// FEATURE DEFINITION
// =#========================================================================$=
/// In-memory [FeatureRegistry].
///
/// Byte features have an ordered list of values, the byte code of a value
/// is its position in that list. Other features are known by name only.
///
/// # Example
/// ```
/// use htstree::model::{FeatureDefinition, FeatureRegistry};
///
/// let features = FeatureDefinition::new()
///     .with_byte_feature("phone", &["0", "a", "b"])
///     .with_byte_feature("gender", &["female", "male"])
///     .with_continuous_feature("f0_mean");
///
/// let gender = features.feature_index("gender").unwrap();
/// assert_eq!(features.byte_value(gender, "male"), Some(1));
/// assert!(!features.is_byte_feature(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeatureDefinition {
    names: Vec<String>,
    indices: HashMap<String, usize>,
    values: Vec<Option<Vec<String>>>,
}

impl FeatureDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a byte feature with its values (at most 256 are addressable).
    pub fn with_byte_feature(mut self, name: &str, values: &[&str]) -> Self {
        self.push(name, Some(values.iter().map(|v| v.to_string()).collect()));
        self
    }

    /// Appends a feature that is not byte valued.
    pub fn with_continuous_feature(mut self, name: &str) -> Self {
        self.push(name, None);
        self
    }

    fn push(&mut self, name: &str, values: Option<Vec<String>>) {
        self.indices.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
        self.values.push(values);
    }

    pub fn num_features(&self) -> usize {
        self.names.len()
    }

    /// Name of the feature at `index`.
    pub fn feature_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Builds a feature vector with the given `(name, value)` assignments,
    /// all other features set to byte `0`.
    ///
    /// Returns `None` if a name or value is unknown or not byte valued.
    pub fn encode(&self, assignments: &[(&str, &str)]) -> Option<Vec<u8>> {
        let mut vector = vec![0u8; self.num_features()];
        for (name, value) in assignments {
            let index = self.feature_index(name)?;
            vector[index] = self.byte_value(index, value)?;
        }
        Some(vector)
    }
}

impl FeatureRegistry for FeatureDefinition {
    fn feature_index(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    fn is_byte_feature(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    fn byte_value(&self, index: usize, value: &str) -> Option<u8> {
        let values = self.values.get(index)?.as_ref()?;
        let position = values.iter().position(|v| v == value)?;
        u8::try_from(position).ok()
    }
}
