//! Structs and logic to parse tree description files.
//!
//! This module provides the [TreeFileParser], generic over a [TestResolver]
//! that turns the second token of a node line into a [NodeTest]:
//! - [FeatureTestResolver] for inline `name=value` byte-feature tests,
//! - [QuestionTestResolver] for named questions declared in the file (legacy).

use crate::model::feature::{FeatureRegistry, ValueNormalizer, normalize_value};
use crate::model::question::find_question;
use crate::model::{FeatureTest, LeafId, NodeId, NodeTest, Question, Target, Tree, TreeBuilder};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::{ParsingError, ParsingErrorType};
use crate::tree_file::defs::*;
use tracing::debug;

// =#========================================================================#=
// TEST RESOLVER (Trait)
// =#========================================================================T=
/// Resolves the test token of node lines and receives question declarations.
pub trait TestResolver {
    /// Turns the test token of a node line into a [NodeTest].
    fn resolve(&mut self, token: &str) -> Result<NodeTest, ParsingErrorType>;

    /// Handles a `QS ...` question declaration line. Ignored by default.
    fn declare_question(&mut self, _line: &str) -> Result<(), ParsingErrorType> {
        Ok(())
    }
}

// =#========================================================================#=
// FEATURE TEST RESOLVER
// =#========================================================================$=
/// Resolves `name=value` tokens through a [FeatureRegistry] into byte tests.
///
/// Question declarations are skipped, the test is inlined in every node.
pub struct FeatureTestResolver<'a, R: ?Sized, N: ?Sized> {
    registry: &'a R,
    normalizer: &'a N,
}

impl<'a, R, N> FeatureTestResolver<'a, R, N>
where
    R: FeatureRegistry + ?Sized,
    N: ValueNormalizer + ?Sized,
{
    pub fn new(registry: &'a R, normalizer: &'a N) -> Self {
        FeatureTestResolver {
            registry,
            normalizer,
        }
    }
}

impl<R, N> TestResolver for FeatureTestResolver<'_, R, N>
where
    R: FeatureRegistry + ?Sized,
    N: ValueNormalizer + ?Sized,
{
    fn resolve(&mut self, token: &str) -> Result<NodeTest, ParsingErrorType> {
        let (name, raw_value) = token
            .split_once(TEST_SEPARATOR)
            .ok_or_else(|| ParsingErrorType::InvalidFeatureTest(token.to_string()))?;

        let feature_index = self
            .registry
            .feature_index(name)
            .ok_or_else(|| ParsingErrorType::UnknownFeature(name.to_string()))?;
        if !self.registry.is_byte_feature(feature_index) {
            return Err(ParsingErrorType::UnsupportedValueType(name.to_string()));
        }

        let value = normalize_value(self.normalizer, name, raw_value);
        let byte = self.registry.byte_value(feature_index, &value).ok_or_else(|| {
            ParsingErrorType::UnknownFeatureValue {
                feature: name.to_string(),
                value: value.clone(),
            }
        })?;

        Ok(NodeTest::Feature(FeatureTest {
            feature_index,
            value: byte,
        }))
    }
}

// =#========================================================================#=
// QUESTION TEST RESOLVER
// =#========================================================================$=
/// Collects question declarations and resolves test tokens as question names.
#[derive(Debug, Default)]
pub struct QuestionTestResolver {
    questions: Vec<Question>,
}

impl QuestionTestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Questions declared so far, in file order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl TestResolver for QuestionTestResolver {
    fn resolve(&mut self, token: &str) -> Result<NodeTest, ParsingErrorType> {
        find_question(&self.questions, token)
            .map(NodeTest::Question)
            .ok_or_else(|| ParsingErrorType::QuestionNotFound(token.to_string()))
    }

    fn declare_question(&mut self, line: &str) -> Result<(), ParsingErrorType> {
        self.questions.push(Question::parse_declaration(line)?);
        Ok(())
    }
}

// =#========================================================================#=
// TREE FILE PARSER
// =#========================================================================$=
/// Parser for tree description files.
///
/// # Format
/// ```text
/// QS C-Vowel { "-a+","-i+" }      optional question declarations
/// {*}[2]                          state header, starts the tree of state 2
/// {
///    0 vc=+  -1  "dur_s2_3"       node id, test, no target, yes target
///   -1 gender=male "dur_s2_1" "dur_s2_2"
/// }
/// {*}[3]
/// ...
/// ```
/// - Node id `0` is the root. Other node lines define nodes that an earlier
///   line referred to as a `-<id>` target.
/// - A target `-<id>` refers to another node, any other target is a leaf:
///   the number after its last `_` (trailing quote ignored).
/// - Lines outside of trees that are neither headers nor questions are ignored.
///
/// # Example
/// ```
/// use htstree::model::{FeatureDefinition, Verbatim};
/// use htstree::parser::ByteParser;
/// use htstree::tree_file::{FeatureTestResolver, TreeFileParser};
///
/// let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
/// let input = "{*}[2]\n{\n0 gender=male \"dur_s2_12\" \"dur_s2_7\"\n}\n";
///
/// let mut parser = TreeFileParser::new(FeatureTestResolver::new(&features, &Verbatim));
/// let trees = parser.parse_all(ByteParser::for_str(input)).unwrap();
/// assert_eq!(trees.len(), 1);
/// assert_eq!(trees[0].state(), 2);
/// ```
pub struct TreeFileParser<T: TestResolver> {
    resolver: T,
}

impl<T: TestResolver> TreeFileParser<T> {
    pub fn new(resolver: T) -> Self {
        TreeFileParser { resolver }
    }

    /// Consumes the parser and returns its resolver.
    pub fn into_resolver(self) -> T {
        self.resolver
    }

    /// Parses all trees until EOF.
    ///
    /// # Returns
    /// * `Ok(Vec<Tree>)` - All trees in file order (at least one)
    /// * `Err(ParsingError)` - On the first format or lookup error, or
    ///   [ParsingErrorType::NoTrees] if the input contains no tree
    pub fn parse_all<B: ByteSource>(
        &mut self,
        mut byte_parser: ByteParser<B>,
    ) -> Result<Vec<Tree>, ParsingError> {
        let mut trees = Vec::new();

        while let Some(line) = byte_parser.read_line()? {
            let line_no = byte_parser.line_number();
            if line.contains(STATE_MARKER) {
                let state = parse_state_header(&line)
                    .map_err(|kind| ParsingError::on_line(kind, line_no, &line))?;
                let tree = self.parse_tree(&mut byte_parser, state, &line)?;
                debug!(
                    state,
                    nodes = tree.num_internal(),
                    leaves = tree.num_leaves(),
                    "parsed tree"
                );
                trees.push(tree);
            } else if line.trim_start().starts_with(QUESTION_KEYWORD) {
                self.resolver
                    .declare_question(&line)
                    .map_err(|kind| ParsingError::on_line(kind, line_no, &line))?;
            }
        }

        if trees.is_empty() {
            return Err(ParsingError::on_line(
                ParsingErrorType::NoTrees,
                byte_parser.line_number(),
                "",
            ));
        }
        Ok(trees)
    }

    /// Parses the body of the tree of `state`, `header` line already consumed.
    ///
    /// The tree ends at the first `}` line. Another state header before
    /// that is an error, as the next tree would otherwise be read into
    /// this one (or skipped).
    fn parse_tree<B: ByteSource>(
        &mut self,
        byte_parser: &mut ByteParser<B>,
        state: usize,
        header: &str,
    ) -> Result<Tree, ParsingError> {
        let Some(open) = next_non_blank_line(byte_parser)? else {
            return Err(ParsingError::on_line(
                ParsingErrorType::MissingOpenBrace(state),
                byte_parser.line_number(),
                header,
            ));
        };
        if open.contains(STATE_MARKER) || !open.contains(TREE_OPEN) {
            return Err(ParsingError::on_line(
                ParsingErrorType::MissingOpenBrace(state),
                byte_parser.line_number(),
                &open,
            ));
        }

        let mut builder = TreeBuilder::new(state);
        if open.contains(TREE_CLOSE) {
            return builder.finish().map_err(|kind| {
                ParsingError::on_line(kind, byte_parser.line_number(), &open)
            });
        }
        let mut last = open;
        loop {
            let Some(line) = byte_parser.read_line()? else {
                return Err(ParsingError::on_line(
                    ParsingErrorType::UnclosedTree(state),
                    byte_parser.line_number(),
                    &last,
                ));
            };
            let line_no = byte_parser.line_number();

            if line.contains(STATE_MARKER) {
                return Err(ParsingError::on_line(
                    ParsingErrorType::UnclosedTree(state),
                    line_no,
                    &line,
                ));
            }
            if line.contains(TREE_CLOSE) {
                return builder
                    .finish()
                    .map_err(|kind| ParsingError::on_line(kind, line_no, &line));
            }
            if line.trim().is_empty() {
                continue;
            }

            self.parse_node_line(&mut builder, &line)
                .map_err(|kind| ParsingError::on_line(kind, line_no, &line))?;
            last = line;
        }
    }

    /// Parses `<id> <test> <no> <yes>` and adds the node to the builder.
    fn parse_node_line(
        &mut self,
        builder: &mut TreeBuilder,
        line: &str,
    ) -> Result<(), ParsingErrorType> {
        let mut tokens = line.split_whitespace();
        let mut next_token = |what: &'static str| {
            tokens
                .next()
                .ok_or(ParsingErrorType::MissingToken(what))
        };

        let id = parse_node_id(next_token("node id")?)?;
        if !builder.is_registered(id) {
            return Err(ParsingErrorType::UnresolvedNode(id));
        }
        let test = self.resolver.resolve(next_token("test")?)?;
        let no = parse_target(next_token("no target")?)?;
        let yes = parse_target(next_token("yes target")?)?;

        builder.define(id, test, no, yes)
    }
}

// ============================================================================
// Token helpers (private)
// ============================================================================
fn next_non_blank_line<B: ByteSource>(
    byte_parser: &mut ByteParser<B>,
) -> std::io::Result<Option<String>> {
    while let Some(line) = byte_parser.read_line()? {
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

/// Extracts the state number of a `{*}[<state>]` header line.
fn parse_state_header(line: &str) -> Result<usize, ParsingErrorType> {
    let invalid = || ParsingErrorType::InvalidStateHeader(line.trim().to_string());

    let after_marker = line
        .find(STATE_MARKER)
        .map(|i| &line[i + STATE_MARKER.len()..])
        .ok_or_else(invalid)?;
    let start = after_marker.find(STATE_OPEN).ok_or_else(invalid)?;
    let end = after_marker[start..]
        .find(STATE_CLOSE)
        .map(|e| start + e)
        .ok_or_else(invalid)?;

    after_marker[start + 1..end]
        .trim()
        .parse()
        .map_err(|_| invalid())
}

/// Parses an unsigned decimal made of ASCII digits only (no sign).
fn parse_digits<N: std::str::FromStr>(digits: &str, token: &str) -> Result<N, ParsingErrorType> {
    let invalid = || ParsingErrorType::InvalidInteger(token.to_string());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

/// Parses a node id, ignoring a leading `-`.
fn parse_node_id(token: &str) -> Result<NodeId, ParsingErrorType> {
    let digits = token.strip_prefix(BRANCH_PREFIX).unwrap_or(token);
    parse_digits(digits, token)
}

/// Parses a `-<id>` internal target or a `..._<leaf>"` terminal target.
fn parse_target(token: &str) -> Result<Target, ParsingErrorType> {
    if let Some(digits) = token.strip_prefix(BRANCH_PREFIX) {
        return parse_digits(digits, token).map(Target::Branch);
    }

    let body = token.strip_suffix('"').unwrap_or(token);
    let (_, digits) = body
        .rsplit_once(LEAF_SEPARATOR)
        .ok_or_else(|| ParsingErrorType::InvalidInteger(token.to_string()))?;
    let leaf: u32 = parse_digits(digits, token)?;

    LeafId::new(leaf)
        .map(Target::Leaf)
        .ok_or_else(|| ParsingErrorType::InvalidLeafId(token.to_string()))
}
