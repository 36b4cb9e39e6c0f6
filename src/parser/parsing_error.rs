//! Error types for the tree description parser.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for representing
//! and reporting format and lookup errors found while parsing a tree file.

use crate::model::NodeId;
use std::io::ErrorKind;
use thiserror::Error;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================€=
/// Error types that can occur while parsing a tree description file.
#[derive(Error, PartialEq, Debug, Clone)]
pub enum ParsingErrorType {
    #[error("IO error - {1}")]
    IoError(ErrorKind, String),
    #[error("No trees found")]
    NoTrees,
    #[error("Invalid state header `{0}`")]
    InvalidStateHeader(String),
    #[error("Expected `{{` to open the tree of state {0}")]
    MissingOpenBrace(usize),
    #[error("Tree of state {0} is not closed by `}}`")]
    UnclosedTree(usize),
    #[error("Node line is missing its {0}")]
    MissingToken(&'static str),
    #[error("Invalid integer `{0}`")]
    InvalidInteger(String),
    #[error("Invalid leaf `{0}`, leaf ids start at 1")]
    InvalidLeafId(String),
    #[error("Invalid feature test `{0}`, expected `name=value`")]
    InvalidFeatureTest(String),
    #[error("Node {0} is defined before any node refers to it")]
    UnresolvedNode(NodeId),
    #[error("Node {0} is defined twice")]
    DuplicateNode(NodeId),
    #[error("Node {0} is referenced but never defined")]
    UndefinedNode(NodeId),
    #[error("Node {0} is part of a reference cycle")]
    CyclicReference(NodeId),
    #[error("Unknown feature `{0}`")]
    UnknownFeature(String),
    #[error("Feature `{0}` is not byte valued, only byte features are supported")]
    UnsupportedValueType(String),
    #[error("Unknown value `{value}` for feature `{feature}`")]
    UnknownFeatureValue { feature: String, value: String },
    #[error("Cannot find question `{0}`")]
    QuestionNotFound(String),
    #[error("Invalid question declaration - {0}")]
    InvalidQuestion(String),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error with contextual information (line number and offending text).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at line {line}{}", format_context(.context))]
pub struct ParsingError {
    kind: ParsingErrorType,
    line: usize,
    context: String,
}

fn format_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context: {context}")
    }
}

impl ParsingError {
    /// Create a [ParsingError] for a line that has already been read.
    pub fn on_line(kind: ParsingErrorType, line: usize, text: &str) -> Self {
        Self {
            kind,
            line,
            context: text.trim().to_string(),
        }
    }

    /// Create a [ParsingError] without parser context (e.g. for builder errors)
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            line: 0,
            context: String::new(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the (1-based) line where the error occurred, `0` if unknown
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the offending text, may be empty
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError::without_context(ParsingErrorType::IoError(err.kind(), err.to_string()))
    }
}
