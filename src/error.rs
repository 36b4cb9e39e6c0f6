//! Errors of loading tree sets and of question lookup.
//!
//! Format errors inside a tree file are [ParsingError]s; [LoadError]
//! attaches the file and model type they belong to.

use crate::model::ModelType;
use crate::parser::ParsingError;
use std::path::PathBuf;
use thiserror::Error;

/// Error while loading the trees of a voice.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid {model_type} tree file `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        model_type: ModelType,
        #[source]
        source: ParsingError,
    },
    #[error("No tree file configured for required model type {0}")]
    MissingRequired(ModelType),
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Error of the name-based question lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Cannot find question `{name}` among the {model_type} questions")]
    QuestionNotFound { model_type: ModelType, name: String },
}
