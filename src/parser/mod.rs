//! Basic low-level, line-oriented byte parser functionality.
pub(crate) mod buffered_byte_source;
pub mod byte_parser;
pub(crate) mod byte_source;
pub(crate) mod in_memory_byte_source;
pub mod parsing_error;

pub use byte_parser::ByteParser;
pub use parsing_error::{ParsingError, ParsingErrorType};
