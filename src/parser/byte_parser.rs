//! Low-level line reader for line-oriented ASCII text.
//!
//! This module provides [ByteParser], which reads a tree description file
//! line by line while keeping track of line numbers for error reporting.
//! The tree file parser is built on top of it.

use crate::parser::buffered_byte_source::BufferedByteSource;
use crate::parser::byte_source::ByteSource;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use std::path::Path;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A line reader over any [ByteSource] (in-memory or buffered).
///
/// # Features
/// - Line reading with `\n` and `\r\n` line endings
/// - Line counting (1-based) for error messages
/// - Read errors of the source are returned, never taken for the end of data
///
/// # Example
/// ```
/// use htstree::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("{*}[2]\r\n{\n}");
/// assert_eq!(parser.read_line()?.as_deref(), Some("{*}[2]"));
/// assert_eq!(parser.read_line()?.as_deref(), Some("{"));
/// assert_eq!(parser.line_number(), 2);
/// assert_eq!(parser.read_line()?.as_deref(), Some("}"));
/// assert_eq!(parser.read_line()?, None);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
    /// Number of lines read so far, which is also the number of the last line read
    line: usize,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a new [ByteParser] from a string by copying it into a Vec.
    pub fn for_str(input: &str) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.as_bytes().to_vec()))
    }

    /// Creates a new [ByteParser] reading the whole file into memory.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened or read.
    pub fn from_file_in_memory<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::new(InMemoryByteSource::from_file(path)?))
    }
}

impl ByteParser<BufferedByteSource> {
    /// Creates a new [ByteParser] streaming the file through a buffered reader.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened.
    pub fn from_file_buffered<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::new(BufferedByteSource::from_file(path)?))
    }
}

impl<S: ByteSource> ByteParser<S> {
    /// Creates a new [ByteParser] from a byte source.
    pub fn new(source: S) -> Self {
        Self { source, line: 0 }
    }

    /// Reads the next line without its line terminator.
    ///
    /// A trailing `\r` is removed. Bytes are interpreted as UTF-8, invalid
    /// sequences are replaced with the Unicode replacement character.
    ///
    /// # Returns
    /// * `Ok(Some(String))` - The next line (possibly empty)
    /// * `Ok(None)` - If the source is exhausted
    /// * `Err(io::Error)` - If the source cannot be read
    pub fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut bytes = Vec::new();
        if !self.source.read_line_into(&mut bytes)? {
            return Ok(None);
        }
        self.line += 1;

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Returns the number of the line read last (1-based), or `0` before the first read.
    pub fn line_number(&self) -> usize {
        self.line
    }
}
