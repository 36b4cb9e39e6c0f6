//! Buffered reader implementation of byte source for parser.
//!
//! This module provides [BufferedByteSource], which wraps a file in a [BufReader]
//! for streaming I/O. The file is closed when the source is dropped, which
//! happens on every exit path of a load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parser::byte_source::ByteSource;

// =#========================================================================#=
// BUFFERED BYTE SOURCE
// =#========================================================================$=
/// A buffered byte source for streaming files.
pub struct BufferedByteSource {
    /// Underlying reader of file, handles getting chunks from file
    reader: BufReader<File>,
}

impl BufferedByteSource {
    /// Creates a new buffered byte source from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened. Read errors, e.g. for
    /// a directory, are only reported by [ByteSource::read_line_into].
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<BufferedByteSource> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
        })
    }
}

impl ByteSource for BufferedByteSource {
    fn read_line_into(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool> {
        Ok(self.reader.read_until(b'\n', buf)? > 0)
    }
}

// =#========================================================================#=
// TESTS - BUFFERED BYTE SOURCE
// =#========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_buffered_reads_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "QS a {{ \"x\" }}\n{{*}}[2]").unwrap();

        let mut source = BufferedByteSource::from_file(file.path()).unwrap();
        let mut buf = Vec::new();
        assert!(source.read_line_into(&mut buf).unwrap());
        assert_eq!(buf, b"QS a { \"x\" }\n");

        buf.clear();
        assert!(source.read_line_into(&mut buf).unwrap());
        assert_eq!(buf, b"{*}[2]");
        assert!(!source.read_line_into(&mut buf).unwrap());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(BufferedByteSource::from_file("does/not/exist.inf").is_err());
    }

    #[test]
    fn test_read_error_is_not_eof() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut source = BufferedByteSource::from_file(dir.path()).unwrap();
        assert!(source.read_line_into(&mut Vec::new()).is_err());
    }
}
