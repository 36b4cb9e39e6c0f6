//! In-memory implementation of byte source for parser.

use crate::parser::byte_source::ByteSource;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================$=
/// An in-memory byte source that owns its data.
///
/// Tree description files of a voice are small (a few hundred kilobytes),
/// so this is the default source.
pub struct InMemoryByteSource {
    /// The owned byte data being parsed
    input: Vec<u8>,
    /// Offset of the first byte not yet read
    pos: usize,
}

impl InMemoryByteSource {
    /// Creates a new in-memory byte source from a Vec of bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            input: bytes,
            pos: 0,
        }
    }

    /// Reads the entire file into memory.
    ///
    /// The file handle is closed before this returns.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<InMemoryByteSource> {
        let mut contents = Vec::new();
        let mut file = File::open(path)?;
        file.read_to_end(&mut contents)?;
        Ok(Self::from_vec(contents))
    }
}

impl ByteSource for InMemoryByteSource {
    fn read_line_into(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return Ok(false);
        }
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        buf.extend_from_slice(&rest[..len]);
        self.pos += len;
        Ok(true)
    }
}
