//! Byte source abstractions for parser.
//!
//! This module provides the [ByteSource] trait, implemented by
//! [InMemoryByteSource](crate::parser::in_memory_byte_source::InMemoryByteSource)
//! and [BufferedByteSource](crate::parser::buffered_byte_source::BufferedByteSource).

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================T=
/// Trait defining the interface for different byte sources used by
/// [ByteParser](crate::parser::ByteParser).
///
/// This trait abstracts over different ways of accessing byte data:
/// - In-memory byte vectors (small tree files, strings in tests)
/// - Buffered reading from files (`BufReader<File>`)
pub trait ByteSource {
    /// Appends the bytes up to and including the next `\n` to `buf`
    /// (or up to the end of data if there is no further `\n`).
    ///
    /// # Returns
    /// * `Ok(true)` - If bytes were appended
    /// * `Ok(false)` - If no bytes were left
    /// * `Err(io::Error)` - If reading the underlying file failed
    fn read_line_into(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool>;
}
