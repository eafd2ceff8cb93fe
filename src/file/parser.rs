//! Low-level byte stream parser for class file decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data parser
//! used for reading the class file header, the constant pool and the member and attribute tables.
//! All operations are bounds-checked, and the stream is consumed strictly front to back.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::pos`] - Get current position
//! - [`crate::file::parser::Parser::remaining`] - Bytes left to consume
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_be`] - Read primitive types (big-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a run of raw bytes
//! - [`crate::file::parser::Parser::read_prefixed_bytes`] - Borrow a `u2` length-prefixed run
//!
//! # Usage Examples
//!
//! ```rust
//! use classreader::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x03, b'a', b'b', b'c'];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
//! assert_eq!(parser.read_prefixed_bytes()?, b"abc");
//! assert!(!parser.has_more_data());
//! # Ok::<(), classreader::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, ClassIO},
    Result,
};

/// A cursor over a byte slice that decodes big-endian class file structures.
///
/// `Parser` maintains an internal position cursor and provides bounds checking to prevent
/// buffer overruns when reading malformed or truncated data. A failed read never moves the
/// cursor.
///
/// # Examples
///
/// ```rust
/// use classreader::Parser;
///
/// let data = [0x00, 0x01, 0x00, 0x02];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_be::<u16>()?, 1);
/// assert_eq!(parser.read_be::<u16>()?, 2);
/// assert!(parser.read_be::<u8>().is_err());
/// # Ok::<(), classreader::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read a value of type `T` in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a `u2` length followed by that many bytes, as used by `CONSTANT_Utf8` entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the length or the payload is truncated.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let length = self.read_be::<u16>()? as usize;
        match self.read_bytes(length) {
            Ok(bytes) => Ok(bytes),
            Err(error) => {
                self.position = start;
                Err(error)
            }
        }
    }

    fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_sequence() {
        let data = [0x00, 0x2A, 0xFF, 0xFF, 0xFF, 0xFE, 0x07];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.len(), 7);
        assert_eq!(parser.read_be::<u16>().unwrap(), 42);
        assert_eq!(parser.read_be::<i32>().unwrap(), -2);
        assert_eq!(parser.pos(), 6);
        assert_eq!(parser.remaining(), 1);
        assert_eq!(parser.read_be::<u8>().unwrap(), 7);
        assert!(!parser.has_more_data());
        assert!(matches!(parser.read_be::<u8>(), Err(Error::OutOfBounds)));
    }

    #[test]
    fn prefixed_bytes() {
        let data = [0x00, 0x02, b'h', b'i', 0x00, 0x05, b'x'];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_prefixed_bytes().unwrap(), b"hi");

        // Truncated payload leaves the cursor in front of the length
        assert!(matches!(
            parser.read_prefixed_bytes(),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(parser.pos(), 4);
    }

    #[test]
    fn empty() {
        let parser = Parser::new(&[]);
        assert!(parser.is_empty());
        assert_eq!(parser.remaining(), 0);
    }
}
