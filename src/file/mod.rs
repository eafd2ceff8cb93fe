//! Access to the raw bytes of a class file.
//!
//! A class file is always consumed as one contiguous byte slice. [`File`] owns that slice,
//! memory-mapped from disk, and the [`crate::file::parser::Parser`] walks it front to back.
//!
//! # Key Components
//!
//! - [`File`] - Owner of the class file bytes
//! - [`Backend`] - Abstraction over the data source
//! - [`crate::file::parser::Parser`] - Cursor used by every decoder in this crate
//! - [`crate::file::io`] - Bounds-checked big-endian primitive reads

pub mod io;
pub mod parser;

mod physical;

use std::path::Path;

use crate::Result;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of class file data. All implementations must be
/// thread-safe.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// A loaded class file.
///
/// # Examples
///
/// ```rust,no_run
/// use classreader::File;
/// use std::path::Path;
///
/// let file = File::from_file(Path::new("pkg/Widget.class"))?;
/// assert_eq!(&file.data()[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
/// # Ok::<(), classreader::Error>(())
/// ```
pub struct File {
    /// The underlying mapped file.
    data: Box<dyn Backend>,
}

impl File {
    /// Loads a class file from the given path. The file is memory-mapped.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the class file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::OutOfBounds`] if it is empty.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;
        Self::load(Box::new(input))
    }

    fn load(data: Box<dyn Backend>) -> Result<File> {
        if data.len() == 0 {
            return Err(out_of_bounds_error!());
        }

        Ok(File { data })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file holds no bytes. Never the case for a successfully loaded file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the complete file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }
}
