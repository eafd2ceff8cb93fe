use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! constant_pool_error {
    ($msg:expr) => {
        crate::Error::ConstantPool {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::ConstantPool {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! internal_error {
    ($msg:expr) => {
        crate::Error::Internal {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Internal {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant is fatal to the single parse attempt that produced it. Nothing is retried
/// internally and no partially built descriptor is ever handed out; the caller decides whether
/// to abort, mark the type as erroneous, or escalate.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::BadMagic`] - The stream does not start with the class file magic
/// - [`Error::UnsupportedVersion`] - The major/minor version is outside the configured range
/// - [`Error::ConstantPool`] - Bad tag, invalid string payload or wrong entry kind
/// - [`Error::OutOfBounds`] - A read ran past the end of the input
/// - [`Error::IdentityMismatch`] - The class file describes another type than the one requested
/// - [`Error::TruncatedAttribute`] - An attribute's declared length does not match its body
/// - [`Error::Malformed`] - Any other structural inconsistency
///
/// ## Environment Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::LoadingDisabled`] - Class loading has been switched off in the configuration
///
/// ## Resolver Bugs
/// - [`Error::Internal`] - A state that well-formed or malformed input alone cannot produce
///
/// # Examples
///
/// ```rust
/// use classreader::{ClassFileReader, Error, ReaderConfig, Runtime};
/// use std::sync::Arc;
///
/// let runtime = Arc::new(Runtime::new());
/// let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
/// let expected = runtime.type_for_class_name("pkg/Widget")?;
///
/// match reader.read_class(expected, &[0xCA, 0xFE, 0xBA, 0xBF]) {
///     Err(Error::BadMagic(magic)) => println!("not a class file: {:08x}", magic),
///     Err(e) => println!("other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// # Ok::<(), classreader::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The stream does not start with `0xCAFEBABE`.
    ///
    /// The associated value is the magic that was actually found.
    #[error("Bad magic number - {0:08x}")]
    BadMagic(u32),

    /// The class file version is not accepted by the active configuration.
    ///
    /// Raised right after the header is read and before any constant pool byte is consumed.
    #[error("Unsupported class file version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version found in the header
        major: u16,
        /// Minor version found in the header
        minor: u16,
    },

    /// The constant pool is malformed.
    ///
    /// Covers unknown tag bytes, strings that are not valid modified UTF-8, indices that are out
    /// of range and entries that are not of the kind their user requires.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Bad constant pool - {file}:{line}: {message}")]
    ConstantPool {
        /// The message to be printed for the ConstantPool error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The class file describes a different type than the caller asked for.
    ///
    /// e.g. a file named after `pkg/Gadget` that actually contains `pkg/Widget`.
    #[error("Expected class \"{expected}\" but found \"{found}\"")]
    IdentityMismatch {
        /// Name of the type the caller expected
        expected: String,
        /// Name of the type the class file declares
        found: String,
    },

    /// An attribute's declared length disagrees with the bytes behind it: it runs past the
    /// end of the input, or a fixed-size body consumed fewer bytes than declared.
    #[error("Attribute '{name}' declares {declared} bytes but {available} were usable")]
    TruncatedAttribute {
        /// Name of the attribute, as decoded from the constant pool
        name: String,
        /// Length declared in the attribute header
        declared: usize,
        /// Bytes left in the input, or bytes the body actually consumed
        available: usize,
    },

    /// The file is damaged and could not be parsed.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Class loading is disabled in the active configuration.
    ///
    /// The associated value names the type whose load was refused.
    #[error("Class loading disabled - {0}")]
    LoadingDisabled(String),

    /// The resolver reached a state that indicates a bug rather than bad input.
    ///
    /// Dereferencing the filler slot behind a `Long`/`Double` entry, or an id that does not fit
    /// the 29-bit payload of a packed entry, end up here.
    #[error("Internal consistency failure - {file}:{line}: {message}")]
    Internal {
        /// The message to be printed for the Internal error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}

impl Error {
    /// Returns `true` if this error points at a resolver bug instead of malformed input.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal { .. })
    }
}
