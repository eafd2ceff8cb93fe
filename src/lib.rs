// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # classreader
//!
//! A reader for the binary class file format of the Java virtual machine, built for the class
//! loading path of a managed runtime. `classreader` turns the bytes of one class file into a
//! fully resolved [`TypeDescriptor`]: every constant pool entry is interned into shared runtime
//! tables, the super type and interfaces are resolved, and fields and methods carry stable
//! member reference ids.
//!
//! ## Features
//!
//! - **Three-pass constant pool resolution** - Forward and backward references in any order
//! - **Compact constant pools** - Every resolved entry is one 32-bit tagged word
//! - **Shared interning** - Names, literals, types and members are deduplicated across classes
//! - **Concurrent loading** - Independent classes are read in parallel against one runtime
//! - **Strict validation** - Malformed input fails with a precise error, never a partial result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use classreader::prelude::*;
//! use std::{path::Path, sync::Arc};
//!
//! let runtime = Arc::new(Runtime::new());
//! let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
//!
//! let expected = runtime.type_for_class_name("pkg/Widget")?;
//! let widget = reader.read_class_from_file(expected, Path::new("pkg/Widget.class"))?;
//! println!("{}: {} methods", widget.name(), widget.methods.len());
//! # Ok::<(), classreader::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::constpool`] - Tagged entries and the three-pass resolver
//! - [`metadata::runtime`] - Interning services shared by all reads ([`Runtime`])
//! - [`metadata::reader`] - [`ClassFileReader`], the structural assembler
//! - [`metadata::attributes`] - Attribute records and the class attribute dispatcher
//! - [`metadata::members`] - Field and method sub-readers
//! - [`metadata::annotations`] - Annotation blocks
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Every error is fatal to the read that
//! produced it:
//!
//! ```rust,no_run
//! use classreader::{ClassFileReader, Error, ReaderConfig, Runtime};
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(Runtime::new());
//! let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
//! let expected = runtime.type_for_class_name("pkg/Gadget")?;
//! let data = std::fs::read("pkg/Gadget.class")?;
//!
//! match reader.read_class(expected, &data) {
//!     Ok(gadget) => println!("Loaded {}", gadget.name()),
//!     Err(Error::IdentityMismatch { found, .. }) => println!("File contains {}", found),
//!     Err(Error::UnsupportedVersion { major, minor }) => println!("Version {}.{}", major, minor),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # Ok::<(), classreader::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never installs a logger.
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run classfile --release
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use classreader::prelude::*;
///
/// let runtime = Runtime::new();
/// let widget = runtime.type_for_class_name("pkg/Widget")?;
/// # Ok::<(), classreader::Error>(())
/// ```
pub mod prelude;

/// Class file metadata: constant pools, runtime services, members, attributes and the reader.
pub mod metadata;

/// `classreader` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `classreader` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the variants.
pub use error::Error;

/// Entry point for reading class files
pub use metadata::reader::ClassFileReader;

/// Reader configuration
pub use metadata::config::{ReaderConfig, SupportedVersions};

/// Shared runtime services
pub use metadata::runtime::Runtime;

/// The result of reading one class
pub use metadata::descriptor::{ClassModifiers, TypeDescriptor};

/// The resolved constant pool
pub use metadata::constpool::ConstantPool;

/// Low-level byte access
pub use file::{parser::Parser, File};
