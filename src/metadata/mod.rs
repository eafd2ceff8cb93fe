//! Class file metadata parsing and representation.
//!
//! This module contains everything between the raw bytes of a class file and the
//! [`descriptor::TypeDescriptor`] handed to the class loading subsystem.
//!
//! # Key Components
//!
//! - [`reader`] - [`crate::ClassFileReader`], header checks and the structural assembler
//! - [`constpool`] - Packed constant pool entries and the three-pass resolver
//! - [`runtime`] - Interning services shared across reads
//! - [`attributes`] - Attribute records and the class attribute dispatcher
//! - [`members`] - Field and method records and their readers
//! - [`annotations`] - Annotation blocks
//! - [`descriptor`] - The resulting type descriptor
//! - [`config`] - Reader configuration
//!
//! # Examples
//!
//! ```rust,no_run
//! use classreader::{ClassFileReader, ReaderConfig, Runtime};
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(Runtime::new());
//! let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
//!
//! let expected = runtime.type_for_class_name("pkg/Widget")?;
//! let widget = reader.read_class(expected, &std::fs::read("pkg/Widget.class")?)?;
//!
//! for field in &widget.fields {
//!     println!("{} {}", field.descriptor, field.name);
//! }
//! if let Some(source) = &widget.source_name {
//!     println!("compiled from {}", source);
//! }
//! # Ok::<(), classreader::Error>(())
//! ```

/// Annotation blocks
pub mod annotations;
/// Attribute records and the class attribute dispatcher
pub mod attributes;
/// Reader configuration
pub mod config;
/// The resolved constant pool
pub mod constpool;
/// The type descriptor produced by a read
pub mod descriptor;
/// Field and method records
pub mod members;
/// The class file reader
pub mod reader;
/// Shared runtime services
pub mod runtime;
