//! # classreader Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the classreader library. Import this module to get quick access to the essential
//! types for reading class files.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classreader operations
pub use crate::Error;

/// The result type used throughout classreader
pub use crate::Result;

/// Reader configuration and accepted versions
pub use crate::{ReaderConfig, SupportedVersions};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for reading class files
pub use crate::ClassFileReader;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Runtime Services
// ================================================================================================

/// The bundle of shared services and its default implementations
pub use crate::metadata::runtime::{
    Atom, AtomId, AtomTable, Atoms, LiteralAllocator, LoaderId, MemberKind, MemberRefId,
    MemberReference, MemberReferences, MemberRegistry, Runtime, Statics, TypeRc, TypeRefId,
    TypeReference, TypeReferences, TypeRegistry,
};

// ================================================================================================
// Constant Pool
// ================================================================================================

/// Resolved constant pool and its entries
pub use crate::metadata::constpool::{ConstantPool, Entry, EntryTag, PackedEntry, Slot};

// ================================================================================================
// Type Descriptors
// ================================================================================================

/// The result of reading one class
pub use crate::metadata::descriptor::{ClassModifiers, TypeDescriptor};

/// Fields and methods
pub use crate::metadata::members::{
    Code, ExceptionHandler, FieldModifiers, FieldReader, FieldRecord, MethodModifiers,
    MethodReader, MethodRecord,
};

/// Annotations
pub use crate::metadata::annotations::{Annotation, AnnotationReader, ElementPair, ElementValue};
