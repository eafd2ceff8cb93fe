//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use classreader::{ClassFileReader, ReaderConfig, Result, Runtime, TypeDescriptor};

#[path = "../../src/test/classfile.rs"]
mod classfile;

pub use classfile::*;

pub fn reader() -> ClassFileReader {
    ClassFileReader::new(Arc::new(Runtime::new()), ReaderConfig::default())
}

pub fn read(reader: &ClassFileReader, name: &str, data: &[u8]) -> Result<TypeDescriptor> {
    let expected = reader.runtime().type_for_class_name(name)?;
    reader.read_class(expected, data)
}
