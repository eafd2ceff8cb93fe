//! Test helpers shared by the unit tests.

pub mod classfile;
