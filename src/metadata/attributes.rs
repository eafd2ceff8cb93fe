//! Attribute tables.
//!
//! Classes, fields, methods and `Code` bodies all end in a table of `(name, length, body)`
//! records. This module reads those records and dispatches the class-level ones; the member
//! readers in [`crate::metadata::members`] use the same record reader for theirs.
//!
//! An attribute body is cut from the input in full before it is interpreted, so a record whose
//! declared length runs past the end of the input fails with [`Error::TruncatedAttribute`] no
//! matter whether it is recognised. A recognised attribute must consume its body exactly.
//!
//! # Class attributes
//!
//! | Name | Effect |
//! |------|--------|
//! | `SourceFile` | source name, only when 2 bytes long |
//! | `InnerClasses` | member classes, declaring and enclosing type, merged modifiers |
//! | `Synthetic` | [`ClassModifiers::SYNTHETIC`] |
//! | `EnclosingMethod` | enclosing type and method |
//! | `Signature` | generic signature |
//! | `RuntimeVisibleAnnotations` | annotations, through an [`AnnotationReader`] |

use std::str::FromStr;

use log::{debug, warn};
use strum::{EnumString, IntoStaticStr};

use crate::{
    file::parser::Parser,
    metadata::{
        annotations::{Annotation, AnnotationReader},
        constpool::ConstantPool,
        descriptor::ClassModifiers,
        runtime::{LoaderId, MemberRefId, TypeRefId},
    },
    Error, Result,
};

/// One attribute record with its body cut out of the input
pub struct AttributeRecord<'a> {
    /// The decoded attribute name
    pub name: String,
    /// The body, exactly as long as declared
    pub data: &'a [u8],
}

impl<'a> AttributeRecord<'a> {
    /// Read the header and body of the next attribute.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedAttribute`] if the declared length exceeds the remaining input,
    /// and [`Error::ConstantPool`] if the name index is not a valid UTF entry.
    pub fn read(pool: &ConstantPool, parser: &mut Parser<'a>) -> Result<Self> {
        let name = pool.utf_str(parser.read_be()?)?;
        let declared = parser.read_be::<u32>()? as usize;

        let available = parser.remaining();
        if declared > available {
            return Err(Error::TruncatedAttribute {
                name,
                declared,
                available,
            });
        }

        let data = parser.read_bytes(declared)?;
        Ok(AttributeRecord { name, data })
    }

    /// Interpret the body with `f`, which has to consume all of it.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `f` reads past the body, [`Error::TruncatedAttribute`] if
    /// it leaves bytes behind, and any error `f` itself returns.
    pub fn parse<T>(&self, f: impl FnOnce(&mut Parser<'a>) -> Result<T>) -> Result<T> {
        let mut parser = Parser::new(self.data);
        let value = f(&mut parser).map_err(|error| match error {
            Error::OutOfBounds => malformed_error!(
                "Attribute '{}' contents run past its length of {}",
                self.name,
                self.data.len()
            ),
            other => other,
        })?;

        if parser.has_more_data() {
            return Err(Error::TruncatedAttribute {
                name: self.name.clone(),
                declared: self.data.len(),
                available: parser.pos(),
            });
        }
        Ok(value)
    }
}

/// Class-level attributes this reader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ClassAttribute {
    /// Name of the source file
    SourceFile,
    /// Nesting relations
    InnerClasses,
    /// Compiler generated class
    Synthetic,
    /// Method enclosing a local or anonymous class
    EnclosingMethod,
    /// Generic signature
    Signature,
    /// Annotations visible through reflection
    RuntimeVisibleAnnotations,
}

/// Everything the class-level attributes contribute to a type descriptor
#[derive(Debug, Default)]
pub(crate) struct ClassAttributes {
    pub declared_classes: Option<Vec<TypeRefId>>,
    pub declaring_type: Option<TypeRefId>,
    pub enclosing_type: Option<TypeRefId>,
    pub enclosing_method: Option<MemberRefId>,
    pub source_name: Option<String>,
    pub signature: Option<String>,
    pub annotations: Option<Vec<Annotation>>,
}

/// What the dispatcher needs to know about the class being read
pub(crate) struct AttributeContext<'p> {
    pub pool: &'p ConstantPool,
    /// Constant pool index of the class's own `CONSTANT_Class` entry
    pub this_index: u16,
    pub loader: LoaderId,
    pub annotations: &'p dyn AnnotationReader,
}

impl AttributeContext<'_> {
    /// Read the class attribute table, updating `modifiers` in place
    pub(crate) fn read_class_attributes(
        &self,
        parser: &mut Parser,
        modifiers: &mut ClassModifiers,
    ) -> Result<ClassAttributes> {
        let mut attributes = ClassAttributes::default();

        let count = parser.read_be::<u16>()?;
        for _ in 0..count {
            let record = AttributeRecord::read(self.pool, parser)?;
            let Ok(kind) = ClassAttribute::from_str(&record.name) else {
                debug!(
                    "Skipping attribute '{}' ({} bytes)",
                    record.name,
                    record.data.len()
                );
                continue;
            };

            match kind {
                ClassAttribute::SourceFile => {
                    if record.data.len() != 2 {
                        warn!(
                            "Skipping SourceFile attribute of {} bytes",
                            record.data.len()
                        );
                        continue;
                    }
                    attributes.source_name =
                        Some(record.parse(|p| self.pool.utf_str(p.read_be()?))?);
                }
                ClassAttribute::InnerClasses => {
                    record.parse(|p| self.read_inner_classes(p, &mut attributes, &mut *modifiers))?;
                }
                ClassAttribute::Synthetic => {
                    record.parse(|_| Ok(()))?;
                    *modifiers |= ClassModifiers::SYNTHETIC;
                }
                ClassAttribute::EnclosingMethod => {
                    record.parse(|p| self.read_enclosing_method(p, &mut attributes))?;
                }
                ClassAttribute::Signature => {
                    attributes.signature =
                        Some(record.parse(|p| self.pool.utf_str(p.read_be()?))?);
                }
                ClassAttribute::RuntimeVisibleAnnotations => {
                    attributes.annotations = Some(record.parse(|p| {
                        self.annotations
                            .read_annotations(self.pool, p, self.loader)
                    })?);
                }
            }
        }

        Ok(attributes)
    }

    fn read_inner_classes(
        &self,
        parser: &mut Parser,
        attributes: &mut ClassAttributes,
        modifiers: &mut ClassModifiers,
    ) -> Result<()> {
        let count = parser.read_be::<u16>()?;
        let mut declared = Vec::new();

        for _ in 0..count {
            let inner_index = parser.read_be::<u16>()?;
            let outer_index = parser.read_be::<u16>()?;
            let inner_name_index = parser.read_be::<u16>()?;
            let inner_flags = ClassModifiers::from_bits_retain(parser.read_be::<u16>()?);

            if outer_index == self.this_index && inner_name_index != 0 {
                if let Some(inner) = self.pool.type_ref(inner_index)? {
                    declared.push(inner);
                }
            }

            if inner_index == self.this_index {
                if let Some(outer) = self.pool.type_ref(outer_index)? {
                    attributes.declaring_type = Some(outer);
                    attributes.enclosing_type.get_or_insert(outer);
                }

                if inner_flags.intersects(ClassModifiers::PRIVATE | ClassModifiers::PROTECTED) {
                    *modifiers -= ClassModifiers::VISIBILITY;
                }
                *modifiers |= inner_flags;
            }
        }

        attributes.declared_classes = Some(declared);
        Ok(())
    }

    fn read_enclosing_method(
        &self,
        parser: &mut Parser,
        attributes: &mut ClassAttributes,
    ) -> Result<()> {
        let class = self.pool.type_ref(parser.read_be()?)?;
        let method_index = parser.read_be::<u16>()?;

        attributes.enclosing_type = class;
        if method_index == 0 {
            return Ok(());
        }

        let Some(class) = class else {
            return Err(malformed_error!(
                "EnclosingMethod names a method but no class"
            ));
        };
        let (name, descriptor) = self.pool.name_and_type(method_index)?;
        attributes.enclosing_method = Some(
            self.pool
                .runtime()
                .members
                .find_or_create(class, name, descriptor)?,
        );
        Ok(())
    }
}
