//! Field and method records.
//!
//! The structural assembler reads the fixed part of every `field_info` and `method_info`
//! (access flags, name, descriptor), interns the member reference and then hands the rest of
//! the record, its attribute table, to a [`FieldReader`] or [`MethodReader`]. The default
//! readers understand the attributes a runtime needs to link and run a class and skip the rest.

use std::{str::FromStr, sync::Arc};

use bitflags::bitflags;
use log::debug;
use strum::EnumString;

use crate::{
    file::parser::Parser,
    metadata::{
        annotations::{Annotation, AnnotationReader, DefaultAnnotationReader},
        attributes::AttributeRecord,
        constpool::{ConstantPool, PackedEntry},
        runtime::{MemberRefId, TypeRefId},
    },
    Result,
};

/// Name of the static initializer
pub const CLASS_INITIALIZER_NAME: &str = "<clinit>";
/// Descriptor of the static initializer
pub const CLASS_INITIALIZER_DESCRIPTOR: &str = "()V";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Access and property flags of a field
    pub struct FieldModifiers: u16 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private`
        const PRIVATE = 0x0002;
        /// Declared `protected`
        const PROTECTED = 0x0004;
        /// Declared `static`
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Declared `volatile`
        const VOLATILE = 0x0040;
        /// Declared `transient`
        const TRANSIENT = 0x0080;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Element of an enum
        const ENUM = 0x4000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Access and property flags of a method
    pub struct MethodModifiers: u16 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private`
        const PRIVATE = 0x0002;
        /// Declared `protected`
        const PROTECTED = 0x0004;
        /// Declared `static`
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Declared `synchronized`
        const SYNCHRONIZED = 0x0020;
        /// Compiler generated bridge method
        const BRIDGE = 0x0040;
        /// Takes a variable number of arguments
        const VARARGS = 0x0080;
        /// Declared `native`
        const NATIVE = 0x0100;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Declared `strictfp`
        const STRICT = 0x0800;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    /// The interned `(owner, name, descriptor)` reference
    pub member: MemberRefId,
    /// Field name
    pub name: String,
    /// Field type descriptor
    pub descriptor: String,
    /// Access flags
    pub modifiers: FieldModifiers,
    /// Initial value of a constant field; a literal entry of the constant pool
    pub constant_value: Option<PackedEntry>,
    /// Generic signature
    pub signature: Option<String>,
    /// Runtime visible annotations
    pub annotations: Option<Vec<Annotation>>,
}

/// One entry of a method's exception table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First covered bytecode offset
    pub start_pc: u16,
    /// First bytecode offset past the covered range
    pub end_pc: u16,
    /// Offset of the handler
    pub handler_pc: u16,
    /// Caught type; `None` catches everything
    pub catch_type: Option<TypeRefId>,
}

/// The `Code` attribute of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Maximum depth of the operand stack
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// The bytecode, verbatim
    pub bytecode: Vec<u8>,
    /// Exception handlers in table order
    pub exception_table: Vec<ExceptionHandler>,
}

/// A declared method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    /// The interned `(owner, name, descriptor)` reference
    pub member: MemberRefId,
    /// Method name
    pub name: String,
    /// Method descriptor
    pub descriptor: String,
    /// Access flags
    pub modifiers: MethodModifiers,
    /// Body; absent for `abstract` and `native` methods
    pub code: Option<Code>,
    /// Declared checked exceptions
    pub exceptions: Option<Vec<TypeRefId>>,
    /// Generic signature
    pub signature: Option<String>,
    /// Runtime visible annotations
    pub annotations: Option<Vec<Annotation>>,
}

impl MethodRecord {
    /// Returns `true` for the static initializer `<clinit>()V`
    #[must_use]
    pub fn is_class_initializer(&self) -> bool {
        self.name == CLASS_INITIALIZER_NAME && self.descriptor == CLASS_INITIALIZER_DESCRIPTOR
    }
}

/// Reads the attribute table of one `field_info`.
pub trait FieldReader: Send + Sync {
    /// Build the record of a field.
    ///
    /// # Arguments
    /// * `owner` - The class declaring the field
    /// * `pool` - The resolved constant pool of `owner`
    /// * `member` - The interned reference of the field
    /// * `modifiers` - The raw access flags
    /// * `parser` - Positioned at the field's attribute count
    ///
    /// # Errors
    /// Returns an error for malformed or truncated attributes.
    fn read_field(
        &self,
        owner: TypeRefId,
        pool: &ConstantPool,
        member: MemberRefId,
        modifiers: u16,
        parser: &mut Parser,
    ) -> Result<FieldRecord>;
}

/// Reads the attribute table of one `method_info`.
pub trait MethodReader: Send + Sync {
    /// Build the record of a method. Arguments as for [`FieldReader::read_field`].
    ///
    /// # Errors
    /// Returns an error for malformed or truncated attributes.
    fn read_method(
        &self,
        owner: TypeRefId,
        pool: &ConstantPool,
        member: MemberRefId,
        modifiers: u16,
        parser: &mut Parser,
    ) -> Result<MethodRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
enum FieldAttribute {
    ConstantValue,
    Signature,
    Synthetic,
    RuntimeVisibleAnnotations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
enum MethodAttribute {
    Code,
    Exceptions,
    Signature,
    Synthetic,
    RuntimeVisibleAnnotations,
}

/// The default [`FieldReader`]
#[derive(Clone)]
pub struct DefaultFieldReader {
    annotations: Arc<dyn AnnotationReader>,
}

impl Default for DefaultFieldReader {
    fn default() -> Self {
        Self::new(Arc::new(DefaultAnnotationReader))
    }
}

impl DefaultFieldReader {
    /// Create a reader that decodes annotations with `annotations`
    #[must_use]
    pub fn new(annotations: Arc<dyn AnnotationReader>) -> Self {
        DefaultFieldReader { annotations }
    }
}

impl FieldReader for DefaultFieldReader {
    fn read_field(
        &self,
        owner: TypeRefId,
        pool: &ConstantPool,
        member: MemberRefId,
        modifiers: u16,
        parser: &mut Parser,
    ) -> Result<FieldRecord> {
        let runtime = pool.runtime();
        let reference = runtime.member_ref(member)?;
        let loader = runtime.type_ref(owner)?.loader;

        let mut field = FieldRecord {
            member,
            name: runtime.atom_str(reference.name)?,
            descriptor: runtime.atom_str(reference.descriptor)?,
            modifiers: FieldModifiers::from_bits_retain(modifiers),
            constant_value: None,
            signature: None,
            annotations: None,
        };

        let count = parser.read_be::<u16>()?;
        for _ in 0..count {
            let record = AttributeRecord::read(pool, parser)?;
            let Ok(kind) = FieldAttribute::from_str(&record.name) else {
                debug!("Skipping field attribute '{}'", record.name);
                continue;
            };

            match kind {
                FieldAttribute::ConstantValue => {
                    field.constant_value = Some(record.parse(|p| {
                        let index = p.read_be()?;
                        pool.literal_description(index)?;
                        pool.entry(index)
                    })?);
                }
                FieldAttribute::Signature => {
                    field.signature = Some(record.parse(|p| pool.utf_str(p.read_be()?))?);
                }
                FieldAttribute::Synthetic => {
                    record.parse(|_| Ok(()))?;
                    field.modifiers |= FieldModifiers::SYNTHETIC;
                }
                FieldAttribute::RuntimeVisibleAnnotations => {
                    field.annotations = Some(
                        record.parse(|p| self.annotations.read_annotations(pool, p, loader))?,
                    );
                }
            }
        }

        Ok(field)
    }
}

/// The default [`MethodReader`]
#[derive(Clone)]
pub struct DefaultMethodReader {
    annotations: Arc<dyn AnnotationReader>,
}

impl Default for DefaultMethodReader {
    fn default() -> Self {
        Self::new(Arc::new(DefaultAnnotationReader))
    }
}

impl DefaultMethodReader {
    /// Create a reader that decodes annotations with `annotations`
    #[must_use]
    pub fn new(annotations: Arc<dyn AnnotationReader>) -> Self {
        DefaultMethodReader { annotations }
    }
}

impl MethodReader for DefaultMethodReader {
    fn read_method(
        &self,
        owner: TypeRefId,
        pool: &ConstantPool,
        member: MemberRefId,
        modifiers: u16,
        parser: &mut Parser,
    ) -> Result<MethodRecord> {
        let runtime = pool.runtime();
        let reference = runtime.member_ref(member)?;
        let loader = runtime.type_ref(owner)?.loader;

        let mut method = MethodRecord {
            member,
            name: runtime.atom_str(reference.name)?,
            descriptor: runtime.atom_str(reference.descriptor)?,
            modifiers: MethodModifiers::from_bits_retain(modifiers),
            code: None,
            exceptions: None,
            signature: None,
            annotations: None,
        };

        let count = parser.read_be::<u16>()?;
        for _ in 0..count {
            let record = AttributeRecord::read(pool, parser)?;
            let Ok(kind) = MethodAttribute::from_str(&record.name) else {
                debug!("Skipping method attribute '{}'", record.name);
                continue;
            };

            match kind {
                MethodAttribute::Code => {
                    if method.code.is_some() {
                        return Err(malformed_error!(
                            "Method {}{} has two Code attributes",
                            method.name,
                            method.descriptor
                        ));
                    }
                    method.code = Some(record.parse(|p| read_code(pool, p))?);
                }
                MethodAttribute::Exceptions => {
                    method.exceptions = Some(record.parse(|p| {
                        let count = p.read_be::<u16>()?;
                        let mut exceptions = Vec::with_capacity(usize::from(count));
                        for _ in 0..count {
                            exceptions.push(pool.class(p.read_be()?)?);
                        }
                        Ok(exceptions)
                    })?);
                }
                MethodAttribute::Signature => {
                    method.signature = Some(record.parse(|p| pool.utf_str(p.read_be()?))?);
                }
                MethodAttribute::Synthetic => {
                    record.parse(|_| Ok(()))?;
                    method.modifiers |= MethodModifiers::SYNTHETIC;
                }
                MethodAttribute::RuntimeVisibleAnnotations => {
                    method.annotations = Some(
                        record.parse(|p| self.annotations.read_annotations(pool, p, loader))?,
                    );
                }
            }
        }

        Ok(method)
    }
}

fn read_code(pool: &ConstantPool, parser: &mut Parser) -> Result<Code> {
    let max_stack = parser.read_be::<u16>()?;
    let max_locals = parser.read_be::<u16>()?;
    let length = parser.read_be::<u32>()? as usize;
    let bytecode = parser.read_bytes(length)?.to_vec();

    let count = parser.read_be::<u16>()?;
    let mut exception_table = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        exception_table.push(ExceptionHandler {
            start_pc: parser.read_be()?,
            end_pc: parser.read_be()?,
            handler_pc: parser.read_be()?,
            catch_type: pool.type_ref(parser.read_be()?)?,
        });
    }

    // LineNumberTable, LocalVariableTable, StackMapTable, ...
    let count = parser.read_be::<u16>()?;
    for _ in 0..count {
        AttributeRecord::read(pool, parser)?;
    }

    Ok(Code {
        max_stack,
        max_locals,
        bytecode,
        exception_table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            constpool::{ConstantPoolBuilder, Entry},
            runtime::{Literal, LoaderId, Runtime},
        },
        test::classfile::*,
        Error,
    };

    struct Fixture {
        pool: ConstantPool,
        owner: TypeRefId,
    }

    impl Fixture {
        fn new(builder: &PoolBuilder) -> Self {
            let bytes = builder.to_bytes();
            let runtime = Arc::new(Runtime::new());
            let owner = runtime.type_for_class_name("pkg/Widget").unwrap();
            let mut parser = Parser::new(&bytes);
            let pool =
                ConstantPoolBuilder::read(&mut parser, runtime, LoaderId::BOOTSTRAP).unwrap();
            Fixture { pool, owner }
        }

        fn member(&self, name: &str, descriptor: &str) -> MemberRefId {
            let runtime = self.pool.runtime();
            let name = runtime.atoms.find_or_create(name.as_bytes()).unwrap();
            let descriptor = runtime.atoms.find_or_create(descriptor.as_bytes()).unwrap();
            runtime
                .members
                .find_or_create(self.owner, name, descriptor)
                .unwrap()
        }
    }

    fn table(pool: &mut PoolBuilder, attributes: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut out = u2(attributes.len() as u16);
        for (name, body) in attributes {
            out.extend(u2(pool.utf(name)));
            out.extend((body.len() as u32).to_be_bytes());
            out.extend(body);
        }
        out
    }

    #[test]
    fn constant_field() {
        let mut builder = PoolBuilder::new();
        let value = builder.long(99);
        let signature = builder.utf("TT;");
        let data = table(
            &mut builder,
            &[
                ("ConstantValue", u2(value)),
                ("Signature", u2(signature)),
                ("Synthetic", vec![]),
                ("Deprecated", vec![]),
            ],
        );
        let fixture = Fixture::new(&builder);
        let member = fixture.member("LIMIT", "J");

        let mut parser = Parser::new(&data);
        let field = DefaultFieldReader::default()
            .read_field(
                fixture.owner,
                &fixture.pool,
                member,
                ACC_STATIC | ACC_FINAL,
                &mut parser,
            )
            .unwrap();
        assert!(!parser.has_more_data());

        assert_eq!(field.name, "LIMIT");
        assert_eq!(field.descriptor, "J");
        assert_eq!(field.signature.as_deref(), Some("TT;"));
        assert!(field.modifiers.contains(
            FieldModifiers::STATIC | FieldModifiers::FINAL | FieldModifiers::SYNTHETIC
        ));

        let Some(constant) = field.constant_value else {
            panic!("no constant value");
        };
        let Entry::Long(offset) = constant.decode() else {
            panic!("not a long");
        };
        assert_eq!(
            fixture.pool.runtime().statics.get(offset),
            Some(Literal::Wide(99))
        );
    }

    #[test]
    fn constant_value_must_be_literal() {
        let mut builder = PoolBuilder::new();
        let utf = builder.utf("not a literal");
        let data = table(&mut builder, &[("ConstantValue", u2(utf))]);
        let fixture = Fixture::new(&builder);
        let member = fixture.member("x", "I");

        let mut parser = Parser::new(&data);
        assert!(matches!(
            DefaultFieldReader::default().read_field(
                fixture.owner,
                &fixture.pool,
                member,
                0,
                &mut parser
            ),
            Err(Error::ConstantPool { .. })
        ));
    }

    #[test]
    fn method_with_code() {
        let mut builder = PoolBuilder::new();
        let exception = builder.class("java/io/IOException");
        let line_numbers = builder.utf("LineNumberTable");

        let mut code = u2s(&[2, 1]);
        code.extend(3u32.to_be_bytes());
        code.extend([0x03, 0xAC, 0x00]);
        code.extend(u2s(&[1, 0, 2, 2, exception]));
        code.extend(u2s(&[1, line_numbers]));
        code.extend(6u32.to_be_bytes());
        code.extend(u2s(&[1, 0, 10]));

        let data = table(
            &mut builder,
            &[("Code", code), ("Exceptions", u2s(&[1, exception]))],
        );
        let fixture = Fixture::new(&builder);
        let member = fixture.member("read", "()I");

        let mut parser = Parser::new(&data);
        let method = DefaultMethodReader::default()
            .read_method(
                fixture.owner,
                &fixture.pool,
                member,
                ACC_PUBLIC,
                &mut parser,
            )
            .unwrap();
        assert!(!parser.has_more_data());
        assert!(!method.is_class_initializer());

        let exception = fixture.pool.class(exception).unwrap();
        let code = method.code.unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 1);
        assert_eq!(code.bytecode, vec![0x03, 0xAC, 0x00]);
        assert_eq!(
            code.exception_table,
            vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: Some(exception),
            }]
        );
        assert_eq!(method.exceptions, Some(vec![exception]));
    }

    #[test]
    fn class_initializer() {
        let builder = PoolBuilder::new();
        let fixture = Fixture::new(&builder);
        let member = fixture.member(CLASS_INITIALIZER_NAME, CLASS_INITIALIZER_DESCRIPTOR);

        let data = u2(0);
        let mut parser = Parser::new(&data);
        let method = DefaultMethodReader::default()
            .read_method(fixture.owner, &fixture.pool, member, ACC_STATIC, &mut parser)
            .unwrap();
        assert!(method.is_class_initializer());
        assert!(method.code.is_none());
    }

    #[test]
    fn code_overrun() {
        let mut builder = PoolBuilder::new();
        let mut code = u2s(&[1, 1]);
        code.extend(100u32.to_be_bytes());
        code.extend([0xB1]);
        let data = table(&mut builder, &[("Code", code)]);
        let fixture = Fixture::new(&builder);
        let member = fixture.member("run", "()V");

        let mut parser = Parser::new(&data);
        assert!(matches!(
            DefaultMethodReader::default().read_method(
                fixture.owner,
                &fixture.pool,
                member,
                0,
                &mut parser
            ),
            Err(Error::Malformed { .. })
        ));
    }
}
