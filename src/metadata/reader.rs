//! Reading a class file into a [`TypeDescriptor`].
//!
//! [`ClassFileReader`] is the entry point of the crate. It checks the header, runs the constant
//! pool resolver, reads the class structure in file order and dispatches the class attributes.
//! Field and method attribute tables go to the configured [`FieldReader`] and
//! [`MethodReader`].
//!
//! # Thread Safety
//!
//! A reader holds no per-parse state. One reader can be shared across threads and used for any
//! number of concurrent reads; all of them intern into the same [`Runtime`].

use std::{path::Path, sync::Arc};

use log::{debug, trace};
use rayon::prelude::*;

use crate::{
    file::{parser::Parser, File},
    metadata::{
        annotations::{AnnotationReader, DefaultAnnotationReader},
        attributes::AttributeContext,
        config::ReaderConfig,
        constpool::{ConstantPool, ConstantPoolBuilder},
        descriptor::{ClassModifiers, TypeDescriptor},
        members::{DefaultFieldReader, DefaultMethodReader, FieldReader, MethodReader},
        runtime::{MemberRefId, Runtime, TypeRc, TypeRefId},
    },
    Error, Result,
};

/// The magic number every class file starts with
pub const CLASS_FILE_MAGIC: u32 = 0xCAFE_BABE;

/// Reads class files against a shared [`Runtime`].
///
/// # Examples
///
/// ```rust,no_run
/// use classreader::{ClassFileReader, ReaderConfig, Runtime};
/// use std::{path::Path, sync::Arc};
///
/// let runtime = Arc::new(Runtime::new());
/// let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
///
/// let expected = runtime.type_for_class_name("pkg/Widget")?;
/// let widget = reader.read_class_from_file(expected, Path::new("pkg/Widget.class"))?;
///
/// println!("{} extends {:?}", widget.name(), widget.super_type.as_ref().map(|s| s.name()));
/// for method in &widget.methods {
///     println!("  {}{}", method.name, method.descriptor);
/// }
/// # Ok::<(), classreader::Error>(())
/// ```
pub struct ClassFileReader {
    runtime: Arc<Runtime>,
    config: ReaderConfig,
    fields: Arc<dyn FieldReader>,
    methods: Arc<dyn MethodReader>,
    annotations: Arc<dyn AnnotationReader>,
}

impl ClassFileReader {
    /// Create a reader with the default field, method and annotation readers
    #[must_use]
    pub fn new(runtime: Arc<Runtime>, config: ReaderConfig) -> Self {
        let annotations: Arc<dyn AnnotationReader> = Arc::new(DefaultAnnotationReader);
        ClassFileReader {
            runtime,
            config,
            fields: Arc::new(DefaultFieldReader::new(annotations.clone())),
            methods: Arc::new(DefaultMethodReader::new(annotations.clone())),
            annotations,
        }
    }

    /// Replace the field reader
    #[must_use]
    pub fn with_field_reader(mut self, fields: Arc<dyn FieldReader>) -> Self {
        self.fields = fields;
        self
    }

    /// Replace the method reader
    #[must_use]
    pub fn with_method_reader(mut self, methods: Arc<dyn MethodReader>) -> Self {
        self.methods = methods;
        self
    }

    /// Replace the reader used for class-level annotations
    #[must_use]
    pub fn with_annotation_reader(mut self, annotations: Arc<dyn AnnotationReader>) -> Self {
        self.annotations = annotations;
        self
    }

    /// The shared runtime services
    #[must_use]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read the class file in `data`, which must describe the type `expected`.
    ///
    /// Type references in the constant pool are interned through the loader of `expected`.
    ///
    /// # Errors
    /// - [`Error::LoadingDisabled`] if the configuration switched loading off
    /// - [`Error::BadMagic`] and [`Error::UnsupportedVersion`] for a bad header
    /// - [`Error::ConstantPool`] for a malformed constant pool
    /// - [`Error::IdentityMismatch`] if the file describes another type
    /// - [`Error::TruncatedAttribute`], [`Error::OutOfBounds`] and [`Error::Malformed`] for
    ///   damaged input
    /// - [`Error::Internal`] for resolver bugs
    pub fn read_class(&self, expected: TypeRefId, data: &[u8]) -> Result<TypeDescriptor> {
        let expected = self.runtime.type_ref(expected)?;
        if !self.config.loading_enabled {
            return Err(Error::LoadingDisabled(expected.name().to_string()));
        }

        trace!("Reading class {}", expected);
        let descriptor = self.read_descriptor(&expected, &mut Parser::new(data))?;
        trace!("Read class {}", expected);
        Ok(descriptor)
    }

    /// Memory map the class file at `path` and read it.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file can not be opened, and everything
    /// [`ClassFileReader::read_class`] returns.
    pub fn read_class_from_file(&self, expected: TypeRefId, path: &Path) -> Result<TypeDescriptor> {
        let file = File::from_file(path)?;
        self.read_class(expected, file.data())
    }

    /// Read independent class files concurrently.
    ///
    /// The results line up with `batch`; one failing class does not affect the others.
    #[must_use]
    pub fn read_classes(&self, batch: &[(TypeRefId, &[u8])]) -> Vec<Result<TypeDescriptor>> {
        batch
            .par_iter()
            .map(|(expected, data)| self.read_class(*expected, data))
            .collect()
    }

    fn read_descriptor(&self, expected: &TypeRc, parser: &mut Parser) -> Result<TypeDescriptor> {
        let magic = parser.read_be::<u32>()?;
        if magic != CLASS_FILE_MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let minor = parser.read_be::<u16>()?;
        let major = parser.read_be::<u16>()?;
        if !self.config.supported_versions.contains(major, minor) {
            return Err(Error::UnsupportedVersion { major, minor });
        }

        let pool =
            ConstantPoolBuilder::read(parser, self.runtime.clone(), expected.loader)?;

        let mut modifiers = ClassModifiers::from_bits_retain(parser.read_be()?);

        let this_index = parser.read_be::<u16>()?;
        let this_type = pool.class(this_index)?;
        if this_type != expected.id {
            return Err(Error::IdentityMismatch {
                expected: expected.name().to_string(),
                found: self.runtime.type_ref(this_type)?.name().to_string(),
            });
        }

        let super_type = self.read_super_type(&pool, expected, modifiers, parser)?;

        let count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let Some(interface) = pool.type_ref(parser.read_be()?)? else {
                return Err(malformed_error!("Interface index 0 in {}", expected));
            };
            interfaces.push(self.runtime.types.resolve(interface)?);
        }

        let count = parser.read_be::<u16>()?;
        let mut fields = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let (access, member) = self.read_member_header(&pool, this_type, parser)?;
            fields.push(
                self.fields
                    .read_field(this_type, &pool, member, access, parser)?,
            );
        }

        let count = parser.read_be::<u16>()?;
        let mut methods = Vec::with_capacity(usize::from(count));
        let mut class_initializer = None;
        for index in 0..usize::from(count) {
            let (access, member) = self.read_member_header(&pool, this_type, parser)?;
            let method = self
                .methods
                .read_method(this_type, &pool, member, access, parser)?;

            if method.is_class_initializer() {
                if class_initializer.is_some() {
                    return Err(malformed_error!(
                        "Class {} declares more than one static initializer",
                        expected
                    ));
                }
                class_initializer = Some(index);
            }
            methods.push(method);
        }
        debug!(
            "Class {}: {} interfaces, {} fields, {} methods",
            expected,
            interfaces.len(),
            fields.len(),
            methods.len()
        );

        let context = AttributeContext {
            pool: &pool,
            this_index,
            loader: expected.loader,
            annotations: self.annotations.as_ref(),
        };
        let attributes = context.read_class_attributes(parser, &mut modifiers)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} bytes after the end of class {}",
                parser.remaining(),
                expected
            ));
        }

        Ok(TypeDescriptor {
            type_ref: expected.clone(),
            constant_pool: pool,
            modifiers,
            super_type,
            interfaces,
            fields,
            methods,
            class_initializer,
            declared_classes: attributes.declared_classes,
            declaring_type: attributes.declaring_type,
            enclosing_type: attributes.enclosing_type,
            enclosing_method: attributes.enclosing_method,
            source_name: attributes.source_name,
            signature: attributes.signature,
            annotations: attributes.annotations,
        })
    }

    fn read_super_type(
        &self,
        pool: &ConstantPool,
        expected: &TypeRc,
        modifiers: ClassModifiers,
        parser: &mut Parser,
    ) -> Result<Option<TypeRc>> {
        let index = parser.read_be::<u16>()?;
        if modifiers.is_interface() {
            return Ok(None);
        }

        match pool.type_ref(index)? {
            Some(super_type) => Ok(Some(self.runtime.types.resolve(super_type)?)),
            None if expected.name() == self.config.root_type => Ok(None),
            None => Err(malformed_error!("Class {} has no super class", expected)),
        }
    }

    fn read_member_header(
        &self,
        pool: &ConstantPool,
        owner: TypeRefId,
        parser: &mut Parser,
    ) -> Result<(u16, MemberRefId)> {
        let access = parser.read_be::<u16>()?;
        let name = pool.utf(parser.read_be()?)?;
        let descriptor = pool.utf(parser.read_be()?)?;
        let member = self
            .runtime
            .members
            .find_or_create(owner, name, descriptor)?;
        Ok((access, member))
    }
}
