//! The in-memory description of one class or interface.

use bitflags::bitflags;

use crate::metadata::{
    annotations::Annotation,
    constpool::ConstantPool,
    members::{FieldRecord, MethodRecord},
    runtime::{MemberRefId, TypeRc, TypeRefId},
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Access and property flags of a class
    pub struct ClassModifiers: u16 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private` (nested classes only)
        const PRIVATE = 0x0002;
        /// Declared `protected` (nested classes only)
        const PROTECTED = 0x0004;
        /// Declared `static` (nested classes only)
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Treat superclass methods specially in `invokespecial`
        const SUPER = 0x0020;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Is an annotation type
        const ANNOTATION = 0x2000;
        /// Is an enum
        const ENUM = 0x4000;
    }
}

impl ClassModifiers {
    /// The bits that select the visibility of a class
    pub const VISIBILITY: ClassModifiers = ClassModifiers::PUBLIC
        .union(ClassModifiers::PRIVATE)
        .union(ClassModifiers::PROTECTED);

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.contains(ClassModifiers::INTERFACE)
    }
}

/// A fully read class or interface.
///
/// Every reference in here is resolved: the super type and the interfaces are type handles,
/// members carry their interned reference ids. The descriptor owns its [`ConstantPool`] so that
/// later stages (bytecode interpretation, constant loading) can keep dereferencing it.
#[derive(Debug)]
pub struct TypeDescriptor {
    /// The type this descriptor describes
    pub type_ref: TypeRc,
    /// The resolved constant pool
    pub constant_pool: ConstantPool,
    /// Access flags, merged with the `InnerClasses` record for this type if present
    pub modifiers: ClassModifiers,
    /// The direct super class; `None` for interfaces and the root type
    pub super_type: Option<TypeRc>,
    /// Direct super interfaces in declaration order
    pub interfaces: Vec<TypeRc>,
    /// Declared fields in declaration order
    pub fields: Vec<FieldRecord>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodRecord>,
    /// Position of the static initializer in [`TypeDescriptor::methods`]
    pub class_initializer: Option<usize>,
    /// Member classes listed in `InnerClasses`, if that attribute is present
    pub declared_classes: Option<Vec<TypeRefId>>,
    /// The class this one is declared in
    pub declaring_type: Option<TypeRefId>,
    /// The innermost class enclosing this one
    pub enclosing_type: Option<TypeRefId>,
    /// The method enclosing a local or anonymous class
    pub enclosing_method: Option<MemberRefId>,
    /// Name of the source file
    pub source_name: Option<String>,
    /// Generic signature
    pub signature: Option<String>,
    /// Runtime visible annotations
    pub annotations: Option<Vec<Annotation>>,
}

impl TypeDescriptor {
    /// Internal name of the type, e.g. `pkg/Widget`
    #[must_use]
    pub fn name(&self) -> &str {
        self.type_ref.name()
    }

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.modifiers.is_interface()
    }

    /// The static initializer, if the type declares one
    #[must_use]
    pub fn class_initializer(&self) -> Option<&MethodRecord> {
        self.class_initializer
            .and_then(|index| self.methods.get(index))
    }

    /// Look up a declared field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up a declared method by name and descriptor
    #[must_use]
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodRecord> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.descriptor == descriptor)
    }
}
