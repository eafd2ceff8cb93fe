//! Shared runtime services used while reading class files.
//!
//! Reading a class file interns names, allocates literal slots and registers type and member
//! references. Those services outlive any single parse and are shared by all parses, possibly
//! running on different threads at the same time. Each one is a trait so an embedding runtime
//! can plug in its own tables; the crate ships a concurrent default for each.
//!
//! # Key Components
//!
//! - [`AtomTable`] / [`Atoms`] - Interned byte strings
//! - [`LiteralAllocator`] / [`Statics`] - Runtime-resident literal slots
//! - [`TypeRegistry`] / [`TypeReferences`] - Type references and their resolution
//! - [`MemberRegistry`] / [`MemberReferences`] - Field and method references
//! - [`Runtime`] - The bundle handed to [`crate::ClassFileReader`]
//!
//! # Thread Safety
//!
//! All services provide idempotent find-or-create semantics: concurrent requests for logically
//! equal inputs converge on one canonical id. The default implementations rely on `DashMap`
//! entry locking for this, and never block beyond a single shard.

mod atoms;
mod memberref;
mod statics;
mod typeref;

use std::sync::Arc;

pub use atoms::{decode_modified_utf8, Atom, AtomId, AtomRc, AtomTable, Atoms};
pub use memberref::{
    MemberKind, MemberRc, MemberRefId, MemberReference, MemberReferences, MemberRegistry,
};
pub use statics::{Literal, LiteralAllocator, LiteralObject, Statics, WIDE_BASE};
pub use typeref::{LoaderId, TypeRc, TypeRefId, TypeReference, TypeReferences, TypeRegistry};

use crate::Result;

/// The set of shared services a class file is read against.
///
/// # Examples
///
/// ```rust
/// use classreader::Runtime;
///
/// let runtime = Runtime::new();
/// let widget = runtime.type_for_class_name("pkg/Widget")?;
/// assert_eq!(runtime.types.get(widget).unwrap().descriptor, "Lpkg/Widget;");
/// # Ok::<(), classreader::Error>(())
/// ```
pub struct Runtime {
    /// Interned byte strings
    pub atoms: Arc<dyn AtomTable>,
    /// Literal slots
    pub statics: Arc<dyn LiteralAllocator>,
    /// Type references
    pub types: Arc<dyn TypeRegistry>,
    /// Member references
    pub members: Arc<dyn MemberRegistry>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime backed by the default in-memory services
    #[must_use]
    pub fn new() -> Self {
        let atoms: Arc<dyn AtomTable> = Arc::new(Atoms::new());
        Runtime {
            members: Arc::new(MemberReferences::new(atoms.clone())),
            atoms,
            statics: Arc::new(Statics::new()),
            types: Arc::new(TypeReferences::new()),
        }
    }

    /// Create a runtime from caller supplied services
    #[must_use]
    pub fn with_services(
        atoms: Arc<dyn AtomTable>,
        statics: Arc<dyn LiteralAllocator>,
        types: Arc<dyn TypeRegistry>,
        members: Arc<dyn MemberRegistry>,
    ) -> Self {
        Runtime {
            atoms,
            statics,
            types,
            members,
        }
    }

    /// Look up an atom by id
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if the id was never handed out.
    pub fn atom(&self, id: AtomId) -> Result<AtomRc> {
        self.atoms
            .get(id)
            .ok_or_else(|| internal_error!("Unknown atom - {:?}", id))
    }

    /// Decode an atom as modified UTF-8
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] for invalid payloads and
    /// [`crate::Error::Internal`] for unknown ids.
    pub fn atom_str(&self, id: AtomId) -> Result<String> {
        self.atom(id)?.to_str()
    }

    /// The type reference for an internal class name (`pkg/Widget`) seen through the
    /// bootstrap loader
    ///
    /// # Errors
    /// Returns an error if the registries ran out of ids.
    pub fn type_for_class_name(&self, name: &str) -> Result<TypeRefId> {
        self.type_for_class_name_in(LoaderId::BOOTSTRAP, name)
    }

    /// The type reference for an internal class name seen through `loader`
    ///
    /// # Errors
    /// Returns an error if the registries ran out of ids.
    pub fn type_for_class_name_in(&self, loader: LoaderId, name: &str) -> Result<TypeRefId> {
        let descriptor = Atom::new(name.as_bytes()).descriptor_from_class_name();
        let descriptor = decode_modified_utf8(&descriptor)?;
        self.types.find_or_create(loader, &descriptor)
    }

    /// Look up a type reference without resolving it
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if the id was never handed out.
    pub fn type_ref(&self, id: TypeRefId) -> Result<TypeRc> {
        self.types
            .get(id)
            .ok_or_else(|| internal_error!("Unknown type reference - {:?}", id))
    }

    /// Look up a member reference
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if the id was never handed out.
    pub fn member_ref(&self, id: MemberRefId) -> Result<MemberRc> {
        self.members
            .get(id)
            .ok_or_else(|| internal_error!("Unknown member reference - {:?}", id))
    }
}
