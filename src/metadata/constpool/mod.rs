//! The resolved constant pool of a class file.
//!
//! A class file's constant pool is read once, by the three-pass resolver in `builder`, into a
//! [`ConstantPool`]: a 1-indexed array whose live slots are [`PackedEntry`] words. By the time a
//! pool is handed out every reference it contains has been interned in the shared [`Runtime`]
//! services, so typed lookups never need to follow more than one index.
//!
//! # Key Components
//!
//! - [`PackedEntry`] / [`EntryTag`] / [`Entry`] - 29-bit payload tagged words and their decoded view
//! - [`TempPackedEntry`] - Two 16-bit indices packed in one word
//! - [`ConstantTag`] - Tag bytes as they appear on disk
//! - [`ConstantPool`] - The resolved pool with typed accessors
//!
//! # Error Handling
//!
//! Lookups distinguish two kinds of failure. An index that is out of range or that holds an
//! entry of the wrong kind is malformed input and reported as [`crate::Error::ConstantPool`].
//! Dereferencing the filler slot behind a `Long`/`Double` can only happen through a resolver bug
//! and is reported as [`crate::Error::Internal`].

mod builder;
mod entry;
mod tag;

use std::{fmt, sync::Arc};

pub(crate) use builder::ConstantPoolBuilder;
pub use entry::{
    Entry, EntryTag, PackedEntry, TempPackedEntry, PAYLOAD_BITS, PAYLOAD_MASK, PAYLOAD_MAX,
    SIGNED_PAYLOAD_MAX, SIGNED_PAYLOAD_MIN,
};
pub use tag::ConstantTag;

use crate::{
    metadata::runtime::{
        AtomId, LiteralObject, MemberKind, MemberRefId, Runtime, TypeRefId,
    },
    Result,
};

/// Size in bytes of a reference literal
pub const REFERENCE_SIZE: usize = std::mem::size_of::<usize>();

/// One slot of a resolved constant pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index 0, which the format never uses
    Unused,
    /// Second slot of a `Long` or `Double` entry
    Filler,
    /// A resolved entry
    Entry(PackedEntry),
    /// A name-and-type pair, only reachable through attributes and member references
    NameAndType {
        /// Member name
        name: AtomId,
        /// Member descriptor
        descriptor: AtomId,
    },
}

/// The resolved constant pool of one class.
///
/// # Examples
///
/// ```rust,no_run
/// use classreader::{ClassFileReader, ReaderConfig, Runtime};
/// use std::sync::Arc;
///
/// let runtime = Arc::new(Runtime::new());
/// let reader = ClassFileReader::new(runtime.clone(), ReaderConfig::default());
/// let expected = runtime.type_for_class_name("pkg/Widget")?;
/// let data = std::fs::read("Widget.class")?;
///
/// let descriptor = reader.read_class(expected, &data)?;
/// let pool = &descriptor.constant_pool;
/// for index in 1..pool.len() {
///     if let Ok(entry) = pool.entry(index as u16) {
///         println!("{}: {:?}", index, entry.decode());
///     }
/// }
/// # Ok::<(), classreader::Error>(())
/// ```
pub struct ConstantPool {
    slots: Box<[Slot]>,
    runtime: Arc<Runtime>,
}

impl ConstantPool {
    pub(crate) fn new(slots: Box<[Slot]>, runtime: Arc<Runtime>) -> Self {
        ConstantPool { slots, runtime }
    }

    /// Number of slots, including the unused slot 0. This is the count from the class file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the pool has no entries besides slot 0
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// All slots, starting at index 0
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The runtime services the pool was resolved against
    #[must_use]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// The slot at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] for index 0 and indices past the end, and
    /// [`crate::Error::Internal`] for filler slots.
    pub fn slot(&self, index: u16) -> Result<&Slot> {
        match self.slots.get(usize::from(index)) {
            None | Some(Slot::Unused) => Err(constant_pool_error!(
                "Index {} outside of constant pool with {} slots",
                index,
                self.slots.len()
            )),
            Some(Slot::Filler) => Err(internal_error!(
                "Dereferenced the filler slot at index {}",
                index
            )),
            Some(slot) => Ok(slot),
        }
    }

    /// The packed entry at `index`
    ///
    /// # Errors
    /// See [`ConstantPool::slot`]. Name-and-type slots are reported as
    /// [`crate::Error::ConstantPool`].
    pub fn entry(&self, index: u16) -> Result<PackedEntry> {
        match self.slot(index)? {
            Slot::Entry(entry) => Ok(*entry),
            _ => Err(constant_pool_error!(
                "Index {} holds a name-and-type pair",
                index
            )),
        }
    }

    fn tagged(&self, index: u16, tag: EntryTag) -> Result<PackedEntry> {
        let entry = self.entry(index)?;
        if entry.tag() != tag {
            return Err(constant_pool_error!(
                "Expected {:?} at index {} but found {:?}",
                tag,
                index,
                entry.tag()
            ));
        }
        Ok(entry)
    }

    /// The atom of the UTF entry at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a UTF entry.
    pub fn utf(&self, index: u16) -> Result<AtomId> {
        Ok(AtomId(self.tagged(index, EntryTag::Utf)?.unpack_unsigned()))
    }

    /// The UTF entry at `index`, decoded
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a UTF entry or its
    /// contents are not valid modified UTF-8.
    pub fn utf_str(&self, index: u16) -> Result<String> {
        self.runtime.atom_str(self.utf(index)?)
    }

    /// The type reference of the class entry at `index`, which must not be 0
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a class entry.
    pub fn class(&self, index: u16) -> Result<TypeRefId> {
        Ok(TypeRefId(
            self.tagged(index, EntryTag::Class)?.unpack_unsigned(),
        ))
    }

    /// The type reference of the class entry at `index`, or `None` for index 0
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if a nonzero `index` does not hold a class entry.
    pub fn type_ref(&self, index: u16) -> Result<Option<TypeRefId>> {
        if index == 0 {
            return Ok(None);
        }
        self.class(index).map(Some)
    }

    /// The member reference at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a member entry.
    pub fn member_ref(&self, index: u16) -> Result<MemberRefId> {
        Ok(MemberRefId(
            self.tagged(index, EntryTag::Member)?.unpack_unsigned(),
        ))
    }

    fn member_of_kind(&self, index: u16, kind: MemberKind) -> Result<MemberRefId> {
        let id = self.member_ref(index)?;
        let member = self.runtime.member_ref(id)?;
        if member.kind != kind {
            return Err(constant_pool_error!(
                "Expected a {:?} reference at index {}",
                kind,
                index
            ));
        }
        Ok(id)
    }

    /// The field reference at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a field reference.
    pub fn field_ref(&self, index: u16) -> Result<MemberRefId> {
        self.member_of_kind(index, MemberKind::Field)
    }

    /// The method reference at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a method reference.
    pub fn method_ref(&self, index: u16) -> Result<MemberRefId> {
        self.member_of_kind(index, MemberKind::Method)
    }

    /// The `(name, descriptor)` atoms of the name-and-type pair at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` does not hold a name-and-type pair.
    pub fn name_and_type(&self, index: u16) -> Result<(AtomId, AtomId)> {
        match self.slot(index)? {
            Slot::NameAndType { name, descriptor } => Ok((*name, *descriptor)),
            _ => Err(constant_pool_error!(
                "Expected a name-and-type pair at index {}",
                index
            )),
        }
    }

    /// The literal offset of the constant at `index`.
    ///
    /// Class entries get their class object literal allocated on first request.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` is not a loadable constant.
    pub fn literal_offset(&self, index: u16) -> Result<i32> {
        let entry = self.entry(index)?;
        match entry.decode() {
            Entry::Int(offset)
            | Entry::Float(offset)
            | Entry::Long(offset)
            | Entry::Double(offset)
            | Entry::String(offset) => Ok(offset),
            Entry::Class(id) => self
                .runtime
                .statics
                .find_or_create_object(LiteralObject::Class(id)),
            Entry::Utf(_) | Entry::Member(_) => Err(constant_pool_error!(
                "Index {} is not a literal - {:?}",
                index,
                entry
            )),
        }
    }

    /// The size in bytes of the literal at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` is not a loadable constant.
    pub fn literal_size(&self, index: u16) -> Result<usize> {
        match self.literal_description(index)? {
            EntryTag::Int | EntryTag::Float => Ok(4),
            EntryTag::Long | EntryTag::Double => Ok(8),
            _ => Ok(REFERENCE_SIZE),
        }
    }

    /// The kind of the literal at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if `index` is not a loadable constant.
    pub fn literal_description(&self, index: u16) -> Result<EntryTag> {
        let tag = self.entry(index)?.tag();
        match tag {
            EntryTag::Utf | EntryTag::Member => Err(constant_pool_error!(
                "Index {} is not a literal - {:?}",
                index,
                tag
            )),
            _ => Ok(tag),
        }
    }
}

impl fmt::Debug for ConstantPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantPool")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}
