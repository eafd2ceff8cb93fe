//! The three-pass constant pool resolver.
//!
//! Constant pool entries reference each other by index, and nothing in the format guarantees
//! that a target is declared before its user. The builder therefore works in three passes over
//! a working array that lives only for the duration of one parse:
//!
//! 1. Raw decode. Strings are interned and numeric literals allocated right away. References
//!    are kept as raw indices.
//! 2. Type and string resolution. `CONSTANT_Class` and `CONSTANT_String` become
//!    [`EntryTag::Class`] and [`EntryTag::String`] entries.
//! 3. Member resolution. Field and method references, whose class index now points at a
//!    resolved class entry, become [`EntryTag::Member`] entries.
//!
//! Name-and-type pairs are not entries of their own in the resolved pool; they are kept as a
//! pair of atoms for attributes that refer to them directly.

use std::sync::Arc;

use log::{debug, trace};

use crate::{
    file::parser::Parser,
    metadata::{
        constpool::{ConstantPool, ConstantTag, EntryTag, PackedEntry, Slot, TempPackedEntry},
        runtime::{decode_modified_utf8, AtomId, LiteralObject, LoaderId, Runtime, TypeRefId},
    },
    Error, Result,
};

/// State of one working slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawSlot {
    /// Index 0
    Unused,
    /// Second half of a `Long` or `Double`
    Filler,
    /// Final entry
    Done(PackedEntry),
    /// `CONSTANT_Class` pointing at its name
    TypeRef(u16),
    /// `CONSTANT_String` pointing at its contents
    String(u16),
    /// Field or method reference: class index, name-and-type index
    Member(TempPackedEntry),
    /// Name index, descriptor index
    NameAndType(TempPackedEntry),
}

/// Working state of one constant pool parse.
pub(crate) struct ConstantPoolBuilder {
    runtime: Arc<Runtime>,
    loader: LoaderId,
    slots: Vec<RawSlot>,
}

impl ConstantPoolBuilder {
    /// Read the constant pool at the current position of `parser`, starting with its u2 count.
    ///
    /// Type references are interned through `loader`.
    pub(crate) fn read(
        parser: &mut Parser,
        runtime: Arc<Runtime>,
        loader: LoaderId,
    ) -> Result<ConstantPool> {
        let count = parser.read_be::<u16>().map_err(truncated)?;
        debug!("Constant pool with {} slots", count);

        let mut builder = ConstantPoolBuilder {
            runtime,
            loader,
            slots: vec![RawSlot::Unused; usize::from(count).max(1)],
        };

        builder.decode_raw(parser).map_err(truncated)?;
        builder.resolve_types()?;
        builder.resolve_members()?;
        builder.finish()
    }

    /// Pass 1
    fn decode_raw(&mut self, parser: &mut Parser) -> Result<()> {
        trace!("Constant pool pass 1: raw decode");

        let count = self.slots.len();
        let mut index = 1;
        while index < count {
            let byte = parser.read_be::<u8>()?;
            let Some(tag) = ConstantTag::from_repr(byte) else {
                return Err(constant_pool_error!(
                    "Unknown constant pool tag {} at index {}",
                    byte,
                    index
                ));
            };

            self.slots[index] = match tag {
                ConstantTag::Utf => {
                    let atom = self.runtime.atoms.find_or_create(parser.read_prefixed_bytes()?)?;
                    RawSlot::Done(PackedEntry::pack(EntryTag::Utf, i64::from(atom.value()))?)
                }
                ConstantTag::Int | ConstantTag::Float => {
                    let offset = self.runtime.statics.find_or_create_word(parser.read_be()?)?;
                    let tag = if tag == ConstantTag::Int {
                        EntryTag::Int
                    } else {
                        EntryTag::Float
                    };
                    RawSlot::Done(PackedEntry::pack(tag, i64::from(offset))?)
                }
                ConstantTag::Long | ConstantTag::Double => {
                    let offset = self.runtime.statics.find_or_create_wide(parser.read_be()?)?;
                    let tag = if tag == ConstantTag::Long {
                        EntryTag::Long
                    } else {
                        EntryTag::Double
                    };
                    RawSlot::Done(PackedEntry::pack(tag, i64::from(offset))?)
                }
                ConstantTag::TypeRef => RawSlot::TypeRef(parser.read_be()?),
                ConstantTag::String => RawSlot::String(parser.read_be()?),
                ConstantTag::FieldRef | ConstantTag::MethodRef | ConstantTag::InterfaceMethodRef => {
                    let class = parser.read_be()?;
                    let name_and_type = parser.read_be()?;
                    RawSlot::Member(TempPackedEntry::pack(class, name_and_type))
                }
                ConstantTag::NameAndType => {
                    let name = parser.read_be()?;
                    let descriptor = parser.read_be()?;
                    RawSlot::NameAndType(TempPackedEntry::pack(name, descriptor))
                }
                ConstantTag::Filler => {
                    return Err(internal_error!(
                        "Filler tag read from the stream at index {}",
                        index
                    ))
                }
            };

            if tag.is_wide() && index + 1 < count {
                self.slots[index + 1] = RawSlot::Filler;
                index += 1;
            }
            index += 1;
        }

        Ok(())
    }

    /// Pass 2
    fn resolve_types(&mut self) -> Result<()> {
        trace!("Constant pool pass 2: types and strings");

        for index in 1..self.slots.len() {
            let resolved = match self.slots[index] {
                RawSlot::TypeRef(name_index) => {
                    let name = self.runtime.atom(self.utf_at(name_index)?)?;
                    let descriptor = decode_modified_utf8(&name.descriptor_from_class_name())?;
                    let id = self.runtime.types.find_or_create(self.loader, &descriptor)?;
                    PackedEntry::pack(EntryTag::Class, i64::from(id.value()))?
                }
                RawSlot::String(utf_index) => {
                    let atom = self.utf_at(utf_index)?;
                    // Only valid strings become literals
                    self.runtime.atom_str(atom)?;
                    let offset = self
                        .runtime
                        .statics
                        .find_or_create_object(LiteralObject::String(atom))?;
                    PackedEntry::pack(EntryTag::String, i64::from(offset))?
                }
                _ => continue,
            };
            self.slots[index] = RawSlot::Done(resolved);
        }

        Ok(())
    }

    /// Pass 3
    fn resolve_members(&mut self) -> Result<()> {
        trace!("Constant pool pass 3: members");

        for index in 1..self.slots.len() {
            if let RawSlot::Member(temp) = self.slots[index] {
                let class = self.class_at(temp.index1())?;
                let (name, descriptor) = self.name_and_type_at(temp.index2())?;
                let id = self
                    .runtime
                    .members
                    .find_or_create(class, name, descriptor)?;
                self.slots[index] =
                    RawSlot::Done(PackedEntry::pack(EntryTag::Member, i64::from(id.value()))?);
            }
        }

        Ok(())
    }

    /// Freeze the working array into the final pool
    fn finish(self) -> Result<ConstantPool> {
        let mut slots = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            slots.push(match *slot {
                RawSlot::Unused => Slot::Unused,
                RawSlot::Filler => Slot::Filler,
                RawSlot::Done(entry) => Slot::Entry(entry),
                RawSlot::NameAndType(temp) => {
                    let (name, descriptor) = self.resolve_name_and_type(temp)?;
                    Slot::NameAndType { name, descriptor }
                }
                RawSlot::TypeRef(_) | RawSlot::String(_) | RawSlot::Member(_) => {
                    return Err(internal_error!("Unresolved constant pool slot {}", index))
                }
            });
        }

        Ok(ConstantPool::new(slots.into_boxed_slice(), self.runtime))
    }

    fn raw(&self, index: u16) -> Result<RawSlot> {
        match self.slots.get(usize::from(index)) {
            None | Some(RawSlot::Unused) => Err(constant_pool_error!(
                "Index {} outside of constant pool with {} slots",
                index,
                self.slots.len()
            )),
            Some(RawSlot::Filler) => Err(internal_error!(
                "Dereferenced the filler slot at index {}",
                index
            )),
            Some(slot) => Ok(*slot),
        }
    }

    fn utf_at(&self, index: u16) -> Result<AtomId> {
        match self.raw(index)? {
            RawSlot::Done(entry) if entry.tag() == EntryTag::Utf => {
                Ok(AtomId(entry.unpack_unsigned()))
            }
            other => Err(constant_pool_error!(
                "Expected a UTF entry at index {} - {:?}",
                index,
                other
            )),
        }
    }

    fn class_at(&self, index: u16) -> Result<TypeRefId> {
        match self.raw(index)? {
            RawSlot::Done(entry) if entry.tag() == EntryTag::Class => {
                Ok(TypeRefId(entry.unpack_unsigned()))
            }
            other => Err(constant_pool_error!(
                "Expected a class entry at index {} - {:?}",
                index,
                other
            )),
        }
    }

    fn name_and_type_at(&self, index: u16) -> Result<(AtomId, AtomId)> {
        match self.raw(index)? {
            RawSlot::NameAndType(temp) => self.resolve_name_and_type(temp),
            other => Err(constant_pool_error!(
                "Expected a name-and-type entry at index {} - {:?}",
                index,
                other
            )),
        }
    }

    fn resolve_name_and_type(&self, temp: TempPackedEntry) -> Result<(AtomId, AtomId)> {
        Ok((self.utf_at(temp.index1())?, self.utf_at(temp.index2())?))
    }
}

/// A short read inside the pool is a pool format error, not a bare bounds error.
fn truncated(error: Error) -> Error {
    match error {
        Error::OutOfBounds => constant_pool_error!("Constant pool truncated"),
        other => other,
    }
}
