//! Tag bytes of constant pool entries as they appear in a class file.

use strum::{EnumCount, EnumIter, FromRepr};

/// The tag byte that introduces every constant pool entry on disk.
///
/// These are the raw values from the class file; they are distinct from the [`super::EntryTag`]
/// a resolved entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, FromRepr)]
#[repr(u8)]
pub enum ConstantTag {
    /// `CONSTANT_Utf8`: u2 length followed by modified UTF-8 bytes
    Utf = 1,
    /// Second slot of a `Long` or `Double`. Never appears in a well-formed stream.
    Filler = 2,
    /// `CONSTANT_Integer`: 4 bytes
    Int = 3,
    /// `CONSTANT_Float`: 4 bytes
    Float = 4,
    /// `CONSTANT_Long`: 8 bytes, occupies two slots
    Long = 5,
    /// `CONSTANT_Double`: 8 bytes, occupies two slots
    Double = 6,
    /// `CONSTANT_Class`: u2 index of the class name
    TypeRef = 7,
    /// `CONSTANT_String`: u2 index of the contents
    String = 8,
    /// `CONSTANT_Fieldref`: u2 class index, u2 name-and-type index
    FieldRef = 9,
    /// `CONSTANT_Methodref`: u2 class index, u2 name-and-type index
    MethodRef = 10,
    /// `CONSTANT_InterfaceMethodref`: u2 class index, u2 name-and-type index
    InterfaceMethodRef = 11,
    /// `CONSTANT_NameAndType`: u2 name index, u2 descriptor index
    NameAndType = 12,
}

impl ConstantTag {
    /// Returns `true` for entries that take up two slots
    #[must_use]
    pub fn is_wide(self) -> bool {
        matches!(self, ConstantTag::Long | ConstantTag::Double)
    }
}
