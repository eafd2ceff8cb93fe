//! Packed constant pool entries.
//!
//! A resolved constant pool slot is a single 32-bit word: a 3-bit [`EntryTag`] in the top bits
//! and a 29-bit payload below it. Depending on the tag the payload is
//! - an atom id ([`EntryTag::Utf`]),
//! - a type reference id ([`EntryTag::Class`]),
//! - a member reference id ([`EntryTag::Member`]), all unsigned, or
//! - a signed literal offset for [`EntryTag::Int`], [`EntryTag::Float`], [`EntryTag::Long`],
//!   [`EntryTag::Double`] and [`EntryTag::String`].
//!
//! Before pass 2 and 3 of the resolver run, reference entries hold a [`TempPackedEntry`]
//! instead: two 16-bit constant pool indices in one word.
//!
//! ```text
//!  31   29 28                                              0
//! +-------+-------------------------------------------------+
//! |  tag  |                     payload                     |
//! +-------+-------------------------------------------------+
//! ```

use std::fmt;

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::runtime::{AtomId, MemberRefId, TypeRefId},
    Result,
};

/// Number of payload bits in a packed entry
pub const PAYLOAD_BITS: u32 = 29;
/// Mask selecting the payload bits
pub const PAYLOAD_MASK: u32 = (1 << PAYLOAD_BITS) - 1;
/// Largest unsigned payload
pub const PAYLOAD_MAX: u32 = PAYLOAD_MASK;
/// Smallest signed payload
pub const SIGNED_PAYLOAD_MIN: i32 = -(1 << (PAYLOAD_BITS - 1));
/// Largest signed payload
pub const SIGNED_PAYLOAD_MAX: i32 = (1 << (PAYLOAD_BITS - 1)) - 1;

/// The kind of a resolved constant pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum EntryTag {
    /// Interned name or string payload
    Utf = 0,
    /// `int` literal
    Int = 1,
    /// `float` literal
    Float = 2,
    /// `long` literal
    Long = 3,
    /// `double` literal
    Double = 4,
    /// `java.lang.String` literal
    String = 5,
    /// Field or method reference
    Member = 6,
    /// Type reference
    Class = 7,
}

const TAGS: [EntryTag; EntryTag::COUNT] = [
    EntryTag::Utf,
    EntryTag::Int,
    EntryTag::Float,
    EntryTag::Long,
    EntryTag::Double,
    EntryTag::String,
    EntryTag::Member,
    EntryTag::Class,
];

impl EntryTag {
    /// Returns `true` if the payload of this tag is a signed literal offset
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            EntryTag::Int | EntryTag::Float | EntryTag::Long | EntryTag::Double | EntryTag::String
        )
    }

    /// The legal payload range for this tag
    #[must_use]
    pub fn payload_range(self) -> std::ops::RangeInclusive<i64> {
        if self.is_signed() {
            i64::from(SIGNED_PAYLOAD_MIN)..=i64::from(SIGNED_PAYLOAD_MAX)
        } else {
            0..=i64::from(PAYLOAD_MAX)
        }
    }
}

/// A resolved constant pool entry packed into one word.
///
/// # Examples
///
/// ```rust
/// use classreader::metadata::constpool::{EntryTag, PackedEntry};
///
/// let entry = PackedEntry::pack(EntryTag::Int, -8)?;
/// assert_eq!(entry.tag(), EntryTag::Int);
/// assert_eq!(entry.unpack_signed(), -8);
///
/// let entry = PackedEntry::pack(EntryTag::Class, 0x1FFF_FFFF)?;
/// assert_eq!(entry.unpack_unsigned(), 0x1FFF_FFFF);
/// # Ok::<(), classreader::Error>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedEntry(u32);

impl PackedEntry {
    /// Pack `value` under `tag`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if `value` is outside the payload range of `tag`.
    /// Every id and offset handed out by the runtime services fits, so this only fails on a
    /// broken service.
    pub fn pack(tag: EntryTag, value: i64) -> Result<Self> {
        if !tag.payload_range().contains(&value) {
            return Err(internal_error!(
                "Payload {} does not fit a {:?} entry",
                value,
                tag
            ));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let payload = (value as u32) & PAYLOAD_MASK;
        Ok(PackedEntry((u32::from(tag as u8) << PAYLOAD_BITS) | payload))
    }

    /// Reinterpret a raw word as a packed entry
    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        PackedEntry(bits)
    }

    /// The raw word
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// The tag in the top three bits
    #[must_use]
    pub fn tag(self) -> EntryTag {
        TAGS[(self.0 >> PAYLOAD_BITS) as usize]
    }

    /// The low 29 bits, zero extended
    #[must_use]
    pub fn unpack_unsigned(self) -> u32 {
        self.0 & PAYLOAD_MASK
    }

    /// The low 29 bits, sign extended
    #[must_use]
    pub fn unpack_signed(self) -> i32 {
        #[allow(clippy::cast_possible_wrap)]
        let word = self.0 as i32;
        (word << (32 - PAYLOAD_BITS)) >> (32 - PAYLOAD_BITS)
    }

    /// The payload, extended according to the signedness of the tag
    #[must_use]
    pub fn value(self) -> i64 {
        if self.tag().is_signed() {
            i64::from(self.unpack_signed())
        } else {
            i64::from(self.unpack_unsigned())
        }
    }

    /// Decode into a typed view
    #[must_use]
    pub fn decode(self) -> Entry {
        match self.tag() {
            EntryTag::Utf => Entry::Utf(AtomId(self.unpack_unsigned())),
            EntryTag::Int => Entry::Int(self.unpack_signed()),
            EntryTag::Float => Entry::Float(self.unpack_signed()),
            EntryTag::Long => Entry::Long(self.unpack_signed()),
            EntryTag::Double => Entry::Double(self.unpack_signed()),
            EntryTag::String => Entry::String(self.unpack_signed()),
            EntryTag::Member => Entry::Member(MemberRefId(self.unpack_unsigned())),
            EntryTag::Class => Entry::Class(TypeRefId(self.unpack_unsigned())),
        }
    }
}

impl fmt::Debug for PackedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedEntry({:?}, {})", self.tag(), self.value())
    }
}

/// Typed view of a [`PackedEntry`]. Literal variants carry their literal offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Interned string
    Utf(AtomId),
    /// Offset of an `int` literal
    Int(i32),
    /// Offset of a `float` literal
    Float(i32),
    /// Offset of a `long` literal
    Long(i32),
    /// Offset of a `double` literal
    Double(i32),
    /// Offset of a string literal
    String(i32),
    /// Field or method reference
    Member(MemberRefId),
    /// Type reference
    Class(TypeRefId),
}

/// Two 16-bit constant pool indices held in one word while the resolver runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempPackedEntry(u32);

impl TempPackedEntry {
    /// Pack two indices
    #[must_use]
    pub fn pack(index1: u16, index2: u16) -> Self {
        TempPackedEntry((u32::from(index1) << 16) | u32::from(index2))
    }

    /// The first index (class, or member name)
    #[must_use]
    pub fn index1(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// The second index (name-and-type, or descriptor)
    #[must_use]
    pub fn index2(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Debug for TempPackedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TempPackedEntry({}, {})", self.index1(), self.index2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn roundtrip_bounds() {
        for tag in EntryTag::iter() {
            let range = tag.payload_range();
            for value in [
                *range.start(),
                *range.start() + 1,
                0,
                1,
                0x0FFF_FFFF.min(*range.end()),
                *range.end() - 1,
                *range.end(),
            ] {
                let entry = PackedEntry::pack(tag, value).unwrap();
                assert_eq!(entry.tag(), tag);
                assert_eq!(entry.value(), value, "{tag:?} {value}");
            }
        }
    }

    #[test]
    fn out_of_range() {
        assert!(PackedEntry::pack(EntryTag::Utf, -1)
            .unwrap_err()
            .is_internal());
        assert!(PackedEntry::pack(EntryTag::Class, i64::from(PAYLOAD_MAX) + 1).is_err());
        assert!(PackedEntry::pack(EntryTag::Int, i64::from(SIGNED_PAYLOAD_MAX) + 1).is_err());
        assert!(PackedEntry::pack(EntryTag::String, i64::from(SIGNED_PAYLOAD_MIN) - 1).is_err());
    }

    #[test]
    fn signed_extension() {
        let entry = PackedEntry::pack(EntryTag::String, -4).unwrap();
        assert_eq!(entry.bits() >> 29, EntryTag::String as u32);
        assert_eq!(entry.unpack_signed(), -4);
        assert_eq!(entry.unpack_unsigned(), 0x1FFF_FFFC);
        assert_eq!(entry.decode(), Entry::String(-4));
    }

    #[test]
    fn decode() {
        let entry = PackedEntry::pack(EntryTag::Member, 17).unwrap();
        assert_eq!(entry.decode(), Entry::Member(MemberRefId(17)));
        assert_eq!(PackedEntry::from_bits(entry.bits()), entry);

        let entry = PackedEntry::pack(EntryTag::Class, 3).unwrap();
        assert_eq!(entry.decode(), Entry::Class(TypeRefId(3)));
    }

    #[test]
    fn temp_entries() {
        for (i1, i2) in [(0, 0), (1, 2), (0xFFFF, 0), (0, 0xFFFF), (0xFFFF, 0xFFFF), (0x1234, 0xABCD)] {
            let temp = TempPackedEntry::pack(i1, i2);
            assert_eq!(temp.index1(), i1);
            assert_eq!(temp.index2(), i2);
        }
    }

    #[test]
    fn tag_count() {
        assert_eq!(EntryTag::COUNT, 8);
        for (index, tag) in EntryTag::iter().enumerate() {
            assert_eq!(TAGS[index], tag);
        }
        assert!(EntryTag::Double.is_signed());
        assert!(!EntryTag::Member.is_signed());
    }
}
