//! Runtime-resident literal values.
//!
//! Numeric constants and reference literals (string constants, class objects) referenced from
//! constant pools live in one flat table addressed by signed byte offsets. Equal values share a
//! slot, so two classes that both use the constant `42` end up pointing at the same offset.
//!
//! The default layout of [`Statics`]:
//! - Word literals (`int`, `float`) grow upward from offset 0 in 4-byte steps
//! - Wide literals (`long`, `double`) grow upward from [`WIDE_BASE`] in 8-byte steps
//! - Reference literals grow downward from -4 in 4-byte steps
//!
//! All offsets fit the signed 29-bit payload of a packed constant pool entry.

use std::sync::atomic::{AtomicI32, Ordering};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        constpool::{SIGNED_PAYLOAD_MAX, SIGNED_PAYLOAD_MIN},
        runtime::{AtomId, TypeRefId},
    },
    Result,
};

/// First offset handed out to wide literals
pub const WIDE_BASE: i32 = 1 << 27;

/// An object that can be stored as a reference literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralObject {
    /// A `java.lang.String` constant with the contents of the atom
    String(AtomId),
    /// The class object of a type
    Class(TypeRefId),
}

/// The value stored at a literal offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// 4-byte value (`int` or the bits of a `float`)
    Word(i32),
    /// 8-byte value (`long` or the bits of a `double`)
    Wide(i64),
    /// Reference literal
    Object(LiteralObject),
}

/// Find-or-create allocation of literal slots.
///
/// Implementations must be thread-safe and idempotent: concurrent requests for equal values
/// converge on one offset.
pub trait LiteralAllocator: Send + Sync {
    /// Slot for a 4-byte value
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] when the word area is exhausted.
    fn find_or_create_word(&self, value: i32) -> Result<i32>;

    /// Slot for an 8-byte value
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] when the wide area is exhausted.
    fn find_or_create_wide(&self, value: i64) -> Result<i32>;

    /// Slot for a reference literal
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] when the reference area is exhausted.
    fn find_or_create_object(&self, object: LiteralObject) -> Result<i32>;

    /// The value stored at `offset`
    fn get(&self, offset: i32) -> Option<Literal>;
}

/// The default [`LiteralAllocator`].
pub struct Statics {
    words: DashMap<i32, i32>,
    wides: DashMap<i64, i32>,
    objects: DashMap<LiteralObject, i32>,
    slots: SkipMap<i32, Literal>,
    next_word: AtomicI32,
    next_wide: AtomicI32,
    next_object: AtomicI32,
}

impl Default for Statics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statics {
    /// Create an empty literal table
    #[must_use]
    pub fn new() -> Self {
        Statics {
            words: DashMap::new(),
            wides: DashMap::new(),
            objects: DashMap::new(),
            slots: SkipMap::new(),
            next_word: AtomicI32::new(0),
            next_wide: AtomicI32::new(WIDE_BASE),
            next_object: AtomicI32::new(-4),
        }
    }

    /// Number of allocated slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no literal has been allocated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Claim the next slot of an area. The counter only moves while the claimed slot fits
    /// in `min..=max`, so an exhausted area stays exhausted.
    fn bump(counter: &AtomicI32, step: i32, min: i32, max: i32) -> Result<i32> {
        counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |offset| {
                let last = offset.checked_add(step.abs() - 1)?;
                if offset < min || last > max {
                    return None;
                }
                offset.checked_add(step)
            })
            .map_err(|offset| internal_error!("Literal area exhausted at offset {}", offset))
    }
}

impl LiteralAllocator for Statics {
    fn find_or_create_word(&self, value: i32) -> Result<i32> {
        match self.words.entry(value) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let offset = Self::bump(&self.next_word, 4, 0, WIDE_BASE - 1)?;
                self.slots.insert(offset, Literal::Word(value));
                entry.insert(offset);
                Ok(offset)
            }
        }
    }

    fn find_or_create_wide(&self, value: i64) -> Result<i32> {
        match self.wides.entry(value) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let offset = Self::bump(&self.next_wide, 8, WIDE_BASE, SIGNED_PAYLOAD_MAX)?;
                self.slots.insert(offset, Literal::Wide(value));
                entry.insert(offset);
                Ok(offset)
            }
        }
    }

    fn find_or_create_object(&self, object: LiteralObject) -> Result<i32> {
        match self.objects.entry(object) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let offset = Self::bump(&self.next_object, -4, SIGNED_PAYLOAD_MIN, -1)?;
                self.slots.insert(offset, Literal::Object(object));
                entry.insert(offset);
                Ok(offset)
            }
        }
    }

    fn get(&self, offset: i32) -> Option<Literal> {
        self.slots.get(&offset).map(|entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_shared() {
        let statics = Statics::new();
        let a = statics.find_or_create_word(42).unwrap();
        let b = statics.find_or_create_word(7).unwrap();
        let c = statics.find_or_create_word(42).unwrap();

        assert_eq!(a, 0);
        assert_eq!(b, 4);
        assert_eq!(a, c);
        assert_eq!(statics.get(b), Some(Literal::Word(7)));
    }

    #[test]
    fn wides_are_aligned() {
        let statics = Statics::new();
        let a = statics.find_or_create_wide(i64::MAX).unwrap();
        let b = statics.find_or_create_wide(-1).unwrap();

        assert_eq!(a, WIDE_BASE);
        assert_eq!(b, WIDE_BASE + 8);
        assert_eq!(statics.get(a), Some(Literal::Wide(i64::MAX)));
    }

    #[test]
    fn objects_are_negative() {
        let statics = Statics::new();
        let s = statics
            .find_or_create_object(LiteralObject::String(AtomId(3)))
            .unwrap();
        let c = statics
            .find_or_create_object(LiteralObject::Class(TypeRefId(3)))
            .unwrap();

        assert_eq!(s, -4);
        assert_eq!(c, -8);
        assert_eq!(
            statics.find_or_create_object(LiteralObject::String(AtomId(3))).unwrap(),
            -4
        );
        assert_eq!(
            statics.get(c),
            Some(Literal::Object(LiteralObject::Class(TypeRefId(3))))
        );
        assert_eq!(statics.len(), 2);
        assert!(statics.get(-12).is_none());
    }

    #[test]
    fn exhausted_area_stays_exhausted() {
        let counter = AtomicI32::new(8);
        assert_eq!(Statics::bump(&counter, 4, 0, 15).unwrap(), 8);
        assert_eq!(Statics::bump(&counter, 4, 0, 15).unwrap(), 12);
        for _ in 0..3 {
            assert!(matches!(
                Statics::bump(&counter, 4, 0, 15),
                Err(crate::Error::Internal { .. })
            ));
        }
        assert_eq!(counter.load(Ordering::Relaxed), 16);

        // A counter at the edge of i32 never wraps into the valid range
        let counter = AtomicI32::new(i32::MAX - 2);
        assert!(Statics::bump(&counter, 8, WIDE_BASE, i32::MAX).is_err());
        assert_eq!(counter.load(Ordering::Relaxed), i32::MAX - 2);

        let counter = AtomicI32::new(SIGNED_PAYLOAD_MIN);
        assert_eq!(
            Statics::bump(&counter, -4, SIGNED_PAYLOAD_MIN, -1).unwrap(),
            SIGNED_PAYLOAD_MIN
        );
        assert!(Statics::bump(&counter, -4, SIGNED_PAYLOAD_MIN, -1).is_err());
        assert!(Statics::bump(&counter, -4, SIGNED_PAYLOAD_MIN, -1).is_err());
        assert_eq!(counter.load(Ordering::Relaxed), SIGNED_PAYLOAD_MIN - 4);
    }

    #[test]
    fn float_bits_are_distinct() {
        let statics = Statics::new();
        let positive = statics
            .find_or_create_word(0.0f32.to_bits() as i32)
            .unwrap();
        let negative = statics
            .find_or_create_word((-0.0f32).to_bits() as i32)
            .unwrap();
        assert_ne!(positive, negative);
    }
}
