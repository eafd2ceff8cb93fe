//! Interned byte strings.
//!
//! Every `CONSTANT_Utf8` entry in a constant pool is interned here exactly once, no matter how
//! many classes mention it. The resulting [`AtomId`] is what the constant pool stores; the
//! original bytes stay available through [`AtomTable::get`].
//!
//! Atom bytes are kept verbatim. Decoding into a Rust string happens on demand through
//! [`Atom::to_str`], which understands the *modified* UTF-8 used by class files (two-byte
//! encoding of NUL, surrogate pairs encoded as two three-byte sequences).

use std::{fmt, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{metadata::constpool::PAYLOAD_MAX, Result};

/// Stable identity of an interned byte string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomId(pub u32);

impl AtomId {
    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomId({})", self.0)
    }
}

/// An interned byte string.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Atom {
    bytes: Box<[u8]>,
}

/// A reference-counted [`Atom`]
pub type AtomRc = Arc<Atom>;

impl Atom {
    /// Create a new atom holding a copy of `bytes`
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        Atom {
            bytes: bytes.into(),
        }
    }

    /// The raw bytes, exactly as they appeared in the class file
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the atom as modified UTF-8.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if the bytes are not valid modified UTF-8.
    pub fn to_str(&self) -> Result<String> {
        decode_modified_utf8(&self.bytes)
    }

    /// Convert an internal class name (`java/lang/String`) into a type descriptor
    /// (`Ljava/lang/String;`). Array names already are descriptors and stay unchanged.
    #[must_use]
    pub fn descriptor_from_class_name(&self) -> Vec<u8> {
        if self.bytes.first() == Some(&b'[') {
            return self.bytes.to_vec();
        }

        let mut descriptor = Vec::with_capacity(self.bytes.len() + 2);
        descriptor.push(b'L');
        descriptor.extend_from_slice(&self.bytes);
        descriptor.push(b';');
        descriptor
    }
}

/// Decode a modified UTF-8 byte sequence.
///
/// # Errors
/// Returns [`crate::Error::ConstantPool`] on truncated sequences, invalid lead bytes, raw NUL
/// bytes or unpaired surrogates.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        let lead = bytes[index];
        match lead {
            0x01..=0x7F => {
                units.push(u16::from(lead));
                index += 1;
            }
            0xC0..=0xDF => {
                let Some(&second) = bytes.get(index + 1) else {
                    return Err(constant_pool_error!("Truncated UTF sequence at {}", index));
                };
                if second & 0xC0 != 0x80 {
                    return Err(constant_pool_error!("Bad UTF continuation at {}", index + 1));
                }
                units.push((u16::from(lead & 0x1F) << 6) | u16::from(second & 0x3F));
                index += 2;
            }
            0xE0..=0xEF => {
                let (Some(&second), Some(&third)) = (bytes.get(index + 1), bytes.get(index + 2))
                else {
                    return Err(constant_pool_error!("Truncated UTF sequence at {}", index));
                };
                if second & 0xC0 != 0x80 || third & 0xC0 != 0x80 {
                    return Err(constant_pool_error!("Bad UTF continuation at {}", index + 1));
                }
                units.push(
                    (u16::from(lead & 0x0F) << 12)
                        | (u16::from(second & 0x3F) << 6)
                        | u16::from(third & 0x3F),
                );
                index += 3;
            }
            _ => {
                return Err(constant_pool_error!(
                    "Invalid UTF byte 0x{:02x} at {}",
                    lead,
                    index
                ))
            }
        }
    }

    String::from_utf16(&units).map_err(|_| constant_pool_error!("Unpaired surrogate in UTF string"))
}

/// Find-or-create interning of byte strings.
///
/// Implementations must be thread-safe and idempotent: concurrent requests for equal bytes
/// converge on one id.
pub trait AtomTable: Send + Sync {
    /// Intern `bytes` and return the id of the canonical atom
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if the table ran out of ids.
    fn find_or_create(&self, bytes: &[u8]) -> Result<AtomId>;

    /// Look up the atom behind `id`
    fn get(&self, id: AtomId) -> Option<AtomRc>;
}

/// The default [`AtomTable`], a concurrent map from bytes to ids plus an append-only id index.
#[derive(Default)]
pub struct Atoms {
    by_bytes: DashMap<Box<[u8]>, AtomId>,
    atoms: boxcar::Vec<AtomRc>,
}

impl Atoms {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned atoms
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.count()
    }

    /// Returns `true` if nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl AtomTable for Atoms {
    fn find_or_create(&self, bytes: &[u8]) -> Result<AtomId> {
        if let Some(existing) = self.by_bytes.get(bytes) {
            return Ok(*existing.value());
        }

        match self.by_bytes.entry(bytes.into()) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let index = self.atoms.push(Arc::new(Atom::new(bytes)));
                let id = u32::try_from(index)
                    .ok()
                    .filter(|id| *id <= PAYLOAD_MAX)
                    .ok_or_else(|| internal_error!("Atom table exhausted - {}", index))?;
                entry.insert(AtomId(id));
                Ok(AtomId(id))
            }
        }
    }

    fn get(&self, id: AtomId) -> Option<AtomRc> {
        self.atoms.get(id.0 as usize).cloned()
    }
}
