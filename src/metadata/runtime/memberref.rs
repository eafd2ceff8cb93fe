//! Member references.
//!
//! A member reference names a field or a method as the triple (declaring type, name,
//! descriptor). Whether it is a field or a method follows from the descriptor: method
//! descriptors start with `(`.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        constpool::PAYLOAD_MAX,
        runtime::{AtomId, AtomTable, TypeRefId},
    },
    Result,
};

/// Stable identity of an interned member reference
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberRefId(pub u32);

impl MemberRefId {
    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for MemberRefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberRefId({})", self.0)
    }
}

/// Whether a member reference names a field or a method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Descriptor is a field type
    Field,
    /// Descriptor is a method type, starting with `(`
    Method,
}

/// An interned member reference
#[derive(Debug, PartialEq, Eq)]
pub struct MemberReference {
    /// Id of this reference inside its registry
    pub id: MemberRefId,
    /// The declaring type
    pub type_ref: TypeRefId,
    /// Member name
    pub name: AtomId,
    /// Member descriptor
    pub descriptor: AtomId,
    /// Field or method
    pub kind: MemberKind,
}

/// A reference-counted [`MemberReference`]
pub type MemberRc = Arc<MemberReference>;

/// Find-or-create registry of member references.
pub trait MemberRegistry: Send + Sync {
    /// Intern the reference `(type_ref, name, descriptor)`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPool`] if the descriptor atom is empty, and
    /// [`crate::Error::Internal`] for unknown atoms or when the registry ran out of ids.
    fn find_or_create(
        &self,
        type_ref: TypeRefId,
        name: AtomId,
        descriptor: AtomId,
    ) -> Result<MemberRefId>;

    /// Look up the reference behind `id`
    fn get(&self, id: MemberRefId) -> Option<MemberRc>;
}

/// The default [`MemberRegistry`].
pub struct MemberReferences {
    atoms: Arc<dyn AtomTable>,
    by_key: DashMap<(TypeRefId, AtomId, AtomId), MemberRefId>,
    members: SkipMap<MemberRefId, MemberRc>,
    next_id: AtomicU32,
}

impl MemberReferences {
    /// Create an empty registry that classifies descriptors through `atoms`
    #[must_use]
    pub fn new(atoms: Arc<dyn AtomTable>) -> Self {
        MemberReferences {
            atoms,
            by_key: DashMap::new(),
            members: SkipMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Number of interned references
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn classify(&self, descriptor: AtomId) -> Result<MemberKind> {
        let Some(atom) = self.atoms.get(descriptor) else {
            return Err(internal_error!("Unknown descriptor atom - {:?}", descriptor));
        };

        match atom.bytes().first() {
            Some(b'(') => Ok(MemberKind::Method),
            Some(_) => Ok(MemberKind::Field),
            None => Err(constant_pool_error!("Empty member descriptor")),
        }
    }
}

impl MemberRegistry for MemberReferences {
    fn find_or_create(
        &self,
        type_ref: TypeRefId,
        name: AtomId,
        descriptor: AtomId,
    ) -> Result<MemberRefId> {
        if let Some(existing) = self.by_key.get(&(type_ref, name, descriptor)) {
            return Ok(*existing.value());
        }

        let kind = self.classify(descriptor)?;
        match self.by_key.entry((type_ref, name, descriptor)) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                if id > PAYLOAD_MAX {
                    return Err(internal_error!("Member registry exhausted - {}", id));
                }

                let id = MemberRefId(id);
                self.members.insert(
                    id,
                    Arc::new(MemberReference {
                        id,
                        type_ref,
                        name,
                        descriptor,
                        kind,
                    }),
                );
                entry.insert(id);
                Ok(id)
            }
        }
    }

    fn get(&self, id: MemberRefId) -> Option<MemberRc> {
        self.members.get(&id).map(|entry| entry.value().clone())
    }
}
