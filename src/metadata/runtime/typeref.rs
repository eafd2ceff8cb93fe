//! Type references.
//!
//! A type reference is the identity of a type as seen by one class loader: the pair of a
//! [`LoaderId`] and a type descriptor (`Ljava/lang/String;`, `I`, `[J`, ...). References are
//! interned so that every class mentioning `java/lang/String` through the same loader shares
//! one [`TypeRefId`]. Resolving a reference turns it into a [`TypeRc`] handle.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{metadata::constpool::PAYLOAD_MAX, Result};

/// Identity of a class loader
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LoaderId(pub u32);

impl LoaderId {
    /// The bootstrap class loader
    pub const BOOTSTRAP: LoaderId = LoaderId(0);
}

/// Stable identity of an interned type reference
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRefId(pub u32);

impl TypeRefId {
    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeRefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRefId({})", self.0)
    }
}

/// An interned type reference
#[derive(Debug, PartialEq, Eq)]
pub struct TypeReference {
    /// Id of this reference inside its registry
    pub id: TypeRefId,
    /// Loader through which the type is seen
    pub loader: LoaderId,
    /// The type descriptor, e.g. `Lpkg/Widget;`
    pub descriptor: String,
}

/// A reference-counted [`TypeReference`], the handle produced by resolution
pub type TypeRc = Arc<TypeReference>;

impl TypeReference {
    /// The name of the type: the internal class name for class types (`pkg/Widget`), the
    /// descriptor itself for arrays and primitives.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor
            .strip_prefix('L')
            .and_then(|name| name.strip_suffix(';'))
            .unwrap_or(&self.descriptor)
    }

    /// Returns `true` for class and interface types
    #[must_use]
    pub fn is_class_type(&self) -> bool {
        self.descriptor.starts_with('L')
    }

    /// Returns `true` for array types
    #[must_use]
    pub fn is_array_type(&self) -> bool {
        self.descriptor.starts_with('[')
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Find-or-create registry of type references.
pub trait TypeRegistry: Send + Sync {
    /// Intern the reference `(loader, descriptor)`
    ///
    /// # Errors
    /// Returns [`crate::Error::Internal`] if the registry ran out of ids.
    fn find_or_create(&self, loader: LoaderId, descriptor: &str) -> Result<TypeRefId>;

    /// Look up a reference without resolving it
    fn get(&self, id: TypeRefId) -> Option<TypeRc>;

    /// Resolve a reference to a type handle
    ///
    /// # Errors
    /// Implementations report types that cannot be resolved; the default registry only fails
    /// for ids it never handed out.
    fn resolve(&self, id: TypeRefId) -> Result<TypeRc>;
}

/// The default [`TypeRegistry`]. Resolution is the identity: every interned reference counts
/// as resolved.
#[derive(Default)]
pub struct TypeReferences {
    by_key: DashMap<(LoaderId, String), TypeRefId>,
    types: SkipMap<TypeRefId, TypeRc>,
    next_id: AtomicU32,
}

impl TypeReferences {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned references
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for TypeReferences {
    fn find_or_create(&self, loader: LoaderId, descriptor: &str) -> Result<TypeRefId> {
        match self.by_key.entry((loader, descriptor.to_string())) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                if id > PAYLOAD_MAX {
                    return Err(internal_error!("Type registry exhausted - {}", id));
                }

                let id = TypeRefId(id);
                self.types.insert(
                    id,
                    Arc::new(TypeReference {
                        id,
                        loader,
                        descriptor: descriptor.to_string(),
                    }),
                );
                entry.insert(id);
                Ok(id)
            }
        }
    }

    fn get(&self, id: TypeRefId) -> Option<TypeRc> {
        self.types.get(&id).map(|entry| entry.value().clone())
    }

    fn resolve(&self, id: TypeRefId) -> Result<TypeRc> {
        self.get(id)
            .ok_or_else(|| internal_error!("Unknown type reference - {:?}", id))
    }
}
