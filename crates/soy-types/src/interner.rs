//! Structural interning of compound types.
//!
//! Maps a candidate type to the canonical instance of its shape. Lookups
//! take a shared lock; only a miss takes the write lock, and the miss is
//! re-checked under it so that racing constructors agree on one winner.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashSet;

use crate::types::{SoyType, SoyTypeRef};

#[derive(Debug, Default)]
pub(crate) struct TypeInterner {
    canonical: RwLock<FxHashSet<SoyTypeRef>>,
}

impl TypeInterner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the canonical instance structurally equal to `candidate`,
    /// storing `candidate` if this shape has not been seen before.
    pub(crate) fn intern(&self, candidate: SoyType) -> SoyTypeRef {
        {
            let canonical = self.canonical.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = canonical.get(&candidate) {
                return Arc::clone(existing);
            }
        }

        let mut canonical = self.canonical.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = canonical.get(&candidate) {
            return Arc::clone(existing);
        }
        let interned = Arc::new(candidate);
        canonical.insert(Arc::clone(&interned));
        tracing::trace!(ty = %interned, "interned new type");
        interned
    }

    pub(crate) fn len(&self) -> usize {
        self.canonical
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
