//! Tag interner.
//!
//! Every tag string that enters the engine (from a grammar, a document, or
//! the public `create_tag` surface) is deduplicated into a small copyable
//! [`TagId`]. All later comparisons are id comparisons, so set membership and
//! context matching never touch string contents.
//!
//! The interner is scoped to one compiled grammar rather than being a
//! process-wide global: two grammars loaded side by side get independent id
//! spaces and cannot contaminate each other. Within one grammar the interner
//! is shared (behind an `Arc`) by every document processed with it.
//!
//! Reads (`resolve`) are lock-free; concurrent `intern` calls for the same
//! string agree on the id.

use lasso::{Spur, ThreadedRodeo};

use crate::errors::InvalidTagError;

/// Identifier of an interned tag string.
pub type TagId = Spur;

/// Deduplicating, append-only tag table.
#[derive(Debug, Default)]
pub struct Interner {
    rodeo: ThreadedRodeo,
}

impl Interner {
    pub fn new() -> Self {
        Interner { rodeo: ThreadedRodeo::default() }
    }

    /// Intern `name`, returning the stable id for it.
    ///
    /// Idempotent: the same string always yields the same id. Rejects the
    /// empty string and strings containing a NUL byte.
    pub fn intern(&self, name: &str) -> Result<TagId, InvalidTagError> {
        if name.is_empty() {
            return Err(InvalidTagError::Empty);
        }
        if name.as_bytes().contains(&0) {
            return Err(InvalidTagError::Nul);
        }
        Ok(self.rodeo.get_or_intern(name))
    }

    /// Resolve an id back to its string. Total for any id this interner produced.
    pub fn resolve(&self, id: TagId) -> &str {
        self.rodeo.resolve(&id)
    }

    /// Look up the id of an already-interned string without interning it.
    pub fn get(&self, name: &str) -> Option<TagId> {
        self.rodeo.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}
