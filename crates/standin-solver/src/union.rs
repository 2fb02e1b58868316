//! Union types.
//!
//! A [`Union`] is an ordered, deduplicated set of [`Atomic`] alternatives,
//! keyed by canonical key. Insertion order is preserved and significant:
//! the atomic matcher walks input unions in stored order.
//!
//! A union is never empty. The infallible constructors take at least one
//! atomic, the fallible one ([`Union::from_atomics`]) reports an empty input
//! as [`SubstitutionError::EmptyUnion`], and [`Union::remove_null`] refuses
//! to remove the last member.

use crate::error::SubstitutionError;
use crate::types::{Atomic, FxIndexMap};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Per-union flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnionFlags: u8 {
        const IGNORE_NULLABLE_ISSUES = 1 << 0;
        const IGNORE_FALSABLE_ISSUES = 1 << 1;
        const POSSIBLY_UNDEFINED = 1 << 2;
        /// The type was inferred from documentation rather than from code.
        const FROM_DOCBLOCK = 1 << 3;

        /// Flags copied verbatim when a union is rebuilt by substitution.
        const CARRIED = Self::IGNORE_NULLABLE_ISSUES.bits()
            | Self::IGNORE_FALSABLE_ISSUES.bits()
            | Self::POSSIBLY_UNDEFINED.bits();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Union {
    types: FxIndexMap<String, Atomic>,
    pub flags: UnionFlags,
}

impl Union {
    /// A union of exactly one atomic.
    pub fn new(atomic: Atomic) -> Self {
        let mut types = FxIndexMap::default();
        types.insert(atomic.key(), atomic);
        Union {
            types,
            flags: UnionFlags::empty(),
        }
    }

    /// Build a union from atomics, keeping the first of any duplicate keys.
    pub fn from_atomics<I>(atomics: I) -> Result<Self, SubstitutionError>
    where
        I: IntoIterator<Item = Atomic>,
    {
        let mut types = FxIndexMap::default();
        for atomic in atomics {
            types.entry(atomic.key()).or_insert(atomic);
        }
        if types.is_empty() {
            return Err(SubstitutionError::EmptyUnion {
                union_id: String::new(),
            });
        }
        Ok(Union {
            types,
            flags: UnionFlags::empty(),
        })
    }

    pub fn mixed() -> Self {
        Union::new(Atomic::Mixed)
    }

    pub fn null() -> Self {
        Union::new(Atomic::Null)
    }

    pub fn int() -> Self {
        Union::new(Atomic::Int)
    }

    pub fn string() -> Self {
        Union::new(Atomic::String)
    }

    pub fn object() -> Self {
        Union::new(Atomic::Object)
    }

    /// `atomic|null`
    pub fn nullable(atomic: Atomic) -> Self {
        let mut union = Union::new(atomic);
        union.add_atomic(Atomic::Null);
        union
    }

    /// Members in stored order.
    pub fn atomics(&self) -> impl DoubleEndedIterator<Item = &Atomic> + ExactSizeIterator {
        self.types.values()
    }

    /// `(canonical key, atomic)` pairs in stored order.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (&str, &Atomic)> + ExactSizeIterator {
        self.types.iter().map(|(key, atomic)| (key.as_str(), atomic))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Never true for a union built through the public constructors.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Add an atomic unless one with the same key is already present.
    pub fn add_atomic(&mut self, atomic: Atomic) {
        self.types.entry(atomic.key()).or_insert(atomic);
    }

    pub fn is_single(&self) -> bool {
        self.types.len() == 1
    }

    pub fn single_atomic(&self) -> Option<&Atomic> {
        if self.is_single() {
            self.types.values().next()
        } else {
            None
        }
    }

    /// Exactly `mixed`.
    pub fn is_mixed(&self) -> bool {
        self.single_atomic().is_some_and(Atomic::is_mixed)
    }

    pub fn has_mixed(&self) -> bool {
        self.types.values().any(Atomic::is_mixed)
    }

    pub fn is_nullable(&self) -> bool {
        self.types.values().any(|atomic| matches!(atomic, Atomic::Null))
    }

    /// Exactly `null`.
    pub fn is_null(&self) -> bool {
        matches!(self.single_atomic(), Some(Atomic::Null))
    }

    /// Drop the `null` member. Returns whether anything was removed; a pure
    /// `null` union is left untouched.
    pub fn remove_null(&mut self) -> bool {
        if self.is_null() {
            return false;
        }
        self.types.shift_remove("null").is_some()
    }

    pub fn from_docblock(&self) -> bool {
        self.flags.contains(UnionFlags::FROM_DOCBLOCK)
    }

    pub fn set_from_docblock(&mut self, from_docblock: bool) {
        self.flags.set(UnionFlags::FROM_DOCBLOCK, from_docblock);
    }

    /// Copy the carried flags of `source` verbatim onto this union.
    pub fn copy_carried_flags(&mut self, source: &Union) {
        self.flags.remove(UnionFlags::CARRIED);
        self.flags.insert(source.flags & UnionFlags::CARRIED);
    }

    /// Canonical identity: member keys joined with `|`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl From<Atomic> for Union {
    fn from(atomic: Atomic) -> Self {
        Union::new(atomic)
    }
}

impl fmt::Display for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.types.keys().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/union_tests.rs"]
mod tests;
