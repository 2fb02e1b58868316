//! Read-only collaborators consumed by the substitution engine.
//!
//! The engine never checks subtyping, joins unions, derives callable
//! signatures or resolves class hierarchies on its own. Those questions are
//! answered by the host checker through the traits below, bundled into an
//! [`Oracles`] value for the duration of one substitution.
//!
//! | Oracle | Absent / failed answer |
//! |--------|------------------------|
//! | [`ContainmentOracle`] | optional; absence means containment holds |
//! | [`CombineOracle`] | required; [`KeyedCombiner`] is the default |
//! | [`CallableShapeOracle`] | optional; `None` means no callable match |
//! | [`ClassMetadataProvider`] | required; unknown class means no match |

use crate::types::{Atomic, FxIndexMap};
use crate::union::{Union, UnionFlags};
use rustc_hash::FxHashMap;

/// Subtype containment: is every value of `candidate` a value of `bound`?
pub trait ContainmentOracle {
    fn is_contained_by(&self, candidate: &Union, bound: &Union) -> bool;
}

/// Joins two unions into one holding the atomics of both.
pub trait CombineOracle {
    fn combine(&self, a: &Union, b: &Union) -> Union;
}

/// Best-effort derivation of a callable signature from an arbitrary atomic
/// (invokable objects, callable strings, ...).
pub trait CallableShapeOracle {
    fn extract_callable_shape(&self, atomic: &Atomic) -> Option<Atomic>;
}

pub trait ClassMetadataProvider {
    fn class_metadata(&self, name: &str) -> Option<&ClassMetadata>;
}

// =============================================================================
// Class metadata
// =============================================================================

/// Key of one entry in a template-extends list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExtendsArgKey {
    /// The ancestor's template parameter name.
    Named(String),
    Position(usize),
}

/// Value of one entry in a template-extends list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtendsArg {
    Atomic(Atomic),
    Union(Union),
}

impl ExtendsArg {
    pub fn to_union(&self) -> Union {
        match self {
            ExtendsArg::Atomic(atomic) => Union::new(atomic.clone()),
            ExtendsArg::Union(union) => union.clone(),
        }
    }
}

impl From<Atomic> for ExtendsArg {
    fn from(atomic: Atomic) -> Self {
        ExtendsArg::Atomic(atomic)
    }
}

impl From<Union> for ExtendsArg {
    fn from(union: Union) -> Self {
        ExtendsArg::Union(union)
    }
}

/// What the engine needs to know about a class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassMetadata {
    pub name: String,
    /// For every ancestor (class or interface) whose templates this class
    /// fills in: the argument supplied for each of the ancestor's template
    /// parameters.
    pub template_extends: FxIndexMap<String, FxIndexMap<ExtendsArgKey, ExtendsArg>>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        ClassMetadata {
            name: name.into(),
            template_extends: FxIndexMap::default(),
        }
    }

    /// Record that this class supplies `arg` for `ancestor`'s template
    /// parameter `key`.
    pub fn extends_template(
        mut self,
        ancestor: impl Into<String>,
        key: ExtendsArgKey,
        arg: impl Into<ExtendsArg>,
    ) -> Self {
        self.template_extends
            .entry(ancestor.into())
            .or_default()
            .insert(key, arg.into());
        self
    }

    pub fn extends_params(&self, ancestor: &str) -> Option<&FxIndexMap<ExtendsArgKey, ExtendsArg>> {
        self.template_extends.get(ancestor)
    }
}

/// In-memory [`ClassMetadataProvider`].
#[derive(Clone, Debug, Default)]
pub struct ClassMetadataStore {
    classes: FxHashMap<String, ClassMetadata>,
}

impl ClassMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metadata: ClassMetadata) {
        self.classes.insert(metadata.name.clone(), metadata);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassMetadata> for ClassMetadataStore {
    fn from_iter<I: IntoIterator<Item = ClassMetadata>>(iter: I) -> Self {
        let mut store = ClassMetadataStore::new();
        for metadata in iter {
            store.insert(metadata);
        }
        store
    }
}

impl ClassMetadataProvider for ClassMetadataStore {
    fn class_metadata(&self, name: &str) -> Option<&ClassMetadata> {
        self.classes.get(name)
    }
}

// =============================================================================
// Default combiner
// =============================================================================

/// Order-preserving join deduplicated by canonical key.
///
/// Atomics of `a` come first, followed by the atomics of `b` whose keys are
/// not already present. Carried flags are OR-ed; the doc-inferred flag
/// survives only when both sides carry it.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyedCombiner;

impl CombineOracle for KeyedCombiner {
    fn combine(&self, a: &Union, b: &Union) -> Union {
        let mut combined = a.clone();
        for atomic in b.atomics() {
            combined.add_atomic(atomic.clone());
        }
        combined.flags = (a.flags | b.flags) & UnionFlags::CARRIED;
        if a.from_docblock() && b.from_docblock() {
            combined.set_from_docblock(true);
        }
        combined
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// The collaborators used by one substitution.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub combiner: &'a dyn CombineOracle,
    pub classes: &'a dyn ClassMetadataProvider,
    pub containment: Option<&'a dyn ContainmentOracle>,
    pub callables: Option<&'a dyn CallableShapeOracle>,
}

impl<'a> Oracles<'a> {
    pub fn new(combiner: &'a dyn CombineOracle, classes: &'a dyn ClassMetadataProvider) -> Self {
        Oracles {
            combiner,
            classes,
            containment: None,
            callables: None,
        }
    }

    pub fn with_containment(mut self, containment: &'a dyn ContainmentOracle) -> Self {
        self.containment = Some(containment);
        self
    }

    pub fn with_callables(mut self, callables: &'a dyn CallableShapeOracle) -> Self {
        self.callables = Some(callables);
        self
    }

    /// Containment check; holds when no oracle is available.
    pub fn is_contained_by(&self, candidate: &Union, bound: &Union) -> bool {
        self.containment
            .is_none_or(|oracle| oracle.is_contained_by(candidate, bound))
    }
}

impl std::fmt::Debug for Oracles<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracles")
            .field("containment", &self.containment.is_some())
            .field("callables", &self.callables.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/oracles_tests.rs"]
mod tests;
