//! Template resolution state for one type-check operation.
//!
//! A [`TemplateResult`] carries two maps keyed by [`TemplateKey`]
//! (parameter name plus defining class):
//!
//! - `template_types`: the declared upper bound of each template parameter.
//!   Only bound-tightening substitution rewrites these.
//! - `generic_params`: the binding inferred for each parameter, together with
//!   the substitution depth at which it was captured.
//!
//! One instance belongs to exactly one logical check (a call site, an
//! assignment) and is dropped afterwards. There is no internal locking;
//! concurrent checks each build their own.

use crate::oracles::CombineOracle;
use crate::types::FxIndexMap;
use crate::union::Union;
use rustc_hash::FxHashMap;
use tracing::trace;

/// `(parameter name, defining class)`.
///
/// `defining_class` is `None` for templates declared outside any class
/// (free functions), which keeps it distinct from a class literally named
/// `""`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey {
    pub name: String,
    pub defining_class: Option<String>,
}

impl TemplateKey {
    pub fn new(name: impl Into<String>, defining_class: Option<&str>) -> Self {
        TemplateKey {
            name: name.into(),
            defining_class: defining_class.map(str::to_string),
        }
    }
}

/// An inferred binding and the depth it was captured at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub ty: Union,
    pub depth: u32,
}

/// How [`TemplateResult::register_binding`] resolved a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingOutcome {
    /// No previous binding.
    Inserted,
    /// The previous binding was captured closer to the root and wins.
    KeptExisting,
    /// Same depth: previous binding and candidate were combined.
    Merged,
    /// The previous binding was captured deeper and was overwritten.
    Replaced,
}

#[derive(Clone, Debug, Default)]
pub struct TemplateResult {
    template_types: FxIndexMap<TemplateKey, Union>,
    generic_params: FxHashMap<TemplateKey, Binding>,
}

impl TemplateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a set of declared upper bounds.
    pub fn with_template_types<I>(template_types: I) -> Self
    where
        I: IntoIterator<Item = (TemplateKey, Union)>,
    {
        TemplateResult {
            template_types: template_types.into_iter().collect(),
            generic_params: FxHashMap::default(),
        }
    }

    pub fn add_template_type(&mut self, name: &str, defining_class: Option<&str>, bound: Union) {
        self.template_types
            .insert(TemplateKey::new(name, defining_class), bound);
    }

    pub fn template_type(&self, name: &str, defining_class: Option<&str>) -> Option<&Union> {
        self.template_types
            .get(&TemplateKey::new(name, defining_class))
    }

    pub fn has_template_type(&self, name: &str, defining_class: Option<&str>) -> bool {
        self.template_type(name, defining_class).is_some()
    }

    /// Declared bounds in declaration order.
    pub fn template_types(&self) -> impl Iterator<Item = (&TemplateKey, &Union)> {
        self.template_types.iter()
    }

    /// Overwrite a declared upper bound (bound-tightening mode).
    pub(crate) fn replace_template_type(&mut self, key: TemplateKey, bound: Union) {
        trace!(param = %key.name, bound = %bound, "tightening template upper bound");
        self.template_types.insert(key, bound);
    }

    pub fn binding(&self, name: &str, defining_class: Option<&str>) -> Option<&Binding> {
        self.generic_params
            .get(&TemplateKey::new(name, defining_class))
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&TemplateKey, &Binding)> {
        self.generic_params.iter()
    }

    pub fn has_bindings(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Unconditionally bind `key` to `ty` at `depth`.
    pub fn set_binding(&mut self, key: TemplateKey, ty: Union, depth: u32) {
        self.generic_params.insert(key, Binding { ty, depth });
    }

    /// Merge an inference candidate into `generic_params`.
    ///
    /// Bindings captured closer to the root take precedence:
    /// - existing depth smaller than `depth`: keep the existing binding;
    /// - same depth: replace it with `combine(existing, candidate)`;
    /// - no binding, or existing depth larger: bind the candidate at `depth`.
    pub fn register_binding(
        &mut self,
        key: TemplateKey,
        candidate: Union,
        depth: u32,
        combiner: &dyn CombineOracle,
    ) -> BindingOutcome {
        match self.generic_params.get_mut(&key) {
            Some(existing) if existing.depth < depth => BindingOutcome::KeptExisting,
            Some(existing) if existing.depth == depth => {
                existing.ty = combiner.combine(&existing.ty, &candidate);
                BindingOutcome::Merged
            }
            Some(existing) => {
                *existing = Binding {
                    ty: candidate,
                    depth,
                };
                BindingOutcome::Replaced
            }
            None => {
                self.generic_params.insert(
                    key,
                    Binding {
                        ty: candidate,
                        depth,
                    },
                );
                BindingOutcome::Inserted
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/template_result_tests.rs"]
mod tests;
