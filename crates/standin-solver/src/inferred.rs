//! Replacing template parameters with their inferred bindings.
//!
//! Runs after inference has filled `generic_params`: a declared type such as
//! a return type is rewritten so that every template placeholder becomes the
//! type it was bound to at the call site.

use crate::error::SubstitutionError;
use crate::oracles::CombineOracle;
use crate::template_result::TemplateResult;
use crate::types::{
    Atomic, ClassString, KeyedArray, TemplateIndexedAccess, TemplateKeyOf, TemplateParam,
    TemplateParamClass,
};
use crate::union::Union;
use smallvec::SmallVec;
use standin_common::limits::{INLINE_ATOMIC_CAPACITY, MAX_INFERRED_REPLACE_DEPTH};
use std::borrow::Cow;
use tracing::{trace, warn};

pub struct InferredTypeReplacer<'a> {
    template_result: &'a TemplateResult,
    combiner: &'a dyn CombineOracle,
}

impl<'a> InferredTypeReplacer<'a> {
    pub fn new(template_result: &'a TemplateResult, combiner: &'a dyn CombineOracle) -> Self {
        InferredTypeReplacer {
            template_result,
            combiner,
        }
    }

    /// Rewrite `union` with the recorded bindings. Returns `union` itself
    /// (borrowed) when no member changed.
    pub fn replace<'u>(&self, union: &'u Union) -> Result<Cow<'u, Union>, SubstitutionError> {
        self.replace_union(union, 0)
    }

    fn replace_union<'u>(
        &self,
        union: &'u Union,
        depth: u32,
    ) -> Result<Cow<'u, Union>, SubstitutionError> {
        let mut replaced: SmallVec<[Cow<'u, Atomic>; INLINE_ATOMIC_CAPACITY]> = SmallVec::new();
        let mut changed = false;

        for atomic in union.atomics() {
            match self.replace_atomic(atomic, depth)? {
                Replacement::Kept(atomic) => replaced.push(atomic),
                Replacement::Expanded(atomics) => {
                    changed = true;
                    replaced.extend(atomics.into_iter().map(Cow::Owned));
                }
            }
        }

        if replaced.is_empty() {
            return Err(SubstitutionError::EmptyUnion {
                union_id: union.id(),
            });
        }
        if !changed && replaced.iter().all(|atomic| matches!(atomic, Cow::Borrowed(_))) {
            return Ok(Cow::Borrowed(union));
        }

        let mut result = Union::from_atomics(replaced.into_iter().map(Cow::into_owned))?;
        result.copy_carried_flags(union);
        if union.from_docblock() {
            result.set_from_docblock(true);
        }
        Ok(Cow::Owned(result))
    }

    fn replace_atomic<'u>(
        &self,
        atomic: &'u Atomic,
        depth: u32,
    ) -> Result<Replacement<'u>, SubstitutionError> {
        let expanded = match atomic {
            Atomic::TemplateParam(param) => self.replace_param(param),
            Atomic::TemplateParamClass(param) => Some(self.replace_param_class(param)),
            Atomic::TemplateKeyOf(key_of) => self.replace_key_of(key_of),
            Atomic::TemplateIndexedAccess(access) => self.replace_indexed_access(access),
            _ => {
                if atomic.has_type_arguments() && depth >= MAX_INFERRED_REPLACE_DEPTH {
                    warn!(atomic = %atomic, depth, "inferred replacement depth limit reached");
                    return Ok(Replacement::Kept(Cow::Borrowed(atomic)));
                }
                let nested =
                    atomic.map_type_arguments(|_, nested| self.replace_union(nested, depth + 1))?;
                return Ok(Replacement::Kept(nested));
            }
        };

        Ok(match expanded {
            Some(atomics) => Replacement::Expanded(atomics),
            None => Replacement::Kept(Cow::Borrowed(atomic)),
        })
    }

    fn replace_param(&self, param: &TemplateParam) -> Option<Vec<Atomic>> {
        let defining_class = param.defining_class.as_deref();
        if let Some(binding) = self.template_result.binding(&param.name, defining_class) {
            trace!(param = %param.name, binding = %binding.ty, "replacing with inferred binding");
            return Some(binding.ty.atomics().cloned().collect());
        }
        if !self
            .template_result
            .has_template_type(&param.name, defining_class)
        {
            return Some(param.as_type.atomics().cloned().collect());
        }
        None
    }

    fn replace_param_class(&self, param: &TemplateParamClass) -> Vec<Atomic> {
        let bound_objects = self
            .template_result
            .binding(&param.param_name, param.defining_class.as_deref())
            .filter(|binding| {
                binding
                    .ty
                    .atomics()
                    .all(|atomic| matches!(atomic, Atomic::NamedObject(_)))
            });

        match bound_objects {
            Some(binding) => binding
                .ty
                .atomics()
                .filter_map(|atomic| {
                    let name = atomic.object_name()?;
                    Some(Atomic::class_string(name, Some(atomic.clone())))
                })
                .collect(),
            None => vec![Atomic::ClassString(ClassString {
                as_class: param.as_class.clone(),
                as_type: param.as_type.clone(),
            })],
        }
    }

    fn replace_key_of(&self, key_of: &TemplateKeyOf) -> Option<Vec<Atomic>> {
        self.template_result
            .binding(&key_of.param_name, key_of.defining_class.as_deref())?
            .ty
            .single_atomic()?
            .container_key_atomics()
    }

    /// `T[K]`; a union of literal offsets yields the combined values.
    fn replace_indexed_access(&self, access: &TemplateIndexedAccess) -> Option<Vec<Atomic>> {
        let defining_class = access.defining_class.as_deref();
        let array = self
            .template_result
            .binding(&access.array_param_name, defining_class)?
            .ty
            .single_atomic()?;
        let Atomic::KeyedArray(KeyedArray { properties }) = array else {
            return None;
        };
        let offsets = &self
            .template_result
            .binding(&access.offset_param_name, defining_class)?
            .ty;

        let mut combined: Option<Union> = None;
        for offset in offsets.atomics() {
            let value = properties.get(&offset.as_array_key()?)?;
            combined = Some(match combined {
                Some(previous) => self.combiner.combine(&previous, value),
                None => value.clone(),
            });
        }
        combined.map(|value| value.atomics().cloned().collect())
    }
}

enum Replacement<'u> {
    Kept(Cow<'u, Atomic>),
    Expanded(Vec<Atomic>),
}

/// Rewrite `union` using the bindings recorded in `template_result`.
pub fn replace_inferred<'u>(
    union: &'u Union,
    template_result: &TemplateResult,
    combiner: &dyn CombineOracle,
) -> Result<Cow<'u, Union>, SubstitutionError> {
    InferredTypeReplacer::new(template_result, combiner).replace(union)
}

#[cfg(test)]
#[path = "../tests/inferred_tests.rs"]
mod tests;
