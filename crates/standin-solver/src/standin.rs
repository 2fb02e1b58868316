//! Template standin substitution.
//!
//! Walks a declared union and replaces template placeholders with concrete
//! standins, recording what each template parameter was inferred to be.
//!
//! Two modes, selected by [`StandinOptions`]:
//!
//! - **standin** (`replace`): produce the substituted type and register
//!   inferred bindings in the template result's `generic_params`.
//! - **bound tightening** (`add_upper_bound` without `replace`): narrow the
//!   declared upper bounds in `template_types` to the observed input type and
//!   return the declared type unchanged.
//!
//! Nested type arguments are visited through [`Atomic::map_type_arguments`]
//! at `depth + 1`, with the input narrowed by the atomic matcher to the
//! member that corresponds to the container being rewritten. The depth is
//! the tie-break key for competing bindings: the one captured closer to the
//! root wins.
//!
//! Untouched unions come back as `Cow::Borrowed`, so callers can tell
//! "no substitution happened" apart from an equal-but-rebuilt result.

use crate::error::SubstitutionError;
use crate::matcher::match_atomic;
use crate::oracles::{CombineOracle, Oracles};
use crate::template_result::{TemplateKey, TemplateResult};
use crate::types::{
    Atomic, ClassString, KeyedArray, OBJECT_CLASS, TemplateIndexedAccess, TemplateKeyOf,
    TemplateParam, TemplateParamClass, TypeArgPosition,
};
use crate::union::Union;
use smallvec::SmallVec;
use standin_common::limits::{INLINE_ATOMIC_CAPACITY, MAX_STANDIN_DEPTH};
use std::borrow::Cow;
use tracing::{debug, trace, trace_span, warn};

/// Stack space kept free before `stacker` switches to a fresh segment.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each segment `stacker` allocates for deep recursion.
const STACK_GROWTH: usize = 1024 * 1024;

type Standins<'u> = SmallVec<[Cow<'u, Atomic>; INLINE_ATOMIC_CAPACITY]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StandinOptions {
    /// Produce a standin and register bindings.
    pub replace: bool,
    /// Tighten declared upper bounds (only honoured when `replace` is off).
    pub add_upper_bound: bool,
    /// Nested type arguments deeper than this are left as declared.
    pub max_depth: u32,
}

impl StandinOptions {
    pub const fn standin() -> Self {
        StandinOptions {
            replace: true,
            add_upper_bound: false,
            max_depth: MAX_STANDIN_DEPTH,
        }
    }

    pub const fn upper_bound() -> Self {
        StandinOptions {
            replace: false,
            add_upper_bound: true,
            max_depth: MAX_STANDIN_DEPTH,
        }
    }

    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Options for a contravariant position (callable parameters).
    const fn flipped(mut self) -> Self {
        self.add_upper_bound = !self.add_upper_bound;
        self
    }
}

impl Default for StandinOptions {
    fn default() -> Self {
        StandinOptions::standin()
    }
}

/// Substitution state for one type-check operation.
pub struct StandinReplacer<'a, 'r> {
    oracles: Oracles<'a>,
    template_result: &'r mut TemplateResult,
    calling_class: Option<&'a str>,
}

impl<'a, 'r> StandinReplacer<'a, 'r> {
    pub fn new(oracles: Oracles<'a>, template_result: &'r mut TemplateResult) -> Self {
        StandinReplacer {
            oracles,
            template_result,
            calling_class: None,
        }
    }

    /// The class whose method is being analysed; nested template parameters
    /// of other classes are expanded to their declared bounds.
    pub fn with_calling_class(mut self, calling_class: Option<&'a str>) -> Self {
        self.calling_class = calling_class;
        self
    }

    pub fn template_result(&self) -> &TemplateResult {
        self.template_result
    }

    /// Substitute every template placeholder in `target`.
    ///
    /// `input` is the type observed at the call or assignment site, if any.
    /// Returns `target` itself (borrowed) when nothing changed.
    pub fn substitute<'u>(
        &mut self,
        target: &'u Union,
        input: Option<&Union>,
        options: StandinOptions,
        depth: u32,
    ) -> Result<Cow<'u, Union>, SubstitutionError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            let _span = trace_span!("standin_substitute", depth, target = %target).entered();
            self.substitute_union(target, input, options, depth)
        })
    }

    fn substitute_union<'u>(
        &mut self,
        target: &'u Union,
        input: Option<&Union>,
        options: StandinOptions,
        depth: u32,
    ) -> Result<Cow<'u, Union>, SubstitutionError> {
        let mut standins = Standins::new();
        let was_nullable = target.is_nullable();

        for atomic in target.atomics() {
            match atomic {
                Atomic::TemplateParam(param)
                    if self
                        .template_result
                        .has_template_type(&param.name, param.defining_class.as_deref()) =>
                {
                    self.template_param_standin(
                        param,
                        atomic,
                        input,
                        was_nullable,
                        options,
                        depth,
                        &mut standins,
                    );
                }
                Atomic::TemplateParamClass(param)
                    if options.replace
                        && self
                            .template_result
                            .has_template_type(&param.param_name, param.defining_class.as_deref()) =>
                {
                    let resolved =
                        self.resolve_class_string_standin(param, input, target.is_single(), depth)?;
                    standins.extend(resolved.into_iter().map(Cow::Owned));
                }
                Atomic::TemplateIndexedAccess(access) if options.replace => {
                    match self.resolve_indexed_access(access) {
                        Some(value) => {
                            trace!(access = %atomic, value = %value, "resolved indexed access");
                            standins.extend(value.atomics().cloned().map(Cow::Owned));
                        }
                        None => standins.push(Cow::Borrowed(atomic)),
                    }
                }
                Atomic::TemplateKeyOf(key_of) if options.replace => {
                    match self.resolve_key_of(key_of) {
                        Some(keys) => {
                            trace!(key_of = %atomic, keys = keys.len(), "resolved key-of");
                            standins.extend(keys.into_iter().map(Cow::Owned));
                        }
                        None => standins.push(Cow::Borrowed(atomic)),
                    }
                }
                _ => standins.push(self.replace_nested(atomic, input, options, depth)?),
            }
        }

        if standins.is_empty() {
            return Err(SubstitutionError::EmptyUnion {
                union_id: target.id(),
            });
        }

        if is_unchanged(target, &standins) {
            return Ok(Cow::Borrowed(target));
        }

        let mut result = Union::from_atomics(standins.into_iter().map(Cow::into_owned))?;
        result.copy_carried_flags(target);
        Ok(Cow::Owned(result))
    }

    // =========================================================================
    // Template parameters
    // =========================================================================

    fn template_param_standin<'u>(
        &mut self,
        param: &'u TemplateParam,
        atomic: &'u Atomic,
        input: Option<&Union>,
        was_nullable: bool,
        options: StandinOptions,
        depth: u32,
        standins: &mut Standins<'u>,
    ) {
        let defining_class = param.defining_class.as_deref();
        let Some(bound) = self
            .template_result
            .template_type(&param.name, defining_class)
            .cloned()
        else {
            standins.push(Cow::Borrowed(atomic));
            return;
        };
        let key = TemplateKey::new(&param.name, defining_class);

        // Still abstract: `T` bounded by itself.
        if bound.id() == param.name {
            standins.extend(bound.atomics().cloned().map(Cow::Owned));
            return;
        }

        if !options.replace {
            if options.add_upper_bound {
                if let Some(input) = input {
                    if self.oracles.is_contained_by(input, &bound) {
                        self.template_result.replace_template_type(key, input.clone());
                    }
                }
            }
            standins.push(Cow::Borrowed(atomic));
            return;
        }

        let mut replacements: Vec<Atomic> = Vec::new();
        if bound.is_mixed() && !param.as_type.is_mixed() {
            replacements.extend(param.as_type.atomics().cloned());
        } else {
            for bound_atomic in bound.atomics() {
                match bound_atomic {
                    Atomic::TemplateKeyOf(key_of) => match self.resolve_key_of(key_of) {
                        Some(keys) => {
                            if let Ok(key_union) = Union::from_atomics(keys.iter().cloned()) {
                                trace!(
                                    param = %param.name,
                                    keys = %key_union,
                                    depth,
                                    "binding template to key-of expansion"
                                );
                                self.template_result.set_binding(key.clone(), key_union, depth);
                            }
                            replacements.extend(keys);
                        }
                        None => replacements.push(bound_atomic.clone()),
                    },
                    Atomic::TemplateParam(nested)
                        if nested.defining_class.as_deref() != self.calling_class =>
                    {
                        replacements.extend(nested.as_type.atomics().cloned());
                    }
                    _ => replacements.push(bound_atomic.clone()),
                }
            }
        }

        if let Some(input) = input {
            if param.as_type.is_mixed() || self.oracles.is_contained_by(input, &param.as_type) {
                let mut candidate = input.clone();
                if was_nullable && candidate.is_nullable() && !candidate.is_null() {
                    candidate.remove_null();
                }
                candidate.set_from_docblock(true);

                let outcome = self.template_result.register_binding(
                    key,
                    candidate,
                    depth,
                    self.oracles.combiner,
                );
                debug!(
                    param = %param.name,
                    defining_class = defining_class.unwrap_or_default(),
                    depth,
                    ?outcome,
                    "registered template binding"
                );
            } else {
                trace!(param = %param.name, input = %input, "input outside declared bound");
            }
        }

        if replacements.is_empty() {
            standins.push(Cow::Borrowed(atomic));
        } else {
            trace!(param = %param.name, replacements = replacements.len(), "template standin");
            standins.extend(replacements.into_iter().map(Cow::Owned));
        }
    }

    /// Standin for `class-string<T>`.
    ///
    /// Always yields the declared class-string. When an input is given, the
    /// class types it names are bound to `T` at `depth`; if it names none and
    /// the declared union had only this member, `T` is bound to `mixed`.
    pub fn resolve_class_string_standin(
        &mut self,
        param: &TemplateParamClass,
        input: Option<&Union>,
        was_single: bool,
        depth: u32,
    ) -> Result<Vec<Atomic>, SubstitutionError> {
        let standin = Atomic::ClassString(ClassString {
            as_class: param.as_class.clone(),
            as_type: param.as_type.clone(),
        });

        let Some(input) = input else {
            return Ok(vec![standin]);
        };

        let candidates: Vec<Atomic> = input.atomics().filter_map(class_string_candidate).collect();
        let key = TemplateKey::new(&param.param_name, param.defining_class.as_deref());

        if !candidates.is_empty() {
            let mut bound = Union::from_atomics(candidates)?;
            if let Some(existing) = self
                .template_result
                .binding(&param.param_name, param.defining_class.as_deref())
            {
                bound = self.oracles.combiner.combine(&existing.ty, &bound);
            }
            bound.set_from_docblock(true);
            trace!(param = %param.param_name, bound = %bound, depth, "class-string binding");
            self.template_result.set_binding(key, bound, depth);
        } else if was_single {
            trace!(param = %param.param_name, depth, "class-string binding fell back to mixed");
            self.template_result.set_binding(key, Union::mixed(), depth);
        }

        Ok(vec![standin])
    }

    // =========================================================================
    // Derived template types
    // =========================================================================

    /// `key-of<T>` where `T`'s declared bound is a single array-like type.
    fn resolve_key_of(&self, key_of: &TemplateKeyOf) -> Option<Vec<Atomic>> {
        self.template_result
            .template_type(&key_of.param_name, key_of.defining_class.as_deref())?
            .single_atomic()?
            .container_key_atomics()
    }

    /// `T[K]` where `T` is a single fixed shape and `K` a single literal key
    /// that the shape declares.
    fn resolve_indexed_access(&self, access: &TemplateIndexedAccess) -> Option<Union> {
        let defining_class = access.defining_class.as_deref();

        let array = self
            .template_result
            .template_type(&access.array_param_name, defining_class)?
            .single_atomic()?;
        let Atomic::KeyedArray(KeyedArray { properties }) = array else {
            return None;
        };

        let offset = self
            .template_result
            .binding(&access.offset_param_name, defining_class)
            .or_else(|| self.template_result.binding(&access.offset_param_name, None))
            .map(|binding| &binding.ty)
            .or_else(|| {
                self.template_result
                    .template_type(&access.offset_param_name, defining_class)
                    .or_else(|| {
                        self.template_result
                            .template_type(&access.offset_param_name, None)
                    })
            })?
            .single_atomic()?;
        if offset.is_mixed() {
            return None;
        }

        properties.get(&offset.as_array_key()?).cloned()
    }

    // =========================================================================
    // Containers
    // =========================================================================

    fn replace_nested<'u>(
        &mut self,
        atomic: &'u Atomic,
        input: Option<&Union>,
        options: StandinOptions,
        depth: u32,
    ) -> Result<Cow<'u, Atomic>, SubstitutionError> {
        if !atomic.has_type_arguments() {
            return Ok(Cow::Borrowed(atomic));
        }
        if depth >= options.max_depth {
            warn!(
                atomic = %atomic,
                depth,
                max_depth = options.max_depth,
                "standin depth limit reached, keeping declared type arguments"
            );
            return Ok(Cow::Borrowed(atomic));
        }

        let matched = match input {
            Some(input) if !input.is_mixed() => match_atomic(atomic, input, &self.oracles)?,
            _ => None,
        };
        let combiner = self.oracles.combiner;

        atomic.map_type_arguments(|position, nested| {
            let counterpart = matched
                .as_deref()
                .and_then(|matched| counterpart(matched, position, combiner));
            let nested_options = match position {
                TypeArgPosition::CallableParam(_) => options.flipped(),
                _ => options,
            };
            self.substitute(nested, counterpart.as_deref(), nested_options, depth + 1)
        })
    }
}

/// Run one standin substitution against `template_result`.
pub fn substitute<'u>(
    target: &'u Union,
    template_result: &mut TemplateResult,
    oracles: Oracles<'_>,
    input: Option<&Union>,
    calling_class: Option<&str>,
    options: StandinOptions,
    depth: u32,
) -> Result<Cow<'u, Union>, SubstitutionError> {
    StandinReplacer::new(oracles, template_result)
        .with_calling_class(calling_class)
        .substitute(target, input, options, depth)
}

fn is_unchanged(target: &Union, standins: &[Cow<'_, Atomic>]) -> bool {
    standins.len() == target.len()
        && standins
            .iter()
            .zip(target.atomics())
            .all(|(standin, original)| match standin {
                Cow::Borrowed(standin) => std::ptr::eq(*standin, original),
                Cow::Owned(standin) => standin == original,
            })
}

/// The class type an input member of a `class-string<T>` position names.
fn class_string_candidate(atomic: &Atomic) -> Option<Atomic> {
    match atomic {
        Atomic::LiteralClassString(name) => Some(Atomic::named_object(name.clone())),
        Atomic::TemplateParamClass(nested) => {
            let as_type = match (&nested.as_type, nested.as_class.as_str()) {
                (Some(as_type), _) => Union::new((**as_type).clone()),
                (None, OBJECT_CLASS) => Union::object(),
                (None, _) => Union::mixed(),
            };
            Some(Atomic::template_param(
                nested.param_name.clone(),
                nested.defining_class.as_deref(),
                as_type,
            ))
        }
        Atomic::ClassString(class_string) => Some(match &class_string.as_type {
            Some(as_type) => (**as_type).clone(),
            None if class_string.as_class != OBJECT_CLASS => {
                Atomic::named_object(class_string.as_class.clone())
            }
            None => Atomic::Object,
        }),
        _ => None,
    }
}

/// The argument of `matched` sitting at `position` of the declared container.
fn counterpart<'m>(
    matched: &'m Atomic,
    position: TypeArgPosition<'_>,
    combiner: &dyn CombineOracle,
) -> Option<Cow<'m, Union>> {
    match (position, matched) {
        (TypeArgPosition::Param(0), Atomic::Array(array)) => Some(Cow::Borrowed(&array.key)),
        (TypeArgPosition::Param(1) | TypeArgPosition::ListValue, Atomic::Array(array)) => {
            Some(Cow::Borrowed(&array.value))
        }
        (TypeArgPosition::Param(0), Atomic::Iterable(iterable)) => iterable
            .type_params
            .as_ref()
            .map(|(key, _)| Cow::Borrowed(key)),
        (TypeArgPosition::Param(1), Atomic::Iterable(iterable)) => iterable
            .type_params
            .as_ref()
            .map(|(_, value)| Cow::Borrowed(value)),
        (TypeArgPosition::Param(offset), Atomic::GenericObject(object)) => {
            object.type_params.get(offset).map(Cow::Borrowed)
        }
        (TypeArgPosition::Param(0), Atomic::KeyedArray(shape)) => {
            Union::from_atomics(shape.key_atomics()).ok().map(Cow::Owned)
        }
        (TypeArgPosition::Param(1) | TypeArgPosition::ListValue, Atomic::KeyedArray(shape)) => {
            combined_shape_value(shape, combiner).map(Cow::Owned)
        }
        (TypeArgPosition::ShapeValue(key), Atomic::KeyedArray(shape)) => {
            shape.properties.get(key).map(Cow::Borrowed)
        }
        (TypeArgPosition::Param(0), Atomic::List(_)) => Some(Cow::Owned(Union::int())),
        (TypeArgPosition::Param(1) | TypeArgPosition::ListValue, Atomic::List(list)) => {
            Some(Cow::Borrowed(&list.value))
        }
        (
            TypeArgPosition::CallableParam(offset),
            Atomic::Function(signature) | Atomic::Callable(signature),
        ) => signature.params.as_ref()?.get(offset).map(Cow::Borrowed),
        (TypeArgPosition::CallableReturn, Atomic::Function(signature) | Atomic::Callable(signature)) => {
            signature.return_type.as_ref().map(Cow::Borrowed)
        }
        _ => None,
    }
}

fn combined_shape_value(shape: &KeyedArray, combiner: &dyn CombineOracle) -> Option<Union> {
    let mut values = shape.properties.values();
    let first = values.next()?.clone();
    Some(values.fold(first, |combined, value| combiner.combine(&combined, value)))
}

impl std::fmt::Debug for StandinReplacer<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandinReplacer")
            .field("calling_class", &self.calling_class)
            .field("template_result", &self.template_result)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/standin_tests.rs"]
mod tests;
