//! Atomic matcher.
//!
//! Before the substitution engine recurses into a container's type
//! arguments it needs the member of the input union that structurally
//! corresponds to the declared atomic. [`match_atomic`] finds it.
//!
//! Candidates are visited in the input union's stored order and the first
//! one satisfying any rule wins, so an earlier weaker match beats a later
//! exact one:
//!
//! 1. same base key
//! 2. closure/callable compatibility
//! 3. declared `iterable`, candidate array-like
//! 4. candidate is an intersection starting with the declared key (`Foo&…`)
//! 5. declared callable, and the callable-shape oracle derives one from the candidate
//! 6. both are objects and the candidate's class fills in the declared class's templates

use crate::error::SubstitutionError;
use crate::oracles::{ExtendsArgKey, Oracles};
use crate::types::{Atomic, GenericObject, base_key};
use crate::union::Union;
use std::borrow::Cow;
use tracing::trace;

/// Find the member of `input` corresponding to `target`.
///
/// The result borrows from `input` unless it had to be derived (a callable
/// shape, or a generic object synthesized from template-extends metadata).
pub fn match_atomic<'i>(
    target: &Atomic,
    input: &'i Union,
    oracles: &Oracles<'_>,
) -> Result<Option<Cow<'i, Atomic>>, SubstitutionError> {
    let target_key = target.key();
    let key = base_key(&target_key);

    for (input_key, candidate) in input.entries() {
        let input_key = base_key(input_key);

        if input_key == key {
            return Ok(Some(Cow::Borrowed(candidate)));
        }

        if matches!(
            (candidate, target),
            (Atomic::Function(_), Atomic::Function(_))
                | (Atomic::Callable(_), Atomic::Callable(_))
                | (Atomic::Function(_), Atomic::Callable(_))
        ) {
            return Ok(Some(Cow::Borrowed(candidate)));
        }

        if key == "iterable" && candidate.is_array_like() {
            return Ok(Some(Cow::Borrowed(candidate)));
        }

        if input_key
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('&'))
        {
            return Ok(Some(Cow::Borrowed(candidate)));
        }

        if let (Atomic::Callable(_), Some(callables)) = (target, oracles.callables) {
            if let Some(shape) = callables.extract_callable_shape(candidate) {
                trace!(candidate = %candidate, shape = %shape, "matched callable shape");
                return Ok(Some(Cow::Owned(shape)));
            }
        }

        if let (Some(target_class), Some(candidate_class)) =
            (target.object_name(), candidate.object_name())
        {
            if let Some(matched) = match_via_template_extends(target_class, candidate_class, candidate, oracles)? {
                return Ok(Some(matched));
            }
        }
    }

    Ok(None)
}

fn match_via_template_extends<'i>(
    target_class: &str,
    candidate_class: &str,
    candidate: &'i Atomic,
    oracles: &Oracles<'_>,
) -> Result<Option<Cow<'i, Atomic>>, SubstitutionError> {
    let Some(metadata) = oracles.classes.class_metadata(candidate_class) else {
        return Ok(None);
    };
    let Some(extends) = metadata.extends_params(target_class) else {
        return Ok(None);
    };

    if matches!(candidate, Atomic::GenericObject(_)) {
        return Ok(Some(Cow::Borrowed(candidate)));
    }

    let type_params: Vec<Union> = extends
        .iter()
        .filter(|(key, _)| matches!(key, ExtendsArgKey::Named(_)))
        .map(|(_, arg)| arg.to_union())
        .collect();

    if type_params.is_empty() {
        return Err(SubstitutionError::EmptyTemplateExtends {
            class_name: candidate_class.to_string(),
            ancestor: target_class.to_string(),
        });
    }

    let extra_types = match candidate {
        Atomic::NamedObject(object) => object.extra_types.clone(),
        _ => Vec::new(),
    };

    trace!(
        candidate = candidate_class,
        ancestor = target_class,
        params = type_params.len(),
        "synthesized generic object from template-extends"
    );

    Ok(Some(Cow::Owned(Atomic::GenericObject(GenericObject {
        name: candidate_class.to_string(),
        type_params,
        extra_types,
    }))))
}

#[cfg(test)]
#[path = "../tests/matcher_tests.rs"]
mod tests;
