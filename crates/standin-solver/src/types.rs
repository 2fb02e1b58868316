//! Atomic type model.
//!
//! An [`Atomic`] is one alternative of a [`Union`]. The set of variants is
//! closed: concrete leaf types (scalars, literals, objects, class-strings),
//! containers that own nested `Union` type arguments (arrays, lists, fixed
//! shapes, iterables, generic objects, callables), and the template-derived
//! variants that the substitution engine resolves.
//!
//! ## Canonical keys
//!
//! Every atomic renders to a canonical key string (its `Display` output).
//! Unions are deduplicated by this key, so two atomics with the same key are
//! the same type as far as the union is concerned.
//!
//! | Variant | Key |
//! |---------|-----|
//! | `TemplateParam` | `T` |
//! | `TemplateParamClass` | `class-string<T>` |
//! | `TemplateKeyOf` | `key-of<T>` |
//! | `TemplateIndexedAccess` | `T[K]` |
//! | `GenericObject` | `Foo<int, string>` |
//! | `NamedObject` with intersection | `Foo&Bar` |
//! | `KeyedArray` | `array{'a': int, 0: string}` |
//!
//! [`base_key`] strips the generic-argument suffix of a key, which is what
//! the substitution engine and the matcher compare on.

use crate::union::Union;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::borrow::Cow;
use std::fmt;

/// Insertion-ordered map with the Fx hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// The class name used by a bare `class-string` (no specific class).
pub const OBJECT_CLASS: &str = "object";

// =============================================================================
// Array keys
// =============================================================================

/// A literal key of a fixed-shape array.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl ArrayKey {
    /// The literal type denoting this key.
    pub fn to_atomic(&self) -> Atomic {
        match self {
            ArrayKey::Int(value) => Atomic::LiteralInt(*value),
            ArrayKey::String(value) => Atomic::LiteralString(value.clone()),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(value: i64) -> Self {
        ArrayKey::Int(value)
    }
}

impl From<&str> for ArrayKey {
    fn from(value: &str) -> Self {
        ArrayKey::String(value.to_string())
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(value) => write!(f, "{value}"),
            ArrayKey::String(value) => write!(f, "'{value}'"),
        }
    }
}

// =============================================================================
// Variant payloads
// =============================================================================

/// `array<K, V>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayType {
    pub key: Union,
    pub value: Union,
}

/// `list<V>`; keys are implicitly `int`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListType {
    pub value: Union,
}

/// Fixed-shape ("object-like") array: `array{'a': int, 'b': string}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedArray {
    pub properties: FxIndexMap<ArrayKey, Union>,
}

impl KeyedArray {
    /// Literal atomics for every declared key, in declaration order.
    pub fn key_atomics(&self) -> Vec<Atomic> {
        self.properties.keys().map(ArrayKey::to_atomic).collect()
    }
}

/// `iterable` or `iterable<K, V>`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct IterableType {
    pub type_params: Option<(Union, Union)>,
}

/// A class instance type, optionally intersected with other types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedObject {
    pub name: String,
    pub extra_types: Vec<Atomic>,
}

/// A class instance type with bound template arguments: `Foo<int>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericObject {
    pub name: String,
    pub type_params: Vec<Union>,
    pub extra_types: Vec<Atomic>,
}

/// `class-string` / `class-string<Foo>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassString {
    /// The class the string names, or [`OBJECT_CLASS`] for any class.
    pub as_class: String,
    /// The named object type the string resolves to, when known.
    pub as_type: Option<Box<Atomic>>,
}

/// Parameter and return types shared by closures and callables.
///
/// `params: None` means the parameter list is unspecified (a bare
/// `callable`), not that it is empty.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CallableSignature {
    pub params: Option<Vec<Union>>,
    pub return_type: Option<Union>,
}

/// A template parameter placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: String,
    pub defining_class: Option<String>,
    /// The documented upper bound (`@template T as Foo`).
    pub as_type: Union,
}

/// `class-string<T>` where `T` is a template parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateParamClass {
    pub param_name: String,
    pub defining_class: Option<String>,
    pub as_class: String,
    pub as_type: Option<Box<Atomic>>,
}

/// `T[K]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateIndexedAccess {
    pub array_param_name: String,
    pub offset_param_name: String,
    pub defining_class: Option<String>,
}

/// `key-of<T>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateKeyOf {
    pub param_name: String,
    pub defining_class: Option<String>,
}

// =============================================================================
// Atomic
// =============================================================================

/// One alternative of a union type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Atomic {
    /// Fully unconstrained.
    Mixed,
    Null,
    Bool,
    Int,
    Float,
    String,
    LiteralInt(i64),
    LiteralString(String),
    /// `Foo::class`
    LiteralClassString(String),
    ClassString(ClassString),
    /// Any object.
    Object,
    NamedObject(NamedObject),
    GenericObject(GenericObject),
    Iterable(IterableType),
    Array(ArrayType),
    List(ListType),
    KeyedArray(KeyedArray),
    /// A closure with a known signature.
    Function(CallableSignature),
    Callable(CallableSignature),
    TemplateParam(TemplateParam),
    TemplateParamClass(TemplateParamClass),
    TemplateIndexedAccess(TemplateIndexedAccess),
    TemplateKeyOf(TemplateKeyOf),
}

/// Where a nested type argument sits inside its container.
///
/// Passed to the closure of [`Atomic::map_type_arguments`] so callers can
/// pick the matching argument of a counterpart type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeArgPosition<'a> {
    /// Positional argument of an `array`, `iterable`, or generic object.
    /// Arrays and iterables use 0 for the key and 1 for the value.
    Param(usize),
    /// The value of a `list`.
    ListValue,
    /// The value stored at a fixed-shape key.
    ShapeValue(&'a ArrayKey),
    CallableParam(usize),
    CallableReturn,
}

impl Atomic {
    pub fn named_object(name: impl Into<String>) -> Self {
        Atomic::NamedObject(NamedObject {
            name: name.into(),
            extra_types: Vec::new(),
        })
    }

    pub fn generic_object(name: impl Into<String>, type_params: Vec<Union>) -> Self {
        Atomic::GenericObject(GenericObject {
            name: name.into(),
            type_params,
            extra_types: Vec::new(),
        })
    }

    /// `Foo&Bar&…`
    pub fn intersection(name: impl Into<String>, extra_types: Vec<Atomic>) -> Self {
        Atomic::NamedObject(NamedObject {
            name: name.into(),
            extra_types,
        })
    }

    pub fn literal_string(value: impl Into<String>) -> Self {
        Atomic::LiteralString(value.into())
    }

    pub fn array(key: Union, value: Union) -> Self {
        Atomic::Array(ArrayType { key, value })
    }

    pub fn list(value: Union) -> Self {
        Atomic::List(ListType { value })
    }

    pub fn keyed_array<K: Into<ArrayKey>>(properties: impl IntoIterator<Item = (K, Union)>) -> Self {
        Atomic::KeyedArray(KeyedArray {
            properties: properties
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        })
    }

    pub fn iterable() -> Self {
        Atomic::Iterable(IterableType::default())
    }

    pub fn function(params: Vec<Union>, return_type: Option<Union>) -> Self {
        Atomic::Function(CallableSignature {
            params: Some(params),
            return_type,
        })
    }

    pub fn callable(params: Option<Vec<Union>>, return_type: Option<Union>) -> Self {
        Atomic::Callable(CallableSignature {
            params,
            return_type,
        })
    }

    pub fn class_string(as_class: impl Into<String>, as_type: Option<Atomic>) -> Self {
        Atomic::ClassString(ClassString {
            as_class: as_class.into(),
            as_type: as_type.map(Box::new),
        })
    }

    pub fn template_param(
        name: impl Into<String>,
        defining_class: Option<&str>,
        as_type: Union,
    ) -> Self {
        Atomic::TemplateParam(TemplateParam {
            name: name.into(),
            defining_class: defining_class.map(str::to_string),
            as_type,
        })
    }

    pub fn template_param_class(
        param_name: impl Into<String>,
        defining_class: Option<&str>,
        as_class: impl Into<String>,
        as_type: Option<Atomic>,
    ) -> Self {
        Atomic::TemplateParamClass(TemplateParamClass {
            param_name: param_name.into(),
            defining_class: defining_class.map(str::to_string),
            as_class: as_class.into(),
            as_type: as_type.map(Box::new),
        })
    }

    pub fn key_of(param_name: impl Into<String>, defining_class: Option<&str>) -> Self {
        Atomic::TemplateKeyOf(TemplateKeyOf {
            param_name: param_name.into(),
            defining_class: defining_class.map(str::to_string),
        })
    }

    pub fn indexed_access(
        array_param_name: impl Into<String>,
        offset_param_name: impl Into<String>,
        defining_class: Option<&str>,
    ) -> Self {
        Atomic::TemplateIndexedAccess(TemplateIndexedAccess {
            array_param_name: array_param_name.into(),
            offset_param_name: offset_param_name.into(),
            defining_class: defining_class.map(str::to_string),
        })
    }

    /// Canonical key of this atomic.
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Atomic::Mixed)
    }

    /// Class name of a named or generic object.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            Atomic::NamedObject(object) => Some(&object.name),
            Atomic::GenericObject(object) => Some(&object.name),
            _ => None,
        }
    }

    /// `array`, `list`, or fixed-shape array.
    pub fn is_array_like(&self) -> bool {
        matches!(
            self,
            Atomic::Array(_) | Atomic::List(_) | Atomic::KeyedArray(_)
        )
    }

    /// The literal array key this atomic denotes, if it is an int or string
    /// literal.
    pub fn as_array_key(&self) -> Option<ArrayKey> {
        match self {
            Atomic::LiteralInt(value) => Some(ArrayKey::Int(*value)),
            Atomic::LiteralString(value) => Some(ArrayKey::String(value.clone())),
            _ => None,
        }
    }

    /// Atomics of this container's key type, as seen by `key-of`.
    ///
    /// - fixed shape: one literal per declared key
    /// - list: `int`
    /// - array: the atomics of its first type argument
    ///
    /// Returns `None` for anything that is not array-like. An empty fixed
    /// shape yields an empty list.
    pub fn container_key_atomics(&self) -> Option<Vec<Atomic>> {
        match self {
            Atomic::KeyedArray(shape) => Some(shape.key_atomics()),
            Atomic::List(_) => Some(vec![Atomic::Int]),
            Atomic::Array(array) => Some(array.key.atomics().cloned().collect()),
            _ => None,
        }
    }

    /// Whether this atomic owns nested `Union` type arguments.
    pub fn has_type_arguments(&self) -> bool {
        match self {
            Atomic::Array(_)
            | Atomic::List(_)
            | Atomic::KeyedArray(_)
            | Atomic::GenericObject(_) => true,
            Atomic::Iterable(iterable) => iterable.type_params.is_some(),
            Atomic::Function(signature) | Atomic::Callable(signature) => {
                signature.params.is_some() || signature.return_type.is_some()
            }
            Atomic::Mixed
            | Atomic::Null
            | Atomic::Bool
            | Atomic::Int
            | Atomic::Float
            | Atomic::String
            | Atomic::LiteralInt(_)
            | Atomic::LiteralString(_)
            | Atomic::LiteralClassString(_)
            | Atomic::ClassString(_)
            | Atomic::Object
            | Atomic::NamedObject(_)
            | Atomic::TemplateParam(_)
            | Atomic::TemplateParamClass(_)
            | Atomic::TemplateIndexedAccess(_)
            | Atomic::TemplateKeyOf(_) => false,
        }
    }

    /// Rewrite every nested type argument through `f`.
    ///
    /// Containers call `f` once per argument, in declaration order, and are
    /// rebuilt only if at least one argument came back owned; otherwise the
    /// original atomic is returned borrowed. Leaf and template variants
    /// never call `f`.
    pub fn map_type_arguments<'s, E, F>(&'s self, mut f: F) -> Result<Cow<'s, Atomic>, E>
    where
        F: FnMut(TypeArgPosition<'s>, &'s Union) -> Result<Cow<'s, Union>, E>,
    {
        let mapped = match self {
            Atomic::Array(array) => {
                let key = f(TypeArgPosition::Param(0), &array.key)?;
                let value = f(TypeArgPosition::Param(1), &array.value)?;
                if is_borrowed(&key) && is_borrowed(&value) {
                    return Ok(Cow::Borrowed(self));
                }
                Atomic::Array(ArrayType {
                    key: key.into_owned(),
                    value: value.into_owned(),
                })
            }
            Atomic::List(list) => {
                let value = f(TypeArgPosition::ListValue, &list.value)?;
                if is_borrowed(&value) {
                    return Ok(Cow::Borrowed(self));
                }
                Atomic::List(ListType {
                    value: value.into_owned(),
                })
            }
            Atomic::Iterable(IterableType {
                type_params: Some((key, value)),
            }) => {
                let key = f(TypeArgPosition::Param(0), key)?;
                let value = f(TypeArgPosition::Param(1), value)?;
                if is_borrowed(&key) && is_borrowed(&value) {
                    return Ok(Cow::Borrowed(self));
                }
                Atomic::Iterable(IterableType {
                    type_params: Some((key.into_owned(), value.into_owned())),
                })
            }
            Atomic::GenericObject(object) => {
                let params = object
                    .type_params
                    .iter()
                    .enumerate()
                    .map(|(offset, param)| f(TypeArgPosition::Param(offset), param))
                    .collect::<Result<Vec<_>, E>>()?;
                if params.iter().all(is_borrowed) {
                    return Ok(Cow::Borrowed(self));
                }
                Atomic::GenericObject(GenericObject {
                    name: object.name.clone(),
                    type_params: params.into_iter().map(Cow::into_owned).collect(),
                    extra_types: object.extra_types.clone(),
                })
            }
            Atomic::KeyedArray(shape) => {
                let values = shape
                    .properties
                    .iter()
                    .map(|(key, value)| f(TypeArgPosition::ShapeValue(key), value))
                    .collect::<Result<Vec<_>, E>>()?;
                if values.iter().all(is_borrowed) {
                    return Ok(Cow::Borrowed(self));
                }
                Atomic::KeyedArray(KeyedArray {
                    properties: shape
                        .properties
                        .keys()
                        .cloned()
                        .zip(values.into_iter().map(Cow::into_owned))
                        .collect(),
                })
            }
            Atomic::Function(signature) => match map_signature(signature, &mut f)? {
                Some(signature) => Atomic::Function(signature),
                None => return Ok(Cow::Borrowed(self)),
            },
            Atomic::Callable(signature) => match map_signature(signature, &mut f)? {
                Some(signature) => Atomic::Callable(signature),
                None => return Ok(Cow::Borrowed(self)),
            },
            Atomic::Iterable(IterableType { type_params: None })
            | Atomic::Mixed
            | Atomic::Null
            | Atomic::Bool
            | Atomic::Int
            | Atomic::Float
            | Atomic::String
            | Atomic::LiteralInt(_)
            | Atomic::LiteralString(_)
            | Atomic::LiteralClassString(_)
            | Atomic::ClassString(_)
            | Atomic::Object
            | Atomic::NamedObject(_)
            | Atomic::TemplateParam(_)
            | Atomic::TemplateParamClass(_)
            | Atomic::TemplateIndexedAccess(_)
            | Atomic::TemplateKeyOf(_) => return Ok(Cow::Borrowed(self)),
        };
        Ok(Cow::Owned(mapped))
    }
}

/// Returns `None` when nothing in the signature changed.
fn map_signature<'s, E, F>(
    signature: &'s CallableSignature,
    f: &mut F,
) -> Result<Option<CallableSignature>, E>
where
    F: FnMut(TypeArgPosition<'s>, &'s Union) -> Result<Cow<'s, Union>, E>,
{
    let params = match &signature.params {
        Some(params) => Some(
            params
                .iter()
                .enumerate()
                .map(|(offset, param)| f(TypeArgPosition::CallableParam(offset), param))
                .collect::<Result<Vec<_>, E>>()?,
        ),
        None => None,
    };
    let return_type = match &signature.return_type {
        Some(return_type) => Some(f(TypeArgPosition::CallableReturn, return_type)?),
        None => None,
    };

    let params_unchanged = params.as_ref().is_none_or(|p| p.iter().all(is_borrowed));
    let return_unchanged = return_type.as_ref().is_none_or(is_borrowed);
    if params_unchanged && return_unchanged {
        return Ok(None);
    }

    Ok(Some(CallableSignature {
        params: params.map(|p| p.into_iter().map(Cow::into_owned).collect()),
        return_type: return_type.map(Cow::into_owned),
    }))
}

pub(crate) fn is_borrowed<T: ToOwned + ?Sized>(value: &Cow<'_, T>) -> bool {
    matches!(value, Cow::Borrowed(_))
}

/// Strip the generic-argument suffix from a canonical key:
/// `Foo<int>` becomes `Foo`, `array{a: int}` becomes `array`.
///
/// Keys with a parenthesized payload (literals, callable signatures) are
/// returned whole.
pub fn base_key(key: &str) -> &str {
    match key.find(['<', '{', '(']) {
        Some(pos) if pos > 0 && key.as_bytes()[pos] != b'(' => &key[..pos],
        _ => key,
    }
}

// =============================================================================
// Display (canonical keys)
// =============================================================================

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_extra_types(f: &mut fmt::Formatter<'_>, extra_types: &[Atomic]) -> fmt::Result {
    for extra in extra_types {
        write!(f, "&{extra}")?;
    }
    Ok(())
}

fn write_signature(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    signature: &CallableSignature,
) -> fmt::Result {
    f.write_str(prefix)?;
    if signature.params.is_none() && signature.return_type.is_none() {
        return Ok(());
    }
    f.write_str("(")?;
    if let Some(params) = &signature.params {
        write_joined(f, params)?;
    }
    f.write_str(")")?;
    if let Some(return_type) = &signature.return_type {
        write!(f, ": {return_type}")?;
    }
    Ok(())
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atomic::Mixed => f.write_str("mixed"),
            Atomic::Null => f.write_str("null"),
            Atomic::Bool => f.write_str("bool"),
            Atomic::Int => f.write_str("int"),
            Atomic::Float => f.write_str("float"),
            Atomic::String => f.write_str("string"),
            Atomic::LiteralInt(value) => write!(f, "int({value})"),
            Atomic::LiteralString(value) => write!(f, "string({value})"),
            Atomic::LiteralClassString(name) => write!(f, "{name}::class"),
            Atomic::ClassString(class_string) => {
                if class_string.as_class == OBJECT_CLASS && class_string.as_type.is_none() {
                    f.write_str("class-string")
                } else {
                    write!(f, "class-string<{}>", class_string.as_class)
                }
            }
            Atomic::Object => f.write_str("object"),
            Atomic::NamedObject(object) => {
                f.write_str(&object.name)?;
                write_extra_types(f, &object.extra_types)
            }
            Atomic::GenericObject(object) => {
                write!(f, "{}<", object.name)?;
                write_joined(f, &object.type_params)?;
                f.write_str(">")?;
                write_extra_types(f, &object.extra_types)
            }
            Atomic::Iterable(iterable) => match &iterable.type_params {
                Some((key, value)) => write!(f, "iterable<{key}, {value}>"),
                None => f.write_str("iterable"),
            },
            Atomic::Array(array) => write!(f, "array<{}, {}>", array.key, array.value),
            Atomic::List(list) => write!(f, "list<{}>", list.value),
            Atomic::KeyedArray(shape) => {
                f.write_str("array{")?;
                for (i, (key, value)) in shape.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Atomic::Function(signature) => write_signature(f, "Closure", signature),
            Atomic::Callable(signature) => write_signature(f, "callable", signature),
            Atomic::TemplateParam(param) => f.write_str(&param.name),
            Atomic::TemplateParamClass(param) => write!(f, "class-string<{}>", param.param_name),
            Atomic::TemplateIndexedAccess(access) => write!(
                f,
                "{}[{}]",
                access.array_param_name, access.offset_param_name
            ),
            Atomic::TemplateKeyOf(key_of) => write!(f, "key-of<{}>", key_of.param_name),
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
