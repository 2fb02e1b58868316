use super::*;
use crate::oracles::{
    CallableShapeOracle, ClassMetadata, ClassMetadataStore, ExtendsArgKey, KeyedCombiner,
};

struct InvokableShapes;

impl CallableShapeOracle for InvokableShapes {
    fn extract_callable_shape(&self, atomic: &Atomic) -> Option<Atomic> {
        match atomic.object_name() {
            Some("Invokable") => Some(Atomic::callable(Some(vec![Union::int()]), Some(Union::string()))),
            _ => None,
        }
    }
}

fn t(name: &str) -> Union {
    Union::new(Atomic::template_param(name, Some("Collection"), Union::mixed()))
}

fn collection_target() -> Atomic {
    Atomic::generic_object("Collection", vec![t("TKey"), t("TValue")])
}

#[test]
fn test_exact_key_match_borrows() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::from_atomics([Atomic::Int, Atomic::named_object("Foo")]).unwrap();

    let matched = match_atomic(&Atomic::named_object("Foo"), &input, &oracles)
        .unwrap()
        .unwrap();
    assert!(matches!(matched, Cow::Borrowed(atomic) if atomic.key() == "Foo"));
}

#[test]
fn test_generic_suffix_is_ignored() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let target = Atomic::array(t("TKey"), t("TValue"));
    let input = Union::new(Atomic::keyed_array([(0_i64, Union::int())]));

    let matched = match_atomic(&target, &input, &oracles).unwrap().unwrap();
    assert_eq!(matched.key(), "array{0: int}");
}

#[test]
fn test_first_candidate_in_input_order_wins() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::from_atomics([
        Atomic::intersection("Foo", vec![Atomic::named_object("Bar")]),
        Atomic::named_object("Foo"),
    ])
    .unwrap();

    // The intersection comes first, so it is returned even though a later
    // member matches the key exactly.
    let matched = match_atomic(&Atomic::named_object("Foo"), &input, &oracles)
        .unwrap()
        .unwrap();
    assert_eq!(matched.key(), "Foo&Bar");
}

#[test]
fn test_closure_matches_callable() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let closure = Atomic::function(vec![Union::int()], Some(Union::string()));
    let input = Union::from_atomics([Atomic::Int, closure.clone()]).unwrap();

    let target = Atomic::callable(Some(vec![t("TKey")]), Some(t("TValue")));
    let matched = match_atomic(&target, &input, &oracles).unwrap().unwrap();
    assert_eq!(*matched, closure);
}

#[test]
fn test_iterable_matches_array_like() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::from_atomics([Atomic::Null, Atomic::list(Union::string())]).unwrap();

    let matched = match_atomic(&Atomic::iterable(), &input, &oracles)
        .unwrap()
        .unwrap();
    assert_eq!(matched.key(), "list<string>");
}

#[test]
fn test_callable_shape_oracle() {
    let store = ClassMetadataStore::new();
    let target = Atomic::callable(Some(vec![t("TKey")]), None);
    let input = Union::new(Atomic::named_object("Invokable"));

    let without = Oracles::new(&KeyedCombiner, &store);
    assert!(match_atomic(&target, &input, &without).unwrap().is_none());

    let with = without.with_callables(&InvokableShapes);
    let matched = match_atomic(&target, &input, &with).unwrap().unwrap();
    assert!(matches!(matched, Cow::Owned(_)));
    assert_eq!(matched.key(), "callable(int): string");
}

#[test]
fn test_template_extends_synthesizes_generic_object() {
    let store: ClassMetadataStore = [ClassMetadata::new("IntMap")
        .extends_template("Collection", ExtendsArgKey::Named("TKey".into()), Atomic::Int)
        .extends_template("Collection", ExtendsArgKey::Position(0), Atomic::Float)
        .extends_template("Collection", ExtendsArgKey::Named("TValue".into()), Atomic::String)]
    .into_iter()
    .collect();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::new(Atomic::named_object("IntMap"));

    let matched = match_atomic(&collection_target(), &input, &oracles)
        .unwrap()
        .unwrap();
    // Positional entries are skipped.
    assert_eq!(matched.key(), "IntMap<int, string>");
}

#[test]
fn test_template_extends_returns_bound_generic_object() {
    let store: ClassMetadataStore = [ClassMetadata::new("TypedMap").extends_template(
        "Collection",
        ExtendsArgKey::Named("TKey".into()),
        Atomic::Int,
    )]
    .into_iter()
    .collect();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::new(Atomic::generic_object("TypedMap", vec![Union::string()]));

    let matched = match_atomic(&collection_target(), &input, &oracles)
        .unwrap()
        .unwrap();
    assert!(matches!(matched, Cow::Borrowed(_)));
    assert_eq!(matched.key(), "TypedMap<string>");
}

#[test]
fn test_template_extends_without_named_arguments_is_fatal() {
    let store: ClassMetadataStore = [ClassMetadata::new("Broken").extends_template(
        "Collection",
        ExtendsArgKey::Position(0),
        Atomic::Int,
    )]
    .into_iter()
    .collect();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::new(Atomic::named_object("Broken"));

    let err = match_atomic(&collection_target(), &input, &oracles).unwrap_err();
    assert_eq!(
        err,
        SubstitutionError::EmptyTemplateExtends {
            class_name: "Broken".into(),
            ancestor: "Collection".into(),
        }
    );
}

#[test]
fn test_unknown_class_is_no_match() {
    let store = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &store);
    let input = Union::from_atomics([Atomic::named_object("Unknown"), Atomic::Int]).unwrap();

    assert!(
        match_atomic(&collection_target(), &input, &oracles)
            .unwrap()
            .is_none()
    );
}
