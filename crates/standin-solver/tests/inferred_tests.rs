use super::*;
use crate::oracles::KeyedCombiner;
use crate::template_result::TemplateKey;
use crate::union::UnionFlags;

const FOO: Option<&str> = Some("Foo");

fn t(name: &str) -> Union {
    Union::new(Atomic::template_param(name, FOO, Union::mixed()))
}

fn bind(result: &mut TemplateResult, name: &str, ty: Union) {
    result.set_binding(TemplateKey::new(name, FOO), ty, 0);
}

#[test]
fn test_bound_param_is_replaced_inside_containers() {
    let mut result = TemplateResult::new();
    result.add_template_type("T", FOO, Union::mixed());
    bind(&mut result, "T", Union::nullable(Atomic::Int));
    let declared = Union::new(Atomic::list(t("T")));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "list<int|null>");
}

#[test]
fn test_undeclared_param_falls_back_to_constraint() {
    let result = TemplateResult::new();
    let declared = Union::new(Atomic::template_param(
        "T",
        FOO,
        Union::new(Atomic::named_object("Model")),
    ));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "Model");
}

#[test]
fn test_declared_but_unbound_param_is_kept() {
    let mut result = TemplateResult::new();
    result.add_template_type("T", FOO, Union::mixed());
    let declared = Union::from_atomics([Atomic::Int, Atomic::template_param("T", FOO, Union::mixed())])
        .unwrap();

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert!(matches!(replaced, Cow::Borrowed(union) if std::ptr::eq(union, &declared)));
}

#[test]
fn test_concrete_union_is_returned_as_is() {
    let result = TemplateResult::new();
    let declared = Union::from_atomics([
        Atomic::array(Union::string(), Union::new(Atomic::list(Union::int()))),
        Atomic::Null,
    ])
    .unwrap();

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert!(matches!(replaced, Cow::Borrowed(union) if std::ptr::eq(union, &declared)));
}

#[test]
fn test_class_string_of_bound_objects() {
    let mut result = TemplateResult::new();
    bind(
        &mut result,
        "T",
        Union::from_atomics([Atomic::named_object("Foo"), Atomic::named_object("Bar")]).unwrap(),
    );
    let declared = Union::new(Atomic::template_param_class("T", FOO, crate::types::OBJECT_CLASS, None));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "class-string<Foo>|class-string<Bar>");
}

#[test]
fn test_class_string_of_non_object_binding_uses_declaration() {
    let mut result = TemplateResult::new();
    bind(&mut result, "T", Union::int());
    let declared = Union::new(Atomic::template_param_class(
        "T",
        FOO,
        "Model",
        Some(Atomic::named_object("Model")),
    ));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "class-string<Model>");
}

#[test]
fn test_key_of_reads_binding() {
    let mut result = TemplateResult::new();
    bind(
        &mut result,
        "T",
        Union::new(Atomic::keyed_array([("id", Union::int()), ("name", Union::string())])),
    );
    let declared = Union::new(Atomic::key_of("T", FOO));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "string(id)|string(name)");
}

#[test]
fn test_indexed_access_with_union_offset() {
    let mut result = TemplateResult::new();
    bind(
        &mut result,
        "T",
        Union::new(Atomic::keyed_array([
            ("id", Union::int()),
            ("name", Union::string()),
            ("tags", Union::new(Atomic::list(Union::string()))),
        ])),
    );
    bind(
        &mut result,
        "K",
        Union::from_atomics([Atomic::literal_string("id"), Atomic::literal_string("name")]).unwrap(),
    );
    let declared = Union::new(Atomic::indexed_access("T", "K", FOO));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "int|string");
}

#[test]
fn test_indexed_access_with_unknown_offset_is_kept() {
    let mut result = TemplateResult::new();
    bind(
        &mut result,
        "T",
        Union::new(Atomic::keyed_array([("id", Union::int())])),
    );
    bind(&mut result, "K", Union::new(Atomic::literal_string("missing")));
    let declared = Union::new(Atomic::indexed_access("T", "K", FOO));

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "T[K]");
}

#[test]
fn test_flags_are_carried() {
    let mut result = TemplateResult::new();
    bind(&mut result, "T", Union::string());
    let mut declared = t("T");
    declared.flags = UnionFlags::IGNORE_NULLABLE_ISSUES | UnionFlags::FROM_DOCBLOCK;

    let replaced = replace_inferred(&declared, &result, &KeyedCombiner).unwrap();
    assert_eq!(replaced.id(), "string");
    assert_eq!(
        replaced.flags,
        UnionFlags::IGNORE_NULLABLE_ISSUES | UnionFlags::FROM_DOCBLOCK
    );
}

#[test]
fn test_key_of_empty_shape_is_fatal() {
    let mut result = TemplateResult::new();
    bind(
        &mut result,
        "T",
        Union::new(Atomic::keyed_array(Vec::<(&str, Union)>::new())),
    );
    let declared = Union::new(Atomic::key_of("T", FOO));

    let err = replace_inferred(&declared, &result, &KeyedCombiner).unwrap_err();
    assert!(matches!(err, SubstitutionError::EmptyUnion { .. }));
}
