use super::*;
use crate::oracles::KeyedCombiner;
use crate::types::Atomic;

fn key(name: &str) -> TemplateKey {
    TemplateKey::new(name, Some("Foo"))
}

#[test]
fn test_template_types_keyed_by_defining_class() {
    let mut result = TemplateResult::new();
    result.add_template_type("T", Some("Foo"), Union::int());
    result.add_template_type("T", None, Union::string());

    assert_eq!(result.template_type("T", Some("Foo")), Some(&Union::int()));
    assert_eq!(result.template_type("T", None), Some(&Union::string()));
    assert!(!result.has_template_type("T", Some("Bar")));
    // An empty class name is not the same as no class.
    assert!(!result.has_template_type("T", Some("")));
}

#[test]
fn test_template_types_keep_declaration_order() {
    let result = TemplateResult::with_template_types([
        (TemplateKey::new("TKey", None), Union::int()),
        (TemplateKey::new("TValue", None), Union::mixed()),
    ]);
    let names: Vec<_> = result.template_types().map(|(k, _)| k.name.as_str()).collect();
    assert_eq!(names, vec!["TKey", "TValue"]);
}

#[test]
fn test_register_binding_shallower_replaces_deeper() {
    let mut result = TemplateResult::new();
    let outcome = result.register_binding(key("T"), Union::int(), 2, &KeyedCombiner);
    assert_eq!(outcome, BindingOutcome::Inserted);

    let outcome = result.register_binding(key("T"), Union::string(), 1, &KeyedCombiner);
    assert_eq!(outcome, BindingOutcome::Replaced);

    let binding = result.binding("T", Some("Foo")).unwrap();
    assert_eq!(binding.ty, Union::string());
    assert_eq!(binding.depth, 1);
}

#[test]
fn test_register_binding_keeps_shallower() {
    let mut result = TemplateResult::new();
    result.register_binding(key("T"), Union::int(), 1, &KeyedCombiner);
    let outcome = result.register_binding(key("T"), Union::string(), 2, &KeyedCombiner);
    assert_eq!(outcome, BindingOutcome::KeptExisting);

    let binding = result.binding("T", Some("Foo")).unwrap();
    assert_eq!(binding.ty, Union::int());
    assert_eq!(binding.depth, 1);
}

#[test]
fn test_register_binding_same_depth_combines() {
    let mut result = TemplateResult::new();
    result.register_binding(key("T"), Union::int(), 1, &KeyedCombiner);
    let outcome = result.register_binding(key("T"), Union::string(), 1, &KeyedCombiner);
    assert_eq!(outcome, BindingOutcome::Merged);

    let binding = result.binding("T", Some("Foo")).unwrap();
    assert_eq!(binding.ty.id(), "int|string");
    assert_eq!(binding.depth, 1);
}

#[test]
fn test_set_binding_overwrites() {
    let mut result = TemplateResult::new();
    assert!(!result.has_bindings());
    result.set_binding(key("T"), Union::int(), 0);
    result.set_binding(key("T"), Union::new(Atomic::Float), 3);
    assert!(result.has_bindings());

    let binding = result.binding("T", Some("Foo")).unwrap();
    assert_eq!(binding.ty, Union::new(Atomic::Float));
    assert_eq!(binding.depth, 3);
    assert_eq!(result.bindings().count(), 1);
}
