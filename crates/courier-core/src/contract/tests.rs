//! Unit tests for contract descriptions.

use rstest::rstest;
use serde_json::json;

use super::*;

#[rstest]
#[case::string("String", ValueShape::Text)]
#[case::integer("u32", ValueShape::Integer)]
#[case::float("f64", ValueShape::Float)]
#[case::boolean("bool", ValueShape::Boolean)]
#[case::vec("Vec<String>", ValueShape::List)]
#[case::map("std::collections::HashMap<String, i64>", ValueShape::Map)]
#[case::value("serde_json::Value", ValueShape::Any)]
#[case::record("TodoItem", ValueShape::Record)]
#[case::str_reference("&str", ValueShape::Text)]
#[case::lifetime_reference("&'a str", ValueShape::Text)]
#[case::mutable_reference("&mut Vec<u8>", ValueShape::List)]
#[case::slice_reference("&'static [u8]", ValueShape::List)]
fn parse_infers_shape(#[case] name: &str, #[case] expected: ValueShape) {
    let ty = TypeRef::parse(name);
    assert_eq!(ty.shape(), expected);
    assert!(!ty.is_nullable());
    assert_eq!(ty.name(), name);
}

#[test]
fn parse_option_is_nullable_with_inner_shape() {
    let ty = TypeRef::parse(" Option<i64> ");
    assert!(ty.is_nullable());
    assert_eq!(ty.shape(), ValueShape::Integer);
    assert_eq!(ty.name(), "Option<i64>");
}

#[rstest]
#[case("Vec<String>", "Vec")]
#[case("Vec<i64>", "Vec")]
#[case("std::collections::HashMap<String, Vec<u8>>", "std::collections::HashMap")]
#[case("String", "String")]
fn erased_name_drops_generic_arguments(#[case] name: &str, #[case] erased: &str) {
    assert_eq!(TypeRef::parse(name).erased_name(), erased);
}

#[rstest]
#[case::text_accepts_string(TypeRef::text(), json!("Ada"), true)]
#[case::text_rejects_number(TypeRef::text(), json!(1), false)]
#[case::integer_accepts_whole(TypeRef::integer(), json!(42), true)]
#[case::integer_rejects_fraction(TypeRef::integer(), json!(4.2), false)]
#[case::integer_rejects_string(TypeRef::integer(), json!("42"), false)]
#[case::float_accepts_whole(TypeRef::float(), json!(42), true)]
#[case::boolean_accepts_bool(TypeRef::boolean(), json!(true), true)]
#[case::list_accepts_array(TypeRef::parse("Vec<i64>"), json!([1, 2]), true)]
#[case::record_accepts_object(TypeRef::parse("TodoItem"), json!({"id": 1}), true)]
#[case::record_rejects_array(TypeRef::parse("TodoItem"), json!([]), false)]
#[case::null_into_plain_type(TypeRef::text(), json!(null), false)]
#[case::null_into_option(TypeRef::parse("Option<String>"), json!(null), true)]
#[case::any_accepts_null(TypeRef::any(), json!(null), true)]
#[case::str_reference_accepts_string(TypeRef::parse("&'a str"), json!("Ada"), true)]
#[case::u8_rejects_negative(TypeRef::parse("u8"), json!(-1), false)]
#[case::u8_rejects_overflow(TypeRef::parse("u8"), json!(1000), false)]
#[case::u32_accepts_in_range(TypeRef::parse("u32"), json!(4_000_000_000_u64), true)]
#[case::i32_rejects_overflow(TypeRef::parse("i32"), json!(4_000_000_000_u64), false)]
#[case::char_rejects_word(TypeRef::parse("char"), json!("hello"), false)]
#[case::char_accepts_one(TypeRef::parse("char"), json!("x"), true)]
fn admits_follows_wire_shape(#[case] ty: TypeRef, #[case] value: Value, #[case] expected: bool) {
    assert_eq!(ty.admits(&value), expected, "{} admits {value}", ty.name());
}

#[test]
fn optional_wraps_name() {
    let ty = TypeRef::optional(&TypeRef::text());
    assert_eq!(ty.name(), "Option<String>");
    assert!(ty.is_nullable());
    assert_eq!(ty.shape(), ValueShape::Text);
}

#[test]
fn overrides_compares_erased_parameters() {
    let child = MethodDescriptor::new("store").with_parameter(TypeRef::parse("Vec<String>"));
    let parent = MethodDescriptor::new("store")
        .with_parameter(TypeRef::parse("Vec<i64>"))
        .returning(TypeRef::boolean());
    let other = MethodDescriptor::new("store").with_parameter(TypeRef::text());
    assert!(child.overrides(&parent));
    assert!(!child.overrides(&other));
}

#[test]
fn builder_keeps_declaration_order() {
    let contract = ServiceContract::builder("OnlineService")
        .remote(true)
        .method(MethodDescriptor::new("b"))
        .method(MethodDescriptor::new("a"))
        .build()
        .expect("valid contract");
    let names: Vec<&str> = contract.methods().iter().map(MethodDescriptor::name).collect();
    assert_eq!(names, ["b", "a"]);
    assert!(contract.is_remote());
}

#[rstest]
#[case::blank_contract(ServiceContract::builder("  "), "contract")]
#[case::blank_method(ServiceContract::builder("Svc").method(MethodDescriptor::new("")), "method")]
fn builder_rejects_blank_names(#[case] builder: ContractBuilder, #[case] kind: &'static str) {
    let error = builder.build().expect_err("blank name should fail");
    assert_eq!(error, GenerationError::EmptyName { kind });
}

#[rstest]
#[case(json!(null), "null")]
#[case(json!([1]), "array")]
#[case(json!({"a": 1}), "object")]
fn value_kind_names_variants(#[case] value: Value, #[case] expected: &str) {
    assert_eq!(value_kind(&value), expected);
}
