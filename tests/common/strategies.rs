use augur_core::orchestration::ComputationInput;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating type tags
pub fn type_tag_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Strategy for generating a registry's default order (distinct tags)
pub fn default_order_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(type_tag_strategy(), 1..12)
        .prop_map(|tags| tags.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Strategy for generating attribute values
pub fn attribute_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::from(n)),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for generating computation inputs
pub fn input_strategy() -> impl Strategy<Value = ComputationInput> {
    (
        "[A-Za-z][A-Za-z ]{0,20}",
        prop::option::of("[A-Za-z ?]{0,30}"),
        prop::collection::btree_map("[a-z_]{1,8}", attribute_value_strategy(), 0..4),
    )
        .prop_map(|(subject, question, attributes)| {
            let mut input = ComputationInput::new(subject);
            input.question = question;
            input.attributes = attributes;
            input
        })
}
