//! End-to-end transformer behavior
//!
//! Covers the expression surface, the operator algebra, and the recursive
//! transformer's scoping rules against realistic templates.

use std::sync::Arc;

use async_trait::async_trait;
use json_to_llm::{Context, ScriptEngine, ScriptError, TemplateEngine, TemplateError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

async fn transform(template: Value, source: Value) -> Result<Value, TemplateError> {
    TemplateEngine::new()
        .transform(&template, &Context::from_root(source))
        .await
}

/// Script engine understanding only the literals `true` and `false`.
struct BoolScriptEngine;

#[async_trait]
impl ScriptEngine for BoolScriptEngine {
    async fn evaluate(&self, code: &str, _model: &Value) -> Result<Value, ScriptError> {
        match code.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(ScriptError::Compile {
                message: format!("unknown condition '{other}'"),
            }),
        }
    }
}

#[tokio::test]
async fn single_function_resolves_value() {
    let result = transform(json!({"result": "@value(foo)"}), json!({"foo": "bar"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "bar"}));
}

#[tokio::test]
async fn multiple_functions_concatenate() {
    let result = transform(
        json!({"result": "@value(prop1)@value(prop2)"}),
        json!({"prop1": "value1", "prop2": "value2"}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"result": "value1value2"}));
}

#[tokio::test]
async fn rooted_paths_reach_into_nested_objects() {
    let result = transform(
        json!({"result": "@value($.prop1)@value($.object1.prop2)"}),
        json!({"prop1": "value1", "object1": {"prop2": "value2"}}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"result": "value1value2"}));
}

#[rstest]
#[case(
    json!({"prop1": "value1", "prop2": "value2"}),
    "@value(prop1,default_value1)@value(prop2,default_value2)",
    "value1value2"
)]
#[case(
    json!({"prop2": "value2"}),
    "@value(prop1,default_value1)@value(prop2,default_value2)",
    "default_value1value2"
)]
#[case(
    json!({}),
    "@value(prop1,default_value1)@value(prop2,default_value2)",
    "default_value1default_value2"
)]
#[case(json!({}), "@value(prop1)@value(prop2,default_value2)", "nulldefault_value2")]
#[case(json!({}), "@value(prop1)@value(prop2)", "nullnull")]
#[tokio::test]
async fn missing_paths_use_defaults(
    #[case] source: Value,
    #[case] template: &str,
    #[case] expected: &str,
) {
    let result = transform(json!({ "result": template }), source).await.unwrap();
    assert_eq!(result, json!({ "result": expected }));
}

#[tokio::test]
async fn formatdate_reformats_a_nested_value() {
    let result = transform(
        json!({"formattedDate": "@formatdate(@value($.originalDate),dd-MM-yyyy,dd/MM/yyyy)"}),
        json!({"originalDate": "29-05-2025"}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"formattedDate": "29/05/2025"}));
}

#[tokio::test]
async fn expressions_resolve_inside_free_text() {
    let result = transform(
        json!({"result": "The customer @value($.name) @value($.secondName) lives in @value($.address.city)"}),
        json!({"name": "giuliano", "secondName": "arru", "address": {"city": "saronno"}}),
    )
    .await
    .unwrap();
    assert_eq!(
        result,
        json!({"result": "The customer giuliano arru lives in saronno"})
    );
}

#[tokio::test]
async fn non_function_strings_pass_through() {
    let result = transform(json!({"result": "noFunctionHere"}), json!({"foo": "bar"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "noFunctionHere"}));
}

#[tokio::test]
async fn malformed_call_passes_through_unchanged() {
    let result = transform(json!({"result": "@value("}), json!({"foo": "bar"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "@value("}));
}

#[tokio::test]
async fn escaped_marker_renders_a_literal_call() {
    let result = transform(json!({"result": "\\@value(foo)"}), json!({"foo": "bar"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "@value(foo)"}));
}

#[tokio::test]
async fn unknown_function_renders_placeholder() {
    let result = transform(json!({"result": "@unknown(1,2)"}), json!({"foo": "bar"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "Function(unknown, 1, 2)"}));
}

#[tokio::test]
async fn operator_free_templates_transform_to_themselves() {
    let template = json!({
        "title": "plain",
        "count": 3,
        "flag": true,
        "nothing": null,
        "nested": {"list": [1, "two", {"deep": false}]}
    });
    let result = transform(template.clone(), json!({"unrelated": 1}))
        .await
        .unwrap();
    assert_eq!(result, template);
}

#[tokio::test]
async fn resolved_output_is_a_fixpoint() {
    let source = json!({"prop1": "value1", "prop2": "value2"});
    let template = json!({"result": "@value(prop1)@value(prop2)"});

    let once = transform(template, source.clone()).await.unwrap();
    let twice = transform(once.clone(), source).await.unwrap();
    assert_eq!(once, twice);
}

#[tokio::test]
async fn each_projects_objects_through_the_element_template() {
    let result = transform(
        json!({"result": {"@operator": "each", "@path": "array", "@element": {"field": "@value(prop)"}}}),
        json!({"array": [{"prop": "value"}, {"prop": "value1"}, {"prop": "value2"}]}),
    )
    .await
    .unwrap();
    assert_eq!(
        result,
        json!({"result": [
            {"field": "value"},
            {"field": "value1"},
            {"field": "value2"}
        ]})
    );
}

#[tokio::test]
async fn each_supports_string_element_templates() {
    let result = transform(
        json!({"result": {"@operator": "each", "@path": "customers", "@element": "Customer @value(name) @value(secondName)"}}),
        json!({"customers": [
            {"name": "giuliano", "secondName": "arru"},
            {"name": "mario", "secondName": "rossi"}
        ]}),
    )
    .await
    .unwrap();
    assert_eq!(
        result,
        json!({"result": ["Customer giuliano arru", "Customer mario rossi"]})
    );
}

#[tokio::test]
async fn nested_each_scopes_inner_paths_to_the_current_item() {
    let result = transform(
        json!({"result": {
            "@operator": "each",
            "@path": "customers",
            "@element": {
                "customer": "@value(name) @value(secondName)",
                "counters": {
                    "@operator": "each",
                    "@path": "counters",
                    "@element": "Spent @value(amount) @value(unit) on @formatdate(@value(date),dd-MM-yyyy,dd/MM/yyyy)"
                }
            }
        }}),
        json!({"customers": [{
            "name": "mario",
            "secondName": "rossi",
            "counters": [
                {"amount": 3, "unit": "euro", "date": "29-05-2025"},
                {"amount": 4, "unit": "dollar", "date": "30-05-2025"}
            ]
        }]}),
    )
    .await
    .unwrap();

    assert_eq!(
        result,
        json!({"result": [{
            "customer": "mario rossi",
            "counters": [
                "Spent 3 euro on 29/05/2025",
                "Spent 4 dollar on 30/05/2025"
            ]
        }]})
    );
}

#[tokio::test]
async fn each_over_a_missing_path_yields_an_empty_array() {
    let result = transform(
        json!({"result": {"@operator": "each", "@path": "missing", "@element": "x"}}),
        json!({}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"result": []}));
}

#[tokio::test]
async fn each_filter_selects_a_subset() {
    let result = transform(
        json!({"result": {
            "@operator": "each",
            "@path": "orders",
            "@filter": "@.total > 100",
            "@element": "@value(id)"
        }}),
        json!({"orders": [
            {"id": "a", "total": 50},
            {"id": "b", "total": 250},
            {"id": "c", "total": 120}
        ]}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"result": ["b", "c"]}));
}

#[tokio::test]
async fn sum_operator_totals_a_numeric_key() {
    let result = transform(
        json!({"total": {"@operator": "sum", "@path": "counters", "@key": "amount"}}),
        json!({"counters": [{"amount": 3}, {"amount": 4.5}]}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"total": 7.5}));
}

#[tokio::test]
async fn sum_fails_when_a_counter_is_explicitly_null() {
    let err = transform(
        json!({"total": {"@operator": "sum", "@path": "counters", "@key": "amount"}}),
        json!({"counters": [{"amount": 3}, {"amount": null}]}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TemplateError::UnsupportedType { .. }));
}

#[tokio::test]
async fn float_operator_parses_string_balances() {
    let result = transform(
        json!({"balance": {"@operator": "float", "@path": "$.account.balance", "@default": 0.0}}),
        json!({"account": {"balance": "1250.40"}}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"balance": 1250.40}));
}

#[tokio::test]
async fn objectpatch_reshapes_the_selected_object() {
    let result = transform(
        json!({"patched": {
            "@operator": "objectpatch",
            "@path": "$.customer",
            "@addIfNull": {"segment": "unknown"},
            "@addOrUpdate": {"greeting": "Hello @value($.customer.name)"},
            "@removeKeys": ["internalId"]
        }}),
        json!({"customer": {"name": "Ada", "internalId": 42}}),
    )
    .await
    .unwrap();
    // patch values are themselves templates, resolved after patching; the
    // patched fragment is transformed under the caller's scope
    assert_eq!(
        result,
        json!({"patched": {"name": "Ada", "segment": "unknown", "greeting": "Hello Ada"}})
    );
}

#[tokio::test]
async fn context_operator_rebinds_scope_for_its_element() {
    let result = transform(
        json!({"result": {
            "@operator": "context",
            "@context": {"name": "rebound"},
            "@element": "@value(name)"
        }}),
        json!({"name": "original"}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"result": "rebound"}));
}

#[tokio::test]
async fn element_operator_extracts_plain_values() {
    let result = transform(
        json!({
            "present": {"@operator": "element", "@path": "$.a.b"},
            "absent": {"@operator": "element", "@path": "$.a.missing", "@default": "fallback"},
            "null_default": {"@operator": "element", "@path": "$.missing"}
        }),
        json!({"a": {"b": [1, 2, 3]}}),
    )
    .await
    .unwrap();
    assert_eq!(
        result,
        json!({"present": [1, 2, 3], "absent": "fallback", "null_default": null})
    );
}

#[tokio::test]
async fn unknown_operator_fails() {
    let err = transform(
        json!({"result": {"@operator": "explode", "@path": "x"}}),
        json!({}),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        TemplateError::UnsupportedOperator {
            name: "explode".to_string()
        }
    );
}

#[tokio::test]
async fn ifelse_chooses_by_script_verdict() {
    let engine = TemplateEngine::with_script_engine(Arc::new(BoolScriptEngine));
    let context = Context::from_root(json!({}));

    let result = engine
        .transform(&json!({"result": "@ifelse(true,yes,no)"}), &context)
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "yes"}));

    let result = engine
        .transform(&json!({"result": "@ifelse(false,yes,no)"}), &context)
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "no"}));
}

#[tokio::test]
async fn script_failures_propagate() {
    let engine = TemplateEngine::with_script_engine(Arc::new(BoolScriptEngine));
    let err = engine
        .transform(
            &json!({"result": "@ifelse(gibberish,yes,no)"}),
            &Context::from_root(json!({})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Script(_)));
}

#[tokio::test]
async fn ifelse_without_a_script_engine_fails() {
    let err = transform(json!({"result": "@ifelse(true,yes,no)"}), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Script(_)));
}

#[tokio::test]
async fn switch_expression_maps_codes_to_labels() {
    let result = transform(
        json!({"state": r#"@switch(@value(status),{"A": "active"\, "C": "closed"},unknown)"#}),
        json!({"status": "C"}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"state": "closed"}));
}

#[tokio::test]
async fn excessive_nesting_is_reported_not_fatal() {
    // build a template nested beyond the engine budget
    let mut template = json!("leaf");
    for _ in 0..20 {
        template = json!({ "child": template });
    }
    let err = TemplateEngine::new()
        .with_max_depth(10)
        .transform(&template, &Context::from_root(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err, TemplateError::DepthExceeded { max: 10 });
}

#[tokio::test]
async fn array_elements_are_scoped_to_themselves() {
    // each array element's local scope is the element itself
    let result = transform(
        json!({"labels": [
            {"label": "@value(name)"},
            {"label": "@value(name)"}
        ]}),
        json!([{"name": "first"}, {"name": "second"}]),
    )
    .await
    .unwrap();
    // the template array's elements are template objects, not data: their
    // scope comes from the *template* element, so lookups miss and default
    assert_eq!(
        result,
        json!({"labels": [{"label": "null"}, {"label": "null"}]})
    );
}
