//! Tests for parameter schema normalization

use serde_json::{json, Value};
use toolbridge_agent::schema::classify;
use toolbridge_agent::{normalize, ParamKind};

fn assert_well_formed(raw: &Value) {
    let schema = normalize(raw);
    let wire = schema.to_value();

    assert_eq!(wire["type"], "object");
    for (_, property) in wire["properties"].as_object().unwrap() {
        let ty = property["type"].as_str().unwrap();
        assert!(["string", "number", "boolean"].contains(&ty), "bad type {ty}");
    }
    for name in schema.required() {
        assert!(schema.property(name).is_some(), "{name} required but missing");
    }
}

#[test]
fn test_json_schema_calculator() {
    let raw = json!({
        "type": "object",
        "properties": {
            "operation": {"type": "string", "enum": ["add", "subtract", "multiply", "divide"]},
            "a": {"type": "number", "description": "First operand"},
            "b": {"type": "number", "description": "Second operand"}
        },
        "required": ["operation", "a", "b"]
    });

    let schema = normalize(&raw);
    let names: Vec<&str> = schema.properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["operation", "a", "b"]);
    assert_eq!(schema.required(), &["operation", "a", "b"]);

    let operation = schema.property("operation").unwrap();
    assert_eq!(operation.kind, ParamKind::String);
    assert_eq!(operation.description, "operation");
    assert_eq!(operation.allowed_values.as_ref().unwrap().len(), 4);

    let a = schema.property("a").unwrap();
    assert_eq!(a.kind, ParamKind::Number);
    assert_eq!(a.description, "First operand");
}

#[test]
fn test_wire_form() {
    let raw = json!({
        "type": "object",
        "properties": {
            "style": {"type": "string", "enum": ["formal", "casual"], "description": "Tone"},
            "strict": {"type": "boolean"}
        },
        "required": ["style"]
    });

    let wire = normalize(&raw).to_value();
    assert_eq!(
        wire,
        json!({
            "type": "object",
            "properties": {
                "style": {"type": "string", "description": "Tone", "enum": ["formal", "casual"]},
                "strict": {"type": "boolean", "description": "strict"}
            },
            "required": ["style"]
        })
    );
}

#[test]
fn test_fields_default_to_required_without_markers() {
    let raw = json!({
        "properties": {
            "pattern": {"type": "string"},
            "text": {"type": "string"}
        }
    });

    let schema = normalize(&raw);
    assert!(schema.is_required("pattern"));
    assert!(schema.is_required("text"));
}

#[test]
fn test_required_array_marks_others_optional() {
    let raw = json!({
        "properties": {
            "pattern": {"type": "string"},
            "flags": {"type": "string"}
        },
        "required": ["pattern"]
    });

    let schema = normalize(&raw);
    assert!(schema.is_required("pattern"));
    assert!(!schema.is_required("flags"));
    assert!(schema.property("flags").is_some());
}

#[test]
fn test_is_optional_flag() {
    let raw = json!({
        "properties": {
            "name": {"type": "string"},
            "nickname": {"type": "string", "isOptional": true},
            "title": {"type": "string", "optional": true}
        }
    });

    let schema = normalize(&raw);
    assert_eq!(schema.required(), &["name"]);
}

#[test]
fn test_zod_style_tags() {
    let raw = json!({
        "properties": {
            "count": {"_def": {"typeName": "ZodNumber"}},
            "enabled": {"_def": {"typeName": "ZodBoolean"}},
            "label": {"_def": {"typeName": "ZodString"}},
            "mode": {"_def": {"typeName": "ZodEnum", "values": ["fast", "slow"]}},
            "limit": {"_def": {"typeName": "ZodOptional", "innerType": {"_def": {"typeName": "ZodNumber"}}}}
        }
    });

    let schema = normalize(&raw);
    assert_eq!(schema.property("count").unwrap().kind, ParamKind::Number);
    assert_eq!(schema.property("enabled").unwrap().kind, ParamKind::Boolean);
    assert_eq!(schema.property("label").unwrap().kind, ParamKind::String);
    assert_eq!(schema.property("mode").unwrap().kind, ParamKind::String);
    assert_eq!(
        schema.property("mode").unwrap().allowed_values,
        Some(vec![json!("fast"), json!("slow")])
    );
    assert_eq!(schema.property("limit").unwrap().kind, ParamKind::Number);
    assert!(!schema.is_required("limit"));
    assert!(schema.is_required("count"));
}

#[test]
fn test_classification_priority() {
    // tag, then type, then enum, then fallback
    assert_eq!(
        classify(&json!({"_def": {"typeName": "ZodBoolean"}, "type": "number"})),
        ParamKind::Boolean
    );
    assert_eq!(classify(&json!({"type": "integer"})), ParamKind::Number);
    assert_eq!(classify(&json!({"enum": [1, 2, 3]})), ParamKind::String);
    assert_eq!(classify(&json!({})), ParamKind::String);
}

#[test]
fn test_unrepresentable_constructs_degrade_to_string() {
    assert_eq!(classify(&json!({"type": "object", "properties": {}})), ParamKind::String);
    assert_eq!(classify(&json!({"type": "array", "items": {"type": "number"}})), ParamKind::String);
    assert_eq!(classify(&json!({"type": ["string", "null"]})), ParamKind::String);
    assert_eq!(
        classify(&json!({"anyOf": [{"type": "number"}, {"type": "boolean"}]})),
        ParamKind::String
    );
    assert_eq!(classify(&json!(42)), ParamKind::String);
    assert_eq!(classify(&Value::Null), ParamKind::String);
}

#[test]
fn test_numeric_enum_keeps_number_type_without_enum_on_wire() {
    let raw = json!({"properties": {"level": {"type": "number", "enum": [1, 2]}}});
    let wire = normalize(&raw).to_value();
    assert_eq!(wire["properties"]["level"]["type"], "number");
    assert!(wire["properties"]["level"].get("enum").is_none());
}

#[test]
fn test_non_string_enum_members_stringified() {
    let raw = json!({"properties": {"choice": {"enum": ["a", 1, true]}}});
    let wire = normalize(&raw).to_value();
    assert_eq!(wire["properties"]["choice"]["enum"], json!(["a", "1", "true"]));
}

#[test]
fn test_missing_or_malformed_schema_is_empty_object() {
    for raw in [
        Value::Null,
        json!({}),
        json!({"type": "object"}),
        json!({"properties": "nope"}),
        json!([1, 2, 3]),
        json!("string"),
    ] {
        let schema = normalize(&raw);
        assert!(schema.is_empty());
        assert!(schema.required().is_empty());
        assert_eq!(
            schema.to_value(),
            json!({"type": "object", "properties": {}, "required": []})
        );
    }
}

#[test]
fn test_required_names_not_in_properties_are_dropped() {
    let raw = json!({
        "properties": {"a": {"type": "number"}},
        "required": ["a", "ghost"]
    });

    let schema = normalize(&raw);
    assert_eq!(schema.required(), &["a"]);
}

#[test]
fn test_schema_totality_over_varied_fragments() {
    let fragments = vec![
        json!({"properties": {"x": null}}),
        json!({"properties": {"x": []}}),
        json!({"properties": {"x": {"_def": null}}}),
        json!({"properties": {"x": {"_def": {"typeName": 7}}}}),
        json!({"properties": {"x": {"_def": {"typeName": "ZodOptional"}}}}),
        json!({"properties": {"x": {"_def": {"typeName": "ZodUnion", "options": []}}}}),
        json!({"properties": {"x": {"type": 5, "enum": "bad"}}}),
        json!({"properties": {"x": {"description": 12}}, "required": "x"}),
        json!({"properties": {"x": {"type": "object", "properties": {"y": {"type": "number"}}}}}),
    ];

    for raw in &fragments {
        assert_well_formed(raw);
    }
}
