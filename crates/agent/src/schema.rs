//! Parameter schema translation
//!
//! Tool servers describe parameters with whatever validation vocabulary they
//! were built on: Zod-style `_def.typeName` tags or plain JSON Schema. The
//! model only understands `{type, description}` per property over three
//! primitive kinds, so every field is classified into [`ParamKind`] and
//! anything richer degrades to `string`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Primitive parameter kinds the function-calling interface accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }

    fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "ZodString" | "ZodEnum" | "ZodNativeEnum" => Some(ParamKind::String),
            "ZodNumber" | "ZodBigInt" => Some(ParamKind::Number),
            "ZodBoolean" => Some(ParamKind::Boolean),
            _ => None,
        }
    }

    fn from_type_field(ty: &str) -> Option<Self> {
        match ty {
            "string" => Some(ParamKind::String),
            "number" | "integer" => Some(ParamKind::Number),
            "boolean" => Some(ParamKind::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zod wrappers that make the wrapped field optional
const OPTIONAL_WRAPPERS: &[&str] = &["ZodOptional", "ZodDefault"];

/// Zod wrappers that are transparent for classification
const TRANSPARENT_WRAPPERS: &[&str] = &["ZodOptional", "ZodDefault", "ZodNullable"];

/// One normalized parameter
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProperty {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    /// Enumeration members, kept as metadata; the wire type stays `string`
    pub allowed_values: Option<Vec<Value>>,
}

/// `{type: "object", properties, required}` in the model's vocabulary.
///
/// Properties keep the order of the source schema and every name in
/// `required` is one of the properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSchema {
    properties: Vec<NormalizedProperty>,
    required: Vec<String>,
}

impl NormalizedSchema {
    pub fn properties(&self) -> &[NormalizedProperty] {
        &self.properties
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn property(&self, name: &str) -> Option<&NormalizedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Wire form handed to the model as function parameters
    pub fn to_value(&self) -> Value {
        let mut properties = Map::new();
        for property in &self.properties {
            let mut entry = json!({
                "type": property.kind.as_str(),
                "description": property.description,
            });
            if let (ParamKind::String, Some(values)) = (property.kind, &property.allowed_values) {
                let members: Vec<Value> = values
                    .iter()
                    .map(|v| match v {
                        Value::String(_) => v.clone(),
                        other => Value::String(other.to_string()),
                    })
                    .collect();
                entry["enum"] = Value::Array(members);
            }
            properties.insert(property.name.clone(), entry);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Normalize a raw parameter schema. Total: malformed or missing input
/// yields an object schema without properties.
pub fn normalize(raw: &Value) -> NormalizedSchema {
    let Some(fields) = raw.get("properties").and_then(Value::as_object) else {
        return NormalizedSchema::default();
    };

    let declared_required: Option<Vec<&str>> = raw
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect());

    let mut schema = NormalizedSchema::default();
    for (name, field) in fields {
        let optional = is_marked_optional(field)
            || declared_required
                .as_ref()
                .is_some_and(|names| !names.contains(&name.as_str()));

        schema.properties.push(NormalizedProperty {
            name: name.clone(),
            kind: classify(field),
            description: describe(name, field),
            allowed_values: enum_values(field),
        });
        if !optional {
            schema.required.push(name.clone());
        }
    }

    schema
}

/// Classify one field: explicit type tag, then `type`, then enumeration,
/// then `string`.
pub fn classify(field: &Value) -> ParamKind {
    if let Some(tag) = type_tag(field) {
        if TRANSPARENT_WRAPPERS.contains(&tag) {
            if let Some(inner) = field.pointer("/_def/innerType") {
                return classify(inner);
            }
        }
        if let Some(kind) = ParamKind::from_type_tag(tag) {
            return kind;
        }
    }

    if let Some(kind) = field
        .get("type")
        .and_then(Value::as_str)
        .and_then(ParamKind::from_type_field)
    {
        return kind;
    }

    if field.get("enum").is_some() {
        return ParamKind::String;
    }

    ParamKind::String
}

fn type_tag(field: &Value) -> Option<&str> {
    field.pointer("/_def/typeName").and_then(Value::as_str)
}

fn is_marked_optional(field: &Value) -> bool {
    let flagged = |key: &str| field.get(key).and_then(Value::as_bool).unwrap_or(false);
    if flagged("isOptional") || flagged("optional") {
        return true;
    }
    type_tag(field).is_some_and(|tag| OPTIONAL_WRAPPERS.contains(&tag))
}

fn describe(name: &str, field: &Value) -> String {
    field
        .get("description")
        .or_else(|| field.pointer("/_def/description"))
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(name)
        .to_string()
}

fn enum_values(field: &Value) -> Option<Vec<Value>> {
    if let Some(values) = field.get("enum").and_then(Value::as_array) {
        return Some(values.clone());
    }
    if let Some(values) = field.pointer("/_def/values").and_then(Value::as_array) {
        return Some(values.clone());
    }
    match type_tag(field) {
        Some(tag) if TRANSPARENT_WRAPPERS.contains(&tag) => {
            field.pointer("/_def/innerType").and_then(enum_values)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_as_str() {
        assert_eq!(ParamKind::String.as_str(), "string");
        assert_eq!(ParamKind::Number.as_str(), "number");
        assert_eq!(ParamKind::Boolean.as_str(), "boolean");
        assert_eq!(ParamKind::Number.to_string(), "number");
    }

    #[test]
    fn test_type_tag_wins_over_type_field() {
        let field = json!({"_def": {"typeName": "ZodNumber"}, "type": "string"});
        assert_eq!(classify(&field), ParamKind::Number);
    }

    #[test]
    fn test_unknown_tag_falls_through_to_type_field() {
        let field = json!({"_def": {"typeName": "ZodEffects"}, "type": "boolean"});
        assert_eq!(classify(&field), ParamKind::Boolean);
    }

    #[test]
    fn test_optional_wrapper_classifies_inner() {
        let field = json!({
            "_def": {"typeName": "ZodOptional", "innerType": {"_def": {"typeName": "ZodBoolean"}}}
        });
        assert_eq!(classify(&field), ParamKind::Boolean);
        assert!(is_marked_optional(&field));
    }

    #[test]
    fn test_nullable_wrapper_is_not_optional() {
        let field = json!({
            "_def": {"typeName": "ZodNullable", "innerType": {"_def": {"typeName": "ZodNumber"}}}
        });
        assert_eq!(classify(&field), ParamKind::Number);
        assert!(!is_marked_optional(&field));
    }

    #[test]
    fn test_zod_enum_values_preserved() {
        let field = json!({"_def": {"typeName": "ZodEnum", "values": ["formal", "casual"]}});
        assert_eq!(classify(&field), ParamKind::String);
        assert_eq!(enum_values(&field), Some(vec![json!("formal"), json!("casual")]));
    }

    #[test]
    fn test_describe_falls_back_to_name() {
        assert_eq!(describe("a", &json!({"type": "number"})), "a");
        assert_eq!(describe("a", &json!({"description": "  "})), "a");
        assert_eq!(describe("a", &json!({"description": "First operand"})), "First operand");
        assert_eq!(
            describe("a", &json!({"_def": {"description": "From zod"}})),
            "From zod"
        );
    }
}
