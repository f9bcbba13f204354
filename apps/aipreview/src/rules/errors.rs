//! Error model rules (AIP-193).

use super::context::{OperationContext, SchemaContext, SpecContext};
use super::{CheckResult, Rule, RuleCheck, RuleMeta};
use crate::heuristics::words::split_words;
use crate::jsonpath::JsonPath;
use crate::models::{Category, Fix, Severity, SpecChange};
use serde_json::{json, Map, Value as Json};

pub(crate) fn spec_rules() -> Vec<Rule> {
    vec![Rule::new(
        RuleMeta::new("errors/error-schema", "Shared error schema", Category::Errors, Severity::Warning).aip(193),
        RuleCheck::Spec(error_schema),
    )]
}

pub(crate) fn operation_rules() -> Vec<Rule> {
    vec![Rule::new(
        RuleMeta::new("errors/error-responses", "Operations document errors", Category::Errors, Severity::Warning).aip(193),
        RuleCheck::Operation(error_responses),
    )]
}

pub(crate) fn schema_rules() -> Vec<Rule> {
    vec![Rule::new(
        RuleMeta::new("errors/error-schema-fields", "Error schema carries code and message", Category::Errors, Severity::Warning).aip(193),
        RuleCheck::Schema(error_schema_fields),
    )]
}

/// Swagger 2.0 documents keep schemas under `definitions`.
fn is_swagger2(spec: &Json) -> bool {
    spec.get("swagger").is_some()
}

fn schema_container(spec: &Json) -> (JsonPath, Option<&Map<String, Json>>) {
    if is_swagger2(spec) {
        let defs = spec.get("definitions").and_then(Json::as_object);
        (JsonPath::root().key("definitions"), defs)
    } else {
        let schemas = spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Json::as_object);
        (JsonPath::root().key("components").key("schemas"), schemas)
    }
}

fn is_shared_error_schema(name: &str, schema: &Json) -> bool {
    is_error_schema_name(name) || name == "Status" || has_code_and_message(schema)
}

/// First declared schema that already serves as the error model.
fn shared_error_schema(spec: &Json) -> Option<&str> {
    let (_, schemas) = schema_container(spec);
    schemas?
        .iter()
        .find(|(name, schema)| is_shared_error_schema(name, schema))
        .map(|(name, _)| name.as_str())
}

/// `$ref` to the shared error schema, or to the `Error` schema the
/// `errors/error-schema` fix introduces when none is declared.
fn error_ref(spec: &Json) -> String {
    let prefix = if is_swagger2(spec) {
        "#/definitions"
    } else {
        "#/components/schemas"
    };
    let name = shared_error_schema(spec).unwrap_or("Error");
    format!("{}/{}", prefix, name.replace('~', "~0").replace('/', "~1"))
}

pub(crate) fn is_error_schema_name(name: &str) -> bool {
    split_words(name)
        .iter()
        .any(|w| matches!(w.as_str(), "error" | "errors" | "problem" | "fault"))
}

fn has_code_and_message(schema: &Json) -> bool {
    schema
        .get("properties")
        .and_then(Json::as_object)
        .is_some_and(|p| p.contains_key("code") && p.contains_key("message"))
}

fn standard_error_schema() -> Json {
    json!({
        "type": "object",
        "required": ["code", "message"],
        "properties": {
            "code": {"type": "integer", "format": "int32", "description": "HTTP status code"},
            "message": {"type": "string", "description": "Developer-facing error message"},
            "details": {"type": "array", "items": {"type": "object"}}
        }
    })
}

fn error_schema(meta: &RuleMeta, ctx: &SpecContext) -> CheckResult {
    if shared_error_schema(ctx.spec).is_some() {
        return Ok(Vec::new());
    }
    let (container, _) = schema_container(ctx.spec);
    let location = container.to_string().trim_start_matches("$.").to_string();
    let target = container.key("Error");
    Ok(vec![meta
        .finding(location, "No shared error schema is defined")
        .with_suggestion("Define an Error schema with code, message and details and reference it from error responses")
        .with_fix(Fix::new(
            "add-error-schema",
            target.to_string(),
            vec![SpecChange::set(target.to_string(), standard_error_schema())],
        ))])
}

fn error_response(spec: &Json) -> Json {
    if is_swagger2(spec) {
        json!({"description": "Error response", "schema": {"$ref": error_ref(spec)}})
    } else {
        json!({
            "description": "Error response",
            "content": {"application/json": {"schema": {"$ref": error_ref(spec)}}}
        })
    }
}

fn error_responses(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    let responses = ctx.operation.get("responses").and_then(Json::as_object);
    let documented = responses.is_some_and(|r| {
        r.keys()
            .any(|code| code == "default" || code.starts_with('4') || code.starts_with('5'))
    });
    if documented {
        return Ok(Vec::new());
    }
    let mut value = Map::new();
    value.insert("default".to_string(), error_response(ctx.spec.spec));
    Ok(vec![meta
        .finding(ctx.location(), "Operation documents no error responses")
        .with_suggestion("Add a default response referencing the shared Error schema")
        .with_fix(Fix::new(
            "add-error-response",
            ctx.json_path().to_string(),
            vec![SpecChange::merge(ctx.json_path().key("responses").to_string(), Json::Object(value))],
        ))])
}

fn error_schema_fields(meta: &RuleMeta, ctx: &SchemaContext) -> CheckResult {
    if !is_error_schema_name(ctx.name) {
        return Ok(Vec::new());
    }
    if ctx.schema.get("$ref").is_some() || ctx.schema.get("allOf").is_some() {
        return Ok(Vec::new());
    }
    let properties = ctx.properties();
    let mut missing = Map::new();
    let defaults = standard_error_schema();
    for field in ["code", "message"] {
        if properties.is_some_and(|p| p.contains_key(field)) {
            continue;
        }
        if let Some(default) = defaults.pointer(&format!("/properties/{}", field)) {
            missing.insert(field.to_string(), default.clone());
        }
    }
    if missing.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = missing.keys().cloned().collect();
    Ok(vec![meta
        .finding(
            ctx.location(),
            format!("Error schema '{}' is missing {}", ctx.name, names.join(" and ")),
        )
        .with_context("missing", names.iter().map(|n| Json::from(n.as_str())).collect::<Vec<_>>())
        .with_fix(Fix::new(
            "add-error-fields",
            ctx.json_path().to_string(),
            vec![SpecChange::merge(ctx.json_path().key("properties").to_string(), Json::Object(missing))],
        ))])
}
