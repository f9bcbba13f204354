//! Standard method semantics (AIP-131..135) and request idempotency (AIP-155).

use super::context::{Method, OperationContext, ParamLocation};
use super::{CheckResult, Rule, RuleCheck, RuleMeta};
use crate::heuristics::inflect::singularize;
use crate::heuristics::paths::{is_action_verb, is_path_param, is_version_segment, split_custom_verb, split_segments};
use crate::heuristics::words::{capitalize, split_words, to_camel_case};
use crate::models::{Category, Fix, Severity, SpecChange};
use serde_json::{json, Value as Json};
use std::collections::HashSet;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("standard-methods/get-no-body", "GET has no request body", Category::StandardMethods, Severity::Error).aip(131),
            RuleCheck::Operation(get_no_body),
        ),
        Rule::new(
            RuleMeta::new("standard-methods/delete-no-body", "DELETE has no request body", Category::StandardMethods, Severity::Warning).aip(135),
            RuleCheck::Operation(delete_no_body),
        ),
        Rule::new(
            RuleMeta::new("standard-methods/patch-over-put", "Prefer PATCH for updates", Category::StandardMethods, Severity::Suggestion).aip(134),
            RuleCheck::Operation(patch_over_put),
        ),
        Rule::new(
            RuleMeta::new("standard-methods/operation-id", "Operations declare an operationId", Category::StandardMethods, Severity::Warning).aip(131),
            RuleCheck::Operation(operation_id),
        ),
        Rule::new(
            RuleMeta::new("idempotency/post-request-id", "Create accepts a request id", Category::Idempotency, Severity::Suggestion).aip(155),
            RuleCheck::Operation(post_request_id),
        ),
    ]
}

const REQUEST_ID_NAMES: &[&str] = &["Idempotency-Key", "X-Idempotency-Key", "X-Request-Id", "request_id", "requestId"];

fn remove_body_fix(ctx: &OperationContext) -> Fix {
    Fix::new(
        "remove-request-body",
        ctx.json_path().to_string(),
        vec![SpecChange::remove(ctx.json_path().key("requestBody").to_string())],
    )
}

fn get_no_body(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if ctx.method != Method::Get || !ctx.has_request_body() {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(ctx.location(), "GET operations must not declare a request body")
        .with_suggestion("Move the inputs to query parameters")
        .with_fix(remove_body_fix(ctx))])
}

fn delete_no_body(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if ctx.method != Method::Delete || !ctx.has_request_body() {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(ctx.location(), "DELETE operations should not declare a request body")
        .with_suggestion("Identify the resource by its path; pass options such as etag or force as query parameters")
        .with_fix(remove_body_fix(ctx))])
}

fn patch_over_put(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if ctx.method != Method::Put || ctx.path_item.get(Method::Patch.key()).is_some() {
        return Ok(Vec::new());
    }
    let ends_in_param = split_segments(ctx.path).last().is_some_and(|s| is_path_param(s));
    if !ends_in_param {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(ctx.location(), "Resource is updated with PUT only")
        .with_suggestion("Offer PATCH with a field mask for partial updates; keep PUT only for full replacement")])
}

/// Derive an operationId from the method and the resource the path names.
pub(crate) fn suggest_operation_id(method: Method, path: &str) -> String {
    let segments: Vec<&str> = split_segments(path)
        .into_iter()
        .filter(|s| !is_version_segment(s))
        .collect();
    let ends_in_param = segments.last().is_some_and(|s| is_path_param(s));
    let mut custom: Option<String> = None;
    let mut resource: Option<&str> = None;
    for (i, seg) in segments.iter().enumerate().rev() {
        let (base, verb) = split_custom_verb(seg);
        if i + 1 == segments.len() {
            if let Some(v) = verb {
                custom = Some(v.to_string());
            } else if is_action_verb(base) && i > 0 {
                custom = Some(base.to_string());
                continue;
            }
        }
        if !is_path_param(base) {
            resource = Some(base);
            break;
        }
    }
    let noun = match resource {
        Some(r) => split_words(r).iter().map(|w| capitalize(w)).collect::<String>(),
        None => "Root".to_string(),
    };
    let single = singularize(&noun);
    let verb = match (custom, method) {
        (Some(v), _) => return to_camel_case(&format!("{}_{}", v, single)),
        (None, Method::Get) if ends_in_param => "get",
        (None, Method::Get) => return format!("list{}", noun),
        (None, Method::Post) => "create",
        (None, Method::Put) => "replace",
        (None, Method::Patch) => "update",
        (None, Method::Delete) => "delete",
        (None, m) => return format!("{}{}", m.key(), noun),
    };
    format!("{}{}", verb, single)
}

fn declared_operation_id(operation: &Json) -> Option<&str> {
    operation
        .get("operationId")
        .and_then(Json::as_str)
        .filter(|id| !id.trim().is_empty())
}

/// Ids taken before the operation at `path`/`method` in traversal order:
/// every declared id, plus the ids suggested for undeclared operations that
/// are visited earlier.
fn claimed_operation_ids(spec: &Json, path: &str, method: Method) -> HashSet<String> {
    let mut claimed = HashSet::new();
    let Some(paths) = spec.get("paths").and_then(Json::as_object) else {
        return claimed;
    };
    let mut earlier = true;
    for (p, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for m in Method::ORDER {
            let Some(op) = item.get(m.key()) else {
                continue;
            };
            if p == path && m == method {
                earlier = false;
                continue;
            }
            match declared_operation_id(op) {
                Some(id) => {
                    claimed.insert(id.to_string());
                }
                None if earlier => {
                    claimed.insert(suggest_operation_id(m, p));
                }
                None => {}
            }
        }
    }
    claimed
}

fn operation_id(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if declared_operation_id(ctx.operation).is_some() {
        return Ok(Vec::new());
    }
    let suggested = suggest_operation_id(ctx.method, ctx.path);
    let finding = meta.finding(ctx.location(), "Operation has no operationId");
    if claimed_operation_ids(ctx.spec.spec, ctx.path, ctx.method).contains(&suggested) {
        return Ok(vec![finding.with_suggestion(format!(
            "Add a unique operationId; '{}' is already used by another operation",
            suggested
        ))]);
    }
    Ok(vec![finding
        .with_suggestion(format!("Add operationId '{}'", suggested))
        .with_fix(Fix::new(
            "add-operation-id",
            ctx.json_path().to_string(),
            vec![SpecChange::set(ctx.json_path().key("operationId").to_string(), Json::from(suggested))],
        ))])
}

fn post_request_id(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if ctx.method != Method::Post || ctx.collection_segment().is_none() {
        return Ok(Vec::new());
    }
    if ctx.has_param(ParamLocation::Header, REQUEST_ID_NAMES) || ctx.has_param(ParamLocation::Query, REQUEST_ID_NAMES) {
        return Ok(Vec::new());
    }
    let header = json!({
        "name": "Idempotency-Key",
        "in": "header",
        "required": false,
        "description": "Unique key that makes retries of this request safe",
        "schema": {"type": "string"}
    });
    Ok(vec![meta
        .finding(ctx.location(), "Create operation accepts no idempotency key")
        .with_suggestion("Accept an Idempotency-Key header so clients can retry safely")
        .with_fix(Fix::new(
            "add-idempotency-key",
            ctx.json_path().to_string(),
            vec![SpecChange::merge(ctx.json_path().key("parameters").to_string(), Json::Array(vec![header]))],
        ))])
}
