//! Documentation coverage (AIP-192).

use super::context::{OperationContext, SpecContext};
use super::{CheckResult, Rule, RuleCheck, RuleMeta};
use crate::models::{Category, Severity};
use serde_json::Value as Json;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("documentation/info-description", "API description", Category::Documentation, Severity::Suggestion).aip(192),
            RuleCheck::Spec(info_description),
        ),
        Rule::new(
            RuleMeta::new("documentation/operation-summary", "Operations are described", Category::Documentation, Severity::Suggestion).aip(192),
            RuleCheck::Operation(operation_summary),
        ),
    ]
}

fn non_blank(value: Option<&Json>) -> bool {
    value.and_then(Json::as_str).is_some_and(|s| !s.trim().is_empty())
}

fn info_description(meta: &RuleMeta, ctx: &SpecContext) -> CheckResult {
    if non_blank(ctx.spec.pointer("/info/description")) {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding("info", "API has no description")
        .with_suggestion("Describe the API's purpose and audience in info.description")])
}

fn operation_summary(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if non_blank(ctx.operation.get("summary")) || non_blank(ctx.operation.get("description")) {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(ctx.location(), "Operation has neither a summary nor a description")
        .with_suggestion("Add a one-line summary")])
}
