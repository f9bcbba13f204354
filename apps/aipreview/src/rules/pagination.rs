//! List pagination (AIP-158), filtering (AIP-160) and ordering (AIP-132).

use super::context::{Method, OperationContext, ParamLocation, ParameterContext};
use super::{CheckResult, Rule, RuleCheck, RuleMeta};
use crate::models::{Category, Fix, Severity, SpecChange};
use serde_json::{json, Value as Json};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("pagination/list-paginated", "List methods paginate", Category::Pagination, Severity::Warning).aip(158),
            RuleCheck::Operation(list_paginated),
        ),
        Rule::new(
            RuleMeta::new("filtering/list-filter", "List methods accept a filter", Category::Filtering, Severity::Suggestion).aip(160),
            RuleCheck::Operation(list_filter),
        ),
        Rule::new(
            RuleMeta::new("filtering/order-by", "Ordering uses order_by", Category::Filtering, Severity::Suggestion).aip(132),
            RuleCheck::Parameter {
                location: Some(ParamLocation::Query),
                check: order_by,
            },
        ),
    ]
}

const PAGINATION_PARAMS: &[&str] = &[
    "page_size", "pageSize", "page_token", "pageToken", "limit", "offset", "cursor", "page",
    "per_page", "perPage", "max_results", "maxResults",
];

const SORT_ALIASES: &[&str] = &["sort", "sort_by", "sortBy", "sort-by", "orderBy", "order-by", "order", "ordering"];

/// Query names that stand for `order_by`.
pub(crate) fn is_sort_alias(name: &str) -> bool {
    SORT_ALIASES.contains(&name)
}

fn is_list(ctx: &OperationContext) -> bool {
    ctx.method == Method::Get && ctx.collection_segment().is_some()
}

fn query_param(name: &str, description: &str, schema: Json) -> Json {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema
    })
}

fn list_paginated(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if !is_list(ctx) || ctx.has_param(ParamLocation::Query, PAGINATION_PARAMS) {
        return Ok(Vec::new());
    }
    let params = vec![
        query_param(
            "page_size",
            "Maximum number of results to return",
            json!({"type": "integer", "format": "int32", "minimum": 1}),
        ),
        query_param(
            "page_token",
            "Token from a previous response's next_page_token",
            json!({"type": "string"}),
        ),
    ];
    Ok(vec![meta
        .finding(ctx.location(), "List operation is not paginated")
        .with_suggestion("Accept page_size and page_token and return next_page_token")
        .with_fix(Fix::new(
            "add-pagination",
            ctx.json_path().to_string(),
            vec![SpecChange::merge(ctx.json_path().key("parameters").to_string(), Json::Array(params))],
        ))])
}

fn list_filter(meta: &RuleMeta, ctx: &OperationContext) -> CheckResult {
    if !is_list(ctx) || ctx.has_param(ParamLocation::Query, &["filter"]) {
        return Ok(Vec::new());
    }
    let param = query_param(
        "filter",
        "Filter expression over the listed resources",
        json!({"type": "string"}),
    );
    Ok(vec![meta
        .finding(ctx.location(), "List operation accepts no filter parameter")
        .with_suggestion("Accept a string filter parameter using the AIP-160 grammar")
        .with_fix(Fix::new(
            "add-filter",
            ctx.json_path().to_string(),
            vec![SpecChange::merge(ctx.json_path().key("parameters").to_string(), Json::Array(vec![param]))],
        ))])
}

fn order_by(meta: &RuleMeta, ctx: &ParameterContext) -> CheckResult {
    let Some(name) = ctx.name() else {
        return Ok(Vec::new());
    };
    if !is_sort_alias(name) {
        return Ok(Vec::new());
    }
    let mut finding = meta
        .finding(ctx.location_label(), format!("Ordering parameter '{}' should be named 'order_by'", name))
        .with_suggestion("Rename to 'order_by' and accept a comma-separated field list with optional ' desc'");
    if !ctx.operation.has_param(ParamLocation::Query, &["order_by"]) {
        finding = finding.with_fix(Fix::new(
            "rename-parameter",
            ctx.json_path().to_string(),
            vec![SpecChange::set(ctx.json_path().key("name").to_string(), Json::from("order_by"))],
        ));
    }
    Ok(vec![finding])
}
