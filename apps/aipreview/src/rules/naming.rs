//! Naming rules: resource paths, parameters, schemas and fields (AIP-122/140/142/156/185).

use super::context::{ParamLocation, ParameterContext, PathContext, PropertyContext, SchemaContext, SpecContext};
use super::pagination::is_sort_alias;
use super::{CheckResult, Rule, RuleCheck, RuleMeta};
use crate::heuristics::inflect::{classify_plurality, is_uncountable, pluralize, singularize, Plurality};
use crate::heuristics::paths::{
    is_custom_method, is_path_param, is_version_segment, split_custom_verb, split_segments,
};
use crate::heuristics::words::{
    detect_casing_style, is_verb_segment, split_words, starts_with_verb, to_camel_case,
    to_kebab_case, to_pascal_case, to_snake_case, CasingStyle,
};
use crate::jsonpath::JsonPath;
use crate::models::{Category, Fix, Severity, SpecChange};
use regex::Regex;
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static VERSION_WITHIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/v\d+(\.\d+)?(/|$)").unwrap());

pub(crate) fn spec_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("versioning/path-version", "Versioned paths", Category::Versioning, Severity::Warning).aip(185),
            RuleCheck::Spec(path_version),
        ),
        Rule::new(
            RuleMeta::new("naming/consistent-casing", "Consistent path casing", Category::Naming, Severity::Suggestion).aip(122),
            RuleCheck::Spec(consistent_casing),
        ),
    ]
}

pub(crate) fn path_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("naming/plural-resources", "Plural collection names", Category::Naming, Severity::Warning).aip(122),
            RuleCheck::Path(plural_resources),
        ),
        Rule::new(
            RuleMeta::new("naming/verb-in-path", "No verbs in resource paths", Category::Naming, Severity::Warning).aip(136),
            RuleCheck::Path(verb_in_path),
        ),
        Rule::new(
            RuleMeta::new("naming/path-casing", "Kebab-case path segments", Category::Naming, Severity::Suggestion).aip(122),
            RuleCheck::Path(path_casing),
        ),
        Rule::new(
            RuleMeta::new("naming/trailing-slash", "No trailing slash", Category::Naming, Severity::Warning).aip(122),
            RuleCheck::Path(trailing_slash),
        ),
        Rule::new(
            RuleMeta::new("naming/singleton-singular", "Singular singleton names", Category::Naming, Severity::Suggestion).aip(156),
            RuleCheck::Path(singleton_singular),
        ),
    ]
}

pub(crate) fn parameter_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("naming/query-param-casing", "snake_case query parameters", Category::Naming, Severity::Warning).aip(140),
            RuleCheck::Parameter {
                location: Some(ParamLocation::Query),
                check: query_param_casing,
            },
        ),
        Rule::new(
            RuleMeta::new("naming/path-param-braces", "Path parameters match the template", Category::Naming, Severity::Error).aip(122),
            RuleCheck::Parameter {
                location: Some(ParamLocation::Path),
                check: path_param_braces,
            },
        ),
    ]
}

pub(crate) fn schema_rules() -> Vec<Rule> {
    vec![Rule::new(
        RuleMeta::new("naming/schema-pascal-case", "PascalCase schema names", Category::Naming, Severity::Suggestion).aip(122),
        RuleCheck::Schema(schema_pascal_case),
    )]
}

pub(crate) fn property_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleMeta::new("naming/field-casing", "Field name casing", Category::Naming, Severity::Warning).aip(140),
            RuleCheck::Property(field_casing),
        ),
        Rule::new(
            RuleMeta::new("naming/boolean-prefix", "No is- prefix on booleans", Category::Naming, Severity::Suggestion).aip(140),
            RuleCheck::Property(boolean_prefix),
        ),
        Rule::new(
            RuleMeta::new("naming/timestamp-suffix", "Timestamp field suffix", Category::Naming, Severity::Suggestion).aip(142),
            RuleCheck::Property(timestamp_suffix),
        ),
    ]
}

fn path_version(meta: &RuleMeta, ctx: &SpecContext) -> CheckResult {
    let Some(paths) = ctx.paths() else {
        return Ok(Vec::new());
    };
    if paths.is_empty() || paths.keys().any(|p| is_versioned_path(p)) || has_versioned_base(ctx.spec) {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding("paths", "No path carries a major version prefix such as /v1")
        .with_suggestion("Prefix every path with the major API version, e.g. /v1/users")])
}

fn is_versioned_path(path: &str) -> bool {
    let segments = split_segments(path);
    match segments.as_slice() {
        [first, ..] if first.eq_ignore_ascii_case("api") => segments.get(1).is_some_and(|s| is_version_segment(s)),
        [first, ..] => is_version_segment(first),
        [] => false,
    }
}

fn has_versioned_base(spec: &Json) -> bool {
    let servers = spec
        .get("servers")
        .and_then(Json::as_array)
        .map(|s| s.iter().filter_map(|srv| srv.get("url").and_then(Json::as_str)).collect::<Vec<_>>())
        .unwrap_or_default();
    let base_path = spec.get("basePath").and_then(Json::as_str);
    servers.into_iter().chain(base_path).any(|u| VERSION_WITHIN_RE.is_match(u))
}

fn consistent_casing(meta: &RuleMeta, ctx: &SpecContext) -> CheckResult {
    let Some(paths) = ctx.paths() else {
        return Ok(Vec::new());
    };
    let mut styles: BTreeMap<CasingStyle, usize> = BTreeMap::new();
    for path in paths.keys() {
        for seg in split_segments(path) {
            if is_path_param(seg) || is_version_segment(seg) {
                continue;
            }
            let (base, _) = split_custom_verb(seg);
            match detect_casing_style(base) {
                CasingStyle::Lowercase => {}
                style => *styles.entry(style).or_insert(0) += 1,
            }
        }
    }
    if styles.len() < 2 {
        return Ok(Vec::new());
    }
    let listed: Vec<String> = styles.iter().map(|(s, n)| format!("{} ({})", s, n)).collect();
    let counts: serde_json::Map<String, Json> = styles.iter().map(|(s, n)| (s.to_string(), json!(n))).collect();
    Ok(vec![meta
        .finding("paths", format!("Path segments mix casing styles: {}", listed.join(", ")))
        .with_suggestion("Pick one style for multi-word segments; kebab-case is conventional for URLs")
        .with_context("styles", Json::Object(counts))])
}

/// Pluralize the last word of a segment, keeping its casing.
fn pluralize_segment(segment: &str) -> String {
    let Some(last) = split_words(segment).pop() else {
        return segment.to_string();
    };
    let end = segment.trim_end_matches(['_', '-', '.', ' ']).len();
    let Some(cut) = end.checked_sub(last.len()) else {
        return segment.to_string();
    };
    if !segment.is_char_boundary(cut) || !segment[cut..end].eq_ignore_ascii_case(&last) {
        return segment.to_string();
    }
    format!("{}{}{}", &segment[..cut], pluralize(&segment[cut..end]), &segment[end..])
}

fn rename_path_fix(ctx: &PathContext, new_path: &str, kind: &str) -> Option<Fix> {
    let declared = ctx.spec.paths().is_some_and(|p| p.contains_key(new_path));
    if declared || new_path == ctx.path {
        return None;
    }
    Some(Fix::new(
        kind,
        ctx.json_path().to_string(),
        vec![SpecChange::rename_key(JsonPath::root().key("paths").to_string(), ctx.path, new_path)],
    ))
}

fn rebuild_path(segments: &[String], trailing_slash: bool) -> String {
    let mut out = format!("/{}", segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        out.push('/');
    }
    out
}

fn plural_resources(meta: &RuleMeta, ctx: &PathContext) -> CheckResult {
    let segments = ctx.segments();
    let mut renamed: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    let mut offending: Vec<&str> = Vec::new();
    for (i, &seg) in segments.iter().enumerate() {
        if is_path_param(seg) || is_version_segment(seg) {
            continue;
        }
        let prefix = format!("/{}", segments[..=i].join("/"));
        if is_custom_method(seg, &prefix, ctx.spec.singletons) || ctx.spec.is_evident_singleton(&prefix) {
            continue;
        }
        if is_verb_segment(seg) || starts_with_verb(seg).is_some() {
            continue;
        }
        let Some(word) = split_words(seg).pop() else {
            continue;
        };
        if is_uncountable(&word) || classify_plurality(&word) == Plurality::Plural {
            continue;
        }
        offending.push(seg);
        renamed[i] = pluralize_segment(seg);
    }
    if offending.is_empty() {
        return Ok(Vec::new());
    }
    let new_path = rebuild_path(&renamed, ctx.path.ends_with('/'));
    let quoted: Vec<String> = offending.iter().map(|s| format!("'{}'", s)).collect();
    let mut finding = meta
        .finding(
            ctx.path,
            format!("Collection segment {} should be a plural noun", quoted.join(", ")),
        )
        .with_suggestion(format!("Rename the path to {}", new_path))
        .with_context("segments", offending.iter().map(|s| Json::from(*s)).collect::<Vec<_>>());
    if let Some(fix) = rename_path_fix(ctx, &new_path, "rename-path") {
        finding = finding.with_fix(fix);
    }
    Ok(vec![finding])
}

fn verb_in_path(meta: &RuleMeta, ctx: &PathContext) -> CheckResult {
    let segments = ctx.segments();
    let mut findings = Vec::new();
    for (i, &seg) in segments.iter().enumerate() {
        if is_path_param(seg) || is_version_segment(seg) {
            continue;
        }
        let prefix = format!("/{}", segments[..=i].join("/"));
        if is_custom_method(seg, &prefix, ctx.spec.singletons) {
            continue;
        }
        let words = split_words(seg);
        let verb = match words.as_slice() {
            [single] if is_verb_segment(single) => Some(single.clone()),
            [single] => starts_with_verb(single).map(str::to_string),
            [first, ..] if is_verb_segment(first) => Some(first.clone()),
            _ => None,
        };
        let Some(verb) = verb else {
            continue;
        };
        let parent = if i == 0 { String::new() } else { format!("/{}", segments[..i].join("/")) };
        findings.push(
            meta.finding(ctx.path, format!("Segment '{}' uses the verb '{}'; paths name resources", seg, verb))
                .with_suggestion(format!(
                    "Use the HTTP method for standard operations or a custom method such as {}:{}",
                    if parent.is_empty() { "/resource" } else { parent.as_str() },
                    to_camel_case(seg)
                ))
                .with_context("segment", seg)
                .with_context("verb", verb),
        );
    }
    Ok(findings)
}

fn path_casing(meta: &RuleMeta, ctx: &PathContext) -> CheckResult {
    let segments = ctx.segments();
    let mut renamed = Vec::with_capacity(segments.len());
    let mut offending: Vec<(&str, CasingStyle)> = Vec::new();
    for &seg in &segments {
        if is_path_param(seg) || is_version_segment(seg) {
            renamed.push(seg.to_string());
            continue;
        }
        let (base, verb) = split_custom_verb(seg);
        let style = detect_casing_style(base);
        if matches!(style, CasingStyle::SnakeCase | CasingStyle::CamelCase | CasingStyle::PascalCase) {
            offending.push((seg, style));
            let kebab = to_kebab_case(base);
            renamed.push(match verb {
                Some(v) => format!("{}:{}", kebab, v),
                None => kebab,
            });
        } else {
            renamed.push(seg.to_string());
        }
    }
    if offending.is_empty() {
        return Ok(Vec::new());
    }
    let new_path = rebuild_path(&renamed, ctx.path.ends_with('/'));
    let listed: Vec<String> = offending.iter().map(|(s, st)| format!("'{}' ({})", s, st)).collect();
    let mut finding = meta
        .finding(ctx.path, format!("Path segments should be kebab-case: {}", listed.join(", ")))
        .with_suggestion(format!("Rename the path to {}", new_path));
    if let Some(fix) = rename_path_fix(ctx, &new_path, "rename-path") {
        finding = finding.with_fix(fix);
    }
    Ok(vec![finding])
}

fn trailing_slash(meta: &RuleMeta, ctx: &PathContext) -> CheckResult {
    if ctx.path.len() <= 1 || !ctx.path.ends_with('/') {
        return Ok(Vec::new());
    }
    let trimmed = ctx.path.trim_end_matches('/');
    let new_path = if trimmed.is_empty() { "/" } else { trimmed };
    let mut finding = meta
        .finding(ctx.path, "Path ends with a trailing slash")
        .with_suggestion(format!("Rename the path to {}", new_path));
    if let Some(fix) = rename_path_fix(ctx, new_path, "remove-trailing-slash") {
        finding = finding.with_fix(fix);
    }
    Ok(vec![finding])
}

fn singleton_singular(meta: &RuleMeta, ctx: &PathContext) -> CheckResult {
    let segments = ctx.segments();
    let [.., parent, last] = segments.as_slice() else {
        return Ok(Vec::new());
    };
    if !is_path_param(parent) || is_path_param(last) || is_custom_method(last, ctx.path, ctx.spec.singletons) {
        return Ok(Vec::new());
    }
    // a nested path that accepts creates is a collection regardless of children
    if !ctx.spec.is_evident_singleton(ctx.path) || ctx.item.get("post").is_some() {
        return Ok(Vec::new());
    }
    let Some(word) = split_words(last).pop() else {
        return Ok(Vec::new());
    };
    if is_uncountable(&word) || classify_plurality(&word) == Plurality::Singular {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(
            ctx.path,
            format!("'{}' has no {{id}} child and so is a singleton; name it with a singular noun", last),
        )
        .with_suggestion(format!("Consider '{}'", singularize(last)))])
}

fn query_param_casing(meta: &RuleMeta, ctx: &ParameterContext) -> CheckResult {
    let Some(name) = ctx.name() else {
        return Ok(Vec::new());
    };
    if name.contains('[') || name.contains('.') || is_sort_alias(name) {
        return Ok(Vec::new());
    }
    let style = detect_casing_style(name);
    if !matches!(style, CasingStyle::CamelCase | CasingStyle::PascalCase | CasingStyle::KebabCase) {
        return Ok(Vec::new());
    }
    let snake = to_snake_case(name);
    let taken = ctx.operation.has_param(ParamLocation::Query, &[snake.as_str()]);
    let mut finding = meta
        .finding(
            ctx.location_label(),
            format!("Query parameter '{}' is {}; use snake_case", name, style),
        )
        .with_suggestion(format!("Rename to '{}'", snake));
    if !taken {
        let path = ctx.json_path().key("name").to_string();
        finding = finding.with_fix(Fix::new(
            "rename-parameter",
            ctx.json_path().to_string(),
            vec![SpecChange::set(path, Json::from(snake))],
        ));
    }
    Ok(vec![finding])
}

fn path_param_braces(meta: &RuleMeta, ctx: &ParameterContext) -> CheckResult {
    let Some(name) = ctx.name() else {
        return Ok(Vec::new());
    };
    let declared: Vec<&str> = split_segments(ctx.operation.path)
        .into_iter()
        .filter(|s| is_path_param(s))
        .map(|s| split_custom_verb(s).0.trim_start_matches('{').trim_end_matches('}'))
        .collect();
    if declared.contains(&name) {
        return Ok(Vec::new());
    }
    let finding = meta
        .finding(
            ctx.location_label(),
            format!("Path parameter '{}' does not appear as {{{}}} in the path template", name, name),
        )
        .with_context("templateParameters", declared.iter().map(|s| Json::from(*s)).collect::<Vec<_>>());
    Ok(vec![finding])
}

fn schema_pascal_case(meta: &RuleMeta, ctx: &SchemaContext) -> CheckResult {
    if detect_casing_style(ctx.name) == CasingStyle::PascalCase && !ctx.name.contains('.') {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(ctx.location(), format!("Schema name '{}' should be PascalCase", ctx.name))
        .with_suggestion(format!(
            "Rename to '{}' and update every $ref to it",
            to_pascal_case(ctx.name)
        ))])
}

fn field_casing(meta: &RuleMeta, ctx: &PropertyContext) -> CheckResult {
    let style = detect_casing_style(ctx.name);
    if !matches!(style, CasingStyle::KebabCase | CasingStyle::PascalCase) {
        return Ok(Vec::new());
    }
    Ok(vec![meta
        .finding(
            ctx.location(),
            format!("Field '{}' is {}; use lowerCamelCase or snake_case", ctx.name, style),
        )
        .with_suggestion(format!("Rename to '{}'", to_camel_case(ctx.name)))])
}

fn strip_boolean_prefix(name: &str) -> Option<String> {
    if let Some(rest) = name.strip_prefix("is_") {
        return (!rest.is_empty()).then(|| rest.to_string());
    }
    let rest = name.strip_prefix("is")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    first
        .is_ascii_uppercase()
        .then(|| first.to_ascii_lowercase().to_string() + chars.as_str())
}

fn boolean_prefix(meta: &RuleMeta, ctx: &PropertyContext) -> CheckResult {
    if ctx.type_name() != Some("boolean") {
        return Ok(Vec::new());
    }
    let Some(renamed) = strip_boolean_prefix(ctx.name) else {
        return Ok(Vec::new());
    };
    let mut finding = meta
        .finding(ctx.location(), format!("Boolean field '{}' should omit the 'is' prefix", ctx.name))
        .with_suggestion(format!("Rename to '{}'", renamed));
    let taken = ctx.schema.properties().is_some_and(|p| p.contains_key(&renamed));
    if !taken {
        let mut changes = vec![SpecChange::rename_key(ctx.properties_path().to_string(), ctx.name, renamed.as_str())];
        if let Some(required) = ctx.schema.schema.get("required").and_then(Json::as_array) {
            if required.iter().any(|r| r.as_str() == Some(ctx.name)) {
                let updated: Vec<Json> = required
                    .iter()
                    .map(|r| if r.as_str() == Some(ctx.name) { Json::from(renamed.as_str()) } else { r.clone() })
                    .collect();
                changes.push(SpecChange::set(
                    ctx.schema.json_path().key("required").to_string(),
                    Json::Array(updated),
                ));
            }
        }
        finding = finding.with_fix(Fix::new("rename-field", ctx.properties_path().key(ctx.name).to_string(), changes));
    }
    Ok(vec![finding])
}

fn timestamp_suffix(meta: &RuleMeta, ctx: &PropertyContext) -> CheckResult {
    let is_timestamp = ctx.property.get("format").and_then(Json::as_str) == Some("date-time");
    if !is_timestamp {
        return Ok(Vec::new());
    }
    let ok = ["_time", "Time", "_at", "At", "timestamp", "Timestamp"]
        .iter()
        .any(|suffix| ctx.name.ends_with(suffix))
        || ctx.name == "time";
    if ok {
        return Ok(Vec::new());
    }
    let suggested = if ctx.name.contains('_') || detect_casing_style(ctx.name) == CasingStyle::Lowercase {
        format!("{}_time", ctx.name)
    } else {
        format!("{}Time", ctx.name)
    };
    Ok(vec![meta
        .finding(ctx.location(), format!("Timestamp field '{}' should end with '_time'", ctx.name))
        .with_suggestion(format!("Consider '{}'", suggested))])
}
