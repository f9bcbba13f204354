//! Review engine: one traversal of the document tree dispatching each element
//! to the rules of its kind.
//!
//! Traversal order is fixed: spec root, then `paths` in document order (path
//! rules, then each declared method in [`Method::ORDER`] with its parameters in
//! array order), then `components.schemas` in document order (schema rules,
//! then each property in document order). Findings are reported in that order.

use crate::heuristics::paths::{infer_singletons, PathIndex};
use crate::models::{Category, Finding, ReviewMetadata, ReviewResult, Severity, Summary};
use crate::rules::context::{
    Method, OperationContext, ParamLocation, ParameterContext, PathContext, PropertyContext, SchemaContext,
    SpecContext,
};
use crate::rules::legacy::adapt_issues;
use crate::rules::{Catalog, CheckResult, Rule, RuleCheck, RuleKind};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value as Json;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Label used when the caller does not name the reviewed document.
pub const DEFAULT_SOURCE_LABEL: &str = "inline";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReviewOptions {
    /// Promote every warning to an error after the pass.
    pub strict: bool,
    /// Restrict to these categories; empty means all.
    pub categories: Vec<Category>,
    /// Rule ids to leave out.
    pub skip_rules: Vec<String>,
}

impl ReviewOptions {
    fn admits(&self, rule: &Rule) -> bool {
        let category_ok = self.categories.is_empty() || self.categories.contains(&rule.meta.category);
        category_ok && !self.skip_rules.iter().any(|id| id == rule.id())
    }
}

#[derive(Default)]
struct Groups {
    spec: Vec<Arc<Rule>>,
    path: Vec<Arc<Rule>>,
    operation: Vec<Arc<Rule>>,
    parameter: Vec<Arc<Rule>>,
    schema: Vec<Arc<Rule>>,
    property: Vec<Arc<Rule>>,
}

impl Groups {
    fn push(&mut self, rule: Arc<Rule>) {
        let group = match rule.kind() {
            RuleKind::Spec => &mut self.spec,
            RuleKind::Path => &mut self.path,
            RuleKind::Operation => &mut self.operation,
            RuleKind::Parameter => &mut self.parameter,
            RuleKind::Schema => &mut self.schema,
            RuleKind::Property => &mut self.property,
        };
        group.push(rule);
    }
}

pub struct Reviewer {
    options: ReviewOptions,
    active: Vec<Arc<Rule>>,
    groups: Groups,
}

impl Reviewer {
    /// Filter `catalog` by `options` and partition the survivors by kind.
    pub fn new(catalog: &Catalog, options: ReviewOptions) -> Self {
        let mut reviewer = Reviewer {
            options,
            active: Vec::new(),
            groups: Groups::default(),
        };
        for rule in catalog.rules() {
            reviewer.admit(Arc::clone(rule));
        }
        debug!(rules = reviewer.active.len(), "reviewer ready");
        reviewer
    }

    /// Append rules beyond the catalog. The same category and skip filters
    /// apply; ids already active are ignored with a warning.
    pub fn with_custom_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        for rule in rules {
            if self.active.iter().any(|r| r.id() == rule.id()) {
                warn!(rule = %rule.id(), "custom rule id already active; ignoring");
                continue;
            }
            self.admit(Arc::new(rule));
        }
        self
    }

    fn admit(&mut self, rule: Arc<Rule>) {
        if !self.options.admits(&rule) {
            return;
        }
        self.active.push(Arc::clone(&rule));
        self.groups.push(rule);
    }

    pub fn options(&self) -> &ReviewOptions {
        &self.options
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.active.iter().map(|r| r.id()).collect()
    }

    pub fn review(&self, spec: &Json, source_label: Option<&str>) -> ReviewResult {
        let index = PathIndex::from_spec(spec);
        let singletons = infer_singletons(&index);
        let ctx = SpecContext {
            spec,
            index: &index,
            singletons: &singletons,
        };

        let mut findings = Vec::new();
        self.visit_spec(&ctx, &mut findings);
        self.visit_paths(&ctx, &mut findings);
        self.visit_schemas(&ctx, &mut findings);

        if self.options.strict {
            for f in findings.iter_mut().filter(|f| f.severity == Severity::Warning) {
                f.severity = Severity::Error;
            }
        }
        let summary = Summary::from_findings(&findings);
        debug!(
            findings = findings.len(),
            errors = summary.errors,
            singletons = singletons.len(),
            "review complete"
        );

        ReviewResult {
            spec_path: source_label.unwrap_or(DEFAULT_SOURCE_LABEL).to_string(),
            spec_title: string_at(spec, "/info/title"),
            spec_version: string_at(spec, "/info/version"),
            findings,
            summary,
            metadata: ReviewMetadata {
                reviewed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                reviewer_version: env!("CARGO_PKG_VERSION").to_string(),
                rules_applied: self.rule_ids().into_iter().map(str::to_string).collect(),
            },
        }
    }

    fn visit_spec(&self, ctx: &SpecContext, findings: &mut Vec<Finding>) {
        for rule in &self.groups.spec {
            match &rule.check {
                RuleCheck::Spec(check) => run(rule, "spec", findings, || check(&rule.meta, ctx)),
                RuleCheck::Legacy(check) => run(rule, "spec", findings, || {
                    check(ctx.spec).map(|issues| adapt_issues(&rule.meta, issues))
                }),
                _ => {}
            }
        }
    }

    fn visit_paths(&self, ctx: &SpecContext, findings: &mut Vec<Finding>) {
        let Some(paths) = ctx.paths() else {
            return;
        };
        for (path, item) in paths {
            let path_ctx = PathContext { spec: ctx, path, item };
            for rule in &self.groups.path {
                if let RuleCheck::Path(check) = &rule.check {
                    run(rule, path, findings, || check(&rule.meta, &path_ctx));
                }
            }
            if !item.is_object() {
                debug!(path = %path, "path item is not an object; skipping operations");
                continue;
            }
            for method in Method::ORDER {
                let Some(operation) = item.get(method.key()).filter(|op| op.is_object()) else {
                    continue;
                };
                let op_ctx = OperationContext {
                    spec: ctx,
                    path,
                    path_item: item,
                    method,
                    operation,
                };
                self.visit_operation(&op_ctx, findings);
            }
        }
    }

    fn visit_operation(&self, op_ctx: &OperationContext, findings: &mut Vec<Finding>) {
        let location = op_ctx.location();
        for rule in &self.groups.operation {
            if let RuleCheck::Operation(check) = &rule.check {
                run(rule, &location, findings, || check(&rule.meta, op_ctx));
            }
        }
        if self.groups.parameter.is_empty() {
            return;
        }
        for (index, parameter) in op_ctx.parameters().iter().enumerate() {
            let param_location = parameter.get("in").and_then(Json::as_str).and_then(ParamLocation::parse);
            let param_ctx = ParameterContext {
                operation: op_ctx,
                index,
                parameter,
                location: param_location,
            };
            for rule in &self.groups.parameter {
                if let RuleCheck::Parameter { location, check } = &rule.check {
                    if location.is_some() && *location != param_location {
                        continue;
                    }
                    run(rule, &param_ctx.location_label(), findings, || check(&rule.meta, &param_ctx));
                }
            }
        }
    }

    fn visit_schemas(&self, ctx: &SpecContext, findings: &mut Vec<Finding>) {
        let Some(schemas) = ctx.schemas() else {
            return;
        };
        for (name, schema) in schemas {
            let schema_ctx = SchemaContext { spec: ctx, name, schema };
            let location = schema_ctx.location();
            for rule in &self.groups.schema {
                if let RuleCheck::Schema(check) = &rule.check {
                    run(rule, &location, findings, || check(&rule.meta, &schema_ctx));
                }
            }
            let Some(properties) = schema_ctx.properties() else {
                continue;
            };
            for (prop_name, property) in properties {
                let prop_ctx = PropertyContext {
                    schema: &schema_ctx,
                    name: prop_name,
                    property,
                };
                for rule in &self.groups.property {
                    if let RuleCheck::Property(check) = &rule.check {
                        run(rule, &prop_ctx.location(), findings, || check(&rule.meta, &prop_ctx));
                    }
                }
            }
        }
    }
}

fn string_at(spec: &Json, pointer: &str) -> Option<String> {
    spec.pointer(pointer).and_then(Json::as_str).map(str::to_string)
}

/// Run one check against one element. Errors and panics are logged and
/// contribute nothing.
fn run(rule: &Rule, element: &str, findings: &mut Vec<Finding>, check: impl FnOnce() -> CheckResult) {
    match catch_unwind(AssertUnwindSafe(check)) {
        Ok(Ok(found)) => findings.extend(found),
        Ok(Err(e)) => warn!(rule = %rule.id(), element = %element, error = %e, "rule failed; skipping element"),
        Err(payload) => warn!(
            rule = %rule.id(),
            element = %element,
            panic = %panic_message(payload.as_ref()),
            "rule panicked; skipping element"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LegacyRule, RuleError, RuleMeta};
    use serde_json::json;

    fn sample() -> Json {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Library", "version": "1.2.0"},
            "paths": {
                "/v1/books": {"get": {"summary": "List", "parameters": [
                    {"name": "pageSize", "in": "query"},
                    {"name": "X-Trace", "in": "header"}
                ]}},
                "/v1/books/{book}": {"get": {"summary": "Get", "requestBody": {"content": {}}}}
            },
            "components": {"schemas": {"book": {"properties": {"isbn-code": {"type": "string"}}}}}
        })
    }

    fn reviewer(options: ReviewOptions) -> Reviewer {
        Reviewer::new(&Catalog::builtin(), options)
    }

    #[test]
    fn test_result_metadata() {
        let result = reviewer(ReviewOptions::default()).review(&sample(), None);
        assert_eq!(result.spec_path, "inline");
        assert_eq!(result.spec_title.as_deref(), Some("Library"));
        assert_eq!(result.spec_version.as_deref(), Some("1.2.0"));
        assert_eq!(result.metadata.reviewer_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(result.metadata.rules_applied.len(), Catalog::builtin().len());
        assert!(chrono::DateTime::parse_from_rfc3339(&result.metadata.reviewed_at).is_ok());
    }

    #[test]
    fn test_findings_follow_traversal_order() {
        let result = reviewer(ReviewOptions::default()).review(&sample(), Some("lib.json"));
        let pos = |id: &str| result.findings.iter().position(|f| f.rule_id == id).unwrap();
        assert!(pos("errors/error-schema") < pos("naming/query-param-casing"));
        assert!(pos("naming/query-param-casing") < pos("standard-methods/get-no-body"));
        assert!(pos("standard-methods/get-no-body") < pos("naming/schema-pascal-case"));
        assert!(pos("naming/schema-pascal-case") < pos("naming/field-casing"));
    }

    #[test]
    fn test_parameter_location_filter() {
        let result = reviewer(ReviewOptions::default()).review(&sample(), None);
        let casing: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.rule_id == "naming/query-param-casing")
            .collect();
        assert_eq!(casing.len(), 1);
        assert_eq!(casing[0].location, "GET /v1/books (parameter: pageSize)");
    }

    #[test]
    fn test_category_and_skip_filters() {
        let options = ReviewOptions {
            categories: vec![Category::StandardMethods],
            skip_rules: vec!["standard-methods/operation-id".into()],
            ..Default::default()
        };
        let r = reviewer(options);
        assert!(r.rule_ids().iter().all(|id| id.starts_with("standard-methods/")));
        assert!(!r.rule_ids().contains(&"standard-methods/operation-id"));
        let result = r.review(&sample(), None);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].rule_id, "standard-methods/get-no-body");
    }

    #[test]
    fn test_strict_promotes_warnings_only() {
        let normal = reviewer(ReviewOptions::default()).review(&sample(), None);
        let strict = reviewer(ReviewOptions {
            strict: true,
            ..Default::default()
        })
        .review(&sample(), None);
        assert_eq!(strict.summary.warnings, 0);
        assert_eq!(strict.summary.errors, normal.summary.errors + normal.summary.warnings);
        assert_eq!(strict.summary.suggestions, normal.summary.suggestions);
    }

    #[test]
    fn test_failing_rules_are_isolated() {
        let failing = Rule::new(
            RuleMeta::new("documentation/fails", "fails", Category::Documentation, Severity::Warning),
            RuleCheck::Path(|_, _| Err(RuleError::Custom("boom".into()))),
        );
        let panicking = Rule::new(
            RuleMeta::new("documentation/panics", "panics", Category::Documentation, Severity::Warning),
            RuleCheck::Schema(|_, _| panic!("bad rule")),
        );
        let baseline = reviewer(ReviewOptions::default()).review(&sample(), None);
        let result = reviewer(ReviewOptions::default())
            .with_custom_rules([failing, panicking])
            .review(&sample(), None);
        assert_eq!(result.findings, baseline.findings);
        assert!(result.metadata.rules_applied.contains(&"documentation/panics".to_string()));
    }

    #[test]
    fn test_legacy_rules_run_with_spec_rules() {
        let legacy = LegacyRule::new(
            RuleMeta::new("documentation/contact", "contact", Category::Documentation, Severity::Suggestion),
            |spec: &Json| {
                Ok(match spec.pointer("/info/contact") {
                    Some(_) => vec![],
                    None => vec![json!({"location": "info", "message": "No contact"}), json!({})],
                })
            },
        );
        let result = reviewer(ReviewOptions::default())
            .with_custom_rules([legacy.into_rule()])
            .review(&sample(), None);
        let contact: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.rule_id == "documentation/contact")
            .collect();
        assert_eq!(contact.len(), 1);
        assert_eq!(contact[0].location, "info");
        assert_eq!(contact[0].severity, Severity::Suggestion);
    }

    #[test]
    fn test_duplicate_custom_rule_ignored() {
        let dup = Rule::new(
            RuleMeta::new("naming/plural-resources", "dup", Category::Naming, Severity::Error),
            RuleCheck::Spec(|meta, _| Ok(vec![meta.finding("spec", "dup")])),
        );
        let r = reviewer(ReviewOptions::default()).with_custom_rules([dup]);
        let result = r.review(&sample(), None);
        assert!(result.findings.iter().all(|f| f.message != "dup"));
    }
}
