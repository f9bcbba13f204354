//! Fix engine: applies the structured changes carried by findings to a
//! working copy of the document.
//!
//! Changes within a fix are attempted in order and are not rolled back when a
//! later one fails. In dry-run mode nothing is resolved or mutated and every
//! change is logged as applied.

use crate::jsonpath::{self, PathError, Segment};
use crate::models::{ChangeOp, ChangeOutcome, Finding, FixErrorEntry, FixResult, FixSummary, SpecChange};
use serde::Deserialize;
use serde_json::Value as Json;
use std::borrow::Cow;
use std::slice;
use thiserror::Error;
use tracing::{debug, info};

/// Per-change precondition failure. The display string is what the change log reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("{operation} requires '{field}'")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
    #[error("Path '{0}' not found")]
    PathNotFound(String),
    #[error("Key '{key}' not found at {path}")]
    KeyNotFound { key: String, path: String },
    #[error("Key '{key}' already exists at {path}")]
    KeyExists { key: String, path: String },
    #[error("Expected object at {path}, found {found}")]
    NotAnObject { path: String, found: &'static str },
    #[error("Cannot add to {found} at {path}; expected array")]
    NotAnArray { path: String, found: &'static str },
    #[error("Cannot merge {value} into {target}")]
    MergeMismatch { value: &'static str, target: &'static str },
    #[error("Cannot initialize {path} from a {value}; merge needs an array or object")]
    MergeScalar { path: String, value: &'static str },
    #[error("No fix attached to finding")]
    NoFix,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixOptions {
    pub dry_run: bool,
}

pub fn type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

pub struct Fixer<'a> {
    spec: Cow<'a, Json>,
    dry_run: bool,
    results: Vec<FixResult>,
    errors: Vec<FixErrorEntry>,
}

impl<'a> Fixer<'a> {
    /// A non-dry-run fixer works on its own deep copy; the caller's tree is
    /// never touched. Dry-run borrows it since nothing is mutated.
    pub fn new(spec: &'a Json, options: FixOptions) -> Self {
        let spec = if options.dry_run {
            Cow::Borrowed(spec)
        } else {
            Cow::Owned(spec.clone())
        };
        Fixer {
            spec,
            dry_run: options.dry_run,
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn apply_fix(&mut self, finding: &Finding) -> FixResult {
        let Some(fix) = &finding.fix else {
            self.errors.push(FixErrorEntry {
                rule_id: finding.rule_id.clone(),
                error: FixError::NoFix.to_string(),
            });
            let result = FixResult {
                rule_id: finding.rule_id.clone(),
                applied: false,
                changes: Vec::new(),
            };
            self.results.push(result.clone());
            return result;
        };

        let mut changes = Vec::with_capacity(fix.spec_changes.len());
        for change in &fix.spec_changes {
            let outcome = if self.dry_run {
                Ok(())
            } else {
                self.apply_change(change)
            };
            match outcome {
                Ok(()) => {
                    debug!(rule = %finding.rule_id, op = change.operation.as_str(), path = %change.path, dry_run = self.dry_run, "change applied");
                    changes.push(ChangeOutcome {
                        change: change.clone(),
                        applied: true,
                        error: None,
                    });
                }
                Err(e) => {
                    debug!(rule = %finding.rule_id, op = change.operation.as_str(), path = %change.path, error = %e, "change failed");
                    self.errors.push(FixErrorEntry {
                        rule_id: finding.rule_id.clone(),
                        error: e.to_string(),
                    });
                    changes.push(ChangeOutcome {
                        change: change.clone(),
                        applied: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        let result = FixResult {
            rule_id: finding.rule_id.clone(),
            applied: changes.iter().all(|c| c.applied),
            changes,
        };
        self.results.push(result.clone());
        result
    }

    pub fn apply_fixes<'f>(&mut self, findings: impl IntoIterator<Item = &'f Finding>) -> Vec<FixResult> {
        let results: Vec<FixResult> = findings.into_iter().map(|f| self.apply_fix(f)).collect();
        let summary = self.get_summary();
        info!(
            total = summary.total,
            applied = summary.applied,
            failed = summary.failed,
            dry_run = self.dry_run,
            "fixes processed"
        );
        results
    }

    /// Apply the fixes of a review run in [`application_order`].
    pub fn apply_review_fixes<'f>(&mut self, findings: impl IntoIterator<Item = &'f Finding>) -> Vec<FixResult> {
        self.apply_fixes(application_order(findings))
    }

    pub fn get_spec(&self) -> &Json {
        &self.spec
    }

    /// Consume the fixer and return the working tree.
    pub fn into_spec(self) -> Json {
        self.spec.into_owned()
    }

    pub fn results(&self) -> &[FixResult] {
        &self.results
    }

    pub fn get_summary(&self) -> FixSummary {
        let applied = self.results.iter().filter(|r| r.applied).count();
        FixSummary {
            total: self.results.len(),
            applied,
            failed: self.results.len() - applied,
            changes: self
                .results
                .iter()
                .flat_map(|r| &r.changes)
                .filter(|c| c.applied)
                .count(),
        }
    }

    pub fn get_errors(&self) -> &[FixErrorEntry] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn apply_change(&mut self, change: &SpecChange) -> Result<(), FixError> {
        let segments = jsonpath::parse(&change.path)?;
        let root = self.spec.to_mut();
        match change.operation {
            ChangeOp::RenameKey => rename_key(root, &segments, change),
            ChangeOp::Set => {
                let value = required_value(change, "set")?;
                let (parent, seg) = jsonpath::resolve_parent(root, &segments)?;
                jsonpath::write_child(parent, seg, value, &change.path)?;
                Ok(())
            }
            ChangeOp::Add => add(root, &segments, change),
            ChangeOp::Remove => remove(root, &segments),
            ChangeOp::Merge => merge(root, &segments, change),
        }
    }
}

fn renames_keys(finding: &Finding) -> bool {
    finding
        .fix
        .as_ref()
        .is_some_and(|fix| fix.spec_changes.iter().any(|c| c.operation == ChangeOp::RenameKey))
}

/// Order findings so every fix carrying a `rename-key` change comes after all
/// other fixes, keeping relative order within both groups.
///
/// Fixes from one review address nodes by the keys the review saw. A path
/// rename applied first would leave later operation fixes pointing at the old
/// key, and `set`/`merge` would recreate it as a stub.
pub fn application_order<'f>(findings: impl IntoIterator<Item = &'f Finding>) -> Vec<&'f Finding> {
    let (renames, others): (Vec<&Finding>, Vec<&Finding>) = findings.into_iter().partition(|f| renames_keys(f));
    others.into_iter().chain(renames).collect()
}

fn required_value(change: &SpecChange, operation: &'static str) -> Result<Json, FixError> {
    change.value.clone().ok_or(FixError::MissingField {
        operation,
        field: "value",
    })
}

fn rename_key(root: &mut Json, segments: &[Segment], change: &SpecChange) -> Result<(), FixError> {
    let missing = |field| FixError::MissingField {
        operation: "rename-key",
        field,
    };
    let from = change.from.as_deref().ok_or_else(|| missing("from"))?;
    let to = change.to.as_deref().ok_or_else(|| missing("to"))?;
    let target = jsonpath::resolve_mut(root, segments).ok_or_else(|| FixError::PathNotFound(change.path.clone()))?;
    let Json::Object(map) = target else {
        return Err(FixError::NotAnObject {
            path: change.path.clone(),
            found: type_name(target),
        });
    };
    if !map.contains_key(from) {
        return Err(FixError::KeyNotFound {
            key: from.to_string(),
            path: change.path.clone(),
        });
    }
    if map.contains_key(to) {
        return Err(FixError::KeyExists {
            key: to.to_string(),
            path: change.path.clone(),
        });
    }
    let old = std::mem::take(map);
    for (key, value) in old {
        if key == from {
            map.insert(to.to_string(), value);
        } else {
            map.insert(key, value);
        }
    }
    Ok(())
}

fn add(root: &mut Json, segments: &[Segment], change: &SpecChange) -> Result<(), FixError> {
    let value = required_value(change, "add")?;
    let (parent, seg) = jsonpath::resolve_parent(root, segments)?;
    if jsonpath::child(parent, seg).is_none() {
        jsonpath::write_child(parent, seg, Json::Array(vec![value]), &change.path)?;
        return Ok(());
    }
    match jsonpath::resolve_mut(parent, slice::from_ref(seg)) {
        Some(Json::Array(items)) => {
            items.push(value);
            Ok(())
        }
        Some(other) => Err(FixError::NotAnArray {
            path: change.path.clone(),
            found: type_name(other),
        }),
        None => Err(FixError::PathNotFound(change.path.clone())),
    }
}

/// Absent targets, including ones behind a missing or scalar intermediate, are a no-op.
fn remove(root: &mut Json, segments: &[Segment]) -> Result<(), FixError> {
    match jsonpath::resolve_existing_parent(root, segments) {
        Ok(Some((parent, seg))) => {
            jsonpath::remove_child(parent, seg);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e @ PathError::RootTarget(_)) => Err(e.into()),
        Err(_) => Ok(()),
    }
}

fn merge(root: &mut Json, segments: &[Segment], change: &SpecChange) -> Result<(), FixError> {
    let value = required_value(change, "merge")?;
    let (parent, seg) = jsonpath::resolve_parent(root, segments)?;
    if jsonpath::child(parent, seg).is_none() {
        if !matches!(value, Json::Array(_) | Json::Object(_)) {
            return Err(FixError::MergeScalar {
                path: change.path.clone(),
                value: type_name(&value),
            });
        }
        jsonpath::write_child(parent, seg, value, &change.path)?;
        return Ok(());
    }
    let target = jsonpath::resolve_mut(parent, slice::from_ref(seg))
        .ok_or_else(|| FixError::PathNotFound(change.path.clone()))?;
    match (target, value) {
        (Json::Array(target), Json::Array(items)) => target.extend(items),
        (Json::Object(target), Json::Object(props)) => {
            for (k, v) in props {
                target.insert(k, v);
            }
        }
        (target, value) => {
            return Err(FixError::MergeMismatch {
                value: type_name(&value),
                target: type_name(target),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Fix, Severity};
    use serde_json::json;

    fn finding(changes: Vec<SpecChange>) -> Finding {
        Finding {
            rule_id: "naming/plural-resources".into(),
            severity: Severity::Warning,
            category: Category::Naming,
            location: "/user".into(),
            message: "m".into(),
            aip_reference: None,
            suggestion: None,
            context: None,
            fix: Some(Fix::new("t", "$.paths", changes)),
        }
    }

    fn apply(spec: &Json, change: SpecChange) -> (FixResult, Json) {
        let mut fixer = Fixer::new(spec, FixOptions::default());
        let result = fixer.apply_fix(&finding(vec![change]));
        (result, fixer.into_spec())
    }

    #[test]
    fn test_rename_key_keeps_order_and_is_not_repeatable() {
        let spec = json!({"paths": {"/a": 1, "/user": 2, "/z": 3}});
        let change = SpecChange::rename_key("$.paths", "/user", "/users");
        let mut fixer = Fixer::new(&spec, FixOptions::default());
        assert!(fixer.apply_fix(&finding(vec![change.clone()])).applied);
        let keys: Vec<&String> = fixer.get_spec()["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["/a", "/users", "/z"]);
        let again = fixer.apply_fix(&finding(vec![change]));
        assert!(!again.applied);
        assert!(again.changes[0].error.as_deref().unwrap().contains("not found"));
        assert!(spec["paths"].get("/user").is_some(), "caller tree untouched");
    }

    #[test]
    fn test_rename_key_conflict_and_missing_parent() {
        let spec = json!({"paths": {"/user": {}, "/users": {}}});
        let (r, _) = apply(&spec, SpecChange::rename_key("$.paths", "/user", "/users"));
        assert!(r.changes[0].error.as_deref().unwrap().contains("already exists"));
        let (r, _) = apply(&spec, SpecChange::rename_key("$.nothing", "a", "b"));
        assert_eq!(r.changes[0].error.as_deref(), Some("Path '$.nothing' not found"));
    }

    #[test]
    fn test_set_creates_intermediates_and_appends_to_arrays() {
        let (r, out) = apply(&json!({}), SpecChange::set("$.components.schemas.Error", json!({"type": "object"})));
        assert!(r.applied);
        assert_eq!(out["components"]["schemas"]["Error"]["type"], "object");

        let spec = json!({"tags": ["a"]});
        let (r, out) = apply(&spec, SpecChange::set("$.tags[1]", json!("b")));
        assert!(r.applied);
        assert_eq!(out["tags"], json!(["a", "b"]));
        let (r, _) = apply(&spec, SpecChange::set("$.tags[5]", json!("x")));
        assert!(!r.applied);
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let (r, _) = apply(&json!({"info": "x"}), SpecChange::set("$.info.title", json!("t")));
        assert_eq!(
            r.changes[0].error.as_deref(),
            Some("Cannot traverse through non-object at '$.info'")
        );
    }

    #[test]
    fn test_add_creates_appends_and_rejects_non_arrays() {
        let (_, out) = apply(&json!({}), SpecChange::add("$.tags", json!("a")));
        assert_eq!(out["tags"], json!(["a"]));
        let (_, out) = apply(&json!({"tags": ["a"]}), SpecChange::add("$.tags", json!("b")));
        assert_eq!(out["tags"], json!(["a", "b"]));
        let (r, _) = apply(&json!({"tags": {}}), SpecChange::add("$.tags", json!("b")));
        assert_eq!(
            r.changes[0].error.as_deref(),
            Some("Cannot add to object at $.tags; expected array")
        );
    }

    #[test]
    fn test_remove_is_idempotent() {
        let spec = json!({"paths": {"/a": {"get": {"requestBody": {}}}}});
        let change = SpecChange::remove("$.paths['/a'].get.requestBody");
        let mut fixer = Fixer::new(&spec, FixOptions::default());
        assert!(fixer.apply_fix(&finding(vec![change.clone()])).applied);
        assert!(fixer.apply_fix(&finding(vec![change])).applied);
        assert!(!fixer.has_errors());
        assert_eq!(fixer.get_spec()["paths"]["/a"]["get"], json!({}));
        let (r, out) = apply(&json!({}), SpecChange::remove("$.a.b.c"));
        assert!(r.applied);
        assert_eq!(out, json!({}), "remove never creates intermediates");
    }

    #[test]
    fn test_merge_semantics() {
        let spec = json!({"p": [{"name": "existing"}], "o": {"a": 1}, "s": "x"});
        let (_, out) = apply(&spec, SpecChange::merge("$.p", json!([{"name": "page_size"}, {"name": "page_token"}])));
        let names: Vec<&str> = out["p"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["existing", "page_size", "page_token"]);

        let (_, out) = apply(&spec, SpecChange::merge("$.o", json!({"b": 2, "a": 3})));
        assert_eq!(out["o"], json!({"a": 3, "b": 2}));

        let (_, out) = apply(&spec, SpecChange::merge("$.new", json!({"k": true})));
        assert_eq!(out["new"], json!({"k": true}));

        let (r, _) = apply(&spec, SpecChange::merge("$.new", json!(5)));
        assert!(!r.applied);
        let (r, _) = apply(&spec, SpecChange::merge("$.p", json!("str")));
        assert_eq!(r.changes[0].error.as_deref(), Some("Cannot merge string into array"));
        let (r, _) = apply(&spec, SpecChange::merge("$.s", json!([1])));
        assert_eq!(r.changes[0].error.as_deref(), Some("Cannot merge array into string"));
    }

    #[test]
    fn test_partial_failure_is_not_rolled_back() {
        let spec = json!({"paths": {"/user": {}}});
        let mut fixer = Fixer::new(&spec, FixOptions::default());
        let result = fixer.apply_fix(&finding(vec![
            SpecChange::rename_key("$.paths", "/user", "/users"),
            SpecChange::rename_key("$.paths", "/missing", "/x"),
            SpecChange::set("$.info.title", json!("T")),
        ]));
        assert!(!result.applied);
        let applied: Vec<bool> = result.changes.iter().map(|c| c.applied).collect();
        assert_eq!(applied, [true, false, true]);
        assert!(fixer.get_spec()["paths"].get("/users").is_some());
        assert_eq!(fixer.get_spec()["info"]["title"], "T");
        let summary = fixer.get_summary();
        assert_eq!(summary, FixSummary { total: 1, applied: 0, failed: 1, changes: 2 });
        assert_eq!(fixer.get_errors().len(), 1);
    }

    #[test]
    fn test_dry_run_records_everything_as_applied() {
        let spec = json!({"paths": {}});
        let mut fixer = Fixer::new(&spec, FixOptions { dry_run: true });
        let result = fixer.apply_fix(&finding(vec![SpecChange::rename_key("$.paths", "/nope", "/x")]));
        assert!(result.applied);
        assert!(!fixer.has_errors());
        assert_eq!(fixer.get_spec(), &spec);
    }

    #[test]
    fn test_renames_are_applied_last() {
        let spec = json!({"paths": {"/user": {"get": {}}}});
        let rename = finding(vec![SpecChange::rename_key("$.paths", "/user", "/users")]);
        let op_id = finding(vec![SpecChange::set("$.paths['/user'].get.operationId", json!("listUsers"))]);
        let order = application_order([&rename, &op_id]);
        assert!(std::ptr::eq(order[0], &op_id));
        assert!(std::ptr::eq(order[1], &rename));

        let mut fixer = Fixer::new(&spec, FixOptions::default());
        let results = fixer.apply_review_fixes([&rename, &op_id]);
        assert!(results.iter().all(|r| r.applied));
        assert_eq!(fixer.get_spec(), &json!({"paths": {"/users": {"get": {"operationId": "listUsers"}}}}));
    }

    #[test]
    fn test_missing_fix_is_logged() {
        let mut f = finding(vec![]);
        f.fix = None;
        let spec = json!({});
        let mut fixer = Fixer::new(&spec, FixOptions::default());
        let result = fixer.apply_fix(&f);
        assert!(!result.applied);
        assert_eq!(fixer.get_errors()[0].error, "No fix attached to finding");
        assert_eq!(fixer.get_summary().failed, 1);
    }

    #[test]
    fn test_empty_fix_trivially_applies() {
        let spec = json!({});
        let mut fixer = Fixer::new(&spec, FixOptions::default());
        assert!(fixer.apply_fix(&finding(vec![])).applied);
    }

    #[test]
    fn test_invalid_path_is_reported() {
        let (r, _) = apply(&json!({}), SpecChange::set("$.a[", json!(1)));
        assert!(r.changes[0].error.as_deref().unwrap().starts_with("Invalid path '$.a['"));
    }
}
