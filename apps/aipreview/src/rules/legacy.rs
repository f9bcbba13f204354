//! Adapter for untyped rules that inspect the whole document and return loose
//! issue objects instead of findings.

use super::{LegacyCheck, Rule, RuleCheck, RuleError, RuleMeta};
use crate::models::{Finding, Fix};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::warn;

pub struct LegacyRule {
    pub meta: RuleMeta,
    pub check: LegacyCheck,
}

impl LegacyRule {
    pub fn new<F>(meta: RuleMeta, check: F) -> Self
    where
        F: Fn(&Json) -> Result<Vec<Json>, RuleError> + Send + Sync + 'static,
    {
        LegacyRule {
            meta,
            check: Arc::new(check),
        }
    }

    pub fn into_rule(self) -> Rule {
        Rule::new(self.meta, RuleCheck::Legacy(self.check))
    }
}

impl From<LegacyRule> for Rule {
    fn from(rule: LegacyRule) -> Self {
        rule.into_rule()
    }
}

/// Convert issue objects `{location?, message, suggestion?, context?, fix?}`
/// into findings attributed to `meta`. Issues without a string `message` are
/// dropped; so is a `fix` that does not have the fix shape.
pub(crate) fn adapt_issues(meta: &RuleMeta, issues: Vec<Json>) -> Vec<Finding> {
    let mut findings = Vec::with_capacity(issues.len());
    for (i, issue) in issues.into_iter().enumerate() {
        let Json::Object(mut obj) = issue else {
            warn!(rule = %meta.id, index = i, "dropping non-object issue");
            continue;
        };
        let Some(message) = obj.get("message").and_then(Json::as_str).map(str::to_string) else {
            warn!(rule = %meta.id, index = i, "dropping issue without a message");
            continue;
        };
        let location = obj
            .get("location")
            .and_then(Json::as_str)
            .unwrap_or("spec")
            .to_string();
        let mut finding = meta.finding(location, message);
        if let Some(s) = obj.get("suggestion").and_then(Json::as_str) {
            finding = finding.with_suggestion(s);
        }
        if let Some(Json::Object(ctx)) = obj.shift_remove("context") {
            finding.context = Some(ctx);
        }
        if let Some(raw) = obj.shift_remove("fix") {
            match serde_json::from_value::<Fix>(raw) {
                Ok(fix) => finding = finding.with_fix(fix),
                Err(e) => warn!(rule = %meta.id, index = i, error = %e, "ignoring malformed fix"),
            }
        }
        findings.push(finding);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ChangeOp, Severity};
    use serde_json::json;

    fn meta() -> RuleMeta {
        RuleMeta::new("documentation/contact", "Contact", Category::Documentation, Severity::Suggestion)
    }

    #[test]
    fn test_adapt_full_issue() {
        let issues = vec![json!({
            "location": "info",
            "message": "No contact",
            "suggestion": "Add info.contact",
            "context": {"field": "contact"},
            "fix": {
                "type": "add-contact",
                "jsonPath": "$.info.contact",
                "specChanges": [{"operation": "set", "path": "$.info.contact", "value": {}}]
            }
        })];
        let findings = adapt_issues(&meta(), issues);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.rule_id, "documentation/contact");
        assert_eq!(f.location, "info");
        assert_eq!(f.suggestion.as_deref(), Some("Add info.contact"));
        assert_eq!(f.context.as_ref().and_then(|c| c.get("field")), Some(&json!("contact")));
        let fix = f.fix.as_ref().unwrap();
        assert_eq!(fix.spec_changes[0].operation, ChangeOp::Set);
    }

    #[test]
    fn test_adapt_drops_messageless_issues() {
        let issues = vec![json!({"location": "info"}), json!("oops"), json!({"message": "kept"})];
        let findings = adapt_issues(&meta(), issues);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, "spec");
        assert!(findings[0].fix.is_none());
    }
}
