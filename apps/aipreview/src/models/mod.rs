//! Shared data models for review findings, review results, and fixes.

pub mod fix;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use fix::{ChangeOp, ChangeOutcome, Fix, FixErrorEntry, FixResult, FixSummary, SpecChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How serious a finding is. `warning` is promoted to `error` in strict mode.
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Rule taxonomy, loosely following the AIP groupings.
pub enum Category {
    Naming,
    StandardMethods,
    Errors,
    Pagination,
    Filtering,
    Idempotency,
    Versioning,
    Documentation,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Naming,
        Category::StandardMethods,
        Category::Errors,
        Category::Pagination,
        Category::Filtering,
        Category::Idempotency,
        Category::Versioning,
        Category::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Naming => "naming",
            Category::StandardMethods => "standard-methods",
            Category::Errors => "errors",
            Category::Pagination => "pagination",
            Category::Filtering => "filtering",
            Category::Idempotency => "idempotency",
            Category::Versioning => "versioning",
            Category::Documentation => "documentation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category '{}' (expected one of: {})", wanted, known.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One reported issue from a review pass.
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub category: Category,
    /// Human-readable locator such as `GET /users` or `components.schemas.User`.
    pub location: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aip_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Json>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Finding {
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Severity and category counts, computed after strict-mode promotion.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub by_category: BTreeMap<Category, usize>,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary::default();
        for f in findings {
            match f.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Suggestion => summary.suggestions += 1,
            }
            *summary.by_category.entry(f.category).or_insert(0) += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    /// RFC 3339 UTC timestamp.
    pub reviewed_at: String,
    pub reviewer_version: String,
    pub rules_applied: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Output of one review pass.
pub struct ReviewResult {
    pub spec_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub metadata: ReviewMetadata,
}

impl ReviewResult {
    /// Findings that carry a machine-applicable fix.
    pub fn fixable(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.fix.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finding(sev: Severity, cat: Category) -> Finding {
        Finding {
            rule_id: "r".into(),
            severity: sev,
            category: cat,
            location: "/x".into(),
            message: "m".into(),
            aip_reference: None,
            suggestion: None,
            context: None,
            fix: None,
        }
    }

    #[test]
    fn test_summary_counts_by_severity_and_category() {
        let findings = vec![
            finding(Severity::Error, Category::Naming),
            finding(Severity::Warning, Category::Naming),
            finding(Severity::Suggestion, Category::Pagination),
        ];
        let s = Summary::from_findings(&findings);
        assert_eq!((s.errors, s.warnings, s.suggestions), (1, 1, 1));
        assert_eq!(s.by_category.get(&Category::Naming), Some(&2));
        assert_eq!(s.by_category.get(&Category::Pagination), Some(&1));
    }

    #[test]
    fn test_finding_serializes_camel_case_and_omits_empty() {
        let f = finding(Severity::Warning, Category::StandardMethods).with_context("method", "GET");
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["ruleId"], "r");
        assert_eq!(v["category"], "standard-methods");
        assert_eq!(v["context"], json!({"method": "GET"}));
        assert!(v.get("fix").is_none());
        assert!(v.get("aipReference").is_none());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("standard-methods".parse::<Category>(), Ok(Category::StandardMethods));
        assert_eq!(" Naming ".parse::<Category>(), Ok(Category::Naming));
        assert!("bogus".parse::<Category>().is_err());
    }
}
