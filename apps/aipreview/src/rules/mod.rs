//! Rule catalog: metadata, the tagged check union, and the builtin rule set.
//!
//! A rule's `check` variant fixes which document element it examines. The
//! review engine partitions an active catalog by variant once, so dispatch
//! per element is a plain iteration over the matching group.

pub mod context;
pub mod documentation;
pub mod errors;
pub mod legacy;
pub mod methods;
pub mod naming;
pub mod pagination;

use crate::models::{Category, Finding, Severity};
use context::{OperationContext, ParamLocation, ParameterContext, PathContext, PropertyContext, SchemaContext, SpecContext};
use serde_json::Value as Json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub use legacy::LegacyRule;

/// Error raised by a rule's check; isolated per element by the review engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("malformed {element}: {reason}")]
    Malformed { element: String, reason: String },
    #[error("duplicate rule id '{0}'")]
    Duplicate(String),
    #[error("{0}")]
    Custom(String),
}

pub type CheckResult = Result<Vec<Finding>, RuleError>;

pub type LegacyCheck = Arc<dyn Fn(&Json) -> Result<Vec<Json>, RuleError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Spec,
    Path,
    Operation,
    Schema,
    Property,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub severity: Severity,
    pub aip_reference: Option<String>,
}

impl RuleMeta {
    pub fn new(id: &str, name: &str, category: Category, severity: Severity) -> Self {
        RuleMeta {
            id: id.to_string(),
            name: name.to_string(),
            category,
            severity,
            aip_reference: None,
        }
    }

    pub fn aip(mut self, number: u32) -> Self {
        self.aip_reference = Some(format!("AIP-{}", number));
        self
    }

    /// Start a finding attributed to this rule.
    pub fn finding(&self, location: impl Into<String>, message: impl Into<String>) -> Finding {
        Finding {
            rule_id: self.id.clone(),
            severity: self.severity,
            category: self.category,
            location: location.into(),
            message: message.into(),
            aip_reference: self.aip_reference.clone(),
            suggestion: None,
            context: None,
            fix: None,
        }
    }
}

pub enum RuleCheck {
    Spec(fn(&RuleMeta, &SpecContext) -> CheckResult),
    Path(fn(&RuleMeta, &PathContext) -> CheckResult),
    Operation(fn(&RuleMeta, &OperationContext) -> CheckResult),
    Parameter {
        /// Only parameters declared `in` this location are dispatched.
        location: Option<ParamLocation>,
        check: fn(&RuleMeta, &ParameterContext) -> CheckResult,
    },
    Schema(fn(&RuleMeta, &SchemaContext) -> CheckResult),
    Property(fn(&RuleMeta, &PropertyContext) -> CheckResult),
    /// Untyped check over the whole document, run with the spec-level rules.
    Legacy(LegacyCheck),
}

pub struct Rule {
    pub meta: RuleMeta,
    pub check: RuleCheck,
}

impl Rule {
    pub fn new(meta: RuleMeta, check: RuleCheck) -> Self {
        Rule { meta, check }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn kind(&self) -> RuleKind {
        match self.check {
            RuleCheck::Spec(_) | RuleCheck::Legacy(_) => RuleKind::Spec,
            RuleCheck::Path(_) => RuleKind::Path,
            RuleCheck::Operation(_) => RuleKind::Operation,
            RuleCheck::Parameter { .. } => RuleKind::Parameter,
            RuleCheck::Schema(_) => RuleKind::Schema,
            RuleCheck::Property(_) => RuleKind::Property,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.meta.id)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Ordered, id-unique collection of rules. Built once and shared by reference.
#[derive(Debug, Default)]
pub struct Catalog {
    rules: Vec<Arc<Rule>>,
}

impl Catalog {
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut catalog = Catalog::default();
        for rule in rules {
            catalog.register(rule)?;
        }
        Ok(catalog)
    }

    /// Every rule shipped with the crate, in catalog order.
    pub fn builtin() -> Self {
        let mut rules = Vec::new();
        rules.extend(naming::spec_rules());
        rules.extend(errors::spec_rules());
        rules.extend(naming::path_rules());
        rules.extend(methods::rules());
        rules.extend(errors::operation_rules());
        rules.extend(pagination::rules());
        rules.extend(documentation::rules());
        rules.extend(naming::parameter_rules());
        rules.extend(naming::schema_rules());
        rules.extend(errors::schema_rules());
        rules.extend(naming::property_rules());
        Catalog {
            rules: rules.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn register(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.get(rule.id()).is_some() {
            return Err(RuleError::Duplicate(rule.id().to_string()));
        }
        self.rules.push(Arc::new(rule));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_unique_and_prefixed_by_category() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.ids().len(), catalog.len());
        for rule in catalog.rules() {
            let prefix = format!("{}/", rule.meta.category);
            assert!(rule.id().starts_with(&prefix), "{}", rule.id());
        }
    }

    #[test]
    fn test_builtin_covers_every_kind() {
        let catalog = Catalog::builtin();
        let kinds: HashSet<RuleKind> = catalog.rules().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds.len(), 6);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog = Catalog::builtin();
        let dup = Rule::new(
            RuleMeta::new("naming/plural-resources", "dup", Category::Naming, Severity::Warning),
            RuleCheck::Spec(|_, _| Ok(Vec::new())),
        );
        assert_eq!(
            catalog.register(dup),
            Err(RuleError::Duplicate("naming/plural-resources".into()))
        );
    }
}
