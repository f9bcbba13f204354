//! Fix payloads attached to findings and the log produced when applying them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

/// A present field, `null` included, is `Some`; only an absent one is `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Mutation kind of a single `SpecChange`.
pub enum ChangeOp {
    RenameKey,
    Set,
    Add,
    Remove,
    Merge,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::RenameKey => "rename-key",
            ChangeOp::Set => "set",
            ChangeOp::Add => "add",
            ChangeOp::Remove => "remove",
            ChangeOp::Merge => "merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Atomic tree mutation. `path` is always resolved from the document root.
pub struct SpecChange {
    pub operation: ChangeOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Json>,
}

impl SpecChange {
    pub fn rename_key(path: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        SpecChange {
            operation: ChangeOp::RenameKey,
            path: path.into(),
            from: Some(from.into()),
            to: Some(to.into()),
            value: None,
        }
    }

    pub fn set(path: impl Into<String>, value: Json) -> Self {
        Self::with_value(ChangeOp::Set, path, value)
    }

    pub fn add(path: impl Into<String>, value: Json) -> Self {
        Self::with_value(ChangeOp::Add, path, value)
    }

    pub fn merge(path: impl Into<String>, value: Json) -> Self {
        Self::with_value(ChangeOp::Merge, path, value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        SpecChange {
            operation: ChangeOp::Remove,
            path: path.into(),
            from: None,
            to: None,
            value: None,
        }
    }

    fn with_value(operation: ChangeOp, path: impl Into<String>, value: Json) -> Self {
        SpecChange {
            operation,
            path: path.into(),
            from: None,
            to: None,
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Machine-applicable resolution of a finding. Changes apply in order.
pub struct Fix {
    #[serde(rename = "type")]
    pub kind: String,
    pub json_path: String,
    #[serde(default)]
    pub spec_changes: Vec<SpecChange>,
}

impl Fix {
    pub fn new(kind: impl Into<String>, json_path: impl Into<String>, spec_changes: Vec<SpecChange>) -> Self {
        Fix {
            kind: kind.into(),
            json_path: json_path.into(),
            spec_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Outcome of one change within a fix.
pub struct ChangeOutcome {
    pub change: SpecChange,
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Log entry for one applied (or attempted) fix.
pub struct FixResult {
    pub rule_id: String,
    /// True only when every change in the fix succeeded.
    pub applied: bool,
    pub changes: Vec<ChangeOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Aggregate counts derived from the fix log.
pub struct FixSummary {
    pub total: usize,
    pub applied: usize,
    pub failed: usize,
    /// Successfully applied changes across all fixes.
    pub changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixErrorEntry {
    pub rule_id: String,
    pub error: String,
}
