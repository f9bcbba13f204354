//! Resource-path analysis: segments, version prefixes, singleton inference and
//! custom-method recognition.
//!
//! Paths are compared in a normalized form where every parameter segment is
//! written `{}` (so `/users/{id}` and `/users/{userId}` coincide) and a root
//! path normalizes to the empty string. Singleton keys use the same form.

use regex::Regex;
use serde_json::Value as Json;
use std::collections::{BTreeSet, HashSet};
use std::ops::Bound;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(v\d+(\.\d+)?|api)$").unwrap());

/// Verbs accepted as custom-method names on a single resource.
const ACTION_VERBS: &[&str] = &[
    "accept", "activate", "approve", "archive", "assign", "backup", "batch", "calculate",
    "cancel", "clone", "close", "complete", "confirm", "copy", "deactivate", "decline", "deploy",
    "disable", "download", "enable", "execute", "expire", "export", "flush", "import", "invite",
    "lock", "login", "logout", "merge", "move", "pause", "preview", "publish", "purge", "refresh",
    "reject", "release", "renew", "reopen", "resend", "reset", "restart", "restore", "resume",
    "retry", "revoke", "rollback", "rotate", "run", "search", "send", "share", "start", "stop",
    "submit", "subscribe", "sync", "test", "transfer", "unarchive", "unassign", "undelete",
    "unlock", "unpublish", "unsubscribe", "upload", "validate", "verify",
];

pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

pub fn is_version_segment(segment: &str) -> bool {
    VERSION_RE.is_match(segment)
}

/// Split `resource:verb` into its resource part and custom verb.
pub fn split_custom_verb(segment: &str) -> (&str, Option<&str>) {
    match segment.split_once(':') {
        Some((base, verb)) => (base, Some(verb)),
        None => (segment, None),
    }
}

pub fn is_path_param(segment: &str) -> bool {
    let (base, _) = split_custom_verb(segment);
    base.starts_with('{') && base.ends_with('}')
}

pub fn is_action_verb(word: &str) -> bool {
    let w = word.to_ascii_lowercase();
    ACTION_VERBS.contains(&w.as_str())
}

fn normalize_segment(segment: &str) -> String {
    match split_custom_verb(segment) {
        (base, verb) if base.starts_with('{') && base.ends_with('}') => match verb {
            Some(v) => format!("{{}}:{}", v),
            None => "{}".to_string(),
        },
        _ => segment.to_string(),
    }
}

fn join_key(segments: &[&str]) -> String {
    segments.iter().map(|s| format!("/{}", normalize_segment(s))).collect()
}

/// Normalized comparison key for a declared path or path prefix.
pub fn normalize_path(path: &str) -> String {
    join_key(&split_segments(path))
}

/// Sorted index of declared paths supporting prefix lookups.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    declared: BTreeSet<String>,
}

impl PathIndex {
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        PathIndex {
            declared: paths.into_iter().map(normalize_path).collect(),
        }
    }

    /// Index the keys of the spec's `paths` object (empty when absent).
    pub fn from_spec(spec: &Json) -> Self {
        match spec.get("paths").and_then(Json::as_object) {
            Some(paths) => Self::new(paths.keys().map(String::as_str)),
            None => Self::default(),
        }
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.declared.contains(key)
    }

    fn beneath<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.declared
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |k| k.starts_with(prefix))
    }

    /// Any declared path whose segment right after `key` is a parameter.
    pub fn has_param_child(&self, key: &str) -> bool {
        let child = format!("{}/{{}}", key);
        let found = self.beneath(&child).next().is_some();
        found
    }

    /// Any declared path beneath `key` with a parameter segment at any depth.
    pub fn has_param_beneath(&self, key: &str) -> bool {
        let child = format!("{}/", key);
        let found = self
            .beneath(&child)
            .any(|k| split_segments(&k[key.len()..]).into_iter().any(is_path_param));
        found
    }

    /// Any declared path strictly beneath `key`.
    pub fn has_descendants(&self, key: &str) -> bool {
        let child = format!("{}/", key);
        let found = self.beneath(&child).next().is_some();
        found
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }
}

/// Infer singleton resources from the spec's declared paths.
pub fn infer_singleton_resources(spec: &Json) -> HashSet<String> {
    infer_singletons(&PathIndex::from_spec(spec))
}

/// Two passes over the declared paths.
///
/// 1. A declared path that does not end in a parameter is a singleton
///    unless `<path>/{param}` is also declared (`/users/{id}/profile`).
/// 2. An undeclared literal ancestor prefix with no parameter segment at any
///    depth beneath it is an implicit singleton (`/v1/database` inferred from
///    `/v1/database/backup`).
///
/// Version segments (`v1`, `v1.2`, `api`) never become singletons.
pub fn infer_singletons(index: &PathIndex) -> HashSet<String> {
    let mut singletons = HashSet::new();
    for key in index.keys() {
        let segments = split_segments(key);
        let Some(last) = segments.last() else {
            continue;
        };
        if is_version_segment(last) || is_path_param(last) {
            continue;
        }
        if !index.is_declared(&format!("{}/{{}}", key)) {
            singletons.insert(key.to_string());
        }
    }
    for key in index.keys() {
        let segments = split_segments(key);
        for end in 1..segments.len() {
            let last = segments[end - 1];
            if is_version_segment(last) || is_path_param(last) {
                continue;
            }
            let prefix = join_key(&segments[..end]);
            if !index.is_declared(&prefix) && !index.has_param_beneath(&prefix) {
                singletons.insert(prefix);
            }
        }
    }
    singletons
}

/// Whether `segment` names a custom method rather than a resource.
///
/// `path` is any path containing the segment; its parent is everything before
/// the last occurrence of `segment`.
pub fn is_custom_method(segment: &str, path: &str, singletons: &HashSet<String>) -> bool {
    if segment.contains(':') {
        return true;
    }
    if let Some((first, _)) = segment.split_once('-') {
        if is_action_verb(first) {
            return true;
        }
    }
    if !is_action_verb(segment) {
        return false;
    }
    let segments = split_segments(path);
    let Some(pos) = segments.iter().rposition(|s| *s == segment) else {
        return false;
    };
    if pos == 0 {
        return false;
    }
    let parent = &segments[..pos];
    if parent.last().is_some_and(|s| is_path_param(s)) {
        return true;
    }
    singletons.contains(&join_key(parent))
}
