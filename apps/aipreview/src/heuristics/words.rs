//! Word-level heuristics: verb detection and casing analysis for path segments.

use std::fmt;

/// Words read as verbs when they appear as a whole path segment.
const VERBS: &[&str] = &[
    "accept", "activate", "add", "analyze", "apply", "approve", "assign", "authenticate",
    "authorize", "calculate", "cancel", "check", "clone", "close", "complete", "compute",
    "confirm", "convert", "copy", "create", "deactivate", "decline", "delete", "disable",
    "downgrade", "duplicate", "enable", "evaluate", "execute", "fetch", "find", "flush",
    "generate", "get", "grant", "invite", "list", "make", "modify", "move", "open", "pause",
    "publish", "purge", "refresh", "register", "reject", "remove", "reset", "restart", "restore",
    "resume", "retrieve", "revoke", "rotate", "send", "set", "start", "stop", "submit",
    "subscribe", "sync", "synchronize", "transform", "translate", "unarchive", "unassign",
    "undelete", "unpublish", "unsubscribe", "update", "upgrade", "validate", "verify",
];

/// Words with a noun/verb duality. In resource paths they are always nouns.
const NOUN_VERB_DUAL: &[&str] = &[
    "archive", "backup", "change", "deploy", "download", "export", "import", "link", "lock",
    "merge", "order", "process", "release", "report", "request", "review", "run", "search",
    "share", "split", "test", "transfer", "upload",
];

/// Verbs that may prefix a concatenated segment such as `getusers`.
const PREFIX_VERBS: &[&str] = &[
    "retrieve", "create", "delete", "update", "remove", "modify", "fetch", "check", "list", "get",
];

/// Verb-prefixed words that are nouns.
const VERB_PREFIXED_NOUNS: &[&str] = &[
    "checkin", "checklist", "checklists", "checkout", "checkouts", "checkpoint", "checkpoints",
    "checksum", "checksums", "checkup", "checkups", "download", "downloads", "getaway", "listener",
    "listeners", "listing", "listings", "login", "logins", "logout", "setup", "setups", "signin",
    "signup", "signups", "updater", "updaters", "upload", "uploads",
];

/// Whether `word` should be treated as a verb in a resource path.
pub fn is_verb_segment(word: &str) -> bool {
    let w = word.to_ascii_lowercase();
    if VERB_PREFIXED_NOUNS.contains(&w.as_str()) || NOUN_VERB_DUAL.contains(&w.as_str()) {
        return false;
    }
    VERBS.contains(&w.as_str())
}

/// Detect a verb glued to the front of an otherwise lowercase word (`getusers`).
pub fn starts_with_verb(word: &str) -> Option<&'static str> {
    let w = word.to_ascii_lowercase();
    if VERB_PREFIXED_NOUNS.contains(&w.as_str()) {
        return None;
    }
    PREFIX_VERBS
        .iter()
        .copied()
        .find(|v| w.len() >= v.len() + 3 && w.starts_with(v))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CasingStyle {
    SnakeCase,
    KebabCase,
    CamelCase,
    PascalCase,
    Lowercase,
}

impl CasingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasingStyle::SnakeCase => "snake_case",
            CasingStyle::KebabCase => "kebab-case",
            CasingStyle::CamelCase => "camelCase",
            CasingStyle::PascalCase => "PascalCase",
            CasingStyle::Lowercase => "lowercase",
        }
    }
}

impl fmt::Display for CasingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn detect_casing_style(segment: &str) -> CasingStyle {
    if segment.contains('_') {
        CasingStyle::SnakeCase
    } else if segment.contains('-') {
        CasingStyle::KebabCase
    } else if segment.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        CasingStyle::PascalCase
    } else if segment.chars().any(|c| c.is_ascii_uppercase()) {
        CasingStyle::CamelCase
    } else {
        CasingStyle::Lowercase
    }
}

/// Split an identifier into lowercase words on `_`, `-`, `.` and case boundaries.
///
/// Acronym runs stay together: `HTTPServer` splits into `http`, `server`.
pub fn split_words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let chars: Vec<char> = ident.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c == ' ' {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !cur.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower) {
                words.push(std::mem::take(&mut cur));
            }
        }
        cur.push(c.to_ascii_lowercase());
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}

pub fn to_kebab_case(ident: &str) -> String {
    split_words(ident).join("-")
}

pub fn to_snake_case(ident: &str) -> String {
    split_words(ident).join("_")
}

pub fn to_pascal_case(ident: &str) -> String {
    split_words(ident).iter().map(|w| capitalize(w)).collect()
}

pub fn to_camel_case(ident: &str) -> String {
    let words = split_words(ident);
    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(w);
        } else {
            out.push_str(&capitalize(w));
        }
    }
    out
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
