//! JSONPath subset used to address nodes in a spec document.
//!
//! Supported syntax, always relative to the root (`$` prefix optional):
//! - `.key` for plain keys (no `.`, `[` or `]`)
//! - `[key]` unquoted; all-digit content is an array index
//! - `['key']` / `["key"]` quoted keys, with `\` escaping the next character
//! - `[N]` numeric index
//!
//! Index segments applied to objects look up the decimal key (`responses[200]`),
//! and numeric plain keys applied to arrays act as indices.

use serde_json::{Map, Value as Json};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn key_string(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }

    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(k) if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) => k.parse().ok(),
            Segment::Key(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Invalid path '{path}': {reason}")]
    Syntax { path: String, reason: String },
    #[error("Path '{0}' does not address a node below the root")]
    RootTarget(String),
    #[error("Cannot traverse through non-object at '{0}'")]
    NonObject(String),
    #[error("Index {index} out of bounds at '{path}'")]
    OutOfBounds { path: String, index: usize },
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Plain,
    Bracket,
    Quoted(char),
    AfterQuoted,
}

/// Parse a path string into segments.
pub fn parse(path: &str) -> Result<Vec<Segment>, PathError> {
    let syntax = |reason: &str| PathError::Syntax {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = path.trim();
    let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut state = State::Plain;
    let mut after_dot = false;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Plain => match c {
                '.' => {
                    if buf.is_empty() && after_dot {
                        return Err(syntax("empty key between dots"));
                    }
                    if !buf.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut buf)));
                    }
                    after_dot = true;
                }
                '[' => {
                    if !buf.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut buf)));
                    } else if after_dot {
                        return Err(syntax("'.' followed by '['"));
                    }
                    after_dot = false;
                    state = State::Bracket;
                }
                ']' => return Err(syntax("unexpected ']'")),
                _ => {
                    if buf.is_empty() && !after_dot && !segments.is_empty() {
                        return Err(syntax("expected '.' or '[' between segments"));
                    }
                    buf.push(c);
                }
            },
            State::Bracket => match c {
                '\'' | '"' if buf.trim().is_empty() => {
                    buf.clear();
                    state = State::Quoted(c);
                }
                ']' => {
                    let raw = buf.trim();
                    if raw.is_empty() {
                        return Err(syntax("empty brackets"));
                    }
                    let seg = if raw.bytes().all(|b| b.is_ascii_digit()) {
                        raw.parse::<usize>()
                            .map(Segment::Index)
                            .map_err(|_| syntax("index too large"))?
                    } else {
                        Segment::Key(raw.to_string())
                    };
                    segments.push(seg);
                    buf.clear();
                    state = State::Plain;
                }
                _ => buf.push(c),
            },
            State::Quoted(quote) => match c {
                '\\' => match chars.next() {
                    Some(escaped) => buf.push(escaped),
                    None => return Err(syntax("unterminated quoted key")),
                },
                c if c == quote => state = State::AfterQuoted,
                _ => buf.push(c),
            },
            State::AfterQuoted => match c {
                ']' => {
                    segments.push(Segment::Key(std::mem::take(&mut buf)));
                    state = State::Plain;
                }
                ' ' => {}
                _ => return Err(syntax("expected ']' after quoted key")),
            },
        }
    }

    match state {
        State::Plain => {
            if !buf.is_empty() {
                segments.push(Segment::Key(buf));
            } else if after_dot {
                return Err(syntax("trailing '.'"));
            }
            Ok(segments)
        }
        State::Quoted(_) => Err(syntax("unterminated quoted key")),
        State::Bracket | State::AfterQuoted => Err(syntax("unterminated '['")),
    }
}

/// Render segments in canonical form: `.key` for identifier-like keys,
/// `['…']` otherwise, `[N]` for indices.
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::from("$");
    for seg in segments {
        match seg {
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            Segment::Key(k) if is_plain_key(k) => {
                out.push('.');
                out.push_str(k);
            }
            Segment::Key(k) => {
                out.push_str("['");
                for c in k.chars() {
                    if c == '\'' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push_str("']");
            }
        }
    }
    out
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-')
}

/// Owned path, built fluently by rules when describing fixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath(Vec<Segment>);

impl JsonPath {
    pub fn root() -> Self {
        JsonPath(Vec::new())
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.0))
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).map(JsonPath)
    }
}

impl From<JsonPath> for String {
    fn from(p: JsonPath) -> String {
        p.to_string()
    }
}

/// Walk `segments` from `root`; `None` on any missing intermediate.
pub fn resolve<'v>(root: &'v Json, segments: &[Segment]) -> Option<&'v Json> {
    let mut cur = root;
    for seg in segments {
        cur = match cur {
            Json::Object(map) => map.get(&seg.key_string())?,
            Json::Array(items) => items.get(seg.as_index()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

pub fn resolve_mut<'v>(root: &'v mut Json, segments: &[Segment]) -> Option<&'v mut Json> {
    let mut cur = root;
    for seg in segments {
        cur = match cur {
            Json::Object(map) => map.get_mut(&seg.key_string())?,
            Json::Array(items) => items.get_mut(seg.as_index()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

enum Blocked {
    NonContainer,
    OutOfBounds(usize),
}

fn child_mut<'v>(node: &'v mut Json, seg: &Segment, create: bool) -> Result<Option<&'v mut Json>, Blocked> {
    match node {
        Json::Object(map) => {
            let key = seg.key_string();
            if create && !map.contains_key(&key) {
                map.insert(key.clone(), Json::Object(Map::new()));
            }
            Ok(map.get_mut(&key))
        }
        Json::Array(items) => {
            let idx = seg.as_index().ok_or(Blocked::NonContainer)?;
            match items.get_mut(idx) {
                Some(item) => Ok(Some(item)),
                None if create => Err(Blocked::OutOfBounds(idx)),
                None => Ok(None),
            }
        }
        _ => Err(Blocked::NonContainer),
    }
}

fn walk_parent<'v, 's>(
    root: &'v mut Json,
    segments: &'s [Segment],
    create: bool,
) -> Result<Option<(&'v mut Json, &'s Segment)>, PathError> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(PathError::RootTarget(render(segments)));
    };
    let mut cur = root;
    for (depth, seg) in parents.iter().enumerate() {
        cur = match child_mut(cur, seg, create) {
            Ok(Some(next)) => next,
            Ok(None) => return Ok(None),
            Err(Blocked::NonContainer) => return Err(PathError::NonObject(render(&segments[..depth]))),
            Err(Blocked::OutOfBounds(index)) => {
                return Err(PathError::OutOfBounds {
                    path: render(&segments[..depth]),
                    index,
                })
            }
        };
    }
    if !matches!(cur, Json::Object(_) | Json::Array(_)) {
        return Err(PathError::NonObject(render(parents)));
    }
    Ok(Some((cur, last)))
}

/// Walk all but the last segment, creating empty objects (never arrays) for
/// missing intermediates. Returns the parent container and the final segment.
pub fn resolve_parent<'v, 's>(
    root: &'v mut Json,
    segments: &'s [Segment],
) -> Result<(&'v mut Json, &'s Segment), PathError> {
    match walk_parent(root, segments, true)? {
        Some(found) => Ok(found),
        None => Err(PathError::NonObject(render(segments))),
    }
}

/// Like [`resolve_parent`] but never creates anything; `Ok(None)` when an
/// intermediate is missing.
pub fn resolve_existing_parent<'v, 's>(
    root: &'v mut Json,
    segments: &'s [Segment],
) -> Result<Option<(&'v mut Json, &'s Segment)>, PathError> {
    walk_parent(root, segments, false)
}

/// Read the child of `parent` addressed by `seg`.
pub fn child<'v>(parent: &'v Json, seg: &Segment) -> Option<&'v Json> {
    resolve(parent, std::slice::from_ref(seg))
}

/// Write `value` under `seg`. Arrays accept an index up to their length (append).
pub fn write_child(parent: &mut Json, seg: &Segment, value: Json, at: &str) -> Result<(), PathError> {
    match parent {
        Json::Object(map) => {
            map.insert(seg.key_string(), value);
            Ok(())
        }
        Json::Array(items) => {
            let idx = seg.as_index().ok_or_else(|| PathError::NonObject(at.to_string()))?;
            if idx < items.len() {
                items[idx] = value;
                Ok(())
            } else if idx == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(PathError::OutOfBounds {
                    path: at.to_string(),
                    index: idx,
                })
            }
        }
        _ => Err(PathError::NonObject(at.to_string())),
    }
}

/// Remove the child under `seg`, returning it when present.
pub fn remove_child(parent: &mut Json, seg: &Segment) -> Option<Json> {
    match parent {
        Json::Object(map) => map.shift_remove(&seg.key_string()),
        Json::Array(items) => {
            let idx = seg.as_index()?;
            (idx < items.len()).then(|| items.remove(idx))
        }
        _ => None,
    }
}
