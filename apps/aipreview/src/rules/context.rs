//! Element contexts handed to rule check functions.
//!
//! Each context borrows from the document tree for the duration of one
//! traversal and carries the spec-wide path index.

use crate::heuristics::inflect::{classify_plurality, is_uncountable, Plurality};
use crate::heuristics::paths::{self, PathIndex};
use crate::heuristics::words;
use crate::jsonpath::JsonPath;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl Method {
    /// Traversal order for operations on one path item.
    pub const ORDER: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
        Method::Head,
    ];

    /// Key of the operation inside a path item.
    pub fn key(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(ParamLocation::Query),
            "path" => Some(ParamLocation::Path),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }
}

/// Spec-wide facts computed once per review.
pub struct SpecContext<'a> {
    pub spec: &'a Json,
    pub index: &'a PathIndex,
    pub singletons: &'a HashSet<String>,
}

impl<'a> SpecContext<'a> {
    pub fn paths(&self) -> Option<&'a Map<String, Json>> {
        self.spec.get("paths").and_then(Json::as_object)
    }

    pub fn schemas(&self) -> Option<&'a Map<String, Json>> {
        self.spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Json::as_object)
    }

    pub fn is_singleton(&self, path_prefix: &str) -> bool {
        self.singletons.contains(&paths::normalize_path(path_prefix))
    }

    /// A singleton backed by structure rather than by the mere absence of a
    /// `{param}` child: implicit (undeclared), nested under a parameter, or
    /// with declared sub-resources. A bare top-level leaf such as `/user`
    /// does not qualify.
    pub fn is_evident_singleton(&self, path_prefix: &str) -> bool {
        let key = paths::normalize_path(path_prefix);
        if !self.singletons.contains(&key) {
            return false;
        }
        if !self.index.is_declared(&key) || self.index.has_descendants(&key) {
            return true;
        }
        let segments = paths::split_segments(&key);
        segments.len() >= 2 && paths::is_path_param(segments[segments.len() - 2])
    }
}

pub struct PathContext<'a> {
    pub spec: &'a SpecContext<'a>,
    pub path: &'a str,
    pub item: &'a Json,
}

impl PathContext<'_> {
    pub fn segments(&self) -> Vec<&str> {
        paths::split_segments(self.path)
    }

    pub fn json_path(&self) -> JsonPath {
        JsonPath::root().key("paths").key(self.path)
    }
}

pub struct OperationContext<'a> {
    pub spec: &'a SpecContext<'a>,
    pub path: &'a str,
    pub path_item: &'a Json,
    pub method: Method,
    pub operation: &'a Json,
}

impl<'a> OperationContext<'a> {
    pub fn location(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn json_path(&self) -> JsonPath {
        JsonPath::root().key("paths").key(self.path).key(self.method.key())
    }

    pub fn parameters(&self) -> &'a [Json] {
        self.operation
            .get("parameters")
            .and_then(Json::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of inline parameters at `location`, from the operation and its path item.
    pub fn param_names(&self, location: ParamLocation) -> Vec<&'a str> {
        let path_level = self
            .path_item
            .get("parameters")
            .and_then(Json::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.parameters()
            .iter()
            .chain(path_level.iter())
            .filter(|p| p.get("in").and_then(Json::as_str).and_then(ParamLocation::parse) == Some(location))
            .filter_map(|p| p.get("name").and_then(Json::as_str))
            .collect()
    }

    pub fn has_param(&self, location: ParamLocation, names: &[&str]) -> bool {
        self.param_names(location)
            .iter()
            .any(|n| names.iter().any(|w| n.eq_ignore_ascii_case(w)))
    }

    /// Last literal segment when the path addresses a collection: declared
    /// with a `{param}` child, or named with a countable plural.
    pub fn collection_segment(&self) -> Option<&'a str> {
        let segments = paths::split_segments(self.path);
        let last = *segments.last()?;
        if paths::is_path_param(last)
            || paths::is_version_segment(last)
            || paths::is_custom_method(last, self.path, self.spec.singletons)
        {
            return None;
        }
        if self.spec.index.has_param_child(&paths::normalize_path(self.path)) {
            return Some(last);
        }
        let word = words::split_words(last).pop()?;
        let plural = !is_uncountable(&word) && classify_plurality(&word) == Plurality::Plural;
        plural.then_some(last)
    }

    pub fn has_request_body(&self) -> bool {
        match self.operation.get("requestBody") {
            None | Some(Json::Null) => false,
            Some(Json::Object(m)) => !m.is_empty(),
            Some(_) => true,
        }
    }
}

pub struct ParameterContext<'a> {
    pub operation: &'a OperationContext<'a>,
    pub index: usize,
    pub parameter: &'a Json,
    pub location: Option<ParamLocation>,
}

impl ParameterContext<'_> {
    pub fn name(&self) -> Option<&str> {
        self.parameter.get("name").and_then(Json::as_str)
    }

    pub fn location_label(&self) -> String {
        format!(
            "{} (parameter: {})",
            self.operation.location(),
            self.name().unwrap_or("<unnamed>")
        )
    }

    pub fn json_path(&self) -> JsonPath {
        self.operation.json_path().key("parameters").index(self.index)
    }
}

pub struct SchemaContext<'a> {
    pub spec: &'a SpecContext<'a>,
    pub name: &'a str,
    pub schema: &'a Json,
}

impl<'a> SchemaContext<'a> {
    pub fn location(&self) -> String {
        format!("components.schemas.{}", self.name)
    }

    pub fn json_path(&self) -> JsonPath {
        JsonPath::root().key("components").key("schemas").key(self.name)
    }

    pub fn properties(&self) -> Option<&'a Map<String, Json>> {
        self.schema.get("properties").and_then(Json::as_object)
    }
}

pub struct PropertyContext<'a> {
    pub schema: &'a SchemaContext<'a>,
    pub name: &'a str,
    pub property: &'a Json,
}

impl PropertyContext<'_> {
    pub fn location(&self) -> String {
        format!("{}.properties.{}", self.schema.location(), self.name)
    }

    pub fn properties_path(&self) -> JsonPath {
        self.schema.json_path().key("properties")
    }

    pub fn type_name(&self) -> Option<&str> {
        self.property.get("type").and_then(Json::as_str)
    }
}
