//! Spec file discovery, parsing and writing, plus the parallel batch review
//! used by the CLI.

use crate::error::{Error, Result};
use crate::models::ReviewResult;
use crate::review::{ReviewOptions, Reviewer};
use crate::rules::Catalog;
use glob::glob;
use rayon::prelude::*;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// `.yaml`/`.yml` are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => SpecFormat::Yaml,
            _ => SpecFormat::Json,
        }
    }
}

/// Expand each pattern relative to `root`. Plain paths are taken as-is when
/// they exist. Results are sorted and de-duplicated.
pub fn expand_targets(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::new();
    for pat in patterns {
        let direct = root.join(pat);
        if direct.is_file() {
            targets.push(direct);
            continue;
        }
        let pattern = direct.to_string_lossy().to_string();
        let entries = glob(&pattern).map_err(|source| Error::Pattern {
            pattern: pat.clone(),
            source,
        })?;
        let before = targets.len();
        targets.extend(entries.flatten().filter(|p| p.is_file()));
        if targets.len() == before {
            return Err(Error::NoMatch(pat.clone()));
        }
    }
    targets.sort();
    targets.dedup();
    Ok(targets)
}

pub fn parse_spec(text: &str, format: SpecFormat, path: &Path) -> Result<Json> {
    match format {
        SpecFormat::Json => serde_json::from_str(text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        }),
        SpecFormat::Yaml => serde_yaml::from_str(text).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn read_spec(path: &Path) -> Result<Json> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spec(&text, SpecFormat::from_path(path), path)
}

pub fn render_spec(spec: &Json, format: SpecFormat) -> Result<String> {
    match format {
        SpecFormat::Json => serde_json::to_string_pretty(spec)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| Error::Serialize(e.to_string())),
        SpecFormat::Yaml => serde_yaml::to_string(spec).map_err(|e| Error::Serialize(e.to_string())),
    }
}

/// Write `spec` to `path`, choosing JSON or YAML by extension.
pub fn write_spec(path: &Path, spec: &Json) -> Result<()> {
    let text = render_spec(spec, SpecFormat::from_path(path))?;
    fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// One file's review, or the reason it could not be reviewed.
#[derive(Debug)]
pub struct FileReview {
    pub path: PathBuf,
    pub outcome: Result<ReviewResult>,
}

/// Review every target in parallel, one reviewer per file. Output is ordered
/// by path regardless of scheduling.
pub fn review_files(catalog: &Catalog, options: &ReviewOptions, targets: &[PathBuf]) -> Vec<FileReview> {
    let mut reviews: Vec<FileReview> = targets
        .par_iter()
        .map(|path| {
            let outcome = read_spec(path).map(|spec| {
                let reviewer = Reviewer::new(catalog, options.clone());
                reviewer.review(&spec, Some(&path.to_string_lossy()))
            });
            FileReview {
                path: path.clone(),
                outcome,
            }
        })
        .collect();
    reviews.sort_by(|a, b| a.path.cmp(&b.path));
    reviews
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_expand_targets_globs_and_sorts() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("specs")).unwrap();
        fs::write(root.join("specs/b.json"), "{}").unwrap();
        fs::write(root.join("specs/a.yaml"), "{}").unwrap();
        let targets = expand_targets(root, &["specs/*".into(), "specs/b.json".into()]).unwrap();
        let names: Vec<String> = targets
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.yaml", "b.json"]);
    }

    #[test]
    fn test_expand_targets_reports_no_match() {
        let dir = tempdir().unwrap();
        let err = expand_targets(dir.path(), &["missing/*.json".into()]).unwrap_err();
        assert!(matches!(err, Error::NoMatch(p) if p == "missing/*.json"));
    }

    #[test]
    fn test_read_yaml_and_json_preserve_order() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("api.yml");
        fs::write(&yaml, "paths:\n  /zebras: {}\n  /apples: {}\n").unwrap();
        let spec = read_spec(&yaml).unwrap();
        let keys: Vec<&String> = spec["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["/zebras", "/apples"]);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{nope").unwrap();
        assert!(matches!(read_spec(&bad), Err(Error::Json { .. })));
    }

    #[test]
    fn test_write_spec_by_extension() {
        let dir = tempdir().unwrap();
        let spec = json!({"openapi": "3.0.0", "paths": {}});
        let out_json = dir.path().join("out.json");
        write_spec(&out_json, &spec).unwrap();
        assert_eq!(read_spec(&out_json).unwrap(), spec);
        let out_yaml = dir.path().join("out.yaml");
        write_spec(&out_yaml, &spec).unwrap();
        assert!(fs::read_to_string(&out_yaml).unwrap().contains("openapi:"));
    }

    #[test]
    fn test_review_files_keeps_failures_per_file() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("a.json");
        let bad = dir.path().join("b.json");
        fs::write(&good, r#"{"paths": {"/user": {"get": {}}}}"#).unwrap();
        fs::write(&bad, "not json").unwrap();
        let reviews = review_files(&Catalog::builtin(), &ReviewOptions::default(), &[bad.clone(), good.clone()]);
        assert_eq!(reviews[0].path, good);
        assert!(reviews[0].outcome.is_ok());
        assert!(reviews[1].outcome.is_err());
    }
}
