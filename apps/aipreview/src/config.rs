//! Configuration discovery and effective settings resolution.
//!
//! aipreview reads `aipreview.toml|yaml|yml` from the working directory or the
//! closest ancestor (stopping at a `.git` directory) and merges it with CLI
//! flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `review.strict`: false
//! - `review.categories`: all
//! - `review.skip_rules`: none
//! - `fix.dry_run`: false
//! - `fix.rules`: every fixable finding
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use crate::models::Category;
use crate::review::ReviewOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: [&str; 3] = ["aipreview.toml", "aipreview.yaml", "aipreview.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// `[review]` section.
pub struct ReviewCfg {
    pub strict: Option<bool>,
    pub categories: Option<Vec<String>>,
    pub skip_rules: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[fix]` section.
pub struct FixCfg {
    pub dry_run: Option<bool>,
    /// Rule ids whose fixes are applied; empty or absent means all.
    pub rules: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `aipreview.toml|yaml`.
pub struct FileConfig {
    pub output: Option<String>,
    pub review: Option<ReviewCfg>,
    pub fix: Option<FixCfg>,
}

/// Values given on the command line. `None`/empty means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides<'a> {
    pub root: Option<&'a str>,
    pub output: Option<&'a str>,
    pub strict: Option<bool>,
    pub categories: &'a [String],
    pub skip_rules: &'a [String],
    pub dry_run: Option<bool>,
    pub fix_rules: &'a [String],
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    /// Which config file was loaded, if any.
    pub config_path: Option<PathBuf>,
    pub output: String,
    pub review: ReviewOptions,
    pub dry_run: bool,
    pub fix_rules: Vec<String>,
}

/// Walk upward from `start` to the directory holding an aipreview config or
/// a `.git` directory; `start` itself when neither is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load the config file at `root`, preferring TOML over YAML.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, FileConfig)>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let cfg: FileConfig = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&s).map_err(|source| Error::Yaml {
                path: path.clone(),
                source,
            })?
        };
        return Ok(Some((path, cfg)));
    }
    Ok(None)
}

fn parse_categories(labels: &[String]) -> Result<Vec<Category>> {
    labels
        .iter()
        .map(|l| l.parse::<Category>().map_err(Error::Config))
        .collect()
}

fn pick<'a>(cli: &'a [String], cfg: Option<&'a Vec<String>>) -> &'a [String] {
    if !cli.is_empty() {
        return cli;
    }
    cfg.map(Vec::as_slice).unwrap_or(&[])
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective> {
    let start = PathBuf::from(cli.root.unwrap_or("."));
    let start = fs::canonicalize(&start).unwrap_or(start);
    let repo_root = detect_repo_root(&start);
    let (config_path, cfg) = match load_config(&repo_root)? {
        Some((p, c)) => (Some(p), c),
        None => (None, FileConfig::default()),
    };
    let review_cfg = cfg.review.unwrap_or_default();
    let fix_cfg = cfg.fix.unwrap_or_default();

    let output = cli
        .output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(Error::Config(format!("unknown output '{}' (expected human or json)", output)));
    }

    let strict = cli.strict.or(review_cfg.strict).unwrap_or(false);
    let categories = parse_categories(pick(cli.categories, review_cfg.categories.as_ref()))?;
    let skip_rules = pick(cli.skip_rules, review_cfg.skip_rules.as_ref()).to_vec();
    let dry_run = cli.dry_run.or(fix_cfg.dry_run).unwrap_or(false);
    let fix_rules = pick(cli.fix_rules, fix_cfg.rules.as_ref()).to_vec();

    Ok(Effective {
        repo_root,
        config_path,
        output,
        review: ReviewOptions {
            strict,
            categories,
            skip_rules,
        },
        dry_run,
        fix_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn resolve_at(root: &Path) -> Result<Effective> {
        let root = root.to_string_lossy().to_string();
        resolve_effective(&Overrides {
            root: Some(&root),
            ..Default::default()
        })
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("aipreview.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
[review]
strict = true
categories = ["naming", "standard-methods"]
skip_rules = ["naming/path-casing"]
[fix]
dry_run = true
rules = ["naming/plural-resources"]
    "#
        )
        .unwrap();

        let eff = resolve_at(root).unwrap();
        assert_eq!(eff.output, "json");
        assert!(eff.review.strict);
        assert_eq!(eff.review.categories, vec![Category::Naming, Category::StandardMethods]);
        assert_eq!(eff.review.skip_rules, vec!["naming/path-casing".to_string()]);
        assert!(eff.dry_run);
        assert_eq!(eff.fix_rules, vec!["naming/plural-resources".to_string()]);
        assert_eq!(eff.config_path, Some(root.join("aipreview.toml")));
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("aipreview.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
review:
  strict: false
            "#
        )
        .unwrap();

        let eff = resolve_at(root).unwrap();
        assert_eq!(eff.output, "human");
        assert!(!eff.review.strict);
        assert!(eff.review.categories.is_empty());
        assert!(!eff.dry_run);
        assert!(eff.fix_rules.is_empty());
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("aipreview.toml"),
            "output = \"json\"\n[review]\nstrict = true\ncategories = [\"errors\"]\n",
        )
        .unwrap();
        let root_str = root.to_string_lossy().to_string();
        let cats = vec!["pagination".to_string()];
        let eff = resolve_effective(&Overrides {
            root: Some(&root_str),
            output: Some("human"),
            strict: Some(false),
            categories: &cats,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(eff.output, "human");
        assert!(!eff.review.strict);
        assert_eq!(eff.review.categories, vec![Category::Pagination]);
    }

    #[test]
    fn test_discovery_walks_up_from_nested_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("aipreview.yml"), "output: json\n").unwrap();
        let nested = root.join("specs").join("v1");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_repo_root(&nested), root.to_path_buf());
        assert_eq!(resolve_at(&nested).unwrap().output, "json");
    }

    #[test]
    fn test_discovery_stops_at_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("aipreview.toml"), "output = \"json\"\n").unwrap();
        let repo = root.join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let eff = resolve_at(&repo).unwrap();
        assert_eq!(eff.repo_root, repo);
        assert!(eff.config_path.is_none());
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_unknown_category_and_output_rejected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("aipreview.toml"), "[review]\ncategories = [\"nope\"]\n").unwrap();
        let err = resolve_at(root).unwrap_err();
        assert!(err.to_string().contains("unknown category 'nope'"));

        fs::write(root.join("aipreview.toml"), "output = \"xml\"\n").unwrap();
        assert!(matches!(resolve_at(root), Err(Error::Config(_))));
    }
}
