//! Output rendering for review, fix and rules commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON forms are built by
//! pure `compose_*_json` functions so their shape can be tested directly.

use crate::loader::FileReview;
use crate::models::{Finding, FixErrorEntry, FixResult, FixSummary, Severity};
use crate::rules::Catalog;
use crate::utils::{error_prefix, rel_to_wd, use_colors};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} failed to render JSON: {}", error_prefix(), e),
    }
}

fn severity_tag(sev: Severity, color: bool) -> (String, String) {
    let (tag, icon) = match sev {
        Severity::Error => ("⟦error⟧", "✖"),
        Severity::Warning => ("⟦warn⟧", "▲"),
        Severity::Suggestion => ("⟦hint⟧", "◆"),
    };
    if !color {
        return (tag.to_string(), icon.to_string());
    }
    match sev {
        Severity::Error => (tag.red().bold().to_string(), icon.red().to_string()),
        Severity::Warning => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        Severity::Suggestion => (tag.blue().bold().to_string(), icon.blue().to_string()),
    }
}

fn print_finding(f: &Finding, color: bool) {
    let (tag, icon) = severity_tag(f.severity, color);
    let location = if color {
        f.location.clone().bold().to_string()
    } else {
        f.location.clone()
    };
    let aip = f.aip_reference.as_deref().map(|a| format!(" [{}]", a)).unwrap_or_default();
    println!("  {} {} {} ❲{}❳ — {}{}", icon, tag, location, f.rule_id, f.message, aip);
    if let Some(s) = &f.suggestion {
        let fixable = if f.fix.is_some() { " (fixable)" } else { "" };
        if color {
            println!("      ↳ {}{}", s.bright_black(), fixable.green());
        } else {
            println!("      ↳ {}{}", s, fixable);
        }
    }
}

/// Print review results for every file in the requested format.
pub fn print_review(reviews: &[FileReview], output: &str) {
    if output == "json" {
        print_json(&compose_review_json(reviews));
        return;
    }
    let color = use_colors(output);
    for r in reviews {
        let file = rel_to_wd(&r.path);
        match &r.outcome {
            Ok(result) => {
                let title = match (&result.spec_title, &result.spec_version) {
                    (Some(t), Some(v)) => format!(" ({} {})", t, v),
                    (Some(t), None) => format!(" ({})", t),
                    _ => String::new(),
                };
                if color {
                    println!("{}{}", file.bold(), title.bright_black());
                } else {
                    println!("{}{}", file, title);
                }
                if result.findings.is_empty() {
                    println!("  no findings");
                }
                for f in &result.findings {
                    print_finding(f, color);
                }
            }
            Err(e) => eprintln!("{} {}", error_prefix(), e),
        }
    }
    let totals = review_totals(reviews);
    let summary = format!(
        "— Summary — errors={} warnings={} suggestions={} fixable={} files={}",
        totals.errors, totals.warnings, totals.suggestions, totals.fixable, totals.files
    );
    if color {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReviewTotals {
    pub files: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub fixable: usize,
}

pub fn review_totals(reviews: &[FileReview]) -> ReviewTotals {
    let mut t = ReviewTotals::default();
    for r in reviews {
        match &r.outcome {
            Ok(result) => {
                t.files += 1;
                t.errors += result.summary.errors;
                t.warnings += result.summary.warnings;
                t.suggestions += result.summary.suggestions;
                t.fixable += result.fixable().count();
            }
            Err(_) => t.failed += 1,
        }
    }
    t
}

/// Compose review JSON object (pure) for testing/snapshot purposes.
pub fn compose_review_json(reviews: &[FileReview]) -> JsonVal {
    let results: Vec<JsonVal> = reviews
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|res| serde_json::to_value(res).unwrap_or(JsonVal::Null))
        .collect();
    let errors: Vec<JsonVal> = reviews
        .iter()
        .filter_map(|r| {
            r.outcome
                .as_ref()
                .err()
                .map(|e| json!({"file": r.path.to_string_lossy(), "error": e.to_string()}))
        })
        .collect();
    let t = review_totals(reviews);
    json!({
        "results": results,
        "errors": errors,
        "summary": {
            "files": t.files,
            "failed": t.failed,
            "errors": t.errors,
            "warnings": t.warnings,
            "suggestions": t.suggestions,
            "fixable": t.fixable,
        }
    })
}

/// Everything the fix command reports.
pub struct FixReport<'a> {
    pub spec_path: &'a str,
    pub dry_run: bool,
    pub results: &'a [FixResult],
    pub summary: FixSummary,
    pub errors: &'a [FixErrorEntry],
    /// Destination the fixed document was written to, if any.
    pub written: Option<String>,
}

pub fn print_fix(report: &FixReport, output: &str) {
    if output == "json" {
        print_json(&compose_fix_json(report));
        return;
    }
    let color = use_colors(output);
    let header = if report.dry_run {
        format!("{} (dry run)", report.spec_path)
    } else {
        report.spec_path.to_string()
    };
    if color {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }
    for r in report.results {
        let status = match (r.applied, color) {
            (true, true) => "✔ applied".green().bold().to_string(),
            (true, false) => "✔ applied".to_string(),
            (false, true) => "✖ failed".red().bold().to_string(),
            (false, false) => "✖ failed".to_string(),
        };
        println!("  {} ❲{}❳", status, r.rule_id);
        for c in &r.changes {
            let target = match (&c.change.from, &c.change.to) {
                (Some(from), Some(to)) => format!("{} {} → {}", c.change.path, from, to),
                _ => c.change.path.clone(),
            };
            match &c.error {
                Some(e) => println!("      {} {} — {}", c.change.operation.as_str(), target, e),
                None => println!("      {} {}", c.change.operation.as_str(), target),
            }
        }
    }
    if let Some(dest) = &report.written {
        println!("  wrote {}", dest);
    }
    let s = &report.summary;
    let summary = format!(
        "— Summary — fixes={} applied={} failed={} changes={}",
        s.total, s.applied, s.failed, s.changes
    );
    if color {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

/// Compose fix JSON object (pure) for testing/snapshot purposes.
pub fn compose_fix_json(report: &FixReport) -> JsonVal {
    json!({
        "specPath": report.spec_path,
        "dryRun": report.dry_run,
        "results": report.results,
        "summary": report.summary,
        "errors": report.errors,
        "written": report.written,
    })
}

pub fn print_rules(catalog: &Catalog, output: &str) {
    if output == "json" {
        print_json(&compose_rules_json(catalog));
        return;
    }
    let color = use_colors(output);
    for rule in catalog.rules() {
        let (tag, _) = severity_tag(rule.meta.severity, color);
        let aip = rule.meta.aip_reference.as_deref().unwrap_or("-");
        let id = if color {
            rule.id().bold().to_string()
        } else {
            rule.id().to_string()
        };
        println!("{} {} {} — {}", tag, id, aip, rule.meta.name);
    }
}

/// Compose rules JSON object (pure) for testing/snapshot purposes.
pub fn compose_rules_json(catalog: &Catalog) -> JsonVal {
    let rules: Vec<JsonVal> = catalog
        .rules()
        .iter()
        .map(|r| {
            json!({
                "id": r.id(),
                "name": r.meta.name,
                "category": r.meta.category,
                "severity": r.meta.severity,
                "aipReference": r.meta.aip_reference,
                "kind": format!("{:?}", r.kind()).to_ascii_lowercase(),
            })
        })
        .collect();
    json!({"rules": rules, "total": rules.len()})
}
