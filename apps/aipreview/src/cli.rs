//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aipreview",
    version,
    about = "Review OpenAPI documents against API Improvement Proposals",
    long_about = "aipreview — review OpenAPI/Swagger documents against AIP conventions and apply the structured fixes it suggests.\n\nConfiguration precedence: CLI > aipreview.toml > defaults.\nSet AIPREVIEW_LOG (e.g. debug) to see diagnostic logs on stderr.",
    after_help = "Examples:\n  aipreview review specs/api.yaml\n  aipreview review 'specs/**/*.json' --strict --output json\n  aipreview fix specs/api.json --dry-run\n  aipreview fix specs/api.yaml --rule naming/plural-resources --write",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for reviewing and fixing documents.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current aipreview version.")]
    Version,
    /// Review spec documents
    #[command(
        about = "Review spec documents",
        long_about = "Run every active rule over each matched document. Exits non-zero when any error-severity finding is reported or a document cannot be read.",
        after_help = "Examples:\n  aipreview review specs/api.yaml\n  aipreview review 'specs/*.json' --category naming --category pagination\n  aipreview review specs/api.yaml --skip-rule naming/path-casing --output json"
    )]
    Review {
        #[arg(required = true, help = "Spec files or glob patterns, relative to --root or the current dir")]
        specs: Vec<String>,
        #[arg(long, help = "Directory to resolve specs and discover config from (default: current dir)")]
        root: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Promote warnings to errors")]
        strict: bool,
        #[arg(long = "category", help = "Only run rules in this category (repeatable)")]
        categories: Vec<String>,
        #[arg(long = "skip-rule", help = "Skip a rule by id (repeatable)")]
        skip_rules: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Apply suggested fixes
    #[command(
        about = "Apply suggested fixes",
        long_about = "Review one document, then apply the fixes attached to its findings in order. Nothing is written unless --write or --out is given.",
        after_help = "Examples:\n  aipreview fix specs/api.json --dry-run\n  aipreview fix specs/api.json --write\n  aipreview fix specs/api.yaml --rule standard-methods/get-no-body --out fixed.yaml"
    )]
    Fix {
        #[arg(help = "Spec file, relative to --root or the current dir")]
        spec: String,
        #[arg(long, help = "Directory to resolve specs and discover config from (default: current dir)")]
        root: Option<String>,
        #[arg(long = "rule", help = "Only apply fixes from this rule (repeatable)")]
        rules: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Record changes without modifying the document")]
        dry_run: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write the fixed document back in place")]
        write: bool,
        #[arg(long, help = "Write the fixed document to this path instead")]
        out: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Promote warnings to errors before fixing")]
        strict: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// List built-in rules
    #[command(about = "List built-in rules", long_about = "Print every rule in the built-in catalog with its severity and AIP reference.")]
    Rules {
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_flags() {
        let cli = Cli::try_parse_from([
            "aipreview",
            "review",
            "a.json",
            "b.yaml",
            "--strict",
            "--category",
            "naming",
            "--skip-rule",
            "naming/path-casing",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Review {
                specs,
                strict,
                categories,
                skip_rules,
                ..
            } => {
                assert_eq!(specs, ["a.json", "b.yaml"]);
                assert!(strict);
                assert_eq!(categories, ["naming"]);
                assert_eq!(skip_rules, ["naming/path-casing"]);
            }
            _ => panic!("expected review"),
        }
    }

    #[test]
    fn test_parse_fix_flags() {
        let cli = Cli::try_parse_from(["aipreview", "fix", "api.json", "--rule", "a/b", "--rule", "c/d", "--dry-run"]).unwrap();
        match cli.cmd {
            Commands::Fix { spec, rules, dry_run, write, .. } => {
                assert_eq!(spec, "api.json");
                assert_eq!(rules, ["a/b", "c/d"]);
                assert!(dry_run);
                assert!(!write);
            }
            _ => panic!("expected fix"),
        }
    }

    #[test]
    fn test_review_requires_a_target() {
        assert!(Cli::try_parse_from(["aipreview", "review"]).is_err());
    }
}
