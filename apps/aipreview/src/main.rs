//! aipreview CLI binary entry point.
//! Resolves configuration, delegates to the review and fix engines, and prints results.

use aipreview::cli::{Cli, Commands};
use aipreview::config::{self, Effective, Overrides};
use aipreview::fix::{FixOptions, Fixer};
use aipreview::loader;
use aipreview::output::{self, FixReport};
use aipreview::review::Reviewer;
use aipreview::rules::Catalog;
use aipreview::utils::{error_prefix, info_prefix, note_prefix, rel_to_wd};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("AIPREVIEW_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", error_prefix(), msg);
    std::process::exit(2);
}

fn resolve(overrides: &Overrides) -> Effective {
    let eff = config::resolve_effective(overrides).unwrap_or_else(|e| fail(e));
    if eff.output != "json" && eff.config_path.is_none() {
        eprintln!("{} No aipreview.toml found; using defaults.", note_prefix());
    }
    eff
}

fn base_dir(root: Option<&str>) -> PathBuf {
    PathBuf::from(root.unwrap_or("."))
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Rules { output } => {
            let output = output.unwrap_or_else(|| "human".to_string());
            output::print_rules(&Catalog::builtin(), &output);
        }
        Commands::Review {
            specs,
            root,
            strict,
            categories,
            skip_rules,
            output,
        } => {
            let eff = resolve(&Overrides {
                root: root.as_deref(),
                output: output.as_deref(),
                strict: strict.then_some(true),
                categories: &categories,
                skip_rules: &skip_rules,
                ..Default::default()
            });
            let targets = loader::expand_targets(&base_dir(root.as_deref()), &specs).unwrap_or_else(|e| fail(e));
            if eff.output != "json" && targets.len() > 1 {
                eprintln!("{} Reviewing {} spec files", info_prefix(), targets.len());
            }
            let reviews = loader::review_files(&Catalog::builtin(), &eff.review, &targets);
            output::print_review(&reviews, &eff.output);
            let totals = output::review_totals(&reviews);
            if totals.failed > 0 {
                std::process::exit(2);
            }
            if totals.errors > 0 {
                std::process::exit(1);
            }
        }
        Commands::Fix {
            spec,
            root,
            rules,
            dry_run,
            write,
            out,
            strict,
            output,
        } => {
            let eff = resolve(&Overrides {
                root: root.as_deref(),
                output: output.as_deref(),
                strict: strict.then_some(true),
                dry_run: dry_run.then_some(true),
                fix_rules: &rules,
                ..Default::default()
            });
            let path = base_dir(root.as_deref()).join(&spec);
            if eff.dry_run && (write || out.is_some()) && eff.output != "json" {
                eprintln!("{} Dry run: nothing will be written", info_prefix());
            }
            let doc = loader::read_spec(&path).unwrap_or_else(|e| fail(e));
            let label = rel_to_wd(&path);
            let review = Reviewer::new(&Catalog::builtin(), eff.review.clone()).review(&doc, Some(&label));
            let selected = review
                .fixable()
                .filter(|f| eff.fix_rules.is_empty() || eff.fix_rules.iter().any(|id| *id == f.rule_id));

            let mut fixer = Fixer::new(&doc, FixOptions { dry_run: eff.dry_run });
            fixer.apply_review_fixes(selected);

            let destination: Option<PathBuf> = match (&out, write, eff.dry_run) {
                (_, _, true) => None,
                (Some(o), _, _) => Some(Path::new(o).to_path_buf()),
                (None, true, _) => Some(path.clone()),
                (None, false, _) => None,
            };
            if let Some(dest) = &destination {
                if let Err(e) = loader::write_spec(dest, fixer.get_spec()) {
                    fail(e);
                }
            }

            let report = FixReport {
                spec_path: &label,
                dry_run: eff.dry_run,
                results: fixer.results(),
                summary: fixer.get_summary(),
                errors: fixer.get_errors(),
                written: destination.as_deref().map(rel_to_wd),
            };
            output::print_fix(&report, &eff.output);
            if fixer.has_errors() {
                std::process::exit(1);
            }
        }
    }
}
