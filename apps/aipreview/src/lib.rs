//! aipreview core library.
//!
//! Reviews OpenAPI 3.x and Swagger 2.0 documents against API Improvement
//! Proposal conventions and applies the structured fixes attached to findings.
//!
//! High-level modules:
//! - `review`: the single-pass review engine (`Reviewer`).
//! - `rules`: rule model, built-in catalog and per-category rule sets.
//! - `heuristics`: inflection, word lists and path analysis used by rules.
//! - `fix`: the fix engine (`Fixer`) and its change operations.
//! - `jsonpath`: the restricted path language fixes address nodes with.
//! - `models`: findings, summaries, fixes and change logs.
//! - `config`: discovery and effective configuration resolution.
//! - `loader`: spec discovery, parsing and parallel batch review.
//! - `output`: human/JSON printers for review, fix and rules.
//! - `cli`, `utils`: argument parsing and terminal helpers for the binary.
//!
//! ```
//! use aipreview::{Catalog, Fixer, FixOptions, ReviewOptions, Reviewer};
//! use serde_json::json;
//!
//! let spec = json!({"paths": {"/user": {"get": {"responses": {}}}}});
//! let review = Reviewer::new(&Catalog::builtin(), ReviewOptions::default()).review(&spec, None);
//! assert!(review.findings.iter().any(|f| f.rule_id == "naming/plural-resources"));
//!
//! let mut fixer = Fixer::new(&spec, FixOptions::default());
//! fixer.apply_review_fixes(review.fixable());
//! let paths = fixer.get_spec()["paths"].as_object().unwrap();
//! assert!(paths.contains_key("/users"));
//! assert!(!paths.contains_key("/user"));
//! ```
pub mod cli;
pub mod config;
pub mod error;
pub mod fix;
pub mod heuristics;
pub mod jsonpath;
pub mod loader;
pub mod models;
pub mod output;
pub mod review;
pub mod rules;
pub mod utils;

pub use error::{Error, Result};
pub use fix::{application_order, FixError, FixOptions, Fixer};
pub use review::{ReviewOptions, Reviewer};
pub use rules::{Catalog, Rule};
