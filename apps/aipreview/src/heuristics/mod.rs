//! Naming and structure heuristics over words and resource paths.
//!
//! Pure functions with no dependency on the rule catalog.

pub mod inflect;
pub mod paths;
pub mod words;

pub use inflect::{classify_plurality, is_uncountable, pluralize, singularize, Plurality};
pub use paths::{
    infer_singleton_resources, infer_singletons, is_custom_method, is_path_param,
    is_version_segment, normalize_path, split_segments, PathIndex,
};
pub use words::{detect_casing_style, is_verb_segment, starts_with_verb, CasingStyle};
