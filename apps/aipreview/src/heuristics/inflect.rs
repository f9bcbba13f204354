//! Singular/plural classification for resource-name words.
//!
//! A domain override list is consulted before the general classifier: words
//! such as `data`, `config` or `settings` are mass nouns in API vocabulary and
//! are never flagged. The general classifier combines irregular tables with
//! ordered suffix rules (first match wins).

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plurality {
    Singular,
    Plural,
}

const UNCOUNTABLE: &[&str] = &[
    "analytics",
    "auth",
    "config",
    "configuration",
    "data",
    "equipment",
    "feedback",
    "firmware",
    "fish",
    "hardware",
    "health",
    "history",
    "info",
    "information",
    "inventory",
    "media",
    "metadata",
    "news",
    "series",
    "settings",
    "sheep",
    "software",
    "species",
    "telemetry",
    "traffic",
];

/// singular, plural
const IRREGULAR: &[(&str, &str)] = &[
    ("analysis", "analyses"),
    ("child", "children"),
    ("criterion", "criteria"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("half", "halves"),
    ("index", "indices"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("man", "men"),
    ("matrix", "matrices"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("shelf", "shelves"),
    ("tooth", "teeth"),
    ("vertex", "vertices"),
    ("wife", "wives"),
    ("wolf", "wolves"),
    ("woman", "women"),
];

/// Words ending in `s` that are nevertheless singular.
const SINGULAR_S: &[&str] = &[
    "alias", "atlas", "bonus", "bus", "campus", "canvas", "census", "corpus", "focus", "gas",
    "lens", "radius", "status", "virus",
];

static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(ss|us|is)$", "$1"),
        (r"(?i)([^aeiou])ies$", "${1}y"),
        (r"(?i)(x|ch|sh|zz)es$", "$1"),
        (r"(?i)(alias|status|bus|campus|virus|ss)es$", "$1"),
        (r"(?i)sses$", "ss"),
        (r"(?i)(o)es$", "$1"),
        (r"(?i)s$", ""),
    ]
    .into_iter()
    .map(|(re, rep)| (Regex::new(re).unwrap(), rep))
    .collect()
});

static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(alias|status|bus|campus|virus)$", "${1}es"),
        (r"(?i)([^aeiou])y$", "${1}ies"),
        (r"(?i)(x|ch|sh|ss|zz|s)$", "${1}es"),
        (r"$", "s"),
    ]
    .into_iter()
    .map(|(re, rep)| (Regex::new(re).unwrap(), rep))
    .collect()
});

pub fn is_uncountable(word: &str) -> bool {
    let w = word.to_ascii_lowercase();
    UNCOUNTABLE.contains(&w.as_str())
}

/// Classify `word` as singular or plural.
///
/// Uncountable words classify as plural: they never need pluralizing.
/// Words with a noun/verb duality (`order`, `download`) are read as nouns,
/// which is what the suffix rules already assume.
pub fn classify_plurality(word: &str) -> Plurality {
    let w = word.to_ascii_lowercase();
    if w.is_empty() || UNCOUNTABLE.contains(&w.as_str()) {
        return Plurality::Plural;
    }
    if IRREGULAR.iter().any(|(_, p)| *p == w) {
        return Plurality::Plural;
    }
    if IRREGULAR.iter().any(|(s, _)| *s == w) || SINGULAR_S.contains(&w.as_str()) {
        return Plurality::Singular;
    }
    if singularize(&w) != w {
        Plurality::Plural
    } else {
        Plurality::Singular
    }
}

/// Best-effort singular form. Unknown or already-singular words are returned unchanged.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) || SINGULAR_S.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((s, _)) = IRREGULAR.iter().find(|(_, p)| *p == lower) {
        return match_case(word, s);
    }
    if IRREGULAR.iter().any(|(s, _)| *s == lower) {
        return word.to_string();
    }
    apply_first(&SINGULAR_RULES, word)
}

/// Best-effort plural form.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, p)) = IRREGULAR.iter().find(|(s, _)| *s == lower) {
        return match_case(word, p);
    }
    if classify_plurality(word) == Plurality::Plural {
        return word.to_string();
    }
    apply_first(&PLURAL_RULES, word)
}

fn apply_first(rules: &[(Regex, &'static str)], word: &str) -> String {
    for (re, rep) in rules {
        if re.is_match(word) {
            return re.replace(word, *rep).into_owned();
        }
    }
    word.to_string()
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        for w in ["users", "orders", "categories", "boxes", "matches", "addresses", "schemas", "metrics"] {
            assert_eq!(classify_plurality(w), Plurality::Plural, "{w}");
        }
        for w in ["user", "order", "category", "box", "address", "status", "alias", "analysis"] {
            assert_eq!(classify_plurality(w), Plurality::Singular, "{w}");
        }
    }

    #[test]
    fn test_uncountables_classify_plural() {
        for w in ["data", "config", "auth", "settings", "software", "Metadata"] {
            assert!(is_uncountable(w));
            assert_eq!(classify_plurality(w), Plurality::Plural, "{w}");
        }
    }

    #[test]
    fn test_irregulars() {
        assert_eq!(classify_plurality("people"), Plurality::Plural);
        assert_eq!(classify_plurality("person"), Plurality::Singular);
        assert_eq!(pluralize("person"), "people");
        assert_eq!(singularize("children"), "child");
        assert_eq!(pluralize("Child"), "Children");
    }

    #[test]
    fn test_pluralize_rules() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("users"), "users");
        assert_eq!(pluralize("data"), "data");
    }

    #[test]
    fn test_singularize_rules() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("heroes"), "hero");
    }
}
