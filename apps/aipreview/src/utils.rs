//! Terminal helpers shared by the printers and the binary.

use owo_colors::OwoColorize;
use std::path::Path;

fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Colors are used for human output unless `NO_COLOR` is set.
pub fn use_colors(output: &str) -> bool {
    output != "json" && color_enabled()
}

pub fn error_prefix() -> String {
    if color_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if color_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if color_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Render `path` relative to the working directory when it lies beneath it.
pub fn rel_to_wd(path: &Path) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return path.display().to_string();
    };
    match pathdiff::diff_paths(path, &cwd) {
        Some(rel) if !rel.starts_with("..") && !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_to_wd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(rel_to_wd(&cwd.join("specs").join("api.json")), Path::new("specs").join("api.json").display().to_string());
        let outside = Path::new("/definitely/elsewhere/api.json");
        assert_eq!(rel_to_wd(outside), "/definitely/elsewhere/api.json");
    }

    #[test]
    fn test_json_output_never_colored() {
        assert!(!use_colors("json"));
    }
}
