//! Validation utilities for CLI and configuration values

use once_cell::sync::Lazy;
use regex::Regex;

// Hostname or IPv4 address, optional port, optionally wrapped in an http(s) URL
static TARGET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*(?::\d{1,5})?(?:/\S*)?$",
    )
    .expect("target pattern is valid")
});

static PLUGIN_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("plugin name pattern is valid"));

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate a scan target: a host name, IP address or http(s) URL
pub fn validate_target(target: &str) -> Result<String, String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err("Target cannot be empty".to_string());
    }
    if !TARGET_PATTERN.is_match(trimmed) {
        return Err(format!(
            "'{}' is not a valid host name, IP address or URL",
            trimmed
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a plugin name (lowercase, digits, '-' and '_')
pub fn validate_plugin_name(name: &str) -> Result<String, String> {
    if PLUGIN_NAME_PATTERN.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(format!(
            "Invalid plugin name '{}': use lowercase letters, digits, '-' or '_'",
            name
        ))
    }
}

/// Flatten repeated and comma-separated values, dropping blanks and duplicates
///
/// `["a,b", "c", "a"]` becomes `["a", "b", "c"]`; first occurrence wins.
pub fn parse_name_list(values: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for value in values {
        for part in value.split(',') {
            let name = part.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Reject plugin names that are both requested and excluded
pub fn validate_selection(run_only: &[String], exclude: &[String]) -> Result<(), String> {
    for name in run_only {
        if exclude.contains(name) {
            return Err(format!(
                "Plugin '{}' is both selected with --run-only and excluded. \
                 Remove it from one of the lists.",
                name
            ));
        }
    }
    Ok(())
}
