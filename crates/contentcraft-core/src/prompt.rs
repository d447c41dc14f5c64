use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::input::GenerationInput;

/// What to do with a `${name}` placeholder that has no value in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unmatched {
    /// Render as the empty string
    #[default]
    Erase,
    /// Leave the placeholder text as-is
    Keep,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"))
}

/// Substitute every `${name}` in `pattern` from `input`.
///
/// Runs as a single pass, so a value that itself contains `${...}` is
/// inserted literally and never expanded.
pub fn render(pattern: &str, input: &GenerationInput, unmatched: Unmatched) -> String {
    placeholder_regex()
        .replace_all(pattern, |caps: &Captures| match input.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => match unmatched {
                Unmatched::Erase => String::new(),
                Unmatched::Keep => caps[0].to_string(),
            },
        })
        .into_owned()
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholders(pattern: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(pattern) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
