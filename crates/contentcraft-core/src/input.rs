use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Template;
use crate::error::GenerationError;

/// Field values for one generation attempt, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationInput(BTreeMap<String, String>);

impl GenerationInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh form for `template`: select fields start on their first option.
    pub fn with_defaults(template: &Template) -> Self {
        let mut input = Self::new();
        for field in template.fields {
            if let Some(option) = field.default_option() {
                input.set(field.name, option);
            }
        }
        input
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn value_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every required field of `template` has a non-blank value.
    pub fn validate(&self, template: &Template) -> Result<(), GenerationError> {
        let missing: Vec<&str> = template
            .fields
            .iter()
            .filter(|f| f.required && self.value_or_empty(f.name).trim().is_empty())
            .map(|f| f.label)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GenerationError::InvalidInput(format!(
                "Please fill in: {}",
                missing.join(", ")
            )))
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GenerationInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Parse a `key=value` pair as given on the command line.
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("empty field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_defaults_seed_select_fields_only() {
        let template = Catalog::builtin().find("blog-post").unwrap();
        let input = GenerationInput::with_defaults(template);
        assert_eq!(input.get("tone"), Some("Professional"));
        assert_eq!(input.get("topic"), None);
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_validate_reports_missing_required_labels() {
        let template = Catalog::builtin().find("blog-post").unwrap();
        let mut input = GenerationInput::with_defaults(template);
        input.set("topic", "  ");

        let err = input.validate(template).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.to_string().contains("Blog Topic"));
        assert!(err.to_string().contains("Target Audience"));

        input.set("topic", "Rust");
        input.set("audience", "Developers");
        assert!(input.validate(template).is_ok());
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let template = Catalog::builtin().find("product-desc").unwrap();
        let input: GenerationInput = [("productName", "ErgoChair"), ("features", "Lumbar support")]
            .into_iter()
            .collect();
        assert!(input.validate(template).is_ok());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("topic=Rust = fun").unwrap(),
            ("topic".to_string(), "Rust = fun".to_string())
        );
        assert_eq!(parse_assignment("empty=").unwrap().1, "");
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
