//! Compiler configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the compiler does with filters and sorts on unknown fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldPolicy {
    /// Drop the offending entry and compile the rest.
    #[default]
    Permissive,
    /// Validate first and reject the whole request.
    Strict,
}

/// Settings for a [`QueryCompiler`](crate::QueryCompiler).
///
/// # Example
///
/// ```rust
/// use quarry::{CompilerConfig, FieldPolicy};
///
/// let config = CompilerConfig::from_yaml(r#"
/// fieldPolicy: strict
/// maxPageSize: 100
/// "#).unwrap();
///
/// assert_eq!(config.field_policy, FieldPolicy::Strict);
/// assert_eq!(config.max_page_size, Some(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    pub field_policy: FieldPolicy,
    /// Largest page size validation accepts. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_page_size: Option<u32>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Creates a configuration from JSON content.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Json`](crate::QuarryError::Json) if parsing fails.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Creates a configuration from YAML content.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Yaml`](crate::QuarryError::Yaml) if parsing fails.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }

    /// Shorthand for `field_policy(FieldPolicy::Strict)`.
    pub fn strict(self) -> Self {
        self.field_policy(FieldPolicy::Strict)
    }

    pub fn max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = Some(max);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.field_policy == FieldPolicy::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuarryError;

    #[test]
    fn defaults_are_permissive_and_unbounded() {
        let config = CompilerConfig::default();
        assert_eq!(config.field_policy, FieldPolicy::Permissive);
        assert_eq!(config.max_page_size, None);
        assert!(!config.is_strict());
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = CompilerConfig::from_json(r#"{"maxPageSize": 50}"#).unwrap();
        assert_eq!(config, CompilerConfig::new().max_page_size(50));
    }

    #[test]
    fn from_yaml_strict() {
        let config = CompilerConfig::from_yaml("fieldPolicy: strict\n").unwrap();
        assert!(config.is_strict());
    }

    #[test]
    fn invalid_policy_is_an_error() {
        let err = CompilerConfig::from_json(r#"{"fieldPolicy": "lenient"}"#).unwrap_err();
        assert!(matches!(err, QuarryError::Json(_)));

        let err = CompilerConfig::from_yaml("fieldPolicy: [1, 2]").unwrap_err();
        assert!(matches!(err, QuarryError::Yaml(_)));
    }

    #[test]
    fn builder_round_trips_through_json() {
        let config = CompilerConfig::new().strict().max_page_size(25);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"fieldPolicy":"strict","maxPageSize":25}"#);
        assert_eq!(CompilerConfig::from_json(&json).unwrap(), config);
    }
}
