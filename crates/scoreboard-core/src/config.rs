#![forbid(unsafe_code)]

//! Application configuration as seen by the board.
//!
//! Only the fields the board reads are modelled; unknown fields in the
//! server document are ignored.

use serde::{Deserialize, Serialize};

/// Server-provided application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub application: ApplicationConfig,
    pub challenges: ChallengesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationConfig {
    pub name: String,
}

/// Challenge related switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengesConfig {
    /// Pin unsolved tutorial challenges ahead of the requested sort.
    pub restrict_to_tutorials_first: bool,
    pub show_hints: bool,
    pub show_mitigations: bool,
    pub show_coding_challenges: bool,
}

impl Default for ChallengesConfig {
    fn default() -> Self {
        Self {
            restrict_to_tutorials_first: true,
            show_hints: true,
            show_mitigations: true,
            show_coding_challenges: true,
        }
    }
}

/// Tutorial-first flag in effect; on when no configuration has arrived.
#[must_use]
pub fn effective_restrict_tutorial_first(configuration: Option<&Configuration>) -> bool {
    configuration.is_none_or(|c| c.challenges.restrict_to_tutorials_first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configuration_restricts() {
        assert!(effective_restrict_tutorial_first(None));
    }

    #[test]
    fn configuration_flag_is_honoured() {
        let mut config = Configuration::default();
        config.challenges.restrict_to_tutorials_first = false;
        assert!(!effective_restrict_tutorial_first(Some(&config)));
    }

    #[test]
    fn partial_document_uses_defaults() {
        let config: Configuration = serde_json::from_str(
            r#"{"application":{"name":"OWASP Juice Shop","logo":"x.png"},"challenges":{"showHints":false}}"#,
        )
        .unwrap();
        assert_eq!(config.application.name, "OWASP Juice Shop");
        assert!(!config.challenges.show_hints);
        assert!(config.challenges.restrict_to_tutorials_first);
    }
}
