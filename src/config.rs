use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the completion assistant, read from the client's
/// `initializationOptions` / `didChangeConfiguration` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    pub enabled: bool,
    pub allow_in_string_literals: bool,
    /// Whether trigger characters start background queries at all.
    pub auto_trigger: bool,
    pub auto_trigger_chars: Vec<char>,
    pub debounce_ms: u64,
    pub max_suggestions: usize,
    /// Upper bound on the enclosing-construct text sent along with a request.
    pub max_focus_chars: usize,
    pub backend: Option<CommandBackendConfig>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_in_string_literals: true,
            auto_trigger: true,
            auto_trigger_chars: vec!['\n', '@', '.', '('],
            debounce_ms: 150,
            max_suggestions: 10,
            max_focus_chars: 4_000,
            backend: None,
        }
    }
}

impl CompletionConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn is_auto_trigger_char(&self, c: char) -> bool {
        self.auto_trigger && self.auto_trigger_chars.contains(&c)
    }
}

/// External generation program; see `assist::backend::command`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandBackendConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl CommandBackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: CompletionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CompletionConfig::default());
    }

    #[test]
    fn test_camel_case_fields() {
        let config: CompletionConfig = serde_json::from_value(serde_json::json!({
            "allowInStringLiterals": false,
            "autoTriggerChars": ["@"],
            "debounceMs": 0,
            "backend": { "program": "/usr/bin/assist-model", "args": ["--json"] }
        }))
        .unwrap();
        assert!(!config.allow_in_string_literals);
        assert!(config.is_auto_trigger_char('@'));
        assert!(!config.is_auto_trigger_char('.'));
        assert_eq!(config.debounce(), Duration::ZERO);
        let backend = config.backend.unwrap();
        assert_eq!(backend.args, vec!["--json".to_string()]);
        assert_eq!(backend.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_auto_trigger_off_ignores_chars() {
        let config = CompletionConfig {
            auto_trigger: false,
            ..CompletionConfig::default()
        };
        assert!(!config.is_auto_trigger_char('\n'));
    }
}
