use serde::Deserialize;
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawComposerConfig {
    #[serde(default)]
    pub grounding: RawGroundingConfig,

    #[serde(default)]
    pub policy: RawPolicyConfig,

    #[serde(default)]
    pub composer: RawOrchestratorConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawGroundingConfig {
    pub min_tokens: Option<usize>,
    pub min_ratio: Option<f64>,
    pub lexical_weight: Option<f64>,
    pub semantic_weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPolicyConfig {
    pub learning_rate: Option<f64>,
    pub initial_epsilon: Option<f64>,
    pub min_epsilon: Option<f64>,
    pub max_epsilon: Option<f64>,
    pub history_capacity: Option<usize>,
    pub snapshot_every: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOrchestratorConfig {
    pub max_attempts: Option<u32>,
    pub enhancement_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Data directory for policy, traces and feedback
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[grounding]
min_ratio = 0.4

[composer]
enhancement_enabled = true
"#;
        let raw: RawComposerConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.grounding.min_ratio, Some(0.4));
        assert!(raw.grounding.min_tokens.is_none());
        assert_eq!(raw.composer.enhancement_enabled, Some(true));
        assert!(raw.policy.seed.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawComposerConfig = toml::from_str("").unwrap();

        assert!(raw.grounding.min_ratio.is_none());
        assert!(raw.composer.max_attempts.is_none());
        assert!(raw.storage.data_dir.is_none());
    }
}
