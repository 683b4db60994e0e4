//! Configuration types for composer-core.
//!
//! Every section has defaults, so an empty TOML document is a valid config.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::paths::{self, ComposerPaths};

/// Hard ceiling on verification calls per composition
pub const MAX_ATTEMPTS: u32 = 3;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Grounding thresholds and score weights
    #[serde(default)]
    pub grounding: GroundingConfig,
    /// Strategy policy (bandit) settings
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Orchestrator settings
    #[serde(default)]
    pub composer: OrchestratorConfig,
    /// Where state lives on disk
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ComposerConfig {
    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents).map_err(|e| crate::ComposerError::Config(e.to_string()))
    }

    /// Resolve on-disk paths
    pub fn paths(&self) -> ComposerPaths {
        ComposerPaths::from_base(self.storage.data_dir())
    }
}

/// Grounding verification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Minimum number of overlapping content tokens
    pub min_tokens: usize,
    /// Minimum ratio of overlapping to candidate content tokens
    pub min_ratio: f64,
    /// Weight of the lexical overlap score in the blended score
    pub lexical_weight: f64,
    /// Weight of the concept score in the blended score
    pub semantic_weight: f64,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            min_tokens: 3,
            min_ratio: 0.3,
            lexical_weight: 0.7,
            semantic_weight: 0.3,
        }
    }
}

/// Strategy policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// TD learning rate (alpha)
    pub learning_rate: f64,
    /// Exploration rate on a fresh start
    pub initial_epsilon: f64,
    /// Exploration floor
    pub min_epsilon: f64,
    /// Exploration ceiling
    pub max_epsilon: f64,
    /// Capacity of the reward and action histories
    pub history_capacity: usize,
    /// Persist a snapshot every N updates
    pub snapshot_every: u64,
    /// Seed for the exploration RNG (random when absent)
    pub seed: Option<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            initial_epsilon: 0.1,
            min_epsilon: 0.05,
            max_epsilon: 0.3,
            history_capacity: 1000,
            snapshot_every: 10,
            seed: None,
        }
    }
}

impl PolicyConfig {
    /// Clamp an exploration rate into the configured bounds
    pub fn clamp_epsilon(&self, epsilon: f64) -> f64 {
        epsilon.clamp(self.min_epsilon, self.max_epsilon.max(self.min_epsilon))
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Verification attempts per composition (clamped to 1..=3)
    pub max_attempts: u32,
    /// Whether the enhancement stage reports itself available
    pub enhancement_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            enhancement_enabled: false,
        }
    }
}

impl OrchestratorConfig {
    /// Effective attempt budget
    pub fn attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS)
    }
}

/// Storage location settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the data directory
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(paths::data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComposerConfig::default();
        assert_eq!(config.grounding.min_tokens, 3);
        assert!((config.grounding.min_ratio - 0.3).abs() < f64::EPSILON);
        assert!((config.policy.initial_epsilon - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.policy.history_capacity, 1000);
        assert_eq!(config.composer.attempts(), 3);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ComposerConfig::from_toml("").unwrap();
        assert_eq!(config, ComposerConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = ComposerConfig::from_toml(
            r#"
            [policy]
            learning_rate = 0.05

            [storage]
            data_dir = "/var/lib/composer"
            "#,
        )
        .unwrap();

        assert!((config.policy.learning_rate - 0.05).abs() < f64::EPSILON);
        assert!((config.policy.max_epsilon - 0.3).abs() < f64::EPSILON);
        assert_eq!(
            config.paths().policy_path,
            PathBuf::from("/var/lib/composer/policy.json")
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ComposerConfig::from_toml("[policy]\nlearning_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, crate::ComposerError::Config(_)));
    }

    #[test]
    fn test_attempts_are_clamped() {
        let config = OrchestratorConfig {
            max_attempts: 10,
            enhancement_enabled: false,
        };
        assert_eq!(config.attempts(), MAX_ATTEMPTS);

        let config = OrchestratorConfig {
            max_attempts: 0,
            enhancement_enabled: false,
        };
        assert_eq!(config.attempts(), 1);
    }

    #[test]
    fn test_clamp_epsilon() {
        let config = PolicyConfig::default();
        assert!((config.clamp_epsilon(0.9) - 0.3).abs() < f64::EPSILON);
        assert!((config.clamp_epsilon(0.0) - 0.05).abs() < f64::EPSILON);
        assert!((config.clamp_epsilon(0.2) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ComposerConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: ComposerConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
