use super::types::{
    RawComposerConfig, RawGroundingConfig, RawOrchestratorConfig, RawPolicyConfig,
    RawStorageConfig,
};
use anyhow::{Context, Result};
use composer_core::paths;
use composer_core::{
    ComposerConfig, GroundingConfig, OrchestratorConfig, PolicyConfig, StorageConfig,
};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user, project, then `explicit` if given)
    pub fn load(explicit: Option<&Path>) -> Result<ComposerConfig> {
        let mut raw = RawComposerConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Explicit --config file, which must exist
        if let Some(path) = explicit {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawComposerConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with COMPOSER_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("COMPOSER_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".composer/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawComposerConfig, overlay: RawComposerConfig) -> RawComposerConfig {
        RawComposerConfig {
            grounding: RawGroundingConfig {
                min_tokens: overlay.grounding.min_tokens.or(base.grounding.min_tokens),
                min_ratio: overlay.grounding.min_ratio.or(base.grounding.min_ratio),
                lexical_weight: overlay
                    .grounding
                    .lexical_weight
                    .or(base.grounding.lexical_weight),
                semantic_weight: overlay
                    .grounding
                    .semantic_weight
                    .or(base.grounding.semantic_weight),
            },
            policy: RawPolicyConfig {
                learning_rate: overlay.policy.learning_rate.or(base.policy.learning_rate),
                initial_epsilon: overlay
                    .policy
                    .initial_epsilon
                    .or(base.policy.initial_epsilon),
                min_epsilon: overlay.policy.min_epsilon.or(base.policy.min_epsilon),
                max_epsilon: overlay.policy.max_epsilon.or(base.policy.max_epsilon),
                history_capacity: overlay
                    .policy
                    .history_capacity
                    .or(base.policy.history_capacity),
                snapshot_every: overlay.policy.snapshot_every.or(base.policy.snapshot_every),
                seed: overlay.policy.seed.or(base.policy.seed),
            },
            composer: RawOrchestratorConfig {
                max_attempts: overlay.composer.max_attempts.or(base.composer.max_attempts),
                enhancement_enabled: overlay
                    .composer
                    .enhancement_enabled
                    .or(base.composer.enhancement_enabled),
            },
            storage: RawStorageConfig {
                data_dir: overlay.storage.data_dir.or(base.storage.data_dir),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawComposerConfig) -> ComposerConfig {
        let grounding = GroundingConfig::default();
        let policy = PolicyConfig::default();
        let composer = OrchestratorConfig::default();

        ComposerConfig {
            grounding: GroundingConfig {
                min_tokens: raw.grounding.min_tokens.unwrap_or(grounding.min_tokens),
                min_ratio: raw.grounding.min_ratio.unwrap_or(grounding.min_ratio),
                lexical_weight: raw.grounding.lexical_weight.unwrap_or(grounding.lexical_weight),
                semantic_weight: raw
                    .grounding
                    .semantic_weight
                    .unwrap_or(grounding.semantic_weight),
            },
            policy: PolicyConfig {
                learning_rate: raw.policy.learning_rate.unwrap_or(policy.learning_rate),
                initial_epsilon: raw.policy.initial_epsilon.unwrap_or(policy.initial_epsilon),
                min_epsilon: raw.policy.min_epsilon.unwrap_or(policy.min_epsilon),
                max_epsilon: raw.policy.max_epsilon.unwrap_or(policy.max_epsilon),
                history_capacity: raw.policy.history_capacity.unwrap_or(policy.history_capacity),
                snapshot_every: raw.policy.snapshot_every.unwrap_or(policy.snapshot_every),
                seed: raw.policy.seed,
            },
            composer: OrchestratorConfig {
                max_attempts: raw.composer.max_attempts.unwrap_or(composer.max_attempts),
                enhancement_enabled: raw
                    .composer
                    .enhancement_enabled
                    .unwrap_or(composer.enhancement_enabled),
            },
            storage: StorageConfig {
                data_dir: raw.storage.data_dir,
            },
        }
    }
}
