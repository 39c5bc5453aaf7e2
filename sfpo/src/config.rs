//! Configuration loading from sfpo.toml
//!
//! The engine itself is pure with respect to global state: every operation
//! takes its parameters explicitly. `AnalysisConfig` is the bag of those
//! parameters, owned by the orchestration layer. It can be specified in an
//! `sfpo.toml` file discovered by walking up from the current directory;
//! every field has a default, so an absent or partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sfpo_core::DEFAULT_EMBEDDING_CUTOFF_UM;
use sfpo_stats::{
    AnovaConfig, BootstrapConfig, DEFAULT_ANOVA_TARGET_SIZE, DEFAULT_BOOTSTRAP_ITERATIONS,
    DEFAULT_SEED,
};

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Embedding-length cutoff in µm.
    #[serde(default = "default_max_embedding_length")]
    pub max_embedding_length: f64,
    /// Number of bootstrap iterations.
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,
    /// Target group size for bootstrap expansion before ANOVA.
    #[serde(default = "default_anova_target_size")]
    pub anova_target_size: usize,
    /// Whether the study runs bootstrap confidence intervals.
    #[serde(default = "default_true")]
    pub perform_bootstrap: bool,
    /// Whether the study runs the cross-series ANOVA.
    #[serde(default = "default_true")]
    pub perform_anova: bool,
    /// Seed for all resampling; fixed for reproducible results.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Whether bootstrap iterations run on the rayon pool (results are
    /// identical either way).
    #[serde(default = "default_true")]
    pub parallel_bootstrap: bool,
}

fn default_max_embedding_length() -> f64 {
    DEFAULT_EMBEDDING_CUTOFF_UM
}

fn default_bootstrap_samples() -> usize {
    DEFAULT_BOOTSTRAP_ITERATIONS
}

fn default_anova_target_size() -> usize {
    DEFAULT_ANOVA_TARGET_SIZE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_embedding_length: default_max_embedding_length(),
            bootstrap_samples: default_bootstrap_samples(),
            anova_target_size: default_anova_target_size(),
            perform_bootstrap: true,
            perform_anova: true,
            seed: default_seed(),
            parallel_bootstrap: true,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Discover `sfpo.toml` by walking up from the current directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let candidate = dir.join("sfpo.toml");
            if candidate.is_file() {
                return Self::load(&candidate).ok();
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// A documented template with all defaults spelled out.
    pub fn default_toml() -> String {
        format!(
            "# SFPO analysis configuration\n\
             max_embedding_length = {DEFAULT_EMBEDDING_CUTOFF_UM:.1}\n\
             bootstrap_samples = {DEFAULT_BOOTSTRAP_ITERATIONS}\n\
             anova_target_size = {DEFAULT_ANOVA_TARGET_SIZE}\n\
             perform_bootstrap = true\n\
             perform_anova = true\n\
             seed = {DEFAULT_SEED}\n\
             parallel_bootstrap = true\n"
        )
    }

    /// The bootstrap settings this configuration implies.
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            iterations: self.bootstrap_samples,
            seed: self.seed,
            parallel: self.parallel_bootstrap,
        }
    }

    /// The group-comparison settings this configuration implies.
    pub fn anova_config(&self) -> AnovaConfig {
        AnovaConfig {
            expand_to: Some(self.anova_target_size),
            bootstrap: self.bootstrap_config(),
            ..AnovaConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_parses() {
        let config: AnalysisConfig = toml::from_str(&AnalysisConfig::default_toml()).unwrap();
        assert_eq!(config.bootstrap_samples, DEFAULT_BOOTSTRAP_ITERATIONS);
        assert_eq!(config.anova_target_size, DEFAULT_ANOVA_TARGET_SIZE);
        assert!(config.perform_anova);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            bootstrap_samples = 250
            perform_anova = false
            "#,
        )
        .unwrap();
        assert_eq!(config.bootstrap_samples, 250);
        assert!(!config.perform_anova);
        assert!((config.max_embedding_length - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_conversions() {
        let config = AnalysisConfig {
            bootstrap_samples: 500,
            seed: 7,
            anova_target_size: 12,
            ..AnalysisConfig::default()
        };
        let bootstrap = config.bootstrap_config();
        assert_eq!(bootstrap.iterations, 500);
        assert_eq!(bootstrap.seed, 7);

        let anova = config.anova_config();
        assert_eq!(anova.expand_to, Some(12));
        assert_eq!(anova.bootstrap.seed, 7);
    }
}
