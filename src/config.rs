use std::env;
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};

use crate::guide::pathway::QuestionStrategy;
use crate::guide::DEFAULT_GENERATION_TIMEOUT;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct GuideConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub generation_timeout: Duration,
    pub strategy: QuestionStrategy,
    pub seed: Option<u64>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            strategy: QuestionStrategy::Pathway,
            seed: None,
        }
    }
}

impl GuideConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(secs) = get("GENERATION_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().wrap_err_with(|| {
                format!("GENERATION_TIMEOUT_SECS must be a whole number, got '{}'", secs)
            })?;
            if secs == 0 {
                return Err(eyre!("GENERATION_TIMEOUT_SECS must be greater than zero"));
            }
            config.generation_timeout = Duration::from_secs(secs);
        }
        if let Some(strategy) = get("QUESTION_STRATEGY") {
            config.strategy = strategy.parse().map_err(|e: String| eyre!(e))?;
        }
        if let Some(seed) = get("GUIDE_SEED") {
            config.seed = Some(seed.parse().wrap_err_with(|| {
                format!("GUIDE_SEED must be an unsigned integer, got '{}'", seed)
            })?);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = GuideConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.generation_timeout, DEFAULT_GENERATION_TIMEOUT);
        assert_eq!(config.strategy, QuestionStrategy::Pathway);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn reads_every_setting() {
        let config = GuideConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "abc"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("GENERATION_TIMEOUT_SECS", "3"),
            ("QUESTION_STRATEGY", "dynamic"),
            ("GUIDE_SEED", "12"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("abc"));
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.generation_timeout, Duration::from_secs(3));
        assert_eq!(config.strategy, QuestionStrategy::Dynamic);
        assert_eq!(config.seed, Some(12));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config = GuideConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GuideConfig::from_lookup(lookup(&[("GENERATION_TIMEOUT_SECS", "soon")])).is_err());
        assert!(GuideConfig::from_lookup(lookup(&[("GENERATION_TIMEOUT_SECS", "0")])).is_err());
        assert!(GuideConfig::from_lookup(lookup(&[("QUESTION_STRATEGY", "random")])).is_err());
        assert!(GuideConfig::from_lookup(lookup(&[("GUIDE_SEED", "-1")])).is_err());
    }
}
