//! Strategy selection by configuration

use crate::{
    ExternalCallbackStrategy, MutationCallback, TemplateStrategy, WordSubstitutionStrategy,
};
use rumor_domain::traits::MutationStrategy;
use rumor_domain::DomainError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Built-in strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Hearsay framing templates
    Template,
    /// Phrase substitution
    #[default]
    WordSubstitution,
}

/// Mutation settings (the `[mutation]` table of the engine config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Built-in strategy, also the fallback when a callback is installed
    pub kind: StrategyKind,

    /// Fixed RNG seed for reproducible mutations
    pub seed: Option<u64>,

    /// Time an external callback may take before the fallback runs
    pub callback_timeout_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::default(),
            seed: None,
            callback_timeout_ms: 2_000,
        }
    }
}

impl StrategyConfig {
    /// Check the settings
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.callback_timeout_ms == 0 {
            return Err(DomainError::InvalidParameter(
                "callback_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Instantiate the configured built-in strategy
    pub fn build(&self) -> Arc<dyn MutationStrategy> {
        match (self.kind, self.seed) {
            (StrategyKind::Template, Some(seed)) => Arc::new(TemplateStrategy::seeded(seed)),
            (StrategyKind::Template, None) => Arc::new(TemplateStrategy::new()),
            (StrategyKind::WordSubstitution, Some(seed)) => {
                Arc::new(WordSubstitutionStrategy::seeded(seed))
            }
            (StrategyKind::WordSubstitution, None) => Arc::new(WordSubstitutionStrategy::new()),
        }
    }

    /// Wrap `callback` with the configured built-in strategy as fallback
    pub fn build_with_callback(&self, callback: Arc<MutationCallback>) -> Arc<dyn MutationStrategy> {
        Arc::new(ExternalCallbackStrategy::new(
            callback,
            Duration::from_millis(self.callback_timeout_ms),
            self.build(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockCallback;

    #[test]
    fn test_default_builds_word_substitution() {
        let strategy = StrategyConfig::default().build();
        assert_eq!(strategy.name(), "word_substitution");
    }

    #[test]
    fn test_template_kind_from_toml() {
        let config: StrategyConfig = toml::from_str(
            r#"
            kind = "template"
            seed = 11
            "#,
        )
        .unwrap();
        assert_eq!(config.kind, StrategyKind::Template);
        assert_eq!(config.callback_timeout_ms, 2_000);
        assert_eq!(config.build().name(), "template");
    }

    #[test]
    fn test_callback_wraps_fallback() {
        let config = StrategyConfig {
            seed: Some(3),
            ..Default::default()
        };
        let strategy = config.build_with_callback(MockCallback::new("retold").into_callback());
        assert_eq!(strategy.name(), "external_callback");
        assert_eq!(strategy.mutate("told", 0.5), "retold");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = StrategyConfig {
            callback_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
