//! Template strategy
//!
//! Wraps the retold content in hearsay framing. Stronger mutations pick from
//! templates that add more invented context.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rumor_domain::traits::MutationStrategy;

const PLACEHOLDER: &str = "{content}";

const LOW: &[&str] = &[
    "{content}, or so I heard",
    "I heard that {content}",
    "{content}, they say",
];

const MEDIUM: &[&str] = &[
    "Word around town is that {content}",
    "Someone told me {content}, though I'm not certain",
    "{content}, if the rumors are true",
];

const HIGH: &[&str] = &[
    "Official reports confirm that {content}. What's worse, this is part of a larger pattern",
    "They're saying {content}, and this could destabilize the entire region",
    "This is just the beginning: {content}, and similar things are happening elsewhere",
];

/// Mutation by template framing
///
/// Strength below 1/3 uses light framing, below 2/3 medium framing, and
/// anything stronger adds invented authority or consequences.
pub struct TemplateStrategy {
    rng: Mutex<StdRng>,
}

impl TemplateStrategy {
    /// Create a strategy seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a strategy with reproducible choices
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn tier(strength: f64) -> &'static [&'static str] {
        if strength < 1.0 / 3.0 {
            LOW
        } else if strength < 2.0 / 3.0 {
            MEDIUM
        } else {
            HIGH
        }
    }
}

impl Default for TemplateStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill a template, lowering the content's first letter when it lands
/// mid-sentence
fn fill(template: &str, content: &str) -> String {
    let content = content.trim_end_matches(['.', '!', '?']);
    if template.starts_with(PLACEHOLDER) {
        return template.replace(PLACEHOLDER, content);
    }
    let mut chars = content.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    template.replace(PLACEHOLDER, &lowered)
}

impl MutationStrategy for TemplateStrategy {
    fn name(&self) -> &str {
        "template"
    }

    fn mutate(&self, content: &str, strength: f64) -> String {
        let strength = strength.clamp(0.0, 1.0);
        if strength == 0.0 {
            return content.to_string();
        }

        let mut rng = self.rng.lock();
        match Self::tier(strength).choose(&mut *rng) {
            Some(template) => fill(template, content),
            None => content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_tier(output: &str, content: &str, tier: &[&str]) -> bool {
        tier.iter().any(|t| fill(t, content) == output)
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let strategy = TemplateStrategy::seeded(1);
        assert_eq!(strategy.mutate("The well is poisoned.", 0.0), "The well is poisoned.");
    }

    #[test]
    fn test_strength_selects_tier() {
        let content = "The well is poisoned";
        let strategy = TemplateStrategy::seeded(1);

        assert!(from_tier(&strategy.mutate(content, 0.2), content, LOW));
        assert!(from_tier(&strategy.mutate(content, 0.5), content, MEDIUM));
        assert!(from_tier(&strategy.mutate(content, 0.9), content, HIGH));
    }

    #[test]
    fn test_fill_lowercases_mid_sentence() {
        assert_eq!(
            fill("I heard that {content}", "The well is poisoned."),
            "I heard that the well is poisoned"
        );
        assert_eq!(
            fill("{content}, they say", "The well is poisoned"),
            "The well is poisoned, they say"
        );
    }

    #[test]
    fn test_every_template_has_placeholder() {
        for template in LOW.iter().chain(MEDIUM).chain(HIGH) {
            assert!(template.contains(PLACEHOLDER), "{}", template);
        }
    }
}
