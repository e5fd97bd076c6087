//! Word substitution strategy
//!
//! Replaces certainty, place, time and source phrases with vaguer ones. The
//! fraction of matching phrases replaced grows with the mutation strength.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rumor_domain::traits::MutationStrategy;

/// Phrase pairs, matched case-insensitively on word boundaries
const PHRASES: &[(&str, &str)] = &[
    // Certainty
    ("is", "might be"),
    ("was", "supposedly was"),
    ("will", "could"),
    ("definitely", "probably"),
    ("certainly", "possibly"),
    ("always", "often"),
    ("never", "rarely"),
    // Place
    ("at the", "somewhere near the"),
    ("in the", "around the"),
    ("near", "somewhere close to"),
    // Time
    ("yesterday", "recently"),
    ("today", "lately"),
    ("tomorrow", "soon"),
    ("last week", "not long ago"),
    // Source
    ("i saw", "someone saw"),
    ("i heard", "word is that"),
    ("he said", "they say"),
    ("she told me", "I heard that"),
    // Quantity
    ("a few", "several"),
    ("many", "quite a few"),
    ("some", "a number of"),
    ("all", "most"),
    // Emotion
    ("angry", "quite upset"),
    ("happy", "pleased"),
    ("sad", "rather down"),
    ("excited", "enthusiastic"),
];

const UNCERTAINTY_MARKERS: &[&str] = &[
    " (or so I heard)",
    " (though I'm not certain)",
    " (if the rumors are true)",
    " (according to some)",
    " (allegedly)",
];

/// Strength at or above which an uncertainty marker is always appended
const MARKER_THRESHOLD: f64 = 0.5;

/// Mutation by phrase substitution
///
/// With strength `s` and `n` matching phrases, `ceil(s * n)` of them are
/// replaced. If nothing could be replaced, or `s >= 0.5`, an uncertainty
/// marker is appended so that any positive strength changes the text.
pub struct WordSubstitutionStrategy {
    rng: Mutex<StdRng>,
}

impl WordSubstitutionStrategy {
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
}

impl Default for WordSubstitutionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the first occurrence of `phrase` in `haystack` that sits
/// on word boundaries. Both arguments must be ASCII-lowercased.
fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    haystack.match_indices(phrase).map(|(i, _)| i).find(|&start| {
        let end = start + phrase.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        before_ok && after_ok
    })
}

/// Replace the first boundary match of `from`, keeping a leading capital
fn replace_phrase(content: &str, from: &str, to: &str) -> Option<String> {
    let lowered = content.to_ascii_lowercase();
    let start = find_phrase(&lowered, from)?;
    let end = start + from.len();

    let capitalize = content[start..].starts_with(|c: char| c.is_ascii_uppercase());
    let replacement = if capitalize {
        let mut chars = to.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        to.to_string()
    };

    Some(format!("{}{}{}", &content[..start], replacement, &content[end..]))
}

impl MutationStrategy for WordSubstitutionStrategy {
    fn name(&self) -> &str {
        "word_substitution"
    }

    fn mutate(&self, content: &str, strength: f64) -> String {
        let strength = strength.clamp(0.0, 1.0);
        if strength == 0.0 {
            return content.to_string();
        }

        let lowered = content.to_ascii_lowercase();
        let mut candidates: Vec<&(&str, &str)> = PHRASES
            .iter()
            .filter(|(from, _)| find_phrase(&lowered, from).is_some())
            .collect();

        let mut rng = self.rng.lock();
        candidates.shuffle(&mut *rng);
        let wanted = (strength * candidates.len() as f64).ceil() as usize;

        let mut mutated = content.to_string();
        let mut replaced = 0;
        for (from, to) in candidates.into_iter().take(wanted) {
            // An earlier replacement may have consumed this phrase
            if let Some(next) = replace_phrase(&mutated, from, to) {
                mutated = next;
                replaced += 1;
            }
        }

        if replaced == 0 || strength >= MARKER_THRESHOLD {
            if let Some(marker) = UNCERTAINTY_MARKERS.choose(&mut *rng) {
                mutated.push_str(marker);
            }
        }

        mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_strength_is_identity() {
        let strategy = WordSubstitutionStrategy::seeded(1);
        assert_eq!(strategy.mutate("The king is ill", 0.0), "The king is ill");
    }

    #[test]
    fn test_full_strength_replaces_every_match() {
        let strategy = WordSubstitutionStrategy::seeded(1);
        let mutated = strategy.mutate("The king is ill and will die tomorrow", 1.0);
        assert!(mutated.starts_with("The king might be ill and could die soon"));
        assert!(UNCERTAINTY_MARKERS.iter().any(|m| mutated.ends_with(m)));
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "is" inside "this" and "island" must not be touched
        let strategy = WordSubstitutionStrategy::seeded(3);
        let mutated = strategy.mutate("this island", 0.3);
        assert!(mutated.starts_with("this island"));
        assert_ne!(mutated, "this island");
    }

    #[test]
    fn test_capitalization_kept() {
        assert_eq!(
            replace_phrase("Yesterday the mill burned", "yesterday", "recently").unwrap(),
            "Recently the mill burned"
        );
        assert!(replace_phrase("Nothing here", "yesterday", "recently").is_none());
    }

    #[test]
    fn test_no_match_appends_marker() {
        let strategy = WordSubstitutionStrategy::seeded(9);
        let mutated = strategy.mutate("Dragons!", 0.1);
        assert!(mutated.starts_with("Dragons!"));
        assert!(mutated.len() > "Dragons!".len());
    }

    #[test]
    fn test_low_strength_replaces_fewer_phrases() {
        let content = "The guard is angry and will march at the gate tomorrow";
        let low = WordSubstitutionStrategy::seeded(5).mutate(content, 0.1);
        let high = WordSubstitutionStrategy::seeded(5).mutate(content, 1.0);

        let low_kept = ["is", "angry", "will", "at the", "tomorrow"]
            .iter()
            .filter(|p| find_phrase(&low.to_ascii_lowercase(), p).is_some())
            .count();
        let high_kept = ["is", "angry", "will", "at the", "tomorrow"]
            .iter()
            .filter(|p| find_phrase(&high.to_ascii_lowercase(), p).is_some())
            .count();
        assert!(low_kept > high_kept);
        assert_eq!(high_kept, 0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let content = "Some soldiers were angry at the tavern yesterday";
        let a = WordSubstitutionStrategy::seeded(42).mutate(content, 0.5);
        let b = WordSubstitutionStrategy::seeded(42).mutate(content, 0.5);
        assert_eq!(a, b);
    }
}
