use indexmap::IndexSet;

/// Phrases that mark a guess as a help request instead of an actual guess.
/// Detection is naive substring containment after normalization, matching
/// the feature-matching rule below.
pub const HELP_KEYWORDS: &[&str] = &["help", "hint", "clue"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    /// Newly matched features in original feature-list order, original casing.
    pub newly_found: Vec<String>,
    pub is_help_request: bool,
}

pub fn normalize_term(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn is_help_request(guess: &str) -> bool {
    let normalized = normalize_term(guess);
    HELP_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
}

/// Matches a free-text guess against the features not yet found.
///
/// A feature counts as newly matched when the normalized guess equals the
/// normalized feature, or either contains the other as a substring. The
/// containment rule is deliberately permissive: short guesses can match
/// longer features, which favors player encouragement over strictness.
/// Help requests bypass matching entirely.
pub fn match_guess(
    guess: &str,
    features: &[String],
    already_found: &IndexSet<String>,
) -> MatchOutcome {
    if is_help_request(guess) {
        return MatchOutcome {
            newly_found: Vec::new(),
            is_help_request: true,
        };
    }

    let normalized_guess = normalize_term(guess);
    if normalized_guess.is_empty() {
        return MatchOutcome::default();
    }

    let mut newly_found = Vec::new();
    for feature in features {
        let normalized_feature = normalize_term(feature);
        if normalized_feature.is_empty() || already_found.contains(&normalized_feature) {
            continue;
        }
        let matched = normalized_guess == normalized_feature
            || normalized_guess.contains(&normalized_feature)
            || normalized_feature.contains(&normalized_guess);
        if matched {
            newly_found.push(feature.clone());
        }
    }

    MatchOutcome {
        newly_found,
        is_help_request: false,
    }
}
