use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GameError;

use super::matcher::{match_guess, normalize_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// How many target features a generated image should carry.
    pub fn feature_count(self) -> usize {
        match self {
            Self::Easy => 3,
            Self::Medium => 5,
            Self::Hard => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// The image under play. Immutable once the session starts; features are
/// deduplicated by normalized form, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    pub alt_text: String,
    pub features: Vec<String>,
    pub difficulty: Difficulty,
}

impl ImageRecord {
    pub fn new(
        url: impl Into<String>,
        alt_text: impl Into<String>,
        features: Vec<String>,
        difficulty: Difficulty,
    ) -> Result<Self, GameError> {
        let mut seen: IndexSet<String> = IndexSet::new();
        let mut deduped = Vec::new();
        for feature in features {
            let normalized = normalize_term(&feature);
            if normalized.is_empty() {
                continue;
            }
            if seen.insert(normalized) {
                deduped.push(feature.trim().to_string());
            }
        }
        if deduped.is_empty() {
            return Err(GameError::EmptyFeatureList);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            alt_text: alt_text.into(),
            features: deduped,
            difficulty,
        })
    }
}

pub const MAX_ATTEMPTS_LIMIT: u32 = 50;
pub const WIN_THRESHOLD_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub max_attempts: u32,
    pub win_threshold: u32,
    pub topic: String,
    pub style: String,
    pub age: Option<u32>,
    pub difficulty: Difficulty,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            win_threshold: 3,
            topic: String::new(),
            style: String::new(),
            age: None,
            difficulty: Difficulty::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self, feature_count: usize) -> Result<(), GameError> {
        if self.max_attempts < 1 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(GameError::Configuration(format!(
                "attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                self.max_attempts
            )));
        }
        if self.win_threshold < 1 || self.win_threshold > WIN_THRESHOLD_LIMIT {
            return Err(GameError::Configuration(format!(
                "win threshold must be between 1 and {WIN_THRESHOLD_LIMIT}, got {}",
                self.win_threshold
            )));
        }
        if self.win_threshold as usize > feature_count {
            return Err(GameError::Configuration(format!(
                "win threshold {} exceeds the {} available features",
                self.win_threshold, feature_count
            )));
        }
        Ok(())
    }
}

/// One play-through, from setup to finish or reset. This is also the
/// snapshot format the persistence port serializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub image: Option<ImageRecord>,
    pub config: SessionConfig,
    pub chat_history: Vec<ChatMessage>,
    /// Normalized feature phrases, in the order they were found.
    pub found_features: IndexSet<String>,
    pub attempts_remaining: u32,
    pub started: bool,
    pub finished: bool,
    pub threshold_met: bool,
    pub all_found: bool,
    /// Sequence number of the last processed submission; anything at or
    /// below this is a duplicate retry and is dropped.
    #[serde(default)]
    pub last_submission_seq: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            image: None,
            config: SessionConfig::default(),
            chat_history: Vec::new(),
            found_features: IndexSet::new(),
            attempts_remaining: 0,
            started: false,
            finished: false,
            threshold_met: false,
            all_found: false,
            last_submission_seq: 0,
        }
    }
}

impl SessionState {
    pub fn push_player(&mut self, text: impl Into<String>) {
        self.chat_history.push(ChatMessage {
            role: Role::Player,
            text: text.into(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.chat_history.push(ChatMessage {
            role: Role::Assistant,
            text: text.into(),
        });
    }

    pub fn total_features(&self) -> usize {
        self.image
            .as_ref()
            .map(|image| image.features.len())
            .unwrap_or(0)
    }

    /// Found features in the image's original order and casing, for display.
    pub fn found_for_display(&self) -> Vec<String> {
        let Some(image) = self.image.as_ref() else {
            return Vec::new();
        };
        image
            .features
            .iter()
            .filter(|feature| self.found_features.contains(&normalize_term(feature)))
            .cloned()
            .collect()
    }

    /// Features still to be discovered, original order and casing.
    pub fn remaining_features(&self) -> Vec<String> {
        let Some(image) = self.image.as_ref() else {
            return Vec::new();
        };
        image
            .features
            .iter()
            .filter(|feature| !self.found_features.contains(&normalize_term(feature)))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuessSubmission {
    pub seq: u64,
    pub text: String,
}

impl GuessSubmission {
    pub fn new(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuessReport {
    /// False when the submission was a no-op: session not started, already
    /// finished, empty guess, or a duplicate sequence number.
    pub accepted: bool,
    pub newly_found: Vec<String>,
    pub is_help_request: bool,
    pub consumed_attempt: bool,
    /// True when the caller should obtain hint text from the collaborator
    /// and append it with `push_assistant`. The scoring outcome stands
    /// whether or not that call succeeds.
    pub needs_hint: bool,
}

/// Applies one guess to the session. Pure: the caller persists the result.
///
/// An attempt is consumed only by a genuinely failed, non-help guess.
/// A finished session is never mutated by further guesses.
pub fn apply_guess(state: &SessionState, submission: &GuessSubmission) -> (SessionState, GuessReport) {
    let trimmed = submission.text.trim();
    if !state.started
        || state.finished
        || trimmed.is_empty()
        || submission.seq <= state.last_submission_seq
    {
        return (state.clone(), GuessReport::default());
    }
    let Some(image) = state.image.as_ref() else {
        return (state.clone(), GuessReport::default());
    };

    let outcome = match_guess(trimmed, &image.features, &state.found_features);
    let total = image.features.len();

    let mut next = state.clone();
    next.last_submission_seq = submission.seq;
    next.push_player(trimmed);

    for feature in &outcome.newly_found {
        next.found_features.insert(normalize_term(feature));
    }

    let consumed_attempt = outcome.newly_found.is_empty() && !outcome.is_help_request;
    if consumed_attempt {
        next.attempts_remaining = next.attempts_remaining.saturating_sub(1);
    }

    let found_count = next.found_features.len();
    next.all_found = found_count == total;
    next.threshold_met = found_count as u32 >= next.config.win_threshold;
    next.finished = next.all_found || next.attempts_remaining == 0;

    if !outcome.newly_found.is_empty() {
        next.push_assistant(acknowledge(&outcome.newly_found, found_count, total));
    }

    let report = GuessReport {
        accepted: true,
        needs_hint: outcome.newly_found.is_empty(),
        consumed_attempt,
        is_help_request: outcome.is_help_request,
        newly_found: outcome.newly_found,
    };
    (next, report)
}

fn acknowledge(newly_found: &[String], found_count: usize, total: usize) -> String {
    format!(
        "You spotted {}! {found_count} of {total} features found.",
        newly_found.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::lifecycle::start_session;

    fn image(features: &[&str]) -> ImageRecord {
        ImageRecord::new(
            "file:///tmp/artifact.png",
            "a test image",
            features.iter().map(|item| item.to_string()).collect(),
            Difficulty::Easy,
        )
        .expect("test image")
    }

    fn config(max_attempts: u32, win_threshold: u32) -> SessionConfig {
        SessionConfig {
            max_attempts,
            win_threshold,
            topic: "a dog in a garden".to_string(),
            ..SessionConfig::default()
        }
    }

    fn guess(state: &SessionState, text: &str) -> (SessionState, GuessReport) {
        apply_guess(
            state,
            &GuessSubmission::new(state.last_submission_seq + 1, text),
        )
    }

    #[test]
    fn image_record_rejects_empty_feature_list() {
        let err = ImageRecord::new("u", "a", vec!["  ".to_string()], Difficulty::Easy)
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert_eq!(err, "image has no guessable features");
    }

    #[test]
    fn image_record_dedupes_by_normalized_form() {
        let record = image(&["Dog", "dog ", "grass"]);
        assert_eq!(record.features, vec!["Dog".to_string(), "grass".to_string()]);
    }

    #[test]
    fn config_validation_bounds() {
        assert!(config(0, 2).validate(3).is_err());
        assert!(config(51, 2).validate(3).is_err());
        assert!(config(3, 0).validate(3).is_err());
        assert!(config(3, 21).validate(30).is_err());
        assert!(config(3, 4).validate(3).is_err());
        assert!(config(3, 2).validate(3).is_ok());
    }

    #[test]
    fn successful_guess_does_not_consume_attempt() {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let (next, report) = guess(&state, "dog");
        assert!(report.accepted);
        assert_eq!(report.newly_found, vec!["dog".to_string()]);
        assert!(!report.consumed_attempt);
        assert_eq!(next.attempts_remaining, 3);
        assert!(next.found_features.contains("dog"));
    }

    #[test]
    fn failed_guess_consumes_one_attempt() {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let (next, report) = guess(&state, "a submarine");
        assert!(report.consumed_attempt);
        assert!(report.needs_hint);
        assert_eq!(next.attempts_remaining, 2);
        assert!(next.found_features.is_empty());
    }

    #[test]
    fn help_request_costs_nothing_and_needs_hint() {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let (next, report) = guess(&state, "can I get a hint");
        assert!(report.is_help_request);
        assert!(!report.consumed_attempt);
        assert!(report.needs_hint);
        assert_eq!(next.attempts_remaining, 3);
        assert!(next.found_features.is_empty());
    }

    #[test]
    fn attempts_never_increase_and_clamp_at_zero() {
        let mut state = start_session(config(1, 1), image(&["dog"])).expect("start");
        let mut last = state.attempts_remaining;
        for text in ["miss one", "miss two", "miss three"] {
            let (next, _) = guess(&state, text);
            assert!(next.attempts_remaining <= last);
            last = next.attempts_remaining;
            state = next;
        }
        assert_eq!(state.attempts_remaining, 0);
        assert!(state.finished);
    }

    #[test]
    fn finished_state_is_immutable_under_further_guesses() {
        let state = start_session(config(1, 1), image(&["dog", "grass"])).expect("start");
        let (finished, _) = guess(&state, "nothing here");
        assert!(finished.finished);

        let (after, report) = guess(&finished, "dog");
        assert!(!report.accepted);
        assert_eq!(after, finished);
    }

    #[test]
    fn all_found_finishes_the_session() {
        let state = start_session(config(5, 1), image(&["dog", "grass"])).expect("start");
        let (state, _) = guess(&state, "dog");
        assert!(!state.finished);
        let (state, _) = guess(&state, "grass");
        assert!(state.all_found);
        assert!(state.finished);
        assert_eq!(state.attempts_remaining, 5);
    }

    #[test]
    fn duplicate_submission_seq_is_dropped() {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let submission = GuessSubmission::new(1, "a submarine");
        let (after_first, first) = apply_guess(&state, &submission);
        assert!(first.accepted);
        assert_eq!(after_first.attempts_remaining, 2);

        let (after_retry, retry) = apply_guess(&after_first, &submission);
        assert!(!retry.accepted);
        assert_eq!(after_retry, after_first);
    }

    #[test]
    fn empty_guess_is_a_noop() {
        let state = start_session(config(3, 2), image(&["dog"])).expect("start");
        let (next, report) = guess(&state, "   ");
        assert!(!report.accepted);
        assert_eq!(next, state);
    }

    #[test]
    fn chat_records_player_and_acknowledgement() {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let (next, _) = guess(&state, "dog");
        assert_eq!(next.chat_history.len(), 2);
        assert_eq!(next.chat_history[0].role, Role::Player);
        assert_eq!(next.chat_history[0].text, "dog");
        assert_eq!(next.chat_history[1].role, Role::Assistant);
        assert_eq!(next.chat_history[1].text, "You spotted dog! 1 of 2 features found.");
    }

    #[test]
    fn display_and_remaining_follow_image_order() {
        let state = start_session(config(5, 1), image(&["Red Collar", "dog", "grass"]))
            .expect("start");
        let (state, _) = guess(&state, "grass");
        let (state, _) = guess(&state, "red collar");
        assert_eq!(
            state.found_for_display(),
            vec!["Red Collar".to_string(), "grass".to_string()]
        );
        assert_eq!(state.remaining_features(), vec!["dog".to_string()]);
    }

    #[test]
    fn end_to_end_scenario_from_setup_to_loss() {
        let state = start_session(config(3, 2), image(&["dog", "grass", "collar"])).expect("start");

        let (state, _) = guess(&state, "a cat");
        assert_eq!(state.attempts_remaining, 2);
        assert!(state.found_features.is_empty());

        let (state, _) = guess(&state, "dog");
        assert_eq!(state.attempts_remaining, 2);
        assert_eq!(state.found_features.len(), 1);

        let (state, _) = guess(&state, "grass");
        assert!(state.threshold_met);
        assert!(!state.all_found);
        assert!(!state.finished);

        let (state, _) = guess(&state, "xyz");
        assert_eq!(state.attempts_remaining, 1);

        let (state, _) = guess(&state, "xyz again");
        assert_eq!(state.attempts_remaining, 0);
        assert!(state.finished);
        assert!(!state.all_found);
        assert!(state.threshold_met);
    }

    #[test]
    fn snapshot_roundtrips_through_serde() -> anyhow::Result<()> {
        let state = start_session(config(3, 2), image(&["dog", "grass"])).expect("start");
        let (state, _) = guess(&state, "dog");
        let raw = serde_json::to_string(&state)?;
        let restored: SessionState = serde_json::from_str(&raw)?;
        assert_eq!(restored, state);
        Ok(())
    }
}
