use indexmap::IndexSet;

use crate::error::GameError;

use super::session::{ImageRecord, SessionConfig, SessionState};

/// Builds a fresh active session for a generated image.
pub fn start_session(
    config: SessionConfig,
    image: ImageRecord,
) -> Result<SessionState, GameError> {
    config.validate(image.features.len())?;
    let attempts = config.max_attempts;
    Ok(SessionState {
        image: Some(image),
        config,
        chat_history: Vec::new(),
        found_features: IndexSet::new(),
        attempts_remaining: attempts,
        started: true,
        finished: false,
        threshold_met: false,
        all_found: false,
        last_submission_seq: 0,
    })
}

/// Accepts a persisted snapshot only when it still belongs to the image
/// currently on screen and the game is not over. Anything else is stale:
/// the caller falls back to setup instead of resurrecting a dead session.
pub fn resume_session(snapshot: SessionState, current_image_id: &str) -> Option<SessionState> {
    let image = snapshot.image.as_ref()?;
    if snapshot.started && !snapshot.finished && image.id == current_image_id {
        Some(snapshot)
    } else {
        None
    }
}

/// The canonical empty, unstarted state shown before setup.
pub fn reset_session() -> SessionState {
    SessionState::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::{apply_guess, Difficulty, GuessSubmission};

    fn image(features: &[&str]) -> ImageRecord {
        ImageRecord::new(
            "file:///tmp/artifact.png",
            "a test image",
            features.iter().map(|item| item.to_string()).collect(),
            Difficulty::Easy,
        )
        .expect("test image")
    }

    fn config() -> SessionConfig {
        SessionConfig {
            max_attempts: 3,
            win_threshold: 2,
            topic: "a dog".to_string(),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn start_session_initializes_active_state() {
        let state = start_session(config(), image(&["dog", "grass"])).expect("start");
        assert!(state.started);
        assert!(!state.finished);
        assert_eq!(state.attempts_remaining, 3);
        assert!(state.chat_history.is_empty());
        assert!(state.found_features.is_empty());
    }

    #[test]
    fn start_session_rejects_threshold_above_feature_count() {
        let bad = SessionConfig {
            win_threshold: 5,
            ..config()
        };
        let err = start_session(bad, image(&["dog", "grass"]))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("win threshold"), "unexpected error: {err}");
    }

    #[test]
    fn start_session_rejects_zero_attempts() {
        let bad = SessionConfig {
            max_attempts: 0,
            ..config()
        };
        assert!(start_session(bad, image(&["dog", "grass"])).is_err());
    }

    #[test]
    fn resume_accepts_matching_unfinished_snapshot() {
        let state = start_session(config(), image(&["dog", "grass"])).expect("start");
        let id = state.image.as_ref().map(|image| image.id.clone()).unwrap_or_default();
        assert_eq!(resume_session(state.clone(), &id), Some(state));
    }

    #[test]
    fn resume_rejects_snapshot_for_a_different_image() {
        let state = start_session(config(), image(&["dog", "grass"])).expect("start");
        assert_eq!(resume_session(state, "other-image-id"), None);
    }

    #[test]
    fn resume_rejects_finished_snapshot() {
        let short = SessionConfig {
            max_attempts: 1,
            win_threshold: 1,
            ..config()
        };
        let state = start_session(short, image(&["dog"])).expect("start");
        let (finished, _) = apply_guess(&state, &GuessSubmission::new(1, "no match here"));
        assert!(finished.finished);
        let id = finished
            .image
            .as_ref()
            .map(|image| image.id.clone())
            .unwrap_or_default();
        assert_eq!(resume_session(finished, &id), None);
    }

    #[test]
    fn resume_rejects_snapshot_without_an_image() {
        assert_eq!(resume_session(SessionState::default(), "any"), None);
    }

    #[test]
    fn reset_returns_unstarted_state() {
        let state = reset_session();
        assert!(!state.started);
        assert!(state.image.is_none());
        assert!(state.chat_history.is_empty());
    }
}
