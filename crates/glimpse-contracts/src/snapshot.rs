use std::path::{Path, PathBuf};

use crate::game::SessionState;

pub const SNAPSHOT_FILE: &str = "session.json";

/// File-backed persistence port for the single session snapshot.
///
/// One snapshot lives at a fixed filename under the session directory. It is
/// overwritten on every state change while the game is live and removed once
/// the game is over or reset, so a dead session can never be resurrected
/// from disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or malformed snapshots read as absent.
    pub fn load(&self) -> Option<SessionState> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn save(&self, state: &SessionState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Applies the lifecycle contract: persist while live, delete otherwise.
    pub fn sync(&self, state: &SessionState) -> anyhow::Result<()> {
        if state.started && !state.finished {
            self.save(state)
        } else {
            self.clear()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        apply_guess, start_session, Difficulty, GuessSubmission, ImageRecord, SessionConfig,
    };

    fn active_state() -> SessionState {
        let image = ImageRecord::new(
            "file:///tmp/artifact.png",
            "a test image",
            vec!["dog".to_string(), "grass".to_string()],
            Difficulty::Easy,
        )
        .expect("image");
        let config = SessionConfig {
            max_attempts: 2,
            win_threshold: 1,
            topic: "a dog".to_string(),
            ..SessionConfig::default()
        };
        start_session(config, image).expect("start")
    }

    #[test]
    fn save_and_load_roundtrip() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        let state = active_state();
        store.save(&state)?;
        assert_eq!(store.load(), Some(state));
        Ok(())
    }

    #[test]
    fn load_tolerates_missing_and_malformed_files() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        assert_eq!(store.load(), None);

        std::fs::write(store.path(), "not json at all")?;
        assert_eq!(store.load(), None);
        Ok(())
    }

    #[test]
    fn sync_persists_live_sessions() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        let state = active_state();
        store.sync(&state)?;
        assert!(store.path().exists());
        Ok(())
    }

    #[test]
    fn sync_deletes_finished_sessions() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        let state = active_state();
        store.sync(&state)?;

        let (state, _) = apply_guess(&state, &GuessSubmission::new(1, "wrong one"));
        let (finished, _) = apply_guess(&state, &GuessSubmission::new(2, "wrong two"));
        assert!(finished.finished);
        store.sync(&finished)?;
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn sync_deletes_unstarted_state() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        store.save(&active_state())?;
        store.sync(&SessionState::default())?;
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SnapshotStore::new(temp.path());
        store.clear()?;
        store.clear()?;
        Ok(())
    }
}
