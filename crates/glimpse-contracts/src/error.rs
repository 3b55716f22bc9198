use thiserror::Error;

/// Errors local to one session start or one guess. None of these are fatal;
/// the caller can always fall back to the setup screen.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("image has no guessable features")]
    EmptyFeatureList,
    #[error("generation failed: {0}")]
    Generation(String),
}
