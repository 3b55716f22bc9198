mod lifecycle;
mod matcher;
mod session;

pub use lifecycle::{reset_session, resume_session, start_session};
pub use matcher::{is_help_request, match_guess, normalize_term, MatchOutcome, HELP_KEYWORDS};
pub use session::{
    apply_guess, ChatMessage, Difficulty, GuessReport, GuessSubmission, ImageRecord, Role,
    SessionConfig, SessionState,
};
