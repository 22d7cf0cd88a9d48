//! Error types for dialogcue-engine organized by failure class.
//!
//! Only configuration and structural input errors are fatal. Synthesis
//! failures and malformed markers degrade gracefully and never surface here.

use thiserror::Error;

/// Engine error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Conversation is structurally invalid
    #[error(transparent)]
    Input(#[from] InputError),

    /// The request was cancelled before the timeline was assembled
    #[error("timeline construction cancelled")]
    Cancelled,
}

/// Configuration errors, reported before any per-request work.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Words-per-second entry is zero, negative or not finite
    #[error("invalid speech rate for `{language}`: {rate} words/s (must be positive)")]
    InvalidSpeechRate { language: String, rate: f64 },

    /// Words-per-second key is not a lowercase language tag
    #[error("invalid language tag `{0}` in speech rates: tags must be lowercase")]
    InvalidLanguageTag(String),

    /// No rate for a language and no default rate configured
    #[error("no words-per-second rate for language `{language}` and no default rate configured")]
    MissingSpeechRate { language: String },

    /// Minimum segment duration must be positive
    #[error("invalid minimum segment duration: {0}s (must be positive)")]
    InvalidMinFloor(f64),

    /// Vocabulary keyword cannot be written as a marker
    #[error("invalid marker keyword `{0}`: expected a lowercase letter followed by [a-z0-9_-]")]
    InvalidMarkerKeyword(String),

    /// Animation duration is negative or not finite
    #[error("invalid duration for animation `{state}`: {duration}s")]
    InvalidAnimationDuration { state: String, duration: f64 },

    /// Animation state name is empty
    #[error("animation state for `{0}` has an empty name")]
    EmptyAnimationState(String),

    /// Subtitle line limit must allow at least one character
    #[error("invalid subtitle line limit: {0} characters")]
    InvalidLineLimit(usize),

    /// Minimum subtitle display time is negative or not finite
    #[error("invalid minimum subtitle display time: {0}s")]
    InvalidMinDisplay(f64),

    /// Probe timeout must be positive and representable as a duration
    #[error("invalid probe timeout: {0}s (must be positive and finite)")]
    InvalidProbeTimeout(f64),

    /// At least one probe call must be allowed in flight
    #[error("invalid probe concurrency: {0} (must be at least 1)")]
    InvalidProbeConcurrency(usize),

    /// Tail hold is negative or not finite
    #[error("invalid tail hold: {0}s")]
    InvalidTailHold(f64),

    /// Configuration document could not be parsed
    #[error("failed to parse configuration")]
    Parse(#[from] serde_json::Error),
}

/// Structural conversation errors.
#[derive(Debug, Error)]
pub enum InputError {
    /// Nothing to build a timeline from
    #[error("conversation is empty")]
    EmptyConversation,

    /// Parallel input lists disagree in length
    #[error("`{list}` has {got} entries but the conversation has {expected} dialogues")]
    LengthMismatch {
        list: &'static str,
        expected: usize,
        got: usize,
    },

    /// Dialogue without a speaker
    #[error("dialogue {index} has no speaker")]
    MissingSpeaker { index: usize },

    /// Dialogue references a speaker that is not in the cast
    #[error("dialogue {index} references unknown speaker `{speaker}`")]
    UnknownSpeaker { index: usize, speaker: String },
}

/// Failure reported by a TTS collaborator.
///
/// Never fatal to the engine; converted into a heuristic fallback.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Collaborator cannot serve this request (no voice, unsupported language)
    #[error("tts unavailable: {0}")]
    Unavailable(String),

    /// IO error while talking to the collaborator
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Backend-specific failure
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for dialogcue-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

// serde_json::Error → ConfigError → Error
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(ConfigError::Parse(e))
    }
}
