//! Error types for dialogcue-tts.

use dialogcue_engine::error::TtsError;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Probe adapter failures.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Command template has no program
    #[error("tts command template is empty")]
    EmptyCommand,

    /// Command template is not valid shell-style words
    #[error("invalid tts command template `{template}`")]
    Template {
        template: String,
        #[source]
        source: shell_words::ParseError,
    },

    /// Template needs `{voice}` but the speaker has none
    #[error("no voice configured for speaker '{0}'")]
    UnknownVoice(String),

    /// Command ran but exited unsuccessfully
    #[error("tts command exited with {status}: {stderr}")]
    CommandFailed { status: ExitStatus, stderr: String },

    /// Expected audio file does not exist
    #[error("audio not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV header error
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

/// Result type alias for dialogcue-tts operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

// ProbeError → TtsError
impl From<ProbeError> for TtsError {
    fn from(e: ProbeError) -> Self {
        match e {
            ProbeError::UnknownVoice(_) | ProbeError::MissingArtifact(_) => {
                TtsError::Unavailable(e.to_string())
            }
            ProbeError::Io(e) => TtsError::Io(e),
            other => TtsError::Backend(Box::new(other)),
        }
    }
}
