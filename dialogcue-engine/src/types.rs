//! Core types for dialogcue-engine

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing timestamps that were produced by summation.
pub(crate) const TIME_EPSILON: f64 = 1e-9;

/// One line of the input conversation.
///
/// Conversation order is semantically significant: the timeline concatenates
/// dialogues in the order they are given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueInput {
    /// Speaker identifier, used to pick character assets and voices
    pub speaker_id: String,
    /// Dialogue text, possibly containing emotion markers such as `[laugh]`
    pub raw_text: String,
    /// Free-form language tag passed to the duration estimator and TTS probe
    pub language_code: String,
}

impl DialogueInput {
    pub fn new(
        speaker_id: impl Into<String>,
        raw_text: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            raw_text: raw_text.into(),
            language_code: language_code.into(),
        }
    }

    /// Zip parallel speaker, text and language lists into a conversation.
    ///
    /// Mismatched lengths are a structural error since there is no sane
    /// per-item fallback.
    pub fn from_parallel<S, T, L>(
        speakers: &[S],
        texts: &[T],
        languages: &[L],
    ) -> Result<Vec<Self>, InputError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
        L: AsRef<str>,
    {
        if texts.is_empty() {
            return Err(InputError::EmptyConversation);
        }

        if languages.len() != texts.len() {
            return Err(InputError::LengthMismatch {
                list: "languages",
                expected: texts.len(),
                got: languages.len(),
            });
        }

        if speakers.len() != texts.len() {
            return Err(InputError::LengthMismatch {
                list: "speakers",
                expected: texts.len(),
                got: speakers.len(),
            });
        }

        Ok(speakers
            .iter()
            .zip(texts)
            .zip(languages)
            .map(|((s, t), l)| Self::new(s.as_ref(), t.as_ref(), l.as_ref()))
            .collect())
    }
}

/// Emotion carried by an inline marker.
///
/// Closed set; keywords that do not name a known emotion fall back to
/// [`EmotionKind::Neutral`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionKind {
    Laugh,
    Surprise,
    Sad,
    Excited,
    Angry,
    Confused,
    Neutral,
}

impl EmotionKind {
    pub const ALL: [Self; 7] = [
        Self::Laugh,
        Self::Surprise,
        Self::Sad,
        Self::Excited,
        Self::Angry,
        Self::Confused,
        Self::Neutral,
    ];

    /// Canonical lowercase keyword for this emotion.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Laugh => "laugh",
            Self::Surprise => "surprise",
            Self::Sad => "sad",
            Self::Excited => "excited",
            Self::Angry => "angry",
            Self::Confused => "confused",
            Self::Neutral => "neutral",
        }
    }

    /// Resolve a keyword to an emotion, case-insensitively.
    ///
    /// Never fails: unknown keywords become `Neutral`.
    pub fn from_keyword(keyword: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
            .unwrap_or(Self::Neutral)
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A piece of tokenized dialogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// Spoken text, verbatim including surrounding whitespace
    Text { content: String },
    /// Emotion marker; `marker` is the keyword as written in the source
    Event { kind: EmotionKind, marker: String },
}

impl Token {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn event(kind: EmotionKind, marker: impl Into<String>) -> Self {
        Self::Event {
            kind,
            marker: marker.into(),
        }
    }

    /// Text content, or `None` for events.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::Event { .. } => None,
        }
    }

    /// Emotion kind, or `None` for text.
    pub fn as_event(&self) -> Option<EmotionKind> {
        match self {
            Self::Text { .. } => None,
            Self::Event { kind, .. } => Some(*kind),
        }
    }
}

/// Position of a text token within the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    /// Index of the dialogue in conversation order
    pub dialogue: usize,
    /// Index of the token within the dialogue's token sequence
    pub token: usize,
}

impl SegmentId {
    pub fn new(dialogue: usize, token: usize) -> Self {
        Self { dialogue, token }
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dialogue, self.token)
    }
}

/// Opaque handle to synthesized audio, passed through to the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioArtifact(pub String);

impl AudioArtifact {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AudioArtifact {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AudioArtifact {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Why a segment fell back to the heuristic estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The probe returned an error
    Failed { message: String },
    /// The probe did not answer in time
    TimedOut { after_sec: f64 },
    /// The probe reported a zero, negative or non-finite duration
    InvalidDuration { seconds: f64 },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { message } => write!(f, "probe failed: {message}"),
            Self::TimedOut { after_sec } => write!(f, "probe timed out after {after_sec:.2}s"),
            Self::InvalidDuration { seconds } => {
                write!(f, "probe reported invalid duration {seconds}")
            }
        }
    }
}

/// Where a duration came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DurationSource {
    /// Reported by the TTS collaborator; authoritative
    Synthesized,
    /// Words-per-second estimate; `fallback` is set when a probe was tried and failed
    Heuristic { fallback: Option<FallbackReason> },
}

impl DurationSource {
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::Heuristic {
                fallback: Some(_)
            }
        )
    }
}

/// Duration of one spoken text segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub segment: SegmentId,
    /// Duration in seconds, always positive
    pub seconds: f64,
    #[serde(flatten)]
    pub source: DurationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<AudioArtifact>,
}

/// Animation state a character displays during a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Speaking,
    Reaction { emotion: EmotionKind, name: String },
}

impl AnimationState {
    /// Asset-facing state name.
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Speaking => "speaking",
            Self::Reaction { name, .. } => name,
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interval during which one speaker holds one animation state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSegment {
    pub speaker_id: String,
    pub state: AnimationState,
    pub start: f64,
    pub end: f64,
}

/// One timed unit of the output timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds; equal to `start` for single-frame reactions
    pub end: f64,
    pub speaker_id: String,
    pub state: AnimationState,
    /// Empty for reaction and idle records
    pub subtitle_text: String,
    /// Synthesized audio for speaking records, when a probe produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioArtifact>,
}

impl TimelineRecord {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Subtitle text with display interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSpan {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleSpan {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
