//! Speech synthesis collection.
//!
//! Probe calls for the spoken segments run concurrently, at most
//! `max_concurrent_probes` at a time, and are collected in request order
//! before the timeline is assembled. Failures and timeouts become heuristic fallbacks;
//! cancellation abandons the whole collection.

use crate::duration::{SpeechRate, word_count};
use crate::error::{ConfigError, Error, Result, TtsError};
use crate::tokenizer::TokenizedDialogue;
use crate::types::{AudioArtifact, DurationEstimate, EmotionKind, FallbackReason, SegmentId, Token};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default probe timeout in seconds
const DEFAULT_PROBE_TIMEOUT: f64 = 30.0;

/// Default number of probe calls in flight
const DEFAULT_MAX_CONCURRENT_PROBES: usize = 4;

/// One text segment to synthesize.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisRequest {
    pub segment: SegmentId,
    pub speaker_id: String,
    pub text: String,
    pub language_code: String,
}

/// Successful synthesis: exact duration plus the produced audio.
#[derive(Clone, Debug, PartialEq)]
pub struct Synthesis {
    pub duration_sec: f64,
    pub artifact: AudioArtifact,
}

/// External text-to-speech capability.
///
/// Only the reported duration matters for timing; the artifact is passed
/// through to the renderer untouched.
#[async_trait]
pub trait TtsProbe: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> std::result::Result<Synthesis, TtsError>;
}

/// Probe call settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisOptions {
    /// Per-call timeout in seconds (default: 30s)
    pub probe_timeout_sec: f64,

    /// Maximum probe calls in flight (default: 4)
    /// Each call may start a TTS process, so this bounds process count
    pub max_concurrent_probes: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            probe_timeout_sec: DEFAULT_PROBE_TIMEOUT,
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }
}

impl SynthesisOptions {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let timeout = self.probe_timeout_sec;
        if timeout <= 0.0 || Duration::try_from_secs_f64(timeout).is_err() {
            return Err(ConfigError::InvalidProbeTimeout(timeout));
        }

        if self.max_concurrent_probes == 0 {
            return Err(ConfigError::InvalidProbeConcurrency(self.max_concurrent_probes));
        }

        Ok(())
    }

    /// Per-call timeout; saturates for values [`validate`](Self::validate) rejects.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.probe_timeout_sec).unwrap_or(Duration::MAX)
    }

    fn concurrency(&self) -> usize {
        self.max_concurrent_probes.max(1)
    }
}

/// Dialogue segment with its timing annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotated {
    Speech {
        content: String,
        estimate: DurationEstimate,
    },
    Reaction {
        kind: EmotionKind,
    },
}

/// Dialogue whose text segments all carry a duration.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedDialogue {
    pub speaker_id: String,
    pub segments: Vec<Annotated>,
}

impl AnnotatedDialogue {
    pub fn estimates(&self) -> impl Iterator<Item = &DurationEstimate> {
        self.segments.iter().filter_map(|s| match s {
            Annotated::Speech { estimate, .. } => Some(estimate),
            Annotated::Reaction { .. } => None,
        })
    }
}

/// Build one request per text token, in conversation order.
pub fn requests(dialogues: &[TokenizedDialogue]) -> Vec<SynthesisRequest> {
    dialogues
        .iter()
        .enumerate()
        .flat_map(|(d, dialogue)| {
            dialogue
                .tokens
                .iter()
                .enumerate()
                .filter_map(move |(t, token)| {
                    token.as_text().map(|text| SynthesisRequest {
                        segment: SegmentId::new(d, t),
                        speaker_id: dialogue.input.speaker_id.clone(),
                        text: text.to_string(),
                        language_code: dialogue.input.language_code.clone(),
                    })
                })
        })
        .collect()
}

/// Annotate dialogues using the probe for every segment with words.
///
/// Returns [`Error::Cancelled`] and discards in-flight calls if `cancel`
/// fires before all probes are joined.
pub async fn annotate<P>(
    dialogues: Vec<TokenizedDialogue>,
    probe: &P,
    rate: &SpeechRate,
    options: &SynthesisOptions,
    cancel: &CancellationToken,
) -> Result<Vec<AnnotatedDialogue>>
where
    P: TtsProbe + ?Sized,
{
    let requests = requests(&dialogues);
    let timeout = options.timeout();
    let limit = options.concurrency();

    tracing::debug!(segments = requests.len(), ?timeout, limit, "probing segments");

    let calls = requests.iter().map(|request| probe_once(probe, request, timeout));

    let outcomes = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("synthesis cancelled, discarding in-flight probes");
            return Err(Error::Cancelled);
        }
        outcomes = stream::iter(calls).buffered(limit).collect::<Vec<_>>() => outcomes,
    };

    assemble(dialogues, outcomes, rate)
}

/// Annotate dialogues with heuristic durations only.
pub fn annotate_offline(
    dialogues: Vec<TokenizedDialogue>,
    rate: &SpeechRate,
) -> Result<Vec<AnnotatedDialogue>> {
    assemble(dialogues, std::iter::repeat(None), rate)
}

/// Call the probe once, converting failures into fallback reasons.
///
/// Segments without words (whitespace, stray punctuation runs) skip the probe.
async fn probe_once<P>(
    probe: &P,
    request: &SynthesisRequest,
    timeout: Duration,
) -> Option<std::result::Result<Synthesis, FallbackReason>>
where
    P: TtsProbe + ?Sized,
{
    if word_count(&request.text) == 0 {
        return None;
    }

    let outcome = match tokio::time::timeout(timeout, probe.synthesize(request)).await {
        Ok(Ok(synthesis)) => Ok(synthesis),
        Ok(Err(e)) => Err(FallbackReason::Failed {
            message: e.to_string(),
        }),
        Err(_) => Err(FallbackReason::TimedOut {
            after_sec: timeout.as_secs_f64(),
        }),
    };

    Some(outcome)
}

/// Zip probe outcomes back onto the text tokens they were issued for.
fn assemble<I>(
    dialogues: Vec<TokenizedDialogue>,
    outcomes: I,
    rate: &SpeechRate,
) -> Result<Vec<AnnotatedDialogue>>
where
    I: IntoIterator<Item = Option<std::result::Result<Synthesis, FallbackReason>>>,
{
    let mut outcomes = outcomes.into_iter();

    dialogues
        .into_iter()
        .enumerate()
        .map(|(d, dialogue)| -> Result<AnnotatedDialogue> {
            let language = &dialogue.input.language_code;

            let segments = dialogue
                .tokens
                .into_iter()
                .enumerate()
                .map(|(t, token)| -> Result<Annotated> {
                    match token {
                        Token::Text { content } => {
                            let probe = outcomes.next().flatten();
                            let estimate = rate.estimate(&content, language, probe)?;

                            Ok(Annotated::Speech {
                                estimate: DurationEstimate {
                                    segment: SegmentId::new(d, t),
                                    seconds: estimate.seconds,
                                    source: estimate.source,
                                    artifact: estimate.artifact,
                                },
                                content,
                            })
                        }
                        Token::Event { kind, .. } => Ok(Annotated::Reaction { kind }),
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(AnnotatedDialogue {
                speaker_id: dialogue.input.speaker_id,
                segments,
            })
        })
        .collect()
}
