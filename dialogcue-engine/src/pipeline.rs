//! High-level engine: conversation in, timeline and subtitles out.

use crate::animation::Animation;
use crate::config::EngineConfig;
use crate::error::{Error, InputError, Result};
use crate::synth::{self, AnnotatedDialogue, TtsProbe};
use crate::timeline::{Timeline, TimelineBuilder};
use crate::tokenizer::{TokenizedDialogue, Tokenizer};
use crate::types::{DialogueInput, DurationEstimate, EmotionKind, SubtitleSpan, Token};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Everything the renderer needs from one conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Production {
    pub timeline: Timeline,
    pub subtitles: Vec<SubtitleSpan>,
    /// Per-segment durations with their source flags
    pub estimates: Vec<DurationEstimate>,
}

impl Production {
    /// Number of segments whose probe failed and fell back to the heuristic.
    pub fn fallback_count(&self) -> usize {
        self.estimates
            .iter()
            .filter(|e| e.source.is_fallback())
            .count()
    }
}

/// Timeline synchronization engine over a validated configuration.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    tokenizer: Tokenizer,
}

impl Engine {
    /// Create an engine; an invalid configuration is rejected here.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let tokenizer = Tokenizer::new(config.vocabulary.clone(), config.unknown_markers);

        Ok(Self { config, tokenizer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tokenize(&self, raw_text: &str) -> Vec<Token> {
        self.tokenizer.tokenize(raw_text)
    }

    pub fn map_event(&self, kind: EmotionKind) -> &Animation {
        self.config.animations.map_event(kind)
    }

    /// Produce a timeline, consulting `probe` for exact durations.
    ///
    /// Without a probe every segment uses the heuristic. All-or-nothing:
    /// cancellation yields [`Error::Cancelled`] and no partial timeline.
    pub async fn produce(
        &self,
        dialogues: &[DialogueInput],
        probe: Option<&dyn TtsProbe>,
        cancel: &CancellationToken,
    ) -> Result<Production> {
        let tokenized = self.prepare(dialogues)?;

        let annotated = match probe {
            Some(probe) => {
                synth::annotate(
                    tokenized,
                    probe,
                    &self.config.speech,
                    &self.config.synthesis,
                    cancel,
                )
                .await?
            }
            None => synth::annotate_offline(tokenized, &self.config.speech)?,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(self.finish(annotated))
    }

    /// Produce a timeline synchronously from heuristic durations.
    pub fn produce_offline(&self, dialogues: &[DialogueInput]) -> Result<Production> {
        let tokenized = self.prepare(dialogues)?;
        let annotated = synth::annotate_offline(tokenized, &self.config.speech)?;
        Ok(self.finish(annotated))
    }

    /// Build the timeline alone, from heuristic durations.
    pub fn build_timeline(&self, dialogues: &[DialogueInput]) -> Result<Timeline> {
        Ok(self.produce_offline(dialogues)?.timeline)
    }

    pub fn derive_subtitles(&self, timeline: &Timeline) -> Vec<SubtitleSpan> {
        self.config.subtitles.derive(timeline)
    }

    /// Reject structurally invalid conversations, then tokenize.
    ///
    /// Runs before any synthesis so that nothing is spent on a request that
    /// cannot succeed.
    fn prepare(&self, dialogues: &[DialogueInput]) -> Result<Vec<TokenizedDialogue>> {
        if dialogues.is_empty() {
            return Err(InputError::EmptyConversation.into());
        }

        for (index, dialogue) in dialogues.iter().enumerate() {
            if dialogue.speaker_id.trim().is_empty() {
                return Err(InputError::MissingSpeaker { index }.into());
            }

            self.config.speech.require_rate(&dialogue.language_code)?;
        }

        Ok(self.tokenizer.tokenize_all(dialogues))
    }

    fn finish(&self, annotated: Vec<AnnotatedDialogue>) -> Production {
        let estimates: Vec<_> = annotated
            .iter()
            .flat_map(|d| d.estimates().cloned())
            .collect();

        let timeline = TimelineBuilder::new(&self.config.animations, self.config.timeline)
            .build(&annotated);

        let subtitles = self.derive_subtitles(&timeline);

        let production = Production {
            timeline,
            subtitles,
            estimates,
        };

        tracing::info!(
            records = production.timeline.records().len(),
            subtitles = production.subtitles.len(),
            fallbacks = production.fallback_count(),
            duration = %format!("{:.2}s", production.timeline.total_duration()),
            "timeline built"
        );

        production
    }
}
