//! Timeline assembly from annotated dialogues.
//!
//! Speakers talk sequentially. A single running clock is threaded through
//! the whole conversation, so every record starts where the previous one
//! ended and the timeline covers `[0, total]` without gaps.

use crate::animation::AnimationTable;
use crate::error::ConfigError;
use crate::synth::{Annotated, AnnotatedDialogue};
use crate::types::{AnimationSegment, AnimationState, TIME_EPSILON, TimelineRecord};
use serde::{Deserialize, Serialize};

/// Timeline assembly settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelinePolicy {
    /// Idle hold appended after each dialogue (default: 0s)
    pub tail_hold_sec: f64,
}

impl TimelinePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tail_hold_sec.is_finite() && self.tail_hold_sec >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidTailHold(self.tail_hold_sec))
        }
    }
}

/// Ordered records spanning a whole conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    records: Vec<TimelineRecord>,
    /// Speakers in order of first appearance
    speakers: Vec<String>,
}

impl Timeline {
    pub fn records(&self) -> &[TimelineRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TimelineRecord> {
        self.records
    }

    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// End of the last record; 0 for an empty timeline.
    pub fn total_duration(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.end)
    }

    /// Total time covered by speaking records.
    pub fn speaking_duration(&self) -> f64 {
        self.records
            .iter()
            .filter(|r| r.state == AnimationState::Speaking)
            .map(TimelineRecord::duration)
            .sum()
    }

    /// Animation states of one speaker as a time-ordered partition of the
    /// timeline.
    ///
    /// The speaker is `Idle` while others hold the floor. Zero-length records
    /// are skipped and adjacent segments in the same state are merged.
    pub fn animation_track(&self, speaker_id: &str) -> Vec<AnimationSegment> {
        let mut track: Vec<AnimationSegment> = Vec::new();

        for record in &self.records {
            if record.duration() <= TIME_EPSILON {
                continue;
            }

            let state = if record.speaker_id == speaker_id {
                record.state.clone()
            } else {
                AnimationState::Idle
            };

            match track.last_mut() {
                Some(last) if last.state == state && (record.start - last.end).abs() <= TIME_EPSILON => {
                    last.end = record.end;
                }
                _ => track.push(AnimationSegment {
                    speaker_id: speaker_id.to_string(),
                    state,
                    start: record.start,
                    end: record.end,
                }),
            }
        }

        track
    }
}

/// Places annotated dialogues on the conversation clock.
#[derive(Clone, Copy, Debug)]
pub struct TimelineBuilder<'a> {
    animations: &'a AnimationTable,
    policy: TimelinePolicy,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(animations: &'a AnimationTable, policy: TimelinePolicy) -> Self {
        Self { animations, policy }
    }

    /// Build the timeline. Never fails.
    ///
    /// Speech advances the clock by its estimate, reactions by their mapped
    /// duration. Zero-duration reactions do not advance the clock and keep
    /// token order, so the first-declared marker wins at a shared instant.
    pub fn build(&self, dialogues: &[AnnotatedDialogue]) -> Timeline {
        let mut clock = 0.0;
        let mut records = Vec::new();
        let mut speakers: Vec<String> = Vec::new();

        for dialogue in dialogues {
            let speaker_id = &dialogue.speaker_id;

            if !speakers.contains(speaker_id) {
                speakers.push(speaker_id.clone());
            }

            let dialogue_start = clock;

            for segment in &dialogue.segments {
                let record = match segment {
                    Annotated::Speech { content, estimate } => TimelineRecord {
                        start: clock,
                        end: clock + estimate.seconds,
                        speaker_id: speaker_id.clone(),
                        state: AnimationState::Speaking,
                        subtitle_text: content.clone(),
                        audio: estimate.artifact.clone(),
                    },
                    Annotated::Reaction { kind } => {
                        let animation = self.animations.map_event(*kind);

                        TimelineRecord {
                            start: clock,
                            end: clock + animation.duration_sec,
                            speaker_id: speaker_id.clone(),
                            state: animation.to_state(*kind),
                            subtitle_text: String::new(),
                            audio: None,
                        }
                    }
                };

                clock = record.end;
                records.push(record);
            }

            if self.policy.tail_hold_sec > 0.0 {
                records.push(TimelineRecord {
                    start: clock,
                    end: clock + self.policy.tail_hold_sec,
                    speaker_id: speaker_id.clone(),
                    state: AnimationState::Idle,
                    subtitle_text: String::new(),
                    audio: None,
                });
                clock += self.policy.tail_hold_sec;
            }

            tracing::trace!(speaker = %speaker_id, start = dialogue_start, end = clock, "dialogue placed");
        }

        Timeline { records, speakers }
    }
}
