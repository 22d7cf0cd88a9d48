//! Derives subtitle spans from a timeline.
//!
//! Long lines are split at word boundaries with the record's interval shared
//! out by character count; adjacent spans of one speaker whose combined
//! duration is still below the minimum are merged to avoid flicker.

use crate::error::ConfigError;
use crate::timeline::Timeline;
use crate::types::{SubtitleSpan, TIME_EPSILON, TimelineRecord};
use serde::{Deserialize, Serialize};

/// Span awaiting merge, tagged with its speaker
#[derive(Clone, Debug)]
struct Pending<'a> {
    speaker_id: &'a str,
    span: SubtitleSpan,
}

/// Subtitle splitting and merging policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubtitleAligner {
    /// Maximum characters per span (default: 42)
    /// Longer records are split at word boundaries
    pub max_chars_per_line: usize,

    /// Minimum display time (default: 1.0s)
    /// Adjacent same-speaker spans whose combined duration is shorter are merged
    pub min_display_sec: f64,
}

impl Default for SubtitleAligner {
    fn default() -> Self {
        Self::COMFORTABLE
    }
}

impl SubtitleAligner {
    /// Preset matching common subtitle guidelines: one 42-character line,
    /// shown for at least a second.
    pub const COMFORTABLE: Self = Self {
        max_chars_per_line: 42,
        min_display_sec: 1.0,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chars_per_line == 0 {
            return Err(ConfigError::InvalidLineLimit(self.max_chars_per_line));
        }

        if !self.min_display_sec.is_finite() || self.min_display_sec < 0.0 {
            return Err(ConfigError::InvalidMinDisplay(self.min_display_sec));
        }

        Ok(())
    }

    /// Derive ordered, non-overlapping subtitle spans.
    ///
    /// Records without text (reactions, idle holds) contribute nothing.
    pub fn derive(&self, timeline: &Timeline) -> Vec<SubtitleSpan> {
        let split = timeline
            .records()
            .iter()
            .filter(|r| !r.subtitle_text.trim().is_empty())
            .flat_map(|r| self.split(r));

        self.merge(split)
    }

    /// Split a record into spans of at most `max_chars_per_line` characters.
    fn split<'a>(&self, record: &'a TimelineRecord) -> Vec<Pending<'a>> {
        let lines = wrap_words(record.subtitle_text.trim(), self.max_chars_per_line);
        let total: usize = lines.iter().map(|l| l.chars().count()).sum();
        let duration = record.duration();
        let last = lines.len() - 1;

        let mut start = record.start;
        let mut consumed = 0;

        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                consumed += line.chars().count();

                let end = if i == last {
                    record.end
                } else {
                    record.start + duration * consumed as f64 / total as f64
                };

                let span = SubtitleSpan::new(line, start, end);
                start = end;

                Pending {
                    speaker_id: &record.speaker_id,
                    span,
                }
            })
            .collect()
    }

    /// Merge adjacent spans whose combined duration is below `min_display_sec`.
    fn merge<'a, I>(&self, spans: I) -> Vec<SubtitleSpan>
    where
        I: IntoIterator<Item = Pending<'a>>,
    {
        let mut out = Vec::new();
        let mut pending: Option<Pending<'a>> = None;

        for next in spans {
            pending = match pending {
                Some(mut cur) if self.should_merge(&cur, &next) => {
                    cur.span.text.push(' ');
                    cur.span.text.push_str(&next.span.text);
                    cur.span.end = next.span.end;
                    Some(cur)
                }
                Some(cur) => {
                    out.push(cur.span);
                    Some(next)
                }
                None => Some(next),
            };
        }

        out.extend(pending.map(|p| p.span));
        out
    }

    fn should_merge(&self, cur: &Pending, next: &Pending) -> bool {
        let chars = cur.span.text.chars().count() + 1 + next.span.text.chars().count();

        next.span.end - cur.span.start < self.min_display_sec
            && cur.speaker_id == next.speaker_id
            && (next.span.start - cur.span.end).abs() <= TIME_EPSILON
            && chars <= self.max_chars_per_line
    }
}

/// Greedy word wrap; a word longer than `width` gets a line of its own.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if current_chars > 0 && current_chars + 1 + word_chars > width {
            lines.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }

        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
