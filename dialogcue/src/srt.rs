//! SRT output for derived subtitle spans.
//!
//! Spans arrive ordered and non-overlapping from the engine, so numbering is
//! positional. Times are rounded to the millisecond here and nowhere else;
//! the manifest keeps full `f64` precision.

use dialogcue_engine::types::SubtitleSpan;
use srtlib::{Subtitle, Timestamp};

/// Number spans from 1 in timeline order.
pub fn to_subtitles(spans: &[SubtitleSpan]) -> Vec<Subtitle> {
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            Subtitle::new(
                i + 1,
                secs_to_timestamp(span.start),
                secs_to_timestamp(span.end),
                span.text.clone(),
            )
        })
        .collect()
}

/// Timeline seconds as an SRT timestamp
fn secs_to_timestamp(secs: f64) -> Timestamp {
    Timestamp::from_milliseconds((secs * 1000.0).round() as u32)
}

/// SRT file body: blank-line separated entries.
pub fn display_subtitles(subtitles: &[Subtitle]) -> String {
    let entries: Vec<_> = subtitles.iter().map(Subtitle::to_string).collect();
    entries.join("\n\n")
}

/// Display preview of subtitles (first and last entries).
pub fn preview_subtitles(subtitles: &[Subtitle], head_count: usize, tail_count: usize) -> String {
    let total = subtitles.len();

    if total <= head_count + tail_count {
        return display_subtitles(subtitles);
    }

    let head = subtitles[..head_count].iter().map(|s| s.to_string());
    let tail = subtitles[total - tail_count..].iter().map(|s| s.to_string());

    head.chain(std::iter::once("...".to_string()))
        .chain(tail)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(n: usize) -> Vec<SubtitleSpan> {
        (0..n)
            .map(|i| SubtitleSpan::new(format!("line {i}"), i as f64, i as f64 + 0.5))
            .collect()
    }

    #[test]
    fn converts_spans_to_subtitles() {
        let subtitles = to_subtitles(&[
            SubtitleSpan::new("Hi", 0.0, 0.4),
            SubtitleSpan::new("there", 1.0, 1.4),
        ]);

        assert_eq!(subtitles.len(), 2);
        assert_eq!(subtitles[0].text, "Hi");
        assert!(subtitles[1].to_string().contains("00:00:01,000 --> 00:00:01,400"));
    }

    #[test]
    fn numbers_entries_from_one() {
        let subtitles = to_subtitles(&spans(3));
        let numbers: Vec<_> = subtitles.iter().map(|s| s.num).collect();

        assert_eq!(numbers, [1, 2, 3]);
        assert!(display_subtitles(&subtitles).starts_with("1\n"));
    }

    #[test]
    fn rounds_to_nearest_millisecond() {
        // 0.1 + 0.2 accumulates to 0.30000000000000004
        let subtitles = to_subtitles(&[SubtitleSpan::new("x", 0.1 + 0.2, 0.7 - 0.0000001)]);

        assert!(subtitles[0].to_string().contains("00:00:00,300 --> 00:00:00,700"));
    }

    #[test]
    fn handles_empty_spans() {
        assert!(to_subtitles(&[]).is_empty());
        assert_eq!(display_subtitles(&[]), "");
    }

    #[test]
    fn previews_head_and_tail() {
        let preview = preview_subtitles(&to_subtitles(&spans(10)), 2, 1);
        let entries: Vec<_> = preview.split("\n\n").collect();

        assert_eq!(entries.len(), 4);
        assert!(entries[1].ends_with("line 1"));
        assert_eq!(entries[2], "...");
        assert!(entries[3].ends_with("line 9"));
    }

    #[test]
    fn short_lists_are_shown_whole() {
        let subtitles = to_subtitles(&spans(3));
        assert_eq!(preview_subtitles(&subtitles, 2, 1), display_subtitles(&subtitles));
    }
}
