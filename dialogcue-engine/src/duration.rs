//! Speech duration estimation.
//!
//! A duration reported by a TTS probe is authoritative. Without one, the
//! estimate is `max(min_floor, words / words_per_second[language])`.

use crate::error::ConfigError;
use crate::synth::Synthesis;
use crate::types::{AudioArtifact, DurationSource, FallbackReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default floor preventing zero-length segments (seconds)
pub const DEFAULT_MIN_FLOOR_SEC: f64 = 0.3;

/// Result of estimating one text segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    pub seconds: f64,
    pub source: DurationSource,
    pub artifact: Option<AudioArtifact>,
}

/// Words-per-second speech model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechRate {
    /// Speaking rate keyed by lowercase language tag
    pub words_per_second: BTreeMap<String, f64>,

    /// Rate for languages missing from the table.
    /// When unset, an unlisted language is a configuration error.
    pub default_words_per_second: Option<f64>,

    /// Lower bound for any estimated segment (default: 0.3s)
    pub min_floor_sec: f64,
}

impl Default for SpeechRate {
    fn default() -> Self {
        Self {
            words_per_second: BTreeMap::from([("en".to_string(), 2.5), ("id".to_string(), 2.2)]),
            default_words_per_second: None,
            min_floor_sec: DEFAULT_MIN_FLOOR_SEC,
        }
    }
}

impl SpeechRate {
    /// Look up the rate for a language tag.
    ///
    /// Tries the exact tag, then its primary subtag (`en-US` → `en`), then
    /// the default rate.
    pub fn rate_for(&self, language: &str) -> Option<f64> {
        let tag = language.trim().to_ascii_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or(&tag);

        self.words_per_second
            .get(&tag)
            .or_else(|| self.words_per_second.get(primary))
            .copied()
            .or(self.default_words_per_second)
    }

    /// Like [`Self::rate_for`], but a missing rate is an error.
    pub fn require_rate(&self, language: &str) -> Result<f64, ConfigError> {
        self.rate_for(language)
            .ok_or_else(|| ConfigError::MissingSpeechRate {
                language: language.to_string(),
            })
    }

    /// Word-count heuristic.
    pub fn heuristic(&self, text: &str, language: &str) -> Result<f64, ConfigError> {
        let rate = self.require_rate(language)?;
        let words = word_count(text) as f64;
        Ok((words / rate).max(self.min_floor_sec))
    }

    /// Estimate a segment, preferring the probe's duration when it has one.
    ///
    /// `probe` is `None` when no probe was consulted. A failed probe or one
    /// reporting an unusable duration degrades to the heuristic with the
    /// reason recorded in the source flag.
    pub fn estimate(
        &self,
        text: &str,
        language: &str,
        probe: Option<Result<Synthesis, FallbackReason>>,
    ) -> Result<Estimate, ConfigError> {
        let fallback = match probe {
            Some(Ok(synthesis))
                if synthesis.duration_sec.is_finite() && synthesis.duration_sec > 0.0 =>
            {
                return Ok(Estimate {
                    seconds: synthesis.duration_sec,
                    source: DurationSource::Synthesized,
                    artifact: Some(synthesis.artifact),
                });
            }
            Some(Ok(synthesis)) => Some(FallbackReason::InvalidDuration {
                seconds: synthesis.duration_sec,
            }),
            Some(Err(reason)) => Some(reason),
            None => None,
        };

        if let Some(reason) = &fallback {
            tracing::warn!(%reason, text, language, "falling back to heuristic duration");
        }

        Ok(Estimate {
            seconds: self.heuristic(text, language)?,
            source: DurationSource::Heuristic { fallback },
            artifact: None,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.min_floor_sec) {
            return Err(ConfigError::InvalidMinFloor(self.min_floor_sec));
        }

        for (language, &rate) in &self.words_per_second {
            // lookups lowercase the tag, so any other key is unreachable
            if language.is_empty() || language.chars().any(|c| c.is_ascii_uppercase()) {
                return Err(ConfigError::InvalidLanguageTag(language.clone()));
            }

            if !positive(rate) {
                return Err(ConfigError::InvalidSpeechRate {
                    language: language.clone(),
                    rate,
                });
            }
        }

        match self.default_words_per_second {
            Some(rate) if !positive(rate) => Err(ConfigError::InvalidSpeechRate {
                language: "default".to_string(),
                rate,
            }),
            _ => Ok(()),
        }
    }
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english_only() -> SpeechRate {
        SpeechRate {
            words_per_second: BTreeMap::from([("en".to_string(), 2.5)]),
            default_words_per_second: None,
            min_floor_sec: 0.3,
        }
    }

    fn synthesis(duration_sec: f64) -> Synthesis {
        Synthesis {
            duration_sec,
            artifact: AudioArtifact::from("dialog_0.wav"),
        }
    }

    #[test]
    fn estimates_single_word_above_floor() {
        let seconds = english_only().heuristic("Hi ", "en").unwrap();
        assert!((seconds - 0.4).abs() < 1e-9);
    }

    #[test]
    fn applies_floor_to_empty_text() {
        let rate = english_only();
        assert!((rate.heuristic("", "en").unwrap() - 0.3).abs() < 1e-9);
        assert!((rate.heuristic("   ", "en").unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn scales_with_word_count() {
        let seconds = english_only()
            .heuristic("one two three four five", "en")
            .unwrap();
        assert!((seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_primary_subtag() {
        assert_eq!(english_only().rate_for("en-US"), Some(2.5));
        assert_eq!(english_only().rate_for("EN_gb"), Some(2.5));
    }

    #[test]
    fn unlisted_language_without_default_is_an_error() {
        let err = english_only().heuristic("Halo", "id").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSpeechRate { language } if language == "id"));
    }

    #[test]
    fn unlisted_language_uses_default_rate() {
        let rate = SpeechRate {
            default_words_per_second: Some(2.0),
            ..english_only()
        };
        assert!((rate.heuristic("a b", "fr").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn probe_duration_is_used_verbatim() {
        let estimate = english_only()
            .estimate("Hi", "en", Some(Ok(synthesis(1.234))))
            .unwrap();

        assert_eq!(estimate.seconds, 1.234);
        assert_eq!(estimate.source, DurationSource::Synthesized);
        assert_eq!(estimate.artifact, Some(AudioArtifact::from("dialog_0.wav")));
    }

    #[test]
    fn failed_probe_degrades_to_heuristic_with_flag() {
        let reason = FallbackReason::Failed {
            message: "boom".into(),
        };

        let estimate = english_only()
            .estimate("Hi", "en", Some(Err(reason.clone())))
            .unwrap();

        assert!((estimate.seconds - 0.4).abs() < 1e-9);
        assert_eq!(
            estimate.source,
            DurationSource::Heuristic {
                fallback: Some(reason)
            }
        );
        assert!(estimate.source.is_fallback());
    }

    #[test]
    fn zero_probe_duration_is_treated_as_failure() {
        let estimate = english_only()
            .estimate("Hi", "en", Some(Ok(synthesis(0.0))))
            .unwrap();

        assert!(matches!(
            estimate.source,
            DurationSource::Heuristic {
                fallback: Some(FallbackReason::InvalidDuration { .. })
            }
        ));
        assert!(estimate.artifact.is_none());
    }

    #[test]
    fn absent_probe_is_not_a_fallback() {
        let estimate = english_only().estimate("Hi", "en", None).unwrap();
        assert!(!estimate.source.is_fallback());
    }

    #[test]
    fn validates_rates() {
        let mut rate = english_only();
        rate.words_per_second.insert("xx".into(), 0.0);
        assert!(matches!(
            rate.validate(),
            Err(ConfigError::InvalidSpeechRate { language, .. }) if language == "xx"
        ));

        let rate = SpeechRate {
            min_floor_sec: 0.0,
            ..english_only()
        };
        assert!(matches!(rate.validate(), Err(ConfigError::InvalidMinFloor(_))));
    }

    #[test]
    fn rejects_uppercase_language_tags() {
        let mut rate = english_only();
        rate.words_per_second.insert("EN-us".into(), 2.5);

        assert!(matches!(
            rate.validate(),
            Err(ConfigError::InvalidLanguageTag(tag)) if tag == "EN-us"
        ));
        assert!(rate.rate_for("EN-us").is_some(), "resolved through the lowercase `en` entry");
    }
}
