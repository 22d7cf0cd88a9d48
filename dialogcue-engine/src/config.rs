//! Engine configuration.
//!
//! Every tunable lives here with a documented default. Sections map to the
//! component that consumes them; [`EngineConfig::validate`] runs once at
//! startup so that a bad table fails fast instead of per request.

use crate::animation::AnimationTable;
use crate::duration::SpeechRate;
use crate::error::ConfigError;
use crate::subtitle::SubtitleAligner;
use crate::synth::SynthesisOptions;
use crate::timeline::TimelinePolicy;
use crate::tokenizer::{UnknownMarkerPolicy, Vocabulary};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Marker keyword → emotion
    pub vocabulary: Vocabulary,
    /// Handling of well-formed markers missing from the vocabulary
    pub unknown_markers: UnknownMarkerPolicy,
    /// Emotion → reaction state and timing
    pub animations: AnimationTable,
    /// Words-per-second table and minimum segment duration
    pub speech: SpeechRate,
    pub subtitles: SubtitleAligner,
    pub timeline: TimelinePolicy,
    pub synthesis: SynthesisOptions,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// Missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vocabulary.validate()?;
        self.animations.validate()?;
        self.speech.validate()?;
        self.subtitles.validate()?;
        self.timeline.validate()?;
        self.synthesis.validate()?;

        Ok(())
    }
}
