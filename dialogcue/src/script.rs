//! Conversation script files.
//!
//! ```json
//! {
//!   "cast": [
//!     { "id": "host", "voice": "en_US-ryan", "assets": { "idle": "host.png", "shake": "host_shake.png" } },
//!     { "id": "maya", "voice": "en_US-amy", "assets": { "idle": "maya.png" } }
//!   ],
//!   "turn_length": 2,
//!   "texts": ["Hey everyone! [laugh] Hahaha", "Hi! [excited] Wohoo"],
//!   "languages": ["en", "en"]
//! }
//! ```
//!
//! Without an explicit `speakers` list, dialogues rotate through the cast
//! `turn_length` lines at a time.

use color_eyre::Section;
use dialogcue_engine::error::InputError;
use dialogcue_engine::types::DialogueInput;
use eyre::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TURN_LENGTH: usize = 2;

/// One character of the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastMember {
    pub id: String,
    /// Voice passed to the TTS command as `{voice}`
    #[serde(default)]
    pub voice: Option<String>,
    /// Animation state name → asset handle; `idle` is the fallback
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
}

impl CastMember {
    /// Asset for a state, falling back to the idle asset.
    pub fn asset_for(&self, state: &str) -> Option<&str> {
        self.assets
            .get(state)
            .or_else(|| self.assets.get("idle"))
            .map(String::as_str)
    }
}

/// Parsed script file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub cast: Vec<CastMember>,

    /// Consecutive lines per speaker when rotating (default: 2)
    #[serde(default = "default_turn_length")]
    pub turn_length: usize,

    pub texts: Vec<String>,

    /// Language tag per text
    pub languages: Vec<String>,

    /// Explicit speaker per text; overrides rotation
    #[serde(default)]
    pub speakers: Option<Vec<String>>,
}

fn default_turn_length() -> usize {
    DEFAULT_TURN_LENGTH
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read script: {:?}", path.display()))?;

        serde_json::from_str(&json)
            .wrap_err_with(|| format!("failed to parse script: {:?}", path.display()))
    }

    pub fn member(&self, id: &str) -> Option<&CastMember> {
        self.cast.iter().find(|m| m.id == id)
    }

    /// Speaker of dialogue `index` under rotation.
    fn rotated_speaker(&self, index: usize) -> &str {
        &self.cast[(index / self.turn_length) % self.cast.len()].id
    }

    /// Resolve the script into an ordered conversation.
    pub fn dialogues(&self) -> Result<Vec<DialogueInput>> {
        ensure!(!self.cast.is_empty(), "script has no cast members");
        ensure!(self.turn_length > 0, "turn_length must be at least 1");

        let speakers: Vec<&str> = match &self.speakers {
            Some(speakers) => speakers.iter().map(String::as_str).collect(),
            None => (0..self.texts.len()).map(|i| self.rotated_speaker(i)).collect(),
        };

        let dialogues = DialogueInput::from_parallel(&speakers, &self.texts, &self.languages)
            .map_err(|e| {
                let mismatch = matches!(e, InputError::LengthMismatch { .. });
                let report = eyre::Report::new(e);
                if mismatch {
                    report.suggestion("`texts`, `languages` and `speakers` must be parallel lists")
                } else {
                    report
                }
            })?;

        if let Some((index, dialogue)) = dialogues
            .iter()
            .enumerate()
            .find(|(_, d)| self.member(&d.speaker_id).is_none())
        {
            let known: Vec<_> = self.cast.iter().map(|m| m.id.as_str()).collect();

            let report = eyre::Report::new(InputError::UnknownSpeaker {
                index,
                speaker: dialogue.speaker_id.clone(),
            });

            return Err(report.with_note(|| format!("cast: {}", known.join(", "))));
        }

        Ok(dialogues)
    }

    /// `(speaker, voice)` pairs for cast members with a voice.
    pub fn voices(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cast
            .iter()
            .filter_map(|m| Some((m.id.as_str(), m.voice.as_deref()?)))
    }
}
