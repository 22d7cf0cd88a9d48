//! Animation state mapping for emotion events.
//!
//! The table is the single source of truth for reaction timing and motion;
//! changing how a reaction feels means changing the table only.

use crate::error::ConfigError;
use crate::types::{AnimationState, EmotionKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Render parameters for one reaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Asset-facing state name, e.g. `shake`
    pub state: String,
    /// How long the reaction holds the timeline (seconds, may be 0)
    pub duration_sec: f64,
    /// Whether the renderer may loop the motion for the whole window
    pub loopable: bool,
    /// Peak horizontal offset in pixels
    #[serde(default)]
    pub amplitude: f32,
    /// Oscillation frequency in radians per second
    #[serde(default)]
    pub frequency: f32,
}

impl Animation {
    pub fn new(state: &str, duration_sec: f64, loopable: bool, amplitude: f32, frequency: f32) -> Self {
        Self {
            state: state.to_string(),
            duration_sec,
            loopable,
            amplitude,
            frequency,
        }
    }

    /// Timeline state for a reaction of the given emotion.
    pub fn to_state(&self, emotion: EmotionKind) -> AnimationState {
        AnimationState::Reaction {
            emotion,
            name: self.state.clone(),
        }
    }
}

/// Lookup table from emotion to reaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationTable {
    pub reactions: BTreeMap<EmotionKind, Animation>,
    /// Used for kinds absent from `reactions`
    pub fallback: Animation,
}

impl Default for AnimationTable {
    fn default() -> Self {
        use EmotionKind::*;

        Self {
            reactions: BTreeMap::from([
                (Laugh, Animation::new("shake", 0.6, true, 15.0, 20.0)),
                (Surprise, Animation::new("jolt", 0.4, false, 20.0, 30.0)),
                (Sad, Animation::new("droop", 0.5, false, 5.0, 10.0)),
                (Excited, Animation::new("bounce", 0.5, true, 25.0, 40.0)),
                (Angry, Animation::new("tremble", 0.5, true, 30.0, 50.0)),
                (Confused, Animation::new("tilt", 0.5, false, 10.0, 15.0)),
            ]),
            fallback: Animation::new("idle-reaction", 0.0, false, 5.0, 10.0),
        }
    }
}

impl AnimationTable {
    /// Map an emotion to its reaction. Pure lookup; never fails.
    pub fn map_event(&self, kind: EmotionKind) -> &Animation {
        self.reactions.get(&kind).unwrap_or(&self.fallback)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = self
            .reactions
            .iter()
            .map(|(k, v)| (k.keyword(), v))
            .chain([("fallback", &self.fallback)]);

        for (key, animation) in entries {
            if animation.state.trim().is_empty() {
                return Err(ConfigError::EmptyAnimationState(key.to_string()));
            }

            if !animation.duration_sec.is_finite() || animation.duration_sec < 0.0 {
                return Err(ConfigError::InvalidAnimationDuration {
                    state: animation.state.clone(),
                    duration: animation.duration_sec,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_laugh_to_shake() {
        let table = AnimationTable::default();
        let animation = table.map_event(EmotionKind::Laugh);

        assert_eq!(animation.state, "shake");
        assert_eq!(animation.duration_sec, 0.6);
        assert!(animation.loopable);
    }

    #[test]
    fn maps_surprise_to_jolt() {
        let table = AnimationTable::default();
        let animation = table.map_event(EmotionKind::Surprise);

        assert_eq!(animation.state, "jolt");
        assert_eq!(animation.duration_sec, 0.4);
        assert!(!animation.loopable);
    }

    #[test]
    fn unmapped_kind_uses_fallback() {
        let table = AnimationTable::default();
        let animation = table.map_event(EmotionKind::Neutral);

        assert_eq!(animation.state, "idle-reaction");
        assert_eq!(animation.duration_sec, 0.0);
    }

    #[test]
    fn mapping_is_idempotent() {
        let table = AnimationTable::default();

        for kind in EmotionKind::ALL {
            assert_eq!(table.map_event(kind), table.map_event(kind));
        }
    }

    #[test]
    fn builds_reaction_state() {
        let table = AnimationTable::default();
        let state = table.map_event(EmotionKind::Laugh).to_state(EmotionKind::Laugh);

        assert_eq!(state.name(), "shake");
    }

    #[test]
    fn rejects_negative_duration() {
        let mut table = AnimationTable::default();
        table.fallback.duration_sec = -1.0;

        assert!(matches!(
            table.validate(),
            Err(ConfigError::InvalidAnimationDuration { state, .. }) if state == "idle-reaction"
        ));
    }

    #[test]
    fn deserializes_partial_table() {
        let json = r#"{
            "reactions": { "laugh": { "state": "giggle", "duration_sec": 1.0, "loopable": true } }
        }"#;

        let table: AnimationTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.map_event(EmotionKind::Laugh).state, "giggle");
        assert_eq!(table.map_event(EmotionKind::Surprise).state, "idle-reaction");
    }
}
