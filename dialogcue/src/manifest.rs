//! Render manifest: everything a compositor needs, as plain JSON.

use crate::script::Script;
use dialogcue_engine::pipeline::Production;
use dialogcue_engine::types::{
    AnimationSegment, AudioArtifact, DurationEstimate, SubtitleSpan, TimelineRecord,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Animation segment with its resolved asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    #[serde(flatten)]
    pub segment: AnimationSegment,
    /// `None` when the cast member has no asset for the state and no idle asset
    pub asset: Option<String>,
}

/// Per-speaker animation track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastTrack {
    pub speaker_id: String,
    pub voice: Option<String>,
    pub track: Vec<TrackSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderManifest {
    pub duration: f64,
    pub cast: Vec<CastTrack>,
    pub records: Vec<TimelineRecord>,
    pub subtitles: Vec<SubtitleSpan>,
    pub estimates: Vec<DurationEstimate>,
}

impl RenderManifest {
    pub fn new(script: &Script, production: Production) -> Self {
        let timeline = &production.timeline;

        let cast = timeline
            .speakers()
            .iter()
            .map(|speaker_id| {
                let member = script.member(speaker_id);

                let track = timeline
                    .animation_track(speaker_id)
                    .into_iter()
                    .map(|segment| TrackSegment {
                        asset: member
                            .and_then(|m| m.asset_for(segment.state.name()))
                            .map(str::to_string),
                        segment,
                    })
                    .collect();

                CastTrack {
                    speaker_id: speaker_id.clone(),
                    voice: member.and_then(|m| m.voice.clone()),
                    track,
                }
            })
            .collect();

        Self {
            duration: timeline.total_duration(),
            cast,
            records: production.timeline.into_records(),
            subtitles: production.subtitles,
            estimates: production.estimates,
        }
    }

    /// Rewrite audio artifacts located under `from` to live under `to`.
    ///
    /// Returns the relocated artifacts as `(old, new)` pairs, deduplicated.
    pub fn relocate_audio(&mut self, from: &Path, to: &Path) -> Vec<(AudioArtifact, AudioArtifact)> {
        let mut moved: Vec<(AudioArtifact, AudioArtifact)> = Vec::new();

        let artifacts = self
            .records
            .iter_mut()
            .filter_map(|r| r.audio.as_mut())
            .chain(self.estimates.iter_mut().filter_map(|e| e.artifact.as_mut()));

        for artifact in artifacts {
            let Ok(name) = Path::new(artifact.as_str()).strip_prefix(from) else {
                continue;
            };

            let relocated = AudioArtifact::from(to.join(name).display().to_string());

            if !moved.iter().any(|(old, _)| old == artifact) {
                moved.push((artifact.clone(), relocated.clone()));
            }

            *artifact = relocated;
        }

        moved
    }
}
