//! WAV duration lookup and the pre-rendered audio probe.
//!
//! Audio for segment `d:t` is stored as `dialog_{d}_{t}.wav`, the same name
//! [`crate::command::CommandProbe`] writes, so a directory produced by one
//! run can be replayed by [`WavDirProbe`].

use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use dialogcue_engine::error::TtsError;
use dialogcue_engine::synth::{Synthesis, SynthesisRequest, TtsProbe};
use dialogcue_engine::types::SegmentId;
use hound::WavReader;
use std::path::{Path, PathBuf};

/// File name of the audio for one segment.
pub fn segment_file_name(segment: SegmentId) -> String {
    format!("dialog_{}_{}.wav", segment.dialogue, segment.token)
}

/// Playback duration of a WAV file in seconds.
///
/// Only the header is read.
pub fn wav_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    // frames, not samples: independent of channel count
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Read a WAV duration off the async runtime.
pub(crate) async fn probe_wav(path: PathBuf) -> Result<Synthesis> {
    if !tokio::fs::try_exists(&path).await? {
        return Err(ProbeError::MissingArtifact(path));
    }

    let (path, duration_sec) = tokio::task::spawn_blocking(move || {
        let duration = wav_duration(&path);
        (path, duration)
    })
    .await
    .map_err(std::io::Error::other)?;

    Ok(Synthesis {
        duration_sec: duration_sec?,
        artifact: path.display().to_string().into(),
    })
}

/// Probe over a directory of pre-rendered segment audio.
#[derive(Clone, Debug)]
pub struct WavDirProbe {
    dir: PathBuf,
}

impl WavDirProbe {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, segment: SegmentId) -> PathBuf {
        self.dir.join(segment_file_name(segment))
    }
}

#[async_trait]
impl TtsProbe for WavDirProbe {
    async fn synthesize(&self, request: &SynthesisRequest) -> std::result::Result<Synthesis, TtsError> {
        let path = self.path_for(request.segment);

        tracing::debug!(segment = %request.segment, path = %path.display(), "looking up pre-rendered audio");

        Ok(probe_wav(path).await?)
    }
}
