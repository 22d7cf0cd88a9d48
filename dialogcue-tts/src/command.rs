//! External TTS command probe.
//!
//! Runs one process per segment from a command template. Placeholders:
//!
//! - `{out}`: WAV path the command must write
//! - `{voice}`: the speaker's configured voice
//! - `{lang}`: the dialogue's language tag
//! - `{text}`: the segment text; when absent, the text is piped to stdin
//!
//! ```text
//! piper --model {voice} --output_file {out}
//! espeak-ng -v {lang} -w {out} {text}
//! ```

use crate::error::{ProbeError, Result};
use crate::wav::{probe_wav, segment_file_name};
use async_trait::async_trait;
use dialogcue_engine::error::TtsError;
use dialogcue_engine::synth::{Synthesis, SynthesisRequest, TtsProbe};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Probe that shells out to a TTS program.
///
/// Audio lands in a caller-owned [`TempDir`]; dropping it removes every
/// file the probe wrote.
#[derive(Debug)]
pub struct CommandProbe<'a> {
    program: String,
    args: Vec<String>,
    voices: BTreeMap<String, String>,
    workdir: &'a TempDir,
}

impl<'a> CommandProbe<'a> {
    pub fn new(template: &str, workdir: &'a TempDir) -> Result<Self> {
        let mut words = split_template(template)?.into_iter();
        let program = words.next().ok_or(ProbeError::EmptyCommand)?;

        Ok(Self {
            program,
            args: words.collect(),
            voices: BTreeMap::new(),
            workdir,
        })
    }

    pub fn with_voice(mut self, speaker_id: impl Into<String>, voice: impl Into<String>) -> Self {
        self.voices.insert(speaker_id.into(), voice.into());
        self
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn pipes_text(&self) -> bool {
        !self.args.iter().any(|arg| arg.contains("{text}"))
    }

    /// Substitute placeholders for one request.
    fn render_args(&self, request: &SynthesisRequest, out: &Path) -> Result<Vec<String>> {
        let out = out.display().to_string();
        let text = request.text.trim();

        self.args
            .iter()
            .map(|arg| {
                let mut arg = arg.replace("{out}", &out).replace("{lang}", &request.language_code);

                if arg.contains("{voice}") {
                    let voice = self
                        .voices
                        .get(&request.speaker_id)
                        .ok_or_else(|| ProbeError::UnknownVoice(request.speaker_id.clone()))?;
                    arg = arg.replace("{voice}", voice);
                }

                // text last, so placeholders spoken in it stay literal
                Ok(arg.replace("{text}", text))
            })
            .collect()
    }

    async fn run(&self, request: &SynthesisRequest) -> Result<Synthesis> {
        let out = artifact_path(self.workdir, request);
        let args = self.render_args(request, &out)?;
        let pipes_text = self.pipes_text();

        tracing::debug!(segment = %request.segment, program = %self.program, ?args, "running tts command");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if pipes_text { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // programs that ignore stdin may exit before reading it
            match stdin.write_all(request.text.trim().as_bytes()).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        probe_wav(out).await
    }
}

#[async_trait]
impl TtsProbe for CommandProbe<'_> {
    async fn synthesize(&self, request: &SynthesisRequest) -> std::result::Result<Synthesis, TtsError> {
        Ok(self.run(request).await?)
    }
}

/// Split a template into words with POSIX shell quoting rules.
fn split_template(template: &str) -> Result<Vec<String>> {
    shell_words::split(template).map_err(|source| ProbeError::Template {
        template: template.to_string(),
        source,
    })
}

/// Where [`CommandProbe`] writes the audio for a request.
pub fn artifact_path(workdir: &TempDir, request: &SynthesisRequest) -> PathBuf {
    workdir.path().join(segment_file_name(request.segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogcue_engine::types::SegmentId;

    fn request(speaker: &str, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            segment: SegmentId::new(1, 2),
            speaker_id: speaker.to_string(),
            text: text.to_string(),
            language_code: "en".to_string(),
        }
    }

    #[test]
    fn splits_quoted_words() {
        let words = split_template(r#"say -v "Daniel Premium" -o '{out}' {text}"#).unwrap();
        assert_eq!(words, ["say", "-v", "Daniel Premium", "-o", "{out}", "{text}"]);
    }

    #[test]
    fn keeps_empty_quoted_word() {
        assert_eq!(split_template(r#"tts "" x"#).unwrap(), ["tts", "", "x"]);
    }

    #[test]
    fn honors_backslash_escapes() {
        let words = split_template(r#"say "It\"s" a\ b"#).unwrap();
        assert_eq!(words, ["say", "It\"s", "a b"]);
    }

    #[test]
    fn rejects_unterminated_quote() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandProbe::new("tts 'oops", &dir).unwrap_err();

        assert!(matches!(err, ProbeError::Template { template, .. } if template == "tts 'oops"));
    }

    #[test]
    fn rejects_empty_template() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(CommandProbe::new("   ", &dir), Err(ProbeError::EmptyCommand)));
    }

    #[test]
    fn renders_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let probe = CommandProbe::new("tts --voice {voice} --lang {lang} --out {out} {text}", &dir)
            .unwrap()
            .with_voice("host", "en_US-lessac");

        let req = request("host", " Hi there ");
        let out = artifact_path(&dir, &req);
        let out_arg = out.display().to_string();
        let args = probe.render_args(&req, &out).unwrap();

        assert_eq!(
            args,
            [
                "--voice",
                "en_US-lessac",
                "--lang",
                "en",
                "--out",
                out_arg.as_str(),
                "Hi there",
            ]
        );
        assert!(out.ends_with("dialog_1_2.wav"));
        assert!(!probe.pipes_text());
    }

    #[test]
    fn placeholders_inside_text_stay_literal() {
        let dir = tempfile::tempdir().unwrap();
        let probe = CommandProbe::new("tts -m {voice} -o {out} {text}", &dir)
            .unwrap()
            .with_voice("host", "amy");

        let req = request("host", "say {voice} and {lang} out loud");
        let args = probe.render_args(&req, &artifact_path(&dir, &req)).unwrap();

        assert_eq!(args[1], "amy");
        assert_eq!(args[4], "say {voice} and {lang} out loud");
    }

    #[test]
    fn missing_voice_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let probe = CommandProbe::new("tts -m {voice} -o {out}", &dir).unwrap();

        let req = request("maya", "Hello");
        let err = probe.render_args(&req, &artifact_path(&dir, &req)).unwrap_err();

        assert!(matches!(err, ProbeError::UnknownVoice(speaker) if speaker == "maya"));
        assert!(probe.pipes_text());
    }
}
