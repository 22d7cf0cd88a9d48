//! Build subcommand: script in, render manifest and SRT out.

use crate::config::ConfigArgs;
use crate::manifest::RenderManifest;
use crate::script::Script;
use crate::srt;
use color_eyre::Section;
use dialogcue_engine::config::EngineConfig;
use dialogcue_engine::error::Error as EngineError;
use dialogcue_engine::pipeline::{Engine, Production};
use dialogcue_engine::types::DialogueInput;
use dialogcue_tts::command::CommandProbe;
use dialogcue_tts::wav::WavDirProbe;
use eyre::{Context, OptionExt, Result, eyre};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// CLI arguments for building a timeline.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to the script JSON
    pub script: PathBuf,

    /// Output directory (default: next to the script)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// TTS command template, e.g. "piper --model {voice} --output_file {out}"
    #[arg(long, conflicts_with = "audio_dir")]
    pub tts_cmd: Option<String>,

    /// Directory of pre-rendered `dialog_{d}_{t}.wav` files
    #[arg(long)]
    pub audio_dir: Option<PathBuf>,

    /// Print the first and last subtitles
    #[arg(long)]
    pub preview: bool,
}

/// Where exact segment durations come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeSource {
    /// Words-per-second heuristic only
    Heuristic,
    Command(String),
    AudioDir(PathBuf),
}

/// Resolved configuration for a build.
#[derive(Debug)]
pub struct Config {
    pub script: PathBuf,
    pub output_dir: PathBuf,
    pub engine: EngineConfig,
    pub probe: ProbeSource,
    pub preview: bool,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let probe = match (args.tts_cmd, args.audio_dir) {
            (Some(cmd), _) => ProbeSource::Command(cmd),
            (None, Some(dir)) if !dir.is_dir() => {
                return Err(eyre!("audio directory not found: {:?}", dir.display())
                    .suggestion("omit --audio-dir to estimate durations from word counts"));
            }
            (None, Some(dir)) => ProbeSource::AudioDir(dir),
            (None, None) => ProbeSource::Heuristic,
        };

        let output_dir = match args.output {
            Some(dir) => dir,
            None => script_dir(&args.script),
        };

        Ok(Self {
            engine: crate::config::Config::try_from(args.config)?.engine,
            script: args.script,
            output_dir,
            probe,
            preview: args.preview,
        })
    }
}

/// Output files of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct Outputs {
    pub manifest: PathBuf,
    pub srt: PathBuf,
    /// Persisted synthesized audio, when a TTS command ran
    pub audio_dir: Option<PathBuf>,
}

impl Outputs {
    fn new(output_dir: &Path, stem: &str) -> Self {
        Self {
            manifest: output_dir.join(format!("{stem}.timeline.json")),
            srt: output_dir.join(format!("{stem}.srt")),
            audio_dir: None,
        }
    }
}

/// Parent directory of the script, `.` for bare file names.
fn script_dir(script: &Path) -> PathBuf {
    match script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub async fn execute(config: Config) -> Result<Outputs> {
    let script = Script::from_path(&config.script)?;
    let dialogues = script.dialogues()?;

    let stem = config
        .script
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_eyre("script path has no file name")?;

    let mut outputs = Outputs::new(&config.output_dir, stem);

    tracing::info!(
        script = ?config.script.display(),
        dialogues = dialogues.len(),
        probe = ?config.probe,
        "building timeline"
    );

    let engine = Engine::new(config.engine)?;
    let cancel = cancel_on_ctrl_c();

    std::fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
        format!("failed to create output directory: {:?}", config.output_dir.display())
    })?;

    let s = Instant::now();

    let manifest = match &config.probe {
        ProbeSource::Heuristic => {
            RenderManifest::new(&script, produce(&engine, &dialogues, None, &cancel).await?)
        }
        ProbeSource::AudioDir(dir) => {
            let probe = WavDirProbe::new(dir);
            RenderManifest::new(&script, produce(&engine, &dialogues, Some(&probe), &cancel).await?)
        }
        ProbeSource::Command(template) => {
            // removed on drop, whatever happens below
            let workdir = tempfile::Builder::new().prefix("cue-").tempdir()?;

            let probe = script.voices().fold(
                CommandProbe::new(template, &workdir).wrap_err("invalid --tts-cmd")?,
                |probe, (speaker, voice)| probe.with_voice(speaker, voice),
            );

            let production = produce(&engine, &dialogues, Some(&probe), &cancel).await?;
            let mut manifest = RenderManifest::new(&script, production);

            let audio_dir = config.output_dir.join(format!("{stem}_audio"));
            persist_audio(&mut manifest, workdir.path(), &audio_dir)?;
            outputs.audio_dir = Some(audio_dir);

            manifest
        }
    };

    tracing::info!(duration = %format_secs(s.elapsed().as_secs_f64()), "timeline built");

    tracing::info!(path = ?outputs.manifest.display(), "write manifest");

    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&outputs.manifest, json)
        .wrap_err_with(|| format!("failed to write manifest: {:?}", outputs.manifest.display()))?;

    tracing::info!(path = ?outputs.srt.display(), "write srt file");

    let subtitles = srt::to_subtitles(&manifest.subtitles);
    std::fs::write(&outputs.srt, srt::display_subtitles(&subtitles) + "\n")
        .wrap_err_with(|| format!("failed to write srt: {:?}", outputs.srt.display()))?;

    if config.preview {
        println!("{}", srt::preview_subtitles(&subtitles, 3, 3));
    }

    Ok(outputs)
}

async fn produce(
    engine: &Engine,
    dialogues: &[DialogueInput],
    probe: Option<&dyn dialogcue_engine::synth::TtsProbe>,
    cancel: &CancellationToken,
) -> Result<Production> {
    let production = engine
        .produce(dialogues, probe, cancel)
        .await
        .map_err(|e| match e {
            EngineError::Cancelled => eyre!(e).with_note(|| "no output files were written"),
            e => eyre!(e),
        })?;

    let fallbacks = production.fallback_count();
    if fallbacks > 0 {
        tracing::warn!(
            fallbacks,
            segments = production.estimates.len(),
            "some segments use estimated durations"
        );
    }

    Ok(production)
}

/// Cancel the returned token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling synthesis");
            token.cancel();
        }
    });

    cancel
}

/// Copy synthesized audio out of the temporary workdir and point the
/// manifest at the copies.
fn persist_audio(manifest: &mut RenderManifest, workdir: &Path, audio_dir: &Path) -> Result<()> {
    let moved = manifest.relocate_audio(workdir, audio_dir);

    if moved.is_empty() {
        return Ok(());
    }

    std::fs::create_dir_all(audio_dir)
        .wrap_err_with(|| format!("failed to create audio directory: {:?}", audio_dir.display()))?;

    for (from, to) in &moved {
        std::fs::copy(from.as_str(), to.as_str())
            .wrap_err_with(|| format!("failed to copy audio {:?}", from.as_str()))?;
    }

    tracing::info!(files = moved.len(), dir = ?audio_dir.display(), "audio persisted");

    Ok(())
}

/// Format seconds as a string with two decimal places.
fn format_secs(secs: f64) -> String {
    format!("{:.2}s", secs)
}
