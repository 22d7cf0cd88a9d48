//! TTS probes for [dialogcue-engine](dialogcue_engine).
//!
//! The engine only needs an exact duration per spoken segment. These
//! adapters get it from real audio:
//!
//! - [`wav::WavDirProbe`]: looks up pre-rendered `dialog_{d}_{t}.wav` files
//! - [`command::CommandProbe`]: runs an external TTS program per segment
//!
//! Durations are read from the WAV header with `hound`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dialogcue_engine::{config::EngineConfig, pipeline::Engine, types::DialogueInput};
//! use dialogcue_tts::command::CommandProbe;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(EngineConfig::default())?;
//! let workdir = tempfile::tempdir()?;
//! let probe = CommandProbe::new("espeak-ng -v {lang} -w {out} {text}", &workdir)?;
//!
//! let _production = engine
//!     .produce(
//!         &[DialogueInput::new("host", "Hi [laugh] there", "en")],
//!         Some(&probe),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod wav;
