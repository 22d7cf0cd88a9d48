//! dialogcue-engine: emotion-event timeline synchronization.
//!
//! Turns dialogue lines tagged with inline emotion markers (`[laugh]`,
//! `[surprise]`, ...) into a timed timeline of speaking and reaction records
//! plus subtitle spans, ready for an external renderer.
//!
//! # Architecture
//!
//! Data flows strictly forward:
//!
//! - [`tokenizer`]: raw text → text and event tokens
//! - [`duration`] and [`synth`]: text tokens → durations, exact from a
//!   [`synth::TtsProbe`] when available, estimated otherwise
//! - [`animation`]: event tokens → reaction state and timing
//! - [`timeline`]: annotated dialogues → ordered, gap-free records
//! - [`subtitle`]: records → subtitle spans
//!
//! # Quick Start
//!
//! ```
//! use dialogcue_engine::config::EngineConfig;
//! use dialogcue_engine::pipeline::Engine;
//! use dialogcue_engine::types::DialogueInput;
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let production = engine.produce_offline(&[
//!     DialogueInput::new("host", "Hi [laugh] there", "en"),
//! ])?;
//!
//! assert!((production.timeline.total_duration() - 1.4).abs() < 1e-9);
//! # Ok::<(), dialogcue_engine::error::Error>(())
//! ```

pub mod animation;
pub mod config;
pub mod duration;
pub mod error;
pub mod pipeline;
pub mod subtitle;
pub mod synth;
pub mod timeline;
pub mod tokenizer;
pub mod types;
