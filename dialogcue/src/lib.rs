//! `cue`: turns emotion-tagged dialogue scripts into render manifests and
//! SRT subtitles using [dialogcue-engine](dialogcue_engine).

pub mod build;
pub mod cli;
pub mod config;
pub mod manifest;
pub mod script;
pub mod srt;
pub mod tokens;
