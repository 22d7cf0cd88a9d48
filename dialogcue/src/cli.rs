//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use eyre::{Context, Result};

#[derive(Debug, Parser)]
#[command(name = "cue")]
#[command(about = "Emotion-tagged dialogue to render timelines and subtitles")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a render manifest and SRT subtitles from a script
    Build(crate::build::Args),

    /// Print the token stream of one dialogue line
    Tokens(crate::tokens::Args),

    /// Print the effective engine configuration as JSON
    Config(crate::config::ConfigArgs),
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Build(args) => {
            let config: crate::build::Config = args.try_into()?;
            let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start runtime")?;
            runtime.block_on(crate::build::execute(config)).map(drop)
        }
        Commands::Tokens(args) => crate::tokens::execute(args.try_into()?),
        Commands::Config(args) => crate::config::execute(args.try_into()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_command() {
        let cli = Cli::parse_from(["cue", "build", "podcast.json"]);

        assert!(matches!(
            &cli.command,
            Commands::Build(crate::build::Args {
                script,
                output: None,
                tts_cmd: None,
                audio_dir: None,
                preview: false,
                ..
            }) if script.to_str() == Some("podcast.json")
        ));
    }

    #[test]
    fn parses_build_with_options() {
        let cli = Cli::parse_from([
            "cue",
            "build",
            "podcast.json",
            "-o",
            "out",
            "-c",
            "cue.json",
            "--tts-cmd",
            "piper --model {voice} --output_file {out}",
            "--preview",
        ]);

        match &cli.command {
            Commands::Build(crate::build::Args {
                output: Some(output),
                config,
                tts_cmd: Some(cmd),
                preview: true,
                ..
            }) => {
                assert_eq!(output.to_str(), Some("out"));
                assert_eq!(config.config.as_deref().and_then(|p| p.to_str()), Some("cue.json"));
                assert!(cmd.starts_with("piper"));
            }
            _ => panic!("unexpected command: {:?}", cli.command),
        }
    }

    #[test]
    fn tts_cmd_conflicts_with_audio_dir() {
        let result = Cli::try_parse_from([
            "cue",
            "build",
            "podcast.json",
            "--tts-cmd",
            "say",
            "--audio-dir",
            "audio",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn parses_tokens_command() {
        let cli = Cli::parse_from(["cue", "tokens", "Hi [laugh] there"]);

        assert!(matches!(
            &cli.command,
            Commands::Tokens(crate::tokens::Args { text, .. }) if text == "Hi [laugh] there"
        ));
    }

    #[test]
    fn parses_config_command() {
        let cli = Cli::parse_from(["cue", "config"]);

        assert!(matches!(&cli.command, Commands::Config(crate::config::ConfigArgs { config: None })));
    }
}
