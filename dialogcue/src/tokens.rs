//! Tokens subcommand - show how a dialogue line is tokenized.

use crate::config::ConfigArgs;
use dialogcue_engine::config::EngineConfig;
use dialogcue_engine::pipeline::Engine;
use dialogcue_engine::types::Token;
use eyre::Result;

/// CLI arguments for tokenizing one line.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Dialogue text, e.g. "Hi [laugh] there"
    pub text: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug)]
pub struct Config {
    pub text: String,
    pub engine: EngineConfig,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            text: args.text,
            engine: crate::config::Config::try_from(args.config)?.engine,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    let engine = Engine::new(config.engine)?;

    print!("{}", describe(&engine, &config.text));

    Ok(())
}

/// One line per token: quoted text, or the emotion with its reaction.
fn describe(engine: &Engine, text: &str) -> String {
    engine
        .tokenize(text)
        .iter()
        .map(|token| match token {
            Token::Text { content } => format!("text   {content:?}\n"),
            Token::Event { kind, marker } => {
                let animation = engine.map_event(*kind);
                format!(
                    "event  [{marker}] {kind} -> {} ({:.2}s)\n",
                    animation.state, animation.duration_sec
                )
            }
        })
        .collect()
}
