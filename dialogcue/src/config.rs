//! Engine configuration resolution and the `config` subcommand.
//!
//! Lookup order: `--config <path>`, then `<config dir>/dialogcue/config.json`,
//! then built-in defaults.

use color_eyre::Section;
use dialogcue_engine::config::EngineConfig;
use eyre::{Context, Result, eyre};
use std::fmt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "dialogcue";
const CONFIG_FILE: &str = "config.json";

/// Default location of the user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// CLI arguments selecting the engine configuration.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Engine configuration JSON (default: <config dir>/dialogcue/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug)]
pub struct Config {
    pub engine: EngineConfig,
    pub source: ConfigSource,
}

impl TryFrom<ConfigArgs> for Config {
    type Error = eyre::Error;

    fn try_from(args: ConfigArgs) -> Result<Self> {
        let path = match args.config {
            Some(path) if !path.is_file() => {
                return Err(eyre!("config file not found: {:?}", path.display())
                    .suggestion("run `cue config > config.json` to start from the defaults"));
            }
            Some(path) => Some(path),
            None => default_config_path().filter(|p| p.is_file()),
        };

        match path {
            Some(path) => Ok(Self {
                engine: load(&path)?,
                source: ConfigSource::File(path),
            }),
            None => Ok(Self {
                engine: EngineConfig::default(),
                source: ConfigSource::Defaults,
            }),
        }
    }
}

/// Read and validate an engine configuration file.
pub fn load(path: &Path) -> Result<EngineConfig> {
    let file = std::fs::File::open(path)
        .wrap_err_with(|| format!("failed to open config: {:?}", path.display()))?;

    EngineConfig::from_reader(std::io::BufReader::new(file))
        .wrap_err_with(|| format!("invalid config: {:?}", path.display()))
}

/// Print the effective configuration as JSON.
pub fn execute(config: Config) -> Result<()> {
    tracing::info!(source = %config.source, "effective configuration");

    println!("{}", serde_json::to_string_pretty(&config.engine)?);

    Ok(())
}
