use std::path::{Component, Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{command::Command, error::ProducerError};

/// Project-local configuration file, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".testspec.toml";
const APP_DIR: &str = "testspec-launch";
const USER_CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// How `launch` prints a descriptor.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON descriptor
    #[default]
    Json,
    /// A `cd <dir> && VAR=... python <script>` line
    Shell,
    /// One `KEY=VALUE` per line
    Env,
}

/// Command line of testspec-launch.
#[derive(Parser, Debug, Clone)]
#[command(name = "testspec-launch", version)]
#[command(about = "Turn a test scope into a tools/load_tests.py launch driven by TEST_SPECS")]
pub struct Cli {
    /// Root of the project under test [default: current directory]
    #[arg(long, global = true)]
    pub project_root: Option<String>,

    /// Configuration file [default: ./.testspec.toml, then the user config dir]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `testspec_launch=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for `launch` (json, shell, env)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings read from a TOML file. Every key is optional.
#[derive(Debug, Deserialize, Serialize, Clone, Default, Eq, PartialEq)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    pub project_root: Option<String>,
    pub format: Option<OutputFormat>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ProducerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Files consulted when no `--config` is given, in order.
    #[must_use]
    pub fn candidates(cwd: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![cwd.join(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(APP_DIR).join(USER_CONFIG_FILE_NAME));
        }
        candidates
    }

    /// Load the explicit file, or the first existing candidate, or nothing.
    pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ProducerError> {
        if let Some(path) = explicit {
            let path = resolve_path(cwd, &path.to_string_lossy());
            if !path.is_file() {
                return Err(ProducerError::ConfigNotFound(path));
            }
            return Self::load(&path);
        }
        match Self::candidates(cwd).into_iter().find(|path| path.is_file()) {
            Some(path) => {
                log::debug!("using config file {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Effective settings: command line over config file over defaults.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Config {
    pub project_root: String,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    pub fn resolve(cli: &Cli, cwd: &Path) -> Result<Self, ProducerError> {
        let file = FileConfig::locate(cli.config.as_deref(), cwd)?;
        Ok(Self::merge(cli, file, cwd))
    }

    fn merge(cli: &Cli, file: FileConfig, cwd: &Path) -> Self {
        let project_root = cli
            .project_root
            .clone()
            .or(file.project_root)
            .map_or_else(|| cwd.to_path_buf(), |root| resolve_path(cwd, &root));
        Self {
            project_root: project_root.to_string_lossy().to_string(),
            format: cli.format.or(file.format).unwrap_or_default(),
            log_level: cli
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

/// Resolve a relative path against a base directory, handling ../ and ./
/// components.
pub fn resolve_path(base_dir: &Path, relative_path: &str) -> PathBuf {
    let absolute = if Path::new(relative_path).is_absolute() {
        PathBuf::from(relative_path)
    } else {
        base_dir.join(relative_path)
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::Normal(_) | Component::RootDir | Component::Prefix(_) => {
                components.push(component);
            }
            Component::CurDir => {}
        }
    }

    PathBuf::from_iter(components)
}
