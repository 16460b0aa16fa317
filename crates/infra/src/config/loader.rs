//! Configuration loading.
//!
//! [`load`] merges a `.env` file into the process environment, then builds
//! a [`Config`] from environment variables. When the required variables are
//! absent it falls back to the first config file found by
//! [`probe_config_paths`].
//!
//! ## Environment Variables
//! - `DAYBOOK_DB_PATH`: database file (required)
//! - `DAYBOOK_DB_POOL_SIZE`, `DAYBOOK_DB_ENCRYPTION_KEY`
//! - `DAYBOOK_PROVIDER_TIMEOUT_SECS`: bound on one provider call
//! - `DAYBOOK_STRICT_EXTERNAL_CREATE`: fail external creates instead of
//!   falling back to local
//! - `DAYBOOK_LOG_LEVEL`, `DAYBOOK_LOG_JSON`
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`:
//!   all three or none
//! - `OPENAI_API_KEY`, `OPENAI_MODEL`
//!
//! ## Config Files
//! `daybook.toml`, `daybook.json`, `config.toml` and `config.json` are looked
//! up in the working directory and up to two of its ancestors, then next to
//! the executable.

use std::path::{Path, PathBuf};

use daybook_domain::config::{
    Config, DatabaseConfig, GoogleConfig, LoggingConfig, OpenAiConfig, ProviderConfig,
    DEFAULT_OPENAI_MODEL, OPENAI_CHAT_COMPLETIONS_URL,
};
use daybook_domain::{DaybookError, Result};
use tracing::{debug, info, warn};

const CONFIG_FILE_NAMES: [&str; 4] = ["daybook.toml", "daybook.json", "config.toml", "config.json"];
const ANCESTOR_DEPTH: usize = 2;

/// Environment first, then the first config file on disk.
///
/// # Errors
/// `Config` when neither source yields a valid configuration.
pub fn load() -> Result<Config> {
    load_dotenv();

    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment");
            Ok(config)
        }
        Err(err) => {
            debug!(error = %err, "environment incomplete, probing config files");
            load_from_file(None)
        }
    }
}

/// Merge `.env` into the process environment. Existing variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "merged .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "ignoring unreadable .env file"),
    }
}

/// # Errors
/// `Config` for a missing `DAYBOOK_DB_PATH`, an unparsable number, or a
/// partially configured Google client.
pub fn load_from_env() -> Result<Config> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from any key lookup. Blank values count as unset.
fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let vars = Vars(lookup);

    let database_defaults = DatabaseConfig::default();
    let database = DatabaseConfig {
        path: vars.required("DAYBOOK_DB_PATH")?,
        pool_size: vars.parsed("DAYBOOK_DB_POOL_SIZE")?.unwrap_or(database_defaults.pool_size),
        encryption_key: vars.get("DAYBOOK_DB_ENCRYPTION_KEY"),
    };

    let provider_defaults = ProviderConfig::default();
    let provider = ProviderConfig {
        timeout_secs: vars
            .parsed("DAYBOOK_PROVIDER_TIMEOUT_SECS")?
            .unwrap_or(provider_defaults.timeout_secs),
        strict_external_create: vars
            .flag("DAYBOOK_STRICT_EXTERNAL_CREATE")
            .unwrap_or(provider_defaults.strict_external_create),
        ..provider_defaults
    };

    let logging_defaults = LoggingConfig::default();
    let logging = LoggingConfig {
        level: vars.get("DAYBOOK_LOG_LEVEL").unwrap_or(logging_defaults.level),
        json: vars.flag("DAYBOOK_LOG_JSON").unwrap_or(logging_defaults.json),
    };

    let google = match (
        vars.get("GOOGLE_CLIENT_ID"),
        vars.get("GOOGLE_CLIENT_SECRET"),
        vars.get("GOOGLE_REDIRECT_URI"),
    ) {
        (Some(client_id), Some(secret), Some(redirect)) => {
            Some(GoogleConfig::new(client_id, secret, redirect))
        }
        (None, None, None) => None,
        _ => {
            return Err(DaybookError::Config(
                "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URI must be set together"
                    .into(),
            ))
        }
    };

    let openai = vars.get("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
        api_key,
        model: vars.get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_owned()),
        api_url: OPENAI_CHAT_COMPLETIONS_URL.to_owned(),
    });

    Ok(Config { database, google, openai, provider, logging })
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| DaybookError::Config(format!("{key} is not set")))
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|err| DaybookError::Config(format!("{key}={raw:?} is invalid: {err}")))
            })
            .transpose()
    }

    /// `1/true/yes/on` are true; any other non-blank value is false.
    fn flag(&self, key: &str) -> Option<bool> {
        self.get(key)
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") | None => Ok(Self::Json),
            Some(other) => {
                Err(DaybookError::Config(format!("unsupported config format `.{other}`")))
            }
        }
    }

    fn parse(self, contents: &str) -> Result<Config> {
        match self {
            Self::Toml => toml::from_str(contents)
                .map_err(|err| DaybookError::Config(format!("invalid TOML config: {err}"))),
            Self::Json => serde_json::from_str(contents)
                .map_err(|err| DaybookError::Config(format!("invalid JSON config: {err}"))),
        }
    }
}

/// Read `path`, or the first probed file when `None`.
///
/// # Errors
/// `Config` when no file is found, it cannot be read, or it does not
/// deserialize.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) if path.is_file() => path,
        Some(path) => {
            return Err(DaybookError::Config(format!("config file {} does not exist", path.display())))
        }
        None => probe_config_paths()
            .ok_or_else(|| DaybookError::Config("no config file found".into()))?,
    };

    let format = FileFormat::of(&path)?;
    info!(path = %path.display(), ?format, "loading configuration file");

    let contents = std::fs::read_to_string(&path).map_err(|err| {
        DaybookError::Config(format!("cannot read {}: {err}", path.display()))
    })?;
    format.parse(&contents)
}

/// First existing config file in the search order, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(ANCESTOR_DEPTH + 1).map(Path::to_path_buf));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
        dirs.push(exe_dir.to_path_buf());
    }

    first_config_in(&dirs)
}

fn first_config_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}
