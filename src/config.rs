use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ClioError;
use crate::generation::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, GenerationSettings};

pub const CONFIG_FILE: &str = "clio.json";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub generation: GenerationSettings,
    pub data_dir: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `clio.json` from the working directory when present. No file
    /// means defaults. The credential is looked up here but only required by the first
    /// generation call.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ClioError> {
        let config = match path {
            Some(path) => Self::read(PathBuf::from(path))?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE);
                if default_path.exists() {
                    Self::read(default_path)?
                } else {
                    Config::default()
                }
            }
        };
        Ok(Self::resolve_config(config, |name| std::env::var(name).ok()))
    }

    fn read(path: PathBuf) -> Result<Config, ClioError> {
        let content =
            fs::read_to_string(&path).map_err(|_| ClioError::ConfigRead(path.clone()))?;
        serde_json::from_str(&content).map_err(|err| ClioError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config<F>(config: Config, env: F) -> ResolvedConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|key| !key.trim().is_empty());
        let api_key = match config.api_key_env.as_deref() {
            Some(name) => lookup(name),
            None => lookup(DEFAULT_API_KEY_ENV).or_else(|| lookup(FALLBACK_API_KEY_ENV)),
        };

        let generation = GenerationSettings {
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            api_key,
        };

        ResolvedConfig {
            generation,
            data_dir: config.data_dir.map(Utf8PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_credential() {
        let resolved = ConfigLoader::resolve_config(Config::default(), |_| None);
        assert_eq!(resolved.generation.model, DEFAULT_MODEL);
        assert_eq!(resolved.generation.timeout, DEFAULT_TIMEOUT);
        assert!(resolved.generation.api_key.is_none());
        assert!(resolved.data_dir.is_none());
    }
}
