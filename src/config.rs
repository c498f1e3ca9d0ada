//! read configuration from a file or the environment

use std::path::Path;

use crate::errors::Error;

pub const BASE_URL_ENV: &str = "HOUSEHOLD_API_BASE_URL";

pub enum ConfigLocation {
    File(String),
    Env,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub base_url: String,
}

impl Config {
    pub fn from_values(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            base_url: std::env::var(BASE_URL_ENV)
                .map_err(|_| Error::Config(format!("Missing {BASE_URL_ENV} env var")))?,
        })
    }

    pub fn load(loc: ConfigLocation) -> Result<Self, Error> {
        match loc {
            ConfigLocation::File(path) => Self::from_file(path),
            ConfigLocation::Env => Self::from_env(),
        }
    }

    /// Parses the base URL, normalising it to end with a slash so relative paths join under it.
    pub fn base_url(&self) -> Result<reqwest::Url, Error> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(Error::Config("Base URL must not be empty".into()));
        }
        let normalised = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        reqwest::Url::parse(&normalised)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", raw, e)))
    }
}
