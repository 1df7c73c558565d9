//! Runtime configuration, read from the environment once at startup.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{
    DEFAULT_API_URL, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT, FontRecord, LocalFontsError,
    load_local_fonts,
};

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    LocalFonts(#[from] LocalFontsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: String,
    pub api_key: Option<String>,
    pub api_url: String,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub local_fonts: Option<PathBuf>,
    /// `*`, or a comma-separated allow-list.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            api_key: None,
            api_url: DEFAULT_API_URL.to_owned(),
            cache_ttl: DEFAULT_CACHE_TTL,
            upstream_timeout: DEFAULT_TIMEOUT,
            local_fonts: None,
            cors_origins: vec!["*".to_owned()],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Unset or blank
    /// keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_key = var("GOOGLE_FONTS_API_KEY");
        if api_key.is_none() {
            info!("GOOGLE_FONTS_API_KEY not set, Google catalog endpoints will fail");
        }

        Ok(Self {
            addr: var("FONTDECK_ADDR").unwrap_or(defaults.addr),
            api_key,
            api_url: var("GOOGLE_FONTS_API_URL").unwrap_or(defaults.api_url),
            cache_ttl: try_load(&var, "FONTDECK_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())
                .map(Duration::from_secs)?,
            upstream_timeout: try_load(
                &var,
                "FONTDECK_UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout.as_secs(),
            )
            .map(Duration::from_secs)?,
            local_fonts: var("FONTDECK_LOCAL_FONTS").map(PathBuf::from),
            cors_origins: var("FONTDECK_CORS_ORIGIN")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        })
    }

    /// The self-hosted record set; empty when no file is configured.
    pub fn local_font_records(&self) -> Result<Vec<FontRecord>, ConfigError> {
        match &self.local_fonts {
            Some(path) => Ok(load_local_fonts(path)?),
            None => Ok(Vec::new()),
        }
    }
}

fn try_load<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
