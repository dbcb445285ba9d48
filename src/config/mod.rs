//! Environment-driven configuration.
//!
//! Binaries load `.env` through dotenvy first; everything here reads plain
//! process environment so tests can build settings directly.

use std::env;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai";
pub const OPENROUTER_MODEL: &str = "openai/gpt-4o";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} has an invalid value: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Deployment environment name (`APP_ENV`), `sandbox` when unset.
pub fn get_environment() -> String {
    env::var("APP_ENV")
        .or_else(|_| env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| "sandbox".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    Gemini,
    #[default]
    OpenRouter,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(ConfigError::InvalidValue {
                var: "ANALYSIS_PROVIDER",
                value: s.to_string(),
            }),
        }
    }
}

/// Connection details for one hosted provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
}

impl ProviderSettings {
    pub fn new(api_key: Option<String>, base_url: Url, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url,
            model: model.into(),
        }
    }

    /// `base_url` without a trailing slash, ready for path concatenation.
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub environment: String,
    pub gemini: ProviderSettings,
    pub openrouter: ProviderSettings,
    pub default_provider: ProviderKind,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value,
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let default_provider = match env::var("ANALYSIS_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ProviderKind::default(),
        };

        Ok(Self {
            port,
            environment: get_environment(),
            gemini: provider_from_env(
                "GEMINI_API_KEY",
                "GEMINI_BASE_URL",
                GEMINI_BASE_URL,
                "GEMINI_MODEL",
                GEMINI_MODEL,
            )?,
            openrouter: provider_from_env(
                "OPENROUTER_API_KEY",
                "OPENROUTER_BASE_URL",
                OPENROUTER_BASE_URL,
                "OPENROUTER_MODEL",
                OPENROUTER_MODEL,
            )?,
            default_provider,
        })
    }
}

fn provider_from_env(
    key_var: &'static str,
    url_var: &'static str,
    default_url: &str,
    model_var: &'static str,
    default_model: &str,
) -> Result<ProviderSettings, ConfigError> {
    let raw_url = env::var(url_var).unwrap_or_else(|_| default_url.to_string());
    let base_url = parse_base_url(url_var, &raw_url)?;
    let model = env::var(model_var).unwrap_or_else(|_| default_model.to_string());
    Ok(ProviderSettings::new(env::var(key_var).ok(), base_url, model))
}

pub fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}
