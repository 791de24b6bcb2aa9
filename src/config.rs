use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, error, info};

use crate::error::{BotError, Result};

const DEFAULT_LOCATION: &str = "asia-east1";
const DEFAULT_MODEL: &str = "gemini-1.5-flash-001";
const DEFAULT_TEMPERATURE: f64 = 0.6;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FETCH_MAX_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub gemini: GeminiConfig,
    pub fetch: FetchConfig,
}

/// Settings for the Vertex AI `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    pub model: String,
    pub temperature: f64,
    pub endpoint: String,
    pub timeout: Duration,
}

/// Limits applied to the `fetchWebsiteContent` tool.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_bytes: usize,
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_bytes: DEFAULT_FETCH_MAX_BYTES,
            allow_private_hosts: false,
        }
    }
}

impl GeminiConfig {
    /// Full URL of the `generateContent` method for the configured model.
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model
        )
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key))
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let required = |key: &str| {
            lookup(key).map_err(|e| {
                error!("Failed to load {key} from environment: {e}");
                BotError::EnvVar(e)
            })
        };

        let discord_token = required("DISCORD_TOKEN")?;
        let project_id = lookup("PROJECT_ID")
            .or_else(|_| lookup("GOOGLE_CLOUD_PROJECT"))
            .map_err(|e| {
                error!("Failed to load PROJECT_ID from environment: {e}");
                BotError::EnvVar(e)
            })?;
        let access_token = required("GOOGLE_ACCESS_TOKEN")?;

        let location = lookup("LOCATION").unwrap_or_else(|_| DEFAULT_LOCATION.to_string());
        let model = lookup("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let endpoint = lookup("GEMINI_ENDPOINT")
            .unwrap_or_else(|_| format!("https://{location}-aiplatform.googleapis.com"));
        let temperature = parse_or(&lookup, "GEMINI_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let model_timeout = parse_or(&lookup, "MODEL_TIMEOUT_SECS", DEFAULT_MODEL_TIMEOUT_SECS)?;

        let fetch = FetchConfig {
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            max_bytes: parse_or(&lookup, "FETCH_MAX_BYTES", DEFAULT_FETCH_MAX_BYTES)?,
            allow_private_hosts: parse_or(&lookup, "FETCH_ALLOW_PRIVATE_HOSTS", false)?,
        };

        info!("Configuration loaded (project: {project_id}, location: {location})");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("Access token length: {} characters", access_token.len());
        debug!("Gemini model: {model} (temperature {temperature})");
        debug!("Gemini endpoint: {endpoint}");
        debug!(
            "Fetch limits: {:?} timeout, {} bytes, private hosts allowed: {}",
            fetch.timeout, fetch.max_bytes, fetch.allow_private_hosts
        );

        Ok(Self {
            discord_token,
            gemini: GeminiConfig {
                project_id,
                location,
                access_token,
                model,
                temperature,
                endpoint,
                timeout: Duration::from_secs(model_timeout),
            },
            fetch,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BotError::Config(format!("{key}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}
