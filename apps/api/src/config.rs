use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::notices::LogLevel;
use crate::session::WizardVariant;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub case_studies_path: PathBuf,
    pub flags: FeatureFlags,
    pub port: u16,
    pub rust_log: String,
}

/// Behaviour switches, read once at startup and handed to the components that use them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlags {
    /// Generate expert solutions with the model instead of reading them from the catalog.
    pub generative_expert_solution: bool,
    pub log_level: LogLevel,
    pub wizard_variant: WizardVariant,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: optional_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            case_studies_path: optional_env("CASE_STUDIES_PATH")
                .unwrap_or_else(|| "case_studies.json".to_string())
                .into(),
            flags: FeatureFlags {
                generative_expert_solution: parse_flag(
                    "ENABLE_GENERATIVE_EXPERT_SOLUTION",
                    optional_env("ENABLE_GENERATIVE_EXPERT_SOLUTION").as_deref(),
                )?,
                log_level: optional_env("LOG_LEVEL")
                    .map(|v| LogLevel::parse(&v))
                    .unwrap_or_default(),
                wizard_variant: optional_env("WIZARD_VARIANT")
                    .map(|v| v.parse::<WizardVariant>())
                    .transpose()
                    .map_err(anyhow::Error::msg)
                    .context("WIZARD_VARIANT is invalid")?
                    .unwrap_or_default(),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests(flags: FeatureFlags) -> Self {
        Config {
            openai_api_key: "test-key".to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            case_studies_path: "case_studies.json".into(),
            flags,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Boolean flag; unset means false.
fn parse_flag(key: &str, value: Option<&str>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean (true/false), got '{other}'"),
    }
}
