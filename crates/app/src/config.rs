use std::time::Duration;

use clap::Args;
use engine::report::ReportLabels;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/nexkontrol.toml";
const ENV_PREFIX: &str = "NEXKONTROL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API root, e.g. `http://localhost:5091/api`.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub credentials_path: String,
    pub log_level: String,
    /// `pt` or `en`; selects the export labels.
    pub locale: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5091/api".to_string(),
            request_timeout_secs: client::DEFAULT_TIMEOUT.as_secs(),
            credentials_path: "config/credentials.json".to_string(),
            log_level: "warn".to_string(),
            locale: "pt".to_string(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn report_labels(&self) -> Result<ReportLabels> {
        match self.locale.trim().to_lowercase().as_str() {
            "pt" | "pt-br" | "pt_br" => Ok(ReportLabels::portuguese()),
            "en" | "en-us" | "en_us" => Ok(ReportLabels::english()),
            other => Err(AppError::Input(format!("unsupported locale: {other}"))),
        }
    }
}

/// Flags shared by every subcommand; each one overrides file and env values.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override the API root (e.g. http://localhost:5091/api).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override the request timeout, in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Override where the login token is kept.
    #[arg(long, global = true)]
    credentials: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Override the export locale (pt, en).
    #[arg(long, global = true)]
    locale: Option<String>,
}

pub fn load(args: ConfigArgs) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let settings: AppConfig = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;

    apply(settings, args)
}

fn apply(mut settings: AppConfig, args: ConfigArgs) -> Result<AppConfig> {
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timeout) = args.timeout {
        settings.request_timeout_secs = timeout;
    }
    if let Some(credentials) = args.credentials {
        settings.credentials_path = credentials;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(locale) = args.locale {
        settings.locale = locale;
    }

    if settings.request_timeout_secs == 0 {
        return Err(AppError::Input(
            "request_timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}
