//! Service configuration
//!
//! Resolution order for every setting: command line → environment → TOML
//! file → compiled default. clap merges the first two tiers; the TOML file
//! comes from `--config`, or `~/.config/mentiscope/mentiscope.toml`.

use clap::Parser;
use mentiscope_common::config::{
    default_config_path, first_configured, load_toml_config, non_blank, resolve_root_folder,
    TomlConfig, DATABASE_FILE_NAME,
};
use mentiscope_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_FRONTEND_URL: &str = "https://mentiscope.vercel.app";
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const DEFAULT_LLM_TITLE: &str = "Mentiscope";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CHECKOUT_BASE_URL: &str = "https://app.dodopayments.com/checkout";

/// Command-line arguments (each also readable from the environment)
#[derive(Debug, Default, Parser)]
#[command(name = "mentiscope-api", version, about = "Student growth & readiness API")]
pub struct Cli {
    /// Folder holding the database
    #[arg(long, env = "MENTISCOPE_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "MENTISCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8000
    #[arg(long, env = "MENTISCOPE_BIND")]
    pub bind: Option<String>,

    /// Frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// LLM provider API key; analysis is skipped when unset
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    #[arg(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Support-ticket intake endpoint
    #[arg(long, env = "SUPPORT_URL")]
    pub support_url: Option<String>,

    #[arg(long, env = "FORM_SECRET", hide_env_values = true)]
    pub form_secret: Option<String>,

    /// Shared secret for payment webhook signatures; verification is off when unset
    #[arg(long, env = "PAYMENT_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    #[arg(long, env = "CHECKOUT_BASE_URL")]
    pub checkout_base_url: Option<String>,
}

/// LLM provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer`
    pub referer: String,
    /// Sent as `X-Title`
    pub title: String,
    pub timeout: Duration,
}

/// Support forwarding settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupportSettings {
    pub url: Option<String>,
    pub form_secret: String,
}

/// Payment settings
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettings {
    pub webhook_secret: Option<String>,
    pub checkout_base_url: String,
}

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub bind_address: String,
    pub frontend_url: String,
    pub llm: LlmSettings,
    pub support: SupportSettings,
    pub payments: PaymentSettings,
}

impl Default for Settings {
    /// Compiled defaults with no credentials configured
    fn default() -> Self {
        Self::merge(Cli::default(), TomlConfig::default())
    }
}

impl Settings {
    /// Resolve settings from parsed arguments plus the TOML file they point to
    pub fn resolve(cli: Cli) -> Result<Self> {
        let toml = match cli.config.clone().or_else(default_config_path) {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };

        let settings = Self::merge(cli, toml);
        settings.validate()?;
        settings.log_summary();
        Ok(settings)
    }

    /// Apply the priority order without touching the filesystem
    pub fn merge(cli: Cli, toml: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref(), &toml);
        let database_path = root_folder.join(DATABASE_FILE_NAME);

        let frontend_url = first_configured(cli.frontend_url, toml.frontend_url)
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());

        let llm = LlmSettings {
            api_key: first_configured(cli.llm_api_key, toml.llm.api_key),
            base_url: first_configured(cli.llm_base_url, toml.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: first_configured(cli.llm_model, toml.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            referer: non_blank(toml.llm.referer).unwrap_or_else(|| frontend_url.clone()),
            title: non_blank(toml.llm.title).unwrap_or_else(|| DEFAULT_LLM_TITLE.to_string()),
            timeout: Duration::from_secs(toml.llm.timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS)),
        };

        let support = SupportSettings {
            url: first_configured(cli.support_url, toml.support.url),
            form_secret: first_configured(cli.form_secret, toml.support.form_secret)
                .unwrap_or_default(),
        };

        let payments = PaymentSettings {
            webhook_secret: first_configured(cli.webhook_secret, toml.payments.webhook_secret),
            checkout_base_url: first_configured(
                cli.checkout_base_url,
                toml.payments.checkout_base_url,
            )
            .unwrap_or_else(|| DEFAULT_CHECKOUT_BASE_URL.to_string()),
        };

        Self {
            root_folder,
            database_path,
            bind_address: first_configured(cli.bind, toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            frontend_url,
            llm,
            support,
            payments,
        }
    }

    /// Reject values that would only fail later at bind or request time
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::Config(format!(
                "Invalid bind address '{}' (expected host:port)",
                self.bind_address
            )));
        }

        if !self.frontend_url.starts_with("http://") && !self.frontend_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid frontend URL '{}' (expected http:// or https://)",
                self.frontend_url
            )));
        }

        if self.llm.timeout.is_zero() {
            return Err(Error::Config("LLM timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    fn log_summary(&self) {
        info!("Root folder: {}", self.root_folder.display());
        info!("CORS origin: {}", self.frontend_url);
        match &self.llm.api_key {
            Some(_) => info!(model = %self.llm.model, base_url = %self.llm.base_url, "LLM analysis enabled"),
            None => warn!("LLM API key not configured; assessments will be stored without analysis"),
        }
        if self.support.url.is_none() {
            warn!("Support URL not configured; support tickets will be rejected");
        }
        if self.payments.webhook_secret.is_none() {
            warn!("Payment webhook secret not configured; webhook signatures are not verified");
        }
    }
}
