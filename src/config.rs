use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::api_connection::Provider;
use crate::logging;

pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenRouter,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(format!("unknown provider `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub llm_provider: LlmProvider,
    pub llm_model: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,
    pub target_phone_number: Option<String>,
}

impl AppConfig {
    /// Startup entry point: loads `.env`, installs the subscriber, then reads
    /// the configuration so its fallback warnings are logged.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        logging::init();
        Self::from_env()
    }

    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            database_url: try_load("DATABASE_URL", "sqlite://meal_plans.db"),
            host: try_load("HOST", "0.0.0.0"),
            port: try_load("PORT", "8080"),
            llm_provider: try_load("LLM_PROVIDER", "anthropic"),
            llm_model: optional("LLM_MODEL"),
            backup_dir: optional("PLAN_BACKUP_DIR").map(PathBuf::from),
            twilio_account_sid: optional("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: optional("TWILIO_AUTH_TOKEN"),
            twilio_phone_number: optional("TWILIO_PHONE_NUMBER"),
            target_phone_number: optional("TARGET_PHONE_NUMBER"),
        }
    }

    pub fn provider(&self) -> Provider {
        match self.llm_provider {
            LlmProvider::Anthropic => {
                Provider::anthropic(ANTHROPIC_KEY_VAR, self.llm_model.clone())
            }
            LlmProvider::OpenRouter => {
                Provider::openrouter(OPENROUTER_KEY_VAR, self.llm_model.clone())
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value `{raw}`: {e}; using default: {default}");
        parse_default(key, default)
    })
}

fn parse_default<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(value) => value,
        Err(e) => panic!("built-in default for {key} does not parse: {e}"),
    }
}
