use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_LLM_URL: &str = "https://api.anthropic.com/v1/messages";

/// Text-generation endpoint settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub url: String,
    pub timeout: Duration,
    pub max_tokens: i32,
}

/// SMTP settings; the mail side effect is disabled without them
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub mail: Option<MailConfig>,
    pub upi_id: String,
    pub payee_name: String,
    pub assets_dir: PathBuf,
    pub log_dir: PathBuf,
    pub payment_window: Duration,
    pub http_port: u16,
    pub session_idle_ttl: Duration,
    pub max_sessions: usize,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;

        let llm = LlmConfig {
            api_key,
            model: env_or("TIXBEE_MODEL", DEFAULT_MODEL),
            url: env_or("TIXBEE_LLM_URL", DEFAULT_LLM_URL),
            timeout: Duration::from_secs(env_parse("TIXBEE_LLM_TIMEOUT_SECS", 30)?),
            max_tokens: 1024,
        };

        Ok(Self {
            llm,
            mail: MailConfig::from_env()?,
            upi_id: env_or("TIXBEE_UPI_ID", "arupiop@axl"),
            payee_name: env_or("TIXBEE_PAYEE_NAME", "TixBee"),
            assets_dir: PathBuf::from(env_or("TIXBEE_ASSETS_DIR", "assets")),
            log_dir: PathBuf::from(env_or("TIXBEE_LOG_DIR", "logs")),
            payment_window: Duration::from_secs(env_parse("TIXBEE_PAYMENT_WINDOW_SECS", 10)?),
            http_port: env_parse("TIXBEE_HTTP_PORT", 3001)?,
            session_idle_ttl: Duration::from_secs(env_parse("TIXBEE_SESSION_IDLE_SECS", 1800)?),
            max_sessions: env_parse("TIXBEE_MAX_SESSIONS", 1000)?,
        })
    }
}

impl MailConfig {
    /// `None` when no `EMAIL_*` variable is set; an error when only some are.
    pub fn from_env() -> Result<Option<Self>> {
        let host = std::env::var("EMAIL_HOST").ok();
        let port = std::env::var("EMAIL_PORT").ok();
        let username = std::env::var("EMAIL_USERNAME").ok();
        let password = std::env::var("EMAIL_PASSWORD").ok();

        match (host, port, username, password) {
            (None, None, None, None) => Ok(None),
            (Some(host), Some(port), Some(username), Some(password)) => {
                let port = port
                    .parse::<u16>()
                    .with_context(|| format!("EMAIL_PORT is not a valid port: {}", port))?;
                Ok(Some(Self {
                    host,
                    port,
                    username,
                    password,
                }))
            }
            _ => Err(anyhow!(
                "EMAIL_HOST, EMAIL_PORT, EMAIL_USERNAME and EMAIL_PASSWORD must be set together"
            )),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
