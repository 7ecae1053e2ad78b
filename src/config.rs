use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::cli::GlobalArgs;
use crate::error::ConfigError;

pub const ENV_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_MODE: &str = "BOT_MODE";
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
pub const ENV_WEBHOOK_HOST: &str = "WEBHOOK_HOST";
pub const ENV_WEBHOOK_PORT: &str = "WEBHOOK_PORT";
pub const ENV_ADMIN_ID: &str = "ADMIN_ID";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Polling,
    Webhook,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Polling => write!(f, "polling"),
            Mode::Webhook => write!(f, "webhook"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polling" => Ok(Mode::Polling),
            "webhook" => Ok(Mode::Webhook),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Resolved run configuration. Built once at startup and never mutated.
#[derive(Clone, PartialEq)]
pub struct RunConfig {
    pub token: String,
    pub mode: Mode,
    /// Always present in webhook mode.
    pub webhook_url: Option<Url>,
    pub bind_host: String,
    pub bind_port: u16,
    pub admin_id: Option<i64>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("token", &mask_token(&self.token))
            .field("mode", &self.mode)
            .field("webhook_url", &self.webhook_url.as_ref().map(Url::as_str))
            .field("bind_host", &self.bind_host)
            .field("bind_port", &self.bind_port)
            .field("admin_id", &self.admin_id)
            .finish()
    }
}

/// Optional TOML file layer, below flags and environment.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelegramSection {
    pub token: Option<String>,
    pub admin_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    pub mode: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_host: Option<String>,
    pub webhook_port: Option<u16>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl RunConfig {
    /// Resolve from the process environment.
    pub fn from_env(args: &GlobalArgs) -> Result<Self, ConfigError> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Merge flag > environment > config file > default, then validate.
    pub fn resolve<F>(args: &GlobalArgs, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let token = args
            .token
            .clone()
            .or_else(|| lookup(ENV_TOKEN))
            .or(file.telegram.token)
            .unwrap_or_default();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let mode = match args
            .mode
            .clone()
            .or_else(|| lookup(ENV_MODE))
            .or(file.server.mode)
        {
            Some(raw) => raw.parse()?,
            None => Mode::default(),
        };

        let raw_url = args
            .webhook_url
            .clone()
            .or_else(|| lookup(ENV_WEBHOOK_URL))
            .or(file.server.webhook_url)
            .filter(|u| !u.is_empty());
        let webhook_url = match (mode, raw_url) {
            (Mode::Webhook, None) => return Err(ConfigError::MissingWebhookUrl),
            (Mode::Webhook, Some(raw)) => Some(
                Url::parse(&raw).map_err(|source| ConfigError::InvalidWebhookUrl {
                    url: raw.clone(),
                    source,
                })?,
            ),
            // Not needed for polling, so a bad value is not an error here
            (Mode::Polling, raw) => raw.and_then(|r| Url::parse(&r).ok()),
        };

        let bind_host = args
            .webhook_host
            .clone()
            .or_else(|| lookup(ENV_WEBHOOK_HOST))
            .or(file.server.webhook_host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let bind_port = args
            .webhook_port
            .or_else(|| lookup(ENV_WEBHOOK_PORT).and_then(|v| lenient_number(&v)))
            .or(file.server.webhook_port)
            .unwrap_or(DEFAULT_PORT);

        let admin_id = args
            .admin_id
            .or_else(|| lookup(ENV_ADMIN_ID).and_then(|v| lenient_number(&v)))
            .or(file.telegram.admin_id)
            .filter(|id| *id != 0);

        Ok(Self {
            token,
            mode,
            webhook_url,
            bind_host,
            bind_port,
            admin_id,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

/// Numeric environment values that do not parse, or parse to zero, are
/// treated as unset rather than rejected.
fn lenient_number<T>(raw: &str) -> Option<T>
where
    T: FromStr + Default + PartialEq,
{
    raw.trim().parse().ok().filter(|n| *n != T::default())
}

/// Keep the first 7 and last 4 characters of a secret.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}
