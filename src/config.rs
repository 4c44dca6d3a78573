use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub pairing: PairingSettings,
    #[serde(default)]
    pub dialog: DialogSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// How messages reach and leave the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// In-memory outbox, inbound through the HTTP API only
    #[default]
    Disabled,
    /// Telegram pushes updates to the webhook route
    Webhook,
    /// The service long-polls Telegram for updates
    Polling,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub bot_token: Option<String>,
    pub webhook_secret: Option<String>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            mode: TransportMode::default(),
            api_base: default_api_base(),
            bot_token: None,
            webhook_secret: None,
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_api_base() -> String { "https://api.telegram.org".to_string() }
fn default_poll_timeout() -> u64 { 30 }
fn default_request_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct PairingSettings {
    /// Evict waiting users after this many seconds. Unset means never.
    pub waiting_ttl_secs: Option<u64>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            waiting_ttl_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl PairingSettings {
    pub fn waiting_ttl(&self) -> Option<Duration> {
        self.waiting_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn default_sweep_interval() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct DialogSettings {
    #[serde(default = "default_dialog_idle")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_pending")]
    pub max_pending: u64,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_dialog_idle(),
            max_pending: default_max_pending(),
        }
    }
}

fn default_dialog_idle() -> u64 { 900 }
fn default_max_pending() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FLIRT__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FLIRT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FLIRT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Reject combinations that cannot start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.mode != TransportMode::Disabled
            && self.telegram.bot_token.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "telegram.bot_token (or TELEGRAM_BOT_TOKEN) is required when telegram.mode is not disabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Apply well-known environment variables that don't follow the FLIRT__ scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
        builder = builder.set_override("telegram.bot_token", token)?;
    }
    if let Ok(secret) = env::var("TELEGRAM_WEBHOOK_SECRET") {
        builder = builder.set_override("telegram.webhook_secret", secret)?;
    }

    builder.build()
}
