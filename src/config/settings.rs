use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST API endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API (e.g. `http://localhost:8000/api/v1`)
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

/// Push channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Base URL of the notification push channel; `/ws?token=...` is appended
    #[serde(default = "default_push_base_url")]
    pub base_url: String,
    /// Delay before the first reconnect attempt in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for any reconnect delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Automatic reconnect attempts allowed per explicit connect
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Jitter factor (0.0 to 1.0) applied to reconnect delays
    #[serde(default)]
    pub jitter_factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Unread-count poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToastConfig {
    /// Auto-dismiss delay for toast popups in seconds
    #[serde(default = "default_dismiss_after")]
    pub dismiss_after_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Access credential used by the command-line client
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `text` (default) or `json`
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_push_base_url() -> String {
    "ws://localhost:8000/api/v1/notifications".to_string()
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    60 // 1 minute
}

fn default_dismiss_after() -> u64 {
    5
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("api.base_url", default_api_base_url())?
            .set_default("api.timeout_secs", default_api_timeout())?
            .set_default("push.base_url", default_push_base_url())?
            .set_default("push.initial_delay_ms", default_initial_delay_ms())?
            .set_default("push.max_delay_ms", default_max_delay_ms())?
            .set_default("push.max_attempts", default_max_attempts())?
            .set_default("push.jitter_factor", 0.0)?
            .set_default("polling.interval_secs", default_poll_interval())?
            .set_default("toast.dismiss_after_secs", default_dismiss_after())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LEAGUE__API__BASE_URL, LEAGUE__PUSH__BASE_URL, LEAGUE__AUTH__TOKEN, ...
            .add_source(
                Environment::with_prefix("LEAGUE")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would stop the client from working at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs must be at least 1"));
        }
        if self.polling.interval_secs == 0 {
            return Err(invalid("polling.interval_secs must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.push.jitter_factor) {
            return Err(invalid("push.jitter_factor must be between 0.0 and 1.0"));
        }
        if self.push.initial_delay_ms > self.push.max_delay_ms {
            return Err(invalid("push.initial_delay_ms must not exceed push.max_delay_ms"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Message(message.to_string())
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            base_url: default_push_base_url(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            jitter_factor: 0.0,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            dismiss_after_secs: default_dismiss_after(),
        }
    }
}
