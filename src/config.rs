//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Product page URLs to track, in processing order
    #[serde(default)]
    pub urls: Vec<String>,

    /// Directory holding the price ledger records
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// IANA timezone used for scheduling and timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Monitor every N hours, aligned to local midnight
    #[serde(default = "default_monitor_interval_hours")]
    pub monitor_interval_hours: u32,

    /// Explicit monitor clock times ("HH:MM"); takes precedence over the interval
    #[serde(default)]
    pub monitor_times: Vec<String>,

    /// Run one monitor and one health check right after startup
    #[serde(default)]
    pub run_on_start: bool,

    /// Send an informational notice on every reading, not only new minimums
    #[serde(default)]
    pub always_notify: bool,

    /// Send health check results through the chat channel
    #[serde(default)]
    pub send_status_updates: bool,

    /// Debug mode: behaves like `always_notify`
    #[serde(default)]
    pub debug_mode: bool,

    /// Also e-mail informational notices (chat only when false)
    #[serde(default)]
    pub informational_email: bool,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay before each page request in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Page fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Health check request timeout in seconds
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,

    /// Currency symbol shown in messages
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Show prices with a decimal comma (199,90)
    #[serde(default = "default_true")]
    pub decimal_comma: bool,

    /// E-mail transport settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// SMTP credentials and recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub to: Option<String>,

    #[serde(default = "default_email_subject")]
    pub subject: String,
}

/// Telegram bot token and target chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,

    /// Bot API base URL
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_monitor_interval_hours() -> u32 {
    6
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    2000
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_health_timeout_secs() -> u64 {
    10
}

fn default_currency_symbol() -> String {
    "R$".to_string()
}

fn default_true() -> bool {
    true
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_email_subject() -> String {
    "💰 Price alert!".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            to: None,
            subject: default_email_subject(),
        }
    }
}

impl EmailConfig {
    /// True when username, password and recipient are all present.
    pub fn is_configured(&self) -> bool {
        self.username.is_some() && self.password.is_some() && self.to.is_some()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self { token: None, chat_id: None, api_base: default_telegram_api() }
    }
}

impl TelegramConfig {
    /// True when both token and chat id are present.
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            data_dir: default_data_dir(),
            timezone: default_timezone(),
            monitor_interval_hours: default_monitor_interval_hours(),
            monitor_times: Vec::new(),
            run_on_start: false,
            always_notify: false,
            send_status_updates: false,
            debug_mode: false,
            informational_email: false,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
            currency_symbol: default_currency_symbol(),
            decimal_comma: true,
            email: EmailConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("price-watch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies process environment overrides.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_env_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(urls) = var("PRODUCT_URLS") {
            let urls = parse_url_list(&urls);
            if !urls.is_empty() {
                self.urls = urls;
            }
        }

        if let Some(v) = var("SEND_NOTIFICATIONS").as_deref().and_then(parse_bool) {
            self.always_notify = v;
        }
        if let Some(v) = var("SEND_STATUS_TELEGRAM").as_deref().and_then(parse_bool) {
            self.send_status_updates = v;
        }
        if let Some(v) = var("DEBUG_MODE").as_deref().and_then(parse_bool) {
            self.debug_mode = v;
        }

        if let Some(token) = var("TELEGRAM_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.token = Some(token);
        }
        if let Some(chat_id) = var("TELEGRAM_CHAT_ID").filter(|v| !v.is_empty()) {
            self.telegram.chat_id = Some(chat_id);
        }

        if let Some(user) = var("EMAIL_USER").filter(|v| !v.is_empty()) {
            self.email.username = Some(user);
        }
        if let Some(pass) = var("EMAIL_PASS").filter(|v| !v.is_empty()) {
            self.email.password = Some(pass);
        }
        if let Some(to) = var("EMAIL_TO").filter(|v| !v.is_empty()) {
            self.email.to = Some(to);
        }
        if let Some(host) = var("SMTP_HOST").filter(|v| !v.is_empty()) {
            self.email.smtp_host = host;
        }
        if let Some(port) = var("SMTP_PORT").and_then(|v| v.parse().ok()) {
            self.email.smtp_port = port;
        }

        if let Some(tz) = var("PRICE_WATCH_TIMEZONE").filter(|v| v.parse::<Tz>().is_ok()) {
            self.timezone = tz;
        }
        if let Some(dir) = var("PRICE_WATCH_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(proxy) = var("PRICE_WATCH_PROXY").filter(|v| !v.is_empty()) {
            self.proxy = Some(proxy);
        }
        if let Some(delay) = var("PRICE_WATCH_DELAY").and_then(|v| v.parse().ok()) {
            self.delay_ms = delay;
        }

        self
    }

    /// Parses the configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }
}

/// Splits a comma-separated URL list, dropping blanks.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|u| !u.is_empty()).map(String::from).collect()
}

/// Lenient boolean parsing for environment flags.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.urls.is_empty());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.timezone, "America/Sao_Paulo");
        assert_eq!(config.monitor_interval_hours, 6);
        assert!(config.monitor_times.is_empty());
        assert!(!config.run_on_start);
        assert!(!config.always_notify);
        assert!(!config.send_status_updates);
        assert!(!config.debug_mode);
        assert!(!config.informational_email);
        assert_eq!(config.health_timeout_secs, 10);
        assert_eq!(config.currency_symbol, "R$");
        assert!(config.decimal_comma);
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 465);
        assert!(!config.email.is_configured());
        assert!(!config.telegram.is_configured());
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            urls = ["https://a.com/1", "https://b.com/2"]
            timezone = "Europe/Lisbon"
            monitor_times = ["00:00", "12:30"]
            debug_mode = true

            [telegram]
            token = "123:abc"
            chat_id = "42"

            [email]
            username = "me@example.com"
            password = "secret"
            to = "you@example.com"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.urls, vec!["https://a.com/1", "https://b.com/2"]);
        assert_eq!(config.timezone, "Europe/Lisbon");
        assert_eq!(config.monitor_times, vec!["00:00", "12:30"]);
        assert!(config.debug_mode);
        assert!(config.telegram.is_configured());
        assert!(config.email.is_configured());
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.delay_ms, 1000);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            urls = ["https://example.com/p"]
            monitor_interval_hours = 4
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.urls, vec!["https://example.com/p"]);
        assert_eq!(config.monitor_interval_hours, 4);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"always_notify = true"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.always_notify);
    }

    #[test]
    fn test_with_env_overrides() {
        let config = Config::new().with_env_from(env(&[
            ("PRODUCT_URLS", "https://a.com/1, https://b.com/2,,"),
            ("SEND_NOTIFICATIONS", "True"),
            ("SEND_STATUS_TELEGRAM", "yes"),
            ("DEBUG_MODE", "FALSE"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100"),
            ("EMAIL_USER", "me@example.com"),
            ("EMAIL_PASS", "secret"),
            ("EMAIL_TO", "you@example.com"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "587"),
            ("PRICE_WATCH_TIMEZONE", "UTC"),
            ("PRICE_WATCH_DATA_DIR", "/var/lib/price-watch"),
            ("PRICE_WATCH_DELAY", "0"),
        ]));

        assert_eq!(config.urls, vec!["https://a.com/1", "https://b.com/2"]);
        assert!(config.always_notify);
        assert!(config.send_status_updates);
        assert!(!config.debug_mode);
        assert_eq!(config.telegram.token.as_deref(), Some("123:abc"));
        assert_eq!(config.telegram.chat_id.as_deref(), Some("-100"));
        assert!(config.email.is_configured());
        assert_eq!(config.email.smtp_host, "smtp.example.com");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/price-watch"));
        assert_eq!(config.delay_ms, 0);
    }

    #[test]
    fn test_with_env_invalid_values_ignored() {
        let config = Config::new().with_env_from(env(&[
            ("PRODUCT_URLS", " , "),
            ("DEBUG_MODE", "maybe"),
            ("SMTP_PORT", "not_a_port"),
            ("PRICE_WATCH_TIMEZONE", "Mars/Olympus"),
            ("TELEGRAM_TOKEN", ""),
        ]));

        assert!(config.urls.is_empty());
        assert!(!config.debug_mode);
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.timezone, "America/Sao_Paulo");
        assert!(config.telegram.token.is_none());
    }

    #[test]
    fn test_tz() {
        assert_eq!(Config::default().tz().unwrap(), chrono_tz::America::Sao_Paulo);

        let config = Config { timezone: "Nowhere/City".to_string(), ..Config::default() };
        assert!(config.tz().unwrap_err().to_string().contains("Invalid timezone"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
