//! Configuration for the invite service.

use crate::scheduler::ScheduleSettings;
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connect API configuration
    pub connect: ConnectConfig,

    /// Beta group configuration
    pub beta: BetaConfig,

    /// Mailbox allocator configuration
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectConfig {
    /// Token issuer ID
    pub issuer_id: String,

    /// Key ID sent as the token header hint
    pub key_id: String,

    /// Path to the PKCS#8 P-256 private key (.p8)
    pub private_key_path: PathBuf,

    /// API base URL
    #[serde(default = "default_connect_url")]
    pub base_url: String,

    /// Token audience
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token lifetime (clamped to 15 minutes)
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Per-attempt request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt; doubles afterwards
    #[serde(default = "default_backoff_base", with = "humantime_serde")]
    pub backoff_base: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BetaConfig {
    /// Group new testers are enrolled into
    pub group_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailboxConfig {
    /// Allocator endpoint
    #[serde(default = "default_mailbox_url")]
    pub url: String,

    /// Allocator timeout
    #[serde(default = "default_mailbox_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Workers per round when the start command omits `threads`
    #[serde(default = "default_workers")]
    pub default_workers: usize,

    /// Upper bound for workers per round
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Interval when the start command omits `interval`
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub default_interval: Duration,

    /// How long a round waits for its workers
    #[serde(default = "default_round_timeout", with = "humantime_serde")]
    pub round_timeout: Duration,

    /// Record allocation and registration failures as error outcomes
    #[serde(default)]
    pub record_failures: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret required by the start and stop commands
    pub api_key: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            url: default_mailbox_url(),
            timeout: default_mailbox_timeout(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_workers: default_workers(),
            max_workers: default_max_workers(),
            default_interval: default_interval(),
            round_timeout: default_round_timeout(),
            record_failures: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_connect_url() -> String {
    connect_client::DEFAULT_BASE_URL.into()
}

fn default_audience() -> String {
    connect_client::DEFAULT_AUDIENCE.into()
}

fn default_token_ttl() -> Duration {
    connect_client::MAX_TOKEN_TTL
}

fn default_request_timeout() -> Duration {
    connect_client::DEFAULT_REQUEST_TIMEOUT
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> Duration {
    Duration::from_secs(1)
}

fn default_mailbox_url() -> String {
    mailbox_client::DEFAULT_ALLOCATOR_URL.into()
}

fn default_mailbox_timeout() -> Duration {
    mailbox_client::DEFAULT_ALLOCATOR_TIMEOUT
}

fn default_workers() -> usize {
    5
}

fn default_max_workers() -> usize {
    20
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_round_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".into()
}

impl SchedulerConfig {
    /// Resolve a start request into concrete schedule settings.
    ///
    /// Workers are clamped to `[1, max_workers]`; a negative interval
    /// becomes zero.
    pub fn schedule(&self, threads: Option<i64>, interval_secs: Option<i64>) -> ScheduleSettings {
        let max_workers = self.max_workers.max(1) as i64;
        let workers = threads
            .unwrap_or(self.default_workers as i64)
            .clamp(1, max_workers) as usize;

        let interval = interval_secs
            .map(|secs| Duration::from_secs(secs.max(0) as u64))
            .unwrap_or(self.default_interval);

        ScheduleSettings {
            workers,
            interval,
            round_timeout: self.round_timeout,
            record_failures: self.record_failures,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen_addr.trim().parse().with_context(|| {
            format!("server.listen_addr is not an IP address: {:?}", self.listen_addr)
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::from_config(config)
    }

    /// Deserialize and validate an already assembled configuration.
    pub fn from_config(config: config::Config) -> Result<Self> {
        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.connect.issuer_id.trim().is_empty() {
            bail!("connect.issuer_id must not be empty");
        }
        if self.connect.key_id.trim().is_empty() {
            bail!("connect.key_id must not be empty");
        }
        if self.beta.group_id.trim().is_empty() {
            bail!("beta.group_id must not be empty");
        }
        if self.server.api_key.expose_secret().trim().is_empty() {
            bail!("server.api_key must not be empty");
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const MINIMAL: &str = r#"
        [connect]
        issuer_id = "issuer-1"
        key_id = "KEY123"
        private_key_path = "/keys/AuthKey.p8"

        [beta]
        group_id = "G1"

        [server]
        api_key = "secret"
    "#;

    fn parse(source: &str) -> Result<Config> {
        let config = config::Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Config::from_config(config)
    }

    #[test]
    fn test_defaults() {
        let config = parse(MINIMAL).unwrap();

        assert_eq!(config.connect.base_url, "https://api.appstoreconnect.apple.com/v1");
        assert_eq!(config.connect.audience, "appstoreconnect-v1");
        assert_eq!(config.connect.token_ttl, Duration::from_secs(900));
        assert_eq!(config.connect.request_timeout, Duration::from_secs(15));
        assert_eq!(config.connect.max_attempts, 3);
        assert_eq!(config.connect.backoff_base, Duration::from_secs(1));
        assert_eq!(config.mailbox.url, "https://api.tempmail.lol/v1/email");
        assert_eq!(config.mailbox.timeout, Duration::from_secs(10));
        assert_eq!(config.scheduler.default_workers, 5);
        assert_eq!(config.scheduler.max_workers, 20);
        assert_eq!(config.scheduler.round_timeout, Duration::from_secs(60));
        assert!(!config.scheduler.record_failures);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_durations_parse_humantime() {
        let source = format!(
            "{}\n[scheduler]\ndefault_interval = \"2m\"\nround_timeout = \"90s\"\n",
            MINIMAL
        );
        let config = parse(&source).unwrap();
        assert_eq!(config.scheduler.default_interval, Duration::from_secs(120));
        assert_eq!(config.scheduler.round_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_missing_group_is_error() {
        let source = MINIMAL.replace("group_id = \"G1\"", "group_id = \"\"");
        assert!(parse(&source).is_err());
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let source = MINIMAL.replace("api_key = \"secret\"", "");
        assert!(parse(&source).is_err());
    }

    #[test]
    fn test_listen_addr() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "0.0.0.0:5000".parse::<SocketAddr>().unwrap()
        );

        let source = MINIMAL.replace(
            "api_key = \"secret\"",
            "api_key = \"secret\"\nlisten_addr = \"127.0.0.1\"\nport = 8080",
        );
        let config = parse(&source).unwrap();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_malformed_listen_addr_is_error() {
        let source = MINIMAL.replace(
            "api_key = \"secret\"",
            "api_key = \"secret\"\nlisten_addr = \"localhost:5000\"",
        );
        let err = parse(&source).unwrap_err();
        assert!(format!("{:#}", err).contains("listen_addr"));
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let config = parse(MINIMAL).unwrap();
        assert!(!format!("{:?}", config).contains("\"secret\""));
    }

    #[test]
    fn test_schedule_clamps_workers() {
        let scheduler = SchedulerConfig::default();

        assert_eq!(scheduler.schedule(None, None).workers, 5);
        assert_eq!(scheduler.schedule(Some(0), None).workers, 1);
        assert_eq!(scheduler.schedule(Some(-3), None).workers, 1);
        assert_eq!(scheduler.schedule(Some(12), None).workers, 12);
        assert_eq!(scheduler.schedule(Some(500), None).workers, 20);
    }

    #[test]
    fn test_schedule_interval() {
        let scheduler = SchedulerConfig::default();

        assert_eq!(scheduler.schedule(None, None).interval, Duration::from_secs(60));
        assert_eq!(scheduler.schedule(None, Some(5)).interval, Duration::from_secs(5));
        assert_eq!(scheduler.schedule(None, Some(-5)).interval, Duration::ZERO);
        assert_eq!(
            scheduler.schedule(None, None).round_timeout,
            Duration::from_secs(60)
        );
    }
}
