//! Configuration for the catline server and client.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for the line server
#[derive(Parser, Debug)]
#[command(name = "catserver")]
#[command(version = "0.1.0")]
#[command(about = "Serves the lines of a file, uppercased, one per LINE request", long_about = None)]
pub struct ServerArgs {
    /// File whose lines are served
    pub file: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Command-line arguments for the checking client
#[derive(Parser, Debug)]
#[command(name = "catclient")]
#[command(version = "0.1.0")]
#[command(about = "Requests lines from a catserver and checks them against a file", long_about = None)]
pub struct ClientArgs {
    /// Reference file replies are checked against
    pub file: PathBuf,

    /// Server port
    pub port: u16,

    /// Server host
    #[arg(long)]
    pub host: Option<String>,

    /// Total run time in seconds
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Seconds to sleep after each check
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address to bind to
    #[serde(default = "default_server_host")]
    pub host: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_server_host(),
        }
    }
}

/// Client-related configuration
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    /// Server host to connect to
    #[serde(default = "default_client_host")]
    pub host: String,
    /// Total run time in seconds
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Sleep between checks in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            host: default_client_host(),
            duration: default_duration(),
            interval: default_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_client_host() -> String {
    "127.0.0.1".to_string()
}

fn default_duration() -> u64 {
    30
}

fn default_interval() -> u64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub file: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ServerArgs::parse())
    }

    /// Merge parsed arguments with the TOML file they point at, if any.
    pub fn from_args(args: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = read_toml(args.config.as_deref())?;

        Ok(ServerConfig {
            file: args.file,
            host: args.host.unwrap_or(toml_config.server.host),
            port: args.port,
            log_level: args.log_level.unwrap_or(toml_config.logging.level),
        })
    }

    /// `host:port` string used for address resolution
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub file: PathBuf,
    pub host: String,
    pub port: u16,
    pub duration: Duration,
    pub interval: Duration,
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ClientArgs::parse())
    }

    /// Merge parsed arguments with the TOML file they point at, if any.
    pub fn from_args(args: ClientArgs) -> Result<Self, ConfigError> {
        let toml_config = read_toml(args.config.as_deref())?;

        let interval = args.interval.unwrap_or(toml_config.client.interval);
        if interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        Ok(ClientConfig {
            file: args.file,
            host: args.host.unwrap_or(toml_config.client.host),
            port: args.port,
            duration: Duration::from_secs(args.duration.unwrap_or(toml_config.client.duration)),
            interval: Duration::from_secs(interval),
            log_level: args.log_level.unwrap_or(toml_config.logging.level),
        })
    }

    /// `host:port` string used for address resolution
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Number of check cycles: whole intervals that fit in the duration.
    pub fn iterations(&self) -> u64 {
        if self.interval.is_zero() {
            return 0;
        }
        (self.duration.as_nanos() / self.interval.as_nanos()) as u64
    }
}

fn read_toml(path: Option<&Path>) -> Result<TomlConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidInterval,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidInterval => write!(f, "Check interval must be at least 1 second"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.client.host, "127.0.0.1");
        assert_eq!(config.client.duration, 30);
        assert_eq!(config.client.interval, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"

            [client]
            host = "catserver"
            duration = 12
            interval = 4

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.client.host, "catserver");
        assert_eq!(config.client.duration, 12);
        assert_eq!(config.client.interval, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_positional_arguments() {
        let args = ServerArgs::try_parse_from(["catserver", "lines.txt", "7000"]).unwrap();
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.file, PathBuf::from("lines.txt"));
        assert_eq!(config.address(), "0.0.0.0:7000");
        assert_eq!(config.log_level, "info");

        assert!(ServerArgs::try_parse_from(["catserver", "lines.txt"]).is_err());
        assert!(ClientArgs::try_parse_from(["catclient", "lines.txt", "not-a-port"]).is_err());
    }

    #[test]
    fn test_default_schedule_is_ten_checks() {
        let args = ClientArgs::try_parse_from(["catclient", "lines.txt", "7000"]).unwrap();
        let config = ClientConfig::from_args(args).unwrap();
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.iterations(), 10);
        assert_eq!(config.address(), "127.0.0.1:7000");
    }

    #[test]
    fn test_iterations_round_down() {
        let args = ClientArgs::try_parse_from([
            "catclient",
            "lines.txt",
            "7000",
            "--duration",
            "10",
            "--interval",
            "3",
        ])
        .unwrap();
        let config = ClientConfig::from_args(args).unwrap();
        assert_eq!(config.iterations(), 3);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args =
            ClientArgs::try_parse_from(["catclient", "lines.txt", "7000", "--interval", "0"])
                .unwrap();
        assert!(matches!(
            ClientConfig::from_args(args),
            Err(ConfigError::InvalidInterval)
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let path = std::env::temp_dir().join(format!("catline-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[client]\nhost = \"catserver\"\ninterval = 5\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let args = ClientArgs::try_parse_from([
            "catclient",
            "lines.txt",
            "7000",
            "--config",
            path.to_str().unwrap(),
            "--interval",
            "1",
        ])
        .unwrap();
        let config = ClientConfig::from_args(args).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.host, "catserver");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_config_file() {
        let args = ServerArgs::try_parse_from([
            "catserver",
            "lines.txt",
            "7000",
            "--config",
            "/nonexistent/catline.toml",
        ])
        .unwrap();
        assert!(matches!(
            ServerConfig::from_args(args),
            Err(ConfigError::FileRead(..))
        ));
    }
}
