//! Bot configuration.
//!
//! Configuration is a flat set of options, loadable from a TOML file or
//! constructed programmatically by an embedding application. The core
//! refuses to start unless `bot_name`, `server`, and `port` are present.

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Address family used when resolving the server host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpType {
    /// IPv4 (the default).
    #[default]
    Inet4,
    /// IPv6.
    Inet6,
}

fn default_reconnect_interval() -> u64 {
    15_000
}

fn default_ssl_verify() -> bool {
    true
}

/// Bot configuration consumed by the core.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Target host.
    pub server: String,
    /// Address family; defaults to IPv4.
    #[serde(default)]
    pub server_ip_type: IpType,
    /// TCP port.
    pub port: u16,
    /// Enable TLS.
    #[serde(default)]
    pub use_ssl: bool,
    /// Verify the server certificate against native roots. Disable only
    /// for self-signed test setups.
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
    /// Nick and username the bot registers with.
    pub bot_name: String,
    /// Optional server password, sent as PASS before registration.
    #[serde(default)]
    pub password: Option<String>,
    /// Channels auto-joined on welcome (001).
    #[serde(default)]
    pub channels: Vec<String>,
    /// Prefix for the synthesized help commands; absent disables the help
    /// surface.
    #[serde(default)]
    pub help_cmd: Option<String>,
    /// Backoff between reconnect attempts, in milliseconds.
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval: u64,
    /// Server liveness deadline in milliseconds; unset disables the check.
    #[serde(default)]
    pub server_timeout: Option<u64>,
}

impl BotConfig {
    /// Create a configuration with the required options and defaults for
    /// everything else.
    pub fn new(server: impl Into<String>, port: u16, bot_name: impl Into<String>) -> Self {
        BotConfig {
            server: server.into(),
            server_ip_type: IpType::default(),
            port,
            use_ssl: false,
            ssl_verify: true,
            bot_name: bot_name.into(),
            password: None,
            channels: Vec::new(),
            help_cmd: None,
            reconnect_interval: default_reconnect_interval(),
            server_timeout: None,
        }
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the startup contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_name.is_empty() {
            return Err(ConfigError::MissingOption("bot_name"));
        }
        if self.server.is_empty() {
            return Err(ConfigError::MissingOption("server"));
        }
        if self.port == 0 {
            return Err(ConfigError::MissingOption("port"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: BotConfig = toml::from_str(
            r##"
            server = "irc.example.net"
            server_ip_type = "inet6"
            port = 6697
            use_ssl = true
            bot_name = "examplebot"
            password = "hunter2"
            channels = ["#a", "#b"]
            help_cmd = "!help"
            reconnect_interval = 5000
            server_timeout = 120000
            "##,
        )
        .unwrap();

        assert_eq!(config.server_ip_type, IpType::Inet6);
        assert!(config.use_ssl);
        assert!(config.ssl_verify);
        assert_eq!(config.channels, vec!["#a", "#b"]);
        assert_eq!(config.server_timeout, Some(120_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_apply() {
        let config: BotConfig = toml::from_str(
            r#"
            server = "irc.example.net"
            port = 6667
            bot_name = "examplebot"
            "#,
        )
        .unwrap();

        assert_eq!(config.server_ip_type, IpType::Inet4);
        assert!(!config.use_ssl);
        assert_eq!(config.reconnect_interval, 15_000);
        assert_eq!(config.server_timeout, None);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn missing_required_options_rejected() {
        let config = BotConfig::new("", 6667, "bot");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOption("server"))
        ));

        let config = BotConfig::new("irc.example.net", 0, "bot");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOption("port"))
        ));

        let config = BotConfig::new("irc.example.net", 6667, "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOption("bot_name"))
        ));
    }
}
