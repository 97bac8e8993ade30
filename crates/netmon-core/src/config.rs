//! Configuration types for the netmon system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default addresses probed to decide whether the LAN link is up.
///
/// Any one of these answering is taken as sufficient evidence, so the set
/// covers the gateway addresses consumer routers commonly ship with.
pub const DEFAULT_LOCAL_ADDRESSES: &[&str] = &[
    "10.0.1.1",
    "192.168.0.1",
    "192.168.1.1",
    "192.168.2.1",
    "192.168.3.1",
    "192.168.50.1",
];

/// Default addresses probed to decide whether the internet is reachable.
pub const DEFAULT_REMOTE_ADDRESSES: &[&str] = &[
    "208.67.222.222", // OpenDNS
    "8.8.8.8",        // Google DNS
    "1.1.1.1",        // Cloudflare DNS
];

/// Main monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Stable client identifier attached to every measurement (MAC-derived)
    pub client_id: String,

    /// How to decide local-network reachability
    #[serde(default)]
    pub local_check: LocalCheck,

    /// How to decide internet reachability
    #[serde(default)]
    pub remote_check: RemoteCheck,

    /// Destination database; `None` disables publishing
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Interval between connectivity checks
    #[serde(default = "default_connection_interval")]
    pub connection_interval: Duration,

    /// Interval between speed tests
    #[serde(default = "default_speed_interval")]
    pub speed_interval: Duration,

    /// Upper bound on a single probe run
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: Duration,

    /// One grace sleep before the first wake in continuous mode, so a host
    /// that just resumed from sleep can re-establish its network link
    #[serde(default = "default_startup_grace")]
    pub startup_grace: Duration,

    /// Perform exactly one wake and exit instead of looping
    #[serde(default)]
    pub one_shot: bool,

    /// Capacity of the engine event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    /// Create a configuration with defaults for the given client identifier
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            local_check: LocalCheck::default(),
            remote_check: RemoteCheck::default(),
            database: None,
            connection_interval: default_connection_interval(),
            speed_interval: default_speed_interval(),
            probe_timeout: default_probe_timeout(),
            startup_grace: default_startup_grace(),
            one_shot: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.client_id.is_empty() {
            return Err(crate::Error::config("client identifier cannot be empty"));
        }
        if self.connection_interval.is_zero() {
            return Err(crate::Error::config("connection interval must be > 0"));
        }
        if self.speed_interval.is_zero() {
            return Err(crate::Error::config("speed test interval must be > 0"));
        }
        if self.probe_timeout.is_zero() {
            return Err(crate::Error::config("probe timeout must be > 0"));
        }
        if let RemoteCheck::Traceroute(hops) = &self.remote_check
            && hops.is_empty()
        {
            return Err(crate::Error::config("traceroute hop list cannot be empty"));
        }
        if let Some(db) = &self.database {
            db.validate()?;
        }
        Ok(())
    }

    /// Addresses probed by the local-reachability check
    pub fn local_addresses(&self) -> Vec<String> {
        match &self.local_check {
            LocalCheck::Default => DEFAULT_LOCAL_ADDRESSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            LocalCheck::Address(addr) => vec![addr.clone()],
        }
    }

    /// Addresses probed by the internet-reachability check
    pub fn remote_addresses(&self) -> Vec<String> {
        match &self.remote_check {
            RemoteCheck::DefaultResolvers => DEFAULT_REMOTE_ADDRESSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            RemoteCheck::Address(addr) => vec![addr.clone()],
            RemoteCheck::Traceroute(hops) => hops.clone(),
        }
    }
}

/// Local-network reachability check mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalCheck {
    /// Probe the default gateway set; up if at least one responds
    #[default]
    Default,

    /// Probe a single configured server or router on the LAN
    Address(String),
}

/// Internet reachability check mode
///
/// The three modes are mutually exclusive by construction. Conflicting
/// command-line flags are rejected before a `RemoteCheck` is ever built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCheck {
    /// Probe well-known public resolvers; up if at least one responds
    #[default]
    DefaultResolvers,

    /// Probe a single configured remote server; up iff it responds
    Address(String),

    /// Probe an ordered traceroute hop list; up iff every hop responds
    Traceroute(Vec<String>),
}

/// Destination time-series database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database HTTP endpoint (e.g. "http://influx.lan:8086")
    pub host: String,

    /// Database name measurements are written to
    pub name: String,

    /// Username
    pub user: String,

    /// Password
    pub password: String,
}

impl DatabaseConfig {
    /// Validate the database configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("missing database host"));
        }
        if self.name.is_empty() {
            return Err(crate::Error::config("missing database name"));
        }
        if self.user.is_empty() {
            return Err(crate::Error::config("missing database username"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("missing database password"));
        }
        Ok(())
    }
}

fn default_connection_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_speed_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_startup_grace() -> Duration {
    Duration::from_secs(30)
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> MonitorConfig {
        MonitorConfig::new("aa:bb:cc:dd:ee:ff")
    }

    #[test]
    fn default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_client_id_rejected() {
        let config = MonitorConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn database_requires_name_user_password() {
        let mut config = valid_config();
        config.database = Some(DatabaseConfig {
            host: "http://influx.lan:8086".to_string(),
            name: String::new(),
            user: "netmon".to_string(),
            password: "netmon".to_string(),
        });
        assert!(config.validate().is_err());

        if let Some(db) = &mut config.database {
            db.name = "netmon".to_string();
            db.password = String::new();
        }
        assert!(config.validate().is_err());

        if let Some(db) = &mut config.database {
            db.password = "netmon".to_string();
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_intervals_rejected() {
        let mut config = valid_config();
        config.connection_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.speed_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_hop_list_rejected() {
        let mut config = valid_config();
        config.remote_check = RemoteCheck::Traceroute(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn address_selection_follows_check_mode() {
        let mut config = valid_config();
        assert_eq!(config.local_addresses().len(), DEFAULT_LOCAL_ADDRESSES.len());
        assert_eq!(
            config.remote_addresses().len(),
            DEFAULT_REMOTE_ADDRESSES.len()
        );

        config.local_check = LocalCheck::Address("192.168.1.254".to_string());
        config.remote_check = RemoteCheck::Address("4.2.2.1".to_string());
        assert_eq!(config.local_addresses(), vec!["192.168.1.254".to_string()]);
        assert_eq!(config.remote_addresses(), vec!["4.2.2.1".to_string()]);

        config.remote_check =
            RemoteCheck::Traceroute(vec!["10.0.0.1".to_string(), "1.1.1.1".to_string()]);
        assert_eq!(config.remote_addresses().len(), 2);
    }
}
