use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::LocalIdentity;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";
pub const DEFAULT_ROOM: &str = "medical-group";

pub const ENDPOINT_ENV: &str = "MEDSTUDY_ENDPOINT";
pub const USER_ENV: &str = "MEDSTUDY_USER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub room_id: String,
    pub identity: IdentityConfig,
    pub reconnect: ReconnectPolicy,
    /// Capacity of the UI <-> network queues.
    pub queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            room_id: DEFAULT_ROOM.to_string(),
            identity: IdentityConfig::default(),
            reconnect: ReconnectPolicy::default(),
            queue_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub display_name: String,
    pub avatar_color: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            display_name: "You".to_string(),
            avatar_color: "#E91E63".to_string(),
        }
    }
}

impl IdentityConfig {
    /// A fresh identity for this application session.
    pub fn to_identity(&self) -> LocalIdentity {
        LocalIdentity::new(self.display_name.clone(), self.avatar_color.clone())
    }
}

/// Exponential backoff between connect attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` when the
    /// policy gives up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt == 0 {
            return None;
        }
        if self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }

        let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        let delay = self.initial_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Some(Duration::from_millis(delay))
    }
}

/// Values given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub display_name: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var(ENDPOINT_ENV).ok().filter(|value| !value.trim().is_empty()),
            display_name: std::env::var(USER_ENV).ok().filter(|value| !value.trim().is_empty()),
        }
    }

    /// Later values win.
    pub fn merge(self, later: Overrides) -> Self {
        Self {
            endpoint: later.endpoint.or(self.endpoint),
            display_name: later.display_name.or(self.display_name),
        }
    }

    pub fn apply(self, config: &mut AppConfig) {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(display_name) = self.display_name {
            config.identity.display_name = display_name;
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
