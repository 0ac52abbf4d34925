// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Stored in TOML through `confy`. Every field has a serde default so older
//! or hand-trimmed files still load.

use std::time::Duration;

use adsb_core::{EarthPoint, FeedConfig};
use serde::{Deserialize, Serialize};

/// Name `confy` stores configuration under.
pub const APP_NAME: &str = "adsb-hud";

/// Default feed host (dump1090 `--net`).
pub const DEFAULT_FEED_HOST: &str = "localhost";

/// Default SBS output port.
pub const DEFAULT_FEED_PORT: u16 = 30003;

/// Where the observer (camera) stands.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ObserverConfig {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in metres above the spheroid
    #[serde(default)]
    pub altitude_m: f64,
}

impl ObserverConfig {
    pub fn point(&self) -> EarthPoint {
        EarthPoint::from_degrees(self.latitude, self.longitude, self.altitude_m)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        // San Francisco
        Self {
            latitude: 37.7749,
            longitude: -122.4194,
            altitude_m: 0.0,
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    #[serde(default)]
    pub observer: ObserverConfig,

    /// SBS feed host
    #[serde(default = "default_feed_host")]
    pub feed_host: String,

    /// SBS feed port
    #[serde(default = "default_feed_port")]
    pub feed_port: u16,

    /// Read deadline on the feed socket, 0 to block indefinitely
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Wait before reconnecting after the feed drops
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Forget aircraft not heard from for this long
    #[serde(default = "default_aircraft_timeout_secs")]
    pub aircraft_timeout_secs: u64,

    /// Minimum time between bearing lines for one aircraft
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_feed_host() -> String {
    DEFAULT_FEED_HOST.to_string()
}

fn default_feed_port() -> u16 {
    DEFAULT_FEED_PORT
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_aircraft_timeout_secs() -> u64 {
    60
}

fn default_report_interval_secs() -> u64 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            observer: ObserverConfig::default(),
            feed_host: default_feed_host(),
            feed_port: default_feed_port(),
            read_timeout_ms: default_read_timeout_ms(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            aircraft_timeout_secs: default_aircraft_timeout_secs(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load(name: &str) -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, name)
    }

    /// Save configuration to disk
    pub fn save(&self, name: &str) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, name, self)
    }

    /// Get the config file path for display to user
    pub fn config_path(name: &str) -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, name)
    }

    /// Socket settings for the feed.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            read_timeout: (self.read_timeout_ms > 0)
                .then(|| Duration::from_millis(self.read_timeout_ms)),
            ..FeedConfig::default()
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn aircraft_timeout(&self) -> Duration {
        Duration::from_secs(self.aircraft_timeout_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}
