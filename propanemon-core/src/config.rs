// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Operating parameters, read from a small JSON document once per wake cycle.
//!
//! ```json
//! { "site": { "sitename": "cabin", "sleeptimefloor": 25, ... },
//!   "tank": { "capacitykg": 11.33, "tarekg": 6.486 } }
//! ```
//!
//! Every key is optional except the `site` object itself. Missing keys take the
//! defaults below.

use crate::interface::ConfigSource;
use heapless::String;
use log::{debug, error, warn};
use serde::Deserialize;

/// Largest configuration document accepted.
pub const MAX_CONFIG_DOCUMENT_SIZE: usize = 512;

pub type SiteName = String<32>;
pub type Credential = String<64>;
pub type Topic = String<64>;
pub type TankType = String<4>;

/// Scratch space for decoding escaped strings, sized to the longest field
const UNESCAPE_BUFFER_SIZE: usize = 64;

const DEFAULT_SITE_NAME: &str = "propanemon";
const DEFAULT_DATA_TOPIC: &str = "propanemon/data";
const DEFAULT_CONTROL_TOPIC: &str = "propanemon/ctrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    MountFailed,
    NotFound,
    /// Malformed, oversized, or missing the `site` object
    ParseFailed,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Configuration {
    pub site: SiteConfig,
    #[serde(default)]
    pub tank: TankConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    #[serde(rename = "sitename")]
    pub site_name: SiteName,
    /// Hours from UTC
    pub timezone: i32,
    pub dst: bool,

    #[serde(rename = "pssid")]
    pub primary_ssid: Credential,
    #[serde(rename = "ppwd")]
    pub primary_password: Credential,
    #[serde(rename = "usealtssid")]
    pub use_alternate_ssid: bool,
    #[serde(rename = "altssid")]
    pub alternate_ssid: Credential,
    #[serde(rename = "altpwd")]
    pub alternate_password: Credential,

    #[serde(rename = "mqtt_topic_data")]
    pub data_topic: Topic,
    #[serde(rename = "mqtt_topic_ctrl")]
    pub control_topic: Topic,
    #[serde(rename = "mqtt_uid")]
    pub transport_user: Credential,
    #[serde(rename = "mqtt_pwd")]
    pub transport_password: Credential,

    pub debug: bool,

    /// Seconds to sleep while percent full is at or above the floor
    #[serde(rename = "sleeptimeabovefloor")]
    pub sleep_time_above_floor: i32,
    /// Seconds to sleep while percent full is below the floor
    #[serde(rename = "sleepttimebelowfloor", alias = "sleeptimebelowfloor")]
    pub sleep_time_below_floor: i32,
    /// Whole percent, e.g. 25
    #[serde(rename = "sleeptimefloor")]
    pub sleep_time_floor: i32,
    /// Raw counts per kg, found by bench testing with a known mass
    #[serde(rename = "empiricalscalefactor", alias = "empericalscalefactor")]
    pub empirical_scale_factor: f32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: bounded(DEFAULT_SITE_NAME),
            timezone: 0,
            dst: false,
            primary_ssid: String::new(),
            primary_password: String::new(),
            use_alternate_ssid: false,
            alternate_ssid: String::new(),
            alternate_password: String::new(),
            data_topic: bounded(DEFAULT_DATA_TOPIC),
            control_topic: bounded(DEFAULT_CONTROL_TOPIC),
            transport_user: String::new(),
            transport_password: String::new(),
            debug: false,
            sleep_time_above_floor: 3600,
            sleep_time_below_floor: 900,
            sleep_time_floor: 25,
            empirical_scale_factor: -23680.0,
        }
    }
}

/// The monitored tank. Defaults describe a 25 lb propane cylinder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    #[serde(rename = "tanktype")]
    pub tank_type: TankType,
    #[serde(rename = "tanknum")]
    pub tank_num: u16,
    /// Rated propane capacity
    #[serde(rename = "capacitykg")]
    pub capacity_kg: f32,
    /// Empty tank weight
    #[serde(rename = "tarekg")]
    pub tare_kg: f32,
    /// Fraction of capacity below which LO is raised
    #[serde(rename = "loalarmfactor")]
    pub lo_alarm_factor: f32,
    /// Fraction of capacity above which HI is raised, above 1.0
    #[serde(rename = "hialarmfactor")]
    pub hi_alarm_factor: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            tank_type: bounded("P"),
            tank_num: 4,
            capacity_kg: 11.33,
            tare_kg: 6.486,
            lo_alarm_factor: 0.10,
            hi_alarm_factor: 1.10,
        }
    }
}

fn bounded<const N: usize>(value: &str) -> String<N> {
    String::try_from(value).unwrap_or_default()
}

/// Load the configuration document from `source`.
///
/// # Errors
///
/// - `MountFailed`: the storage could not be mounted
/// - `NotFound`: no document is stored, or it could not be read
/// - `ParseFailed`: the document is larger than [`MAX_CONFIG_DOCUMENT_SIZE`] or not valid
pub async fn load_configuration<S: ConfigSource>(
    source: &mut S,
) -> Result<Configuration, ConfigError> {
    debug!("Mounting configuration storage");
    source.mount().await.map_err(|e| {
        error!("Failed to mount configuration storage: {:?}", e);
        ConfigError::MountFailed
    })?;

    let size = match source.document_size().await {
        Ok(Some(size)) => size,
        Ok(None) => {
            error!("Configuration document does not exist");
            return Err(ConfigError::NotFound);
        }
        Err(e) => {
            error!("Failed to open configuration document: {:?}", e);
            return Err(ConfigError::NotFound);
        }
    };
    debug!("Configuration document size = {}", size);

    if size > MAX_CONFIG_DOCUMENT_SIZE {
        error!(
            "Configuration document is {} bytes, limit is {}",
            size, MAX_CONFIG_DOCUMENT_SIZE
        );
        return Err(ConfigError::ParseFailed);
    }

    let mut buffer = [0u8; MAX_CONFIG_DOCUMENT_SIZE];
    let read = source
        .read_document(&mut buffer[..size])
        .await
        .map_err(|e| {
            error!("Failed to read configuration document: {:?}", e);
            ConfigError::NotFound
        })?;

    let document = buffer.get(..read).ok_or_else(|| {
        error!("Storage reported {} bytes read into a {} byte buffer", read, size);
        ConfigError::ParseFailed
    })?;
    if read < size {
        warn!("Short configuration read, {} of {} bytes", read, size);
    }

    let config = parse_configuration(document)?;
    log_configuration(&config);
    Ok(config)
}

/// Parse a configuration document already in memory.
pub fn parse_configuration(document: &[u8]) -> Result<Configuration, ConfigError> {
    if document.len() > MAX_CONFIG_DOCUMENT_SIZE {
        error!("Configuration document is {} bytes", document.len());
        return Err(ConfigError::ParseFailed);
    }

    let mut unescape_buffer = [0u8; UNESCAPE_BUFFER_SIZE];
    serde_json_core::from_slice_escaped::<Configuration>(document, &mut unescape_buffer)
        .map(|(config, _)| config)
        .map_err(|e| {
            error!("Failed to parse configuration document: {:?}", e);
            ConfigError::ParseFailed
        })
}

fn log_configuration(config: &Configuration) {
    let site = &config.site;
    debug!(
        "Config loaded: sitename {}, timezone {}, dst {}",
        site.site_name, site.timezone, site.dst
    );
    debug!(
        "pssid {}, use alternate {}, altssid {}",
        site.primary_ssid, site.use_alternate_ssid, site.alternate_ssid
    );
    debug!(
        "data topic {}, control topic {}, uid {}, debug {}",
        site.data_topic, site.control_topic, site.transport_user, site.debug
    );
    debug!(
        "sleep above floor {} s, below floor {} s, floor {}%, scale factor {}",
        site.sleep_time_above_floor,
        site.sleep_time_below_floor,
        site.sleep_time_floor,
        site.empirical_scale_factor
    );
    let tank = &config.tank;
    debug!(
        "tank {}{}: capacity {} kg, tare {} kg, lo {}, hi {}",
        tank.tank_type,
        tank.tank_num,
        tank.capacity_kg,
        tank.tare_kg,
        tank.lo_alarm_factor,
        tank.hi_alarm_factor
    );
}
