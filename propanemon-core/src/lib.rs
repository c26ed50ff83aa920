#![cfg_attr(not(test), no_std)]
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

//! Core of the propane tank monitor.
//!
//! One wake cycle loads the configuration, converts a raw load cell reading into tank
//! state, evaluates alarms, picks the next sleep duration and publishes a status record.
//! Storage, the ADC driver and the network are reached through the traits in
//! [`interface`] so the whole pipeline runs on the host as well as on the device.

pub mod alarm;
pub mod calibration;
pub mod config;
pub mod cycle;
pub mod image;
pub mod interface;
pub mod scheduler;
pub mod tank;

#[cfg(test)]
mod testing;

pub use alarm::{Alarm, AlarmSet, NUM_ALARMS, UnknownAlarm, evaluate_alarms};
pub use calibration::{CalibrationError, Conversion, KG_TO_LBS, convert, kg_to_lbs};
pub use config::{
    ConfigError, Configuration, MAX_CONFIG_DOCUMENT_SIZE, SiteConfig, TankConfig,
    load_configuration, parse_configuration,
};
pub use cycle::{CycleError, CycleOutcome, CycleReport, run_wake_cycle};
pub use image::{
    CONFIG_HEADER_SIZE, CONFIG_IMAGE_MAGIC, ConfigImageError, read_config_header,
    write_config_image,
};
pub use interface::{ConfigSource, RawReadingSource, StatusTransport};
pub use propanemon_messages::{MAX_PAYLOAD_SIZE, SerializationError, StatusPayload, build_message};
pub use scheduler::{FALLBACK_SLEEP_SECONDS, SchedulerError, compute_sleep_seconds};
pub use tank::{TankState, TankStateError, update_tank_state};
