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

use crate::calibration::{CalibrationError, convert, kg_to_lbs};
use crate::config::{Configuration, TankConfig, TankType};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TankStateError {
    /// Capacity is zero, negative or not finite
    InvalidCapacity,
    /// Tare is not finite
    InvalidTare,
    Calibration(CalibrationError),
}

impl From<CalibrationError> for TankStateError {
    fn from(err: CalibrationError) -> Self {
        TankStateError::Calibration(err)
    }
}

/// Measured and derived state of the monitored tank.
///
/// The measured fields are only written by [`update_tank_state`], which keeps
/// `percent_full` consistent with `net_propane_wt`.
#[derive(Debug, Clone, PartialEq)]
pub struct TankState {
    tank_type: TankType,
    tank_num: u16,
    capacity_kg: f32,
    tare_kg: f32,
    lo_alarm_factor: f32,
    net_propane_wt: f32,
    scale_weight: f32,
    percent_full: f32,
    lo_alarm: f32,
}

impl TankState {
    /// A tank with no reading taken yet.
    pub fn new(tank: &TankConfig) -> Self {
        Self {
            tank_type: tank.tank_type.clone(),
            tank_num: tank.tank_num,
            capacity_kg: tank.capacity_kg,
            tare_kg: tank.tare_kg,
            lo_alarm_factor: tank.lo_alarm_factor,
            net_propane_wt: 0.0,
            scale_weight: 0.0,
            percent_full: 0.0,
            lo_alarm: 0.0,
        }
    }

    pub fn tank_type(&self) -> &str {
        &self.tank_type
    }

    pub fn tank_num(&self) -> u16 {
        self.tank_num
    }

    pub fn capacity_kg(&self) -> f32 {
        self.capacity_kg
    }

    pub fn tare_kg(&self) -> f32 {
        self.tare_kg
    }

    pub fn net_propane_wt(&self) -> f32 {
        self.net_propane_wt
    }

    pub fn net_propane_lbs(&self) -> f32 {
        kg_to_lbs(self.net_propane_wt)
    }

    pub fn scale_weight(&self) -> f32 {
        self.scale_weight
    }

    pub fn percent_full(&self) -> f32 {
        self.percent_full
    }

    /// Low alarm threshold in kg from the last update.
    pub fn lo_alarm(&self) -> f32 {
        self.lo_alarm
    }
}

/// Apply one raw reading to `tank`, returning the updated state.
///
/// The tank constants come from `tank` itself, `config` only supplies the load cell scale
/// factor. Net weight is kept signed. Only `percent_full` is clamped to 0..=100.
pub fn update_tank_state(
    tank: &TankState,
    raw_reading: f32,
    config: &Configuration,
) -> Result<TankState, TankStateError> {
    let capacity_kg = tank.capacity_kg;
    if !(capacity_kg.is_finite() && capacity_kg > 0.0) {
        return Err(TankStateError::InvalidCapacity);
    }
    if !tank.tare_kg.is_finite() {
        return Err(TankStateError::InvalidTare);
    }

    let conversion = convert(
        raw_reading,
        config.site.empirical_scale_factor,
        tank.tare_kg,
    )?;
    let percent_full = (conversion.net_propane_wt / capacity_kg * 100.0).clamp(0.0, 100.0);

    trace!(
        "Scale weight = {} kg, net = {} kg, {}% full",
        conversion.scale_weight, conversion.net_propane_wt, percent_full
    );

    Ok(TankState {
        scale_weight: conversion.scale_weight,
        net_propane_wt: conversion.net_propane_wt,
        percent_full,
        lo_alarm: tank.lo_alarm_factor * capacity_kg,
        ..tank.clone()
    })
}
