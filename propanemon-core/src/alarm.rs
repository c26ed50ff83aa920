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

use crate::tank::TankState;
use core::fmt;
use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Tank alarms, with the bit each one occupies in the published alarm flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCount, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Net weight above the HI factor of capacity, an overfill or sensor fault
    Hi,
    /// Net weight below the LO factor of capacity
    Lo,
    /// Load cell depth or overload fault reported by the driver
    MaxDepth,
    /// No alarm, the all-zero mask
    Clear,
}

/// Number of [`Alarm`] entries, for per-alarm arrays indexed by [`Alarm::index`].
pub const NUM_ALARMS: usize = Alarm::COUNT;

/// Bit pattern that is not a single known alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownAlarm(pub u8);

impl Alarm {
    pub const fn bits(self) -> u8 {
        match self {
            Alarm::Hi => 0b0000_0001,
            Alarm::Lo => 0b0000_0010,
            Alarm::MaxDepth => 0b0000_0100,
            Alarm::Clear => 0b0000_0000,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Alarm::Hi => "HI",
            Alarm::Lo => "LO",
            Alarm::MaxDepth => "MAXDEPTH",
            Alarm::Clear => "CLEARALL",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Alarm::Hi => 0,
            Alarm::Lo => 1,
            Alarm::MaxDepth => 2,
            Alarm::Clear => 3,
        }
    }

    pub fn from_bits(bits: u8) -> Result<Self, UnknownAlarm> {
        Alarm::iter()
            .find(|alarm| alarm.bits() == bits)
            .ok_or(UnknownAlarm(bits))
    }
}

/// Set of raised alarms, published as the alarm flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmSet(u8);

impl AlarmSet {
    pub const CLEAR: AlarmSet = AlarmSet(Alarm::Clear.bits());

    const KNOWN_BITS: u8 = Alarm::Hi.bits() | Alarm::Lo.bits() | Alarm::MaxDepth.bits();

    /// Rebuild a set from published flags.
    pub fn from_bits(bits: u8) -> Result<Self, UnknownAlarm> {
        if bits & !Self::KNOWN_BITS != 0 {
            return Err(UnknownAlarm(bits));
        }
        Ok(AlarmSet(bits))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, alarm: Alarm) {
        self.0 |= alarm.bits();
    }

    pub fn contains(self, alarm: Alarm) -> bool {
        match alarm {
            Alarm::Clear => self.is_clear(),
            _ => self.0 & alarm.bits() != 0,
        }
    }

    pub const fn is_clear(self) -> bool {
        self.0 == Alarm::Clear.bits()
    }

    /// Any alarm bit set. Handed to the transport as the urgency hint.
    pub const fn is_raised(self) -> bool {
        !self.is_clear()
    }

    /// Raised alarms in bit order. Empty for a clear set.
    pub fn iter(self) -> impl Iterator<Item = Alarm> {
        Alarm::iter().filter(move |alarm| *alarm != Alarm::Clear && self.contains(*alarm))
    }
}

impl fmt::Display for AlarmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            return f.write_str(Alarm::Clear.name());
        }
        for (i, alarm) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(alarm.name())?;
        }
        Ok(())
    }
}

/// Evaluate the weight alarms for `tank`.
///
/// HI and LO are tested independently against fractions of capacity. MAXDEPTH comes
/// from the load cell driver and is added by the caller.
pub fn evaluate_alarms(tank: &TankState, hi_alarm_factor: f32, lo_alarm_factor: f32) -> AlarmSet {
    let net = tank.net_propane_wt();
    let capacity = tank.capacity_kg();
    let mut alarms = AlarmSet::CLEAR;

    if net > capacity * hi_alarm_factor {
        alarms.insert(Alarm::Hi);
    }
    if net < capacity * lo_alarm_factor {
        alarms.insert(Alarm::Lo);
    }

    alarms
}
