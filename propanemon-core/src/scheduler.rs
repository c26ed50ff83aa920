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

/// Sleep used whenever a wake cycle aborts, so a bad configuration neither keeps the
/// device awake nor puts it to sleep for good.
pub const FALLBACK_SLEEP_SECONDS: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// A configured sleep duration is negative
    InvalidDuration,
}

/// Pick the next sleep duration from the two tier power policy.
///
/// At or above `floor` percent the tank is adequately supplied and the longer
/// `above_sleep` applies, below it `below_sleep`. Both durations are checked even though
/// only one is used.
pub fn compute_sleep_seconds(
    percent_full: f32,
    floor: i32,
    above_sleep: i32,
    below_sleep: i32,
) -> Result<u32, SchedulerError> {
    let above_sleep = u32::try_from(above_sleep).map_err(|_| SchedulerError::InvalidDuration)?;
    let below_sleep = u32::try_from(below_sleep).map_err(|_| SchedulerError::InvalidDuration)?;

    if percent_full >= floor as f32 {
        Ok(above_sleep)
    } else {
        Ok(below_sleep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_belongs_to_the_upper_tier() {
        assert_eq!(compute_sleep_seconds(25.0, 25, 1800, 300), Ok(1800));
    }

    #[test]
    fn tiers_either_side_of_floor() {
        assert_eq!(compute_sleep_seconds(80.0, 25, 1800, 300), Ok(1800));
        assert_eq!(compute_sleep_seconds(24.99, 25, 1800, 300), Ok(300));
        assert_eq!(compute_sleep_seconds(0.0, 25, 1800, 300), Ok(300));
    }

    #[test]
    fn zero_duration_is_allowed() {
        assert_eq!(compute_sleep_seconds(50.0, 25, 0, 300), Ok(0));
    }

    #[test]
    fn negative_duration_is_a_configuration_error() {
        assert_eq!(
            compute_sleep_seconds(50.0, 25, -1, 300),
            Err(SchedulerError::InvalidDuration)
        );
        // the unused tier is still checked
        assert_eq!(
            compute_sleep_seconds(50.0, 25, 1800, -300),
            Err(SchedulerError::InvalidDuration)
        );
    }

    #[test]
    fn extreme_floors() {
        assert_eq!(compute_sleep_seconds(0.0, 0, 1800, 300), Ok(1800));
        assert_eq!(compute_sleep_seconds(100.0, 101, 1800, 300), Ok(300));
    }
}
