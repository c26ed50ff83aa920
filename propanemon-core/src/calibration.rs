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

pub const KG_TO_LBS: f32 = 2.20462;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Scale factor is zero or not finite
    InvalidFactor,
    /// Raw reading is not finite
    InvalidReading,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Gross weight on the scale in kg
    pub scale_weight: f32,
    /// Scale weight less the tank tare in kg, negative values are kept
    pub net_propane_wt: f32,
}

/// Convert a raw load cell reading to weight.
///
/// `scale_factor` is raw counts per kg. Its sign follows the load cell wiring and is used
/// as given.
pub fn convert(
    raw_reading: f32,
    scale_factor: f32,
    tare_kg: f32,
) -> Result<Conversion, CalibrationError> {
    if scale_factor == 0.0 || !scale_factor.is_finite() {
        return Err(CalibrationError::InvalidFactor);
    }
    if !raw_reading.is_finite() {
        return Err(CalibrationError::InvalidReading);
    }

    let scale_weight = raw_reading / scale_factor;
    Ok(Conversion {
        scale_weight,
        net_propane_wt: scale_weight - tare_kg,
    })
}

pub fn kg_to_lbs(kg: f32) -> f32 {
    kg * KG_TO_LBS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_close;

    const FACTOR: f32 = -23680.0;
    const TARE: f32 = 6.486;

    #[test]
    fn reading_converts_through_negative_factor() {
        let conversion = convert(-189440.0, FACTOR, TARE).unwrap();
        assert_eq!(conversion.scale_weight, 8.0);
        assert_close(conversion.net_propane_wt, 1.514);
    }

    #[test]
    fn net_weight_below_tare_is_kept_negative() {
        let conversion = convert(-21312.0, FACTOR, TARE).unwrap();
        assert_close(conversion.scale_weight, 0.9);
        assert_close(conversion.net_propane_wt, -5.586);
    }

    #[test]
    fn factor_sign_is_not_corrected() {
        let conversion = convert(-189440.0, -FACTOR, TARE).unwrap();
        assert_eq!(conversion.scale_weight, -8.0);
    }

    #[test]
    fn zero_factor_is_rejected() {
        assert_eq!(
            convert(1000.0, 0.0, TARE),
            Err(CalibrationError::InvalidFactor)
        );
        assert_eq!(
            convert(1000.0, -0.0, TARE),
            Err(CalibrationError::InvalidFactor)
        );
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert_eq!(
            convert(1000.0, f32::NAN, TARE),
            Err(CalibrationError::InvalidFactor)
        );
        assert_eq!(
            convert(1000.0, f32::INFINITY, TARE),
            Err(CalibrationError::InvalidFactor)
        );
        assert_eq!(
            convert(f32::NAN, FACTOR, TARE),
            Err(CalibrationError::InvalidReading)
        );
    }

    #[test]
    fn pounds_view() {
        assert_close(kg_to_lbs(11.33), 24.978);
    }
}
