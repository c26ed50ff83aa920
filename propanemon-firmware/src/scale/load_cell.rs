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

use crate::scale::AsyncStrainGaugeInterface;
use core::fmt::Debug;
use defmt::{Debug2Format, debug, trace, warn};
use propanemon_core::RawReadingSource;

/// Conversions averaged into one raw reading
const SAMPLES_PER_READING: usize = 16;

/// Averages a burst of strain gauge conversions into the raw reading used by the wake
/// cycle, and tracks whether any of them saturated.
pub struct LoadCellReader<StrainGauge> {
    strain_gauge: StrainGauge,
    saturated: bool,
}

impl<StrainGauge, StrainGaugeE> LoadCellReader<StrainGauge>
where
    StrainGauge: AsyncStrainGaugeInterface<Error = StrainGaugeE>,
{
    pub async fn new(mut strain_gauge: StrainGauge) -> Result<Self, StrainGaugeE> {
        strain_gauge.initialize().await?;
        Ok(Self {
            strain_gauge,
            saturated: false,
        })
    }

    pub async fn power_down(&mut self) -> Result<(), StrainGaugeE> {
        self.strain_gauge.power_down().await
    }
}

impl<StrainGauge, StrainGaugeE> RawReadingSource for LoadCellReader<StrainGauge>
where
    StrainGauge: AsyncStrainGaugeInterface<Error = StrainGaugeE>,
    StrainGaugeE: Debug,
{
    type Error = StrainGaugeE;

    async fn read_raw(&mut self) -> Result<f32, Self::Error> {
        let mut total = 0.0f32;
        self.saturated = false;

        for _ in 0..SAMPLES_PER_READING {
            let reading = self.strain_gauge.get_next_reading().await.map_err(|e| {
                warn!("Strain gauge read failed: {}", Debug2Format(&e));
                e
            })?;
            trace!("Conversion = {}", reading);
            if self.strain_gauge.is_saturated(reading) {
                self.saturated = true;
            }
            total += reading as f32;
        }

        let mean = total / SAMPLES_PER_READING as f32;
        debug!("Mean of {} conversions = {}, saturated = {}", SAMPLES_PER_READING, mean, self.saturated);
        Ok(mean)
    }

    fn max_depth_fault(&self) -> bool {
        self.saturated
    }
}
