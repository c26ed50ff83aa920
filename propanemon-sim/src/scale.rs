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

use propanemon_core::RawReadingSource;

/// Load cell stand-in that always returns the reading given on the command line.
pub struct SimulatedScale {
    raw_reading: f32,
    max_depth: bool,
}

impl SimulatedScale {
    pub fn new(raw_reading: f32, max_depth: bool) -> Self {
        Self {
            raw_reading,
            max_depth,
        }
    }
}

impl RawReadingSource for SimulatedScale {
    type Error = core::convert::Infallible;

    async fn read_raw(&mut self) -> Result<f32, Self::Error> {
        Ok(self.raw_reading)
    }

    fn max_depth_fault(&self) -> bool {
        self.max_depth
    }
}
