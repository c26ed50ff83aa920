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
use embassy_time::{Duration, Ticker, Timer, with_timeout};

const POWER_MODE_CHANGE_DELAY: Duration = Duration::from_micros(60);
const CLK_HALF_PERIOD: Duration = Duration::from_micros(1);
const VALID_DATA_BITS: usize = 24;
/// Extra pulses after the data bits that select channel A, gain 128 for the next conversion
const CHANNEL_A_GAIN_128_PULSES: usize = 1;
/// A conversion takes 100 ms at the 10 Hz rate, anything much longer is a missing chip
const CONVERSION_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
    /// DOUT never signalled a finished conversion
    Timeout,
}

/// Bit banged HX711 24 bit load cell ADC, fixed to channel A at gain 128.
pub struct Hx711Async<CLK, DATA> {
    clock_pin: CLK,
    data_pin: DATA,
    powered_up: bool,
}

impl<CLK, DATA, ClkE, DataE> Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    pub fn new(clock_pin: CLK, data_pin: DATA) -> Self {
        Self {
            clock_pin,
            data_pin,
            powered_up: false,
        }
    }

    /// One clock pulse, returning DOUT as sampled after the falling edge.
    async fn clock_pulse(&mut self, ticker: &mut Ticker) -> Result<bool, Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        ticker.next().await;
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        let bit = self.data_pin.is_high().map_err(Error::InPin)?;
        ticker.next().await;
        Ok(bit)
    }
}

/// Two's complement 24 bit value to i32.
fn sign_extend(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

impl<CLK, DATA, ClkE, DataE> AsyncStrainGaugeInterface for Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    type Error = Error<ClkE, DataE>;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_up().await
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        if !self.powered_up {
            self.power_up().await?;
        }

        // DOUT goes low when conversion is ready, the pull-up holds it high with no chip fitted
        with_timeout(CONVERSION_TIMEOUT, self.data_pin.wait_for_low())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::InPin)?;

        let mut clock_ticker = Ticker::every(CLK_HALF_PERIOD);
        clock_ticker.next().await;

        let mut raw: u32 = 0;
        for _ in 0..VALID_DATA_BITS {
            raw = (raw << 1) | u32::from(self.clock_pulse(&mut clock_ticker).await?);
        }
        for _ in 0..CHANNEL_A_GAIN_128_PULSES {
            self.clock_pulse(&mut clock_ticker).await?;
        }

        Ok(sign_extend(raw))
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        Timer::after(POWER_MODE_CHANGE_DELAY).await;
        self.powered_up = false;
        Ok(())
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        Timer::after(POWER_MODE_CHANGE_DELAY).await;
        self.powered_up = true;
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        VALID_DATA_BITS
    }
}
