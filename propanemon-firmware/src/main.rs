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

#![no_std]
#![no_main]

mod scale;
mod storage;
mod transport;

use crate::scale::hx711async::Hx711Async;
use crate::scale::load_cell::LoadCellReader;
use crate::storage::config_store::FlashConfigStore;
use crate::transport::uart_gateway::UartGateway;
use assign_resources::assign_resources;
use core::cell::RefCell;
use defmt::{Debug2Format, error, info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_embedded_hal::flash::partition::BlockingPartition;
use embassy_executor::Spawner;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUartTx};
use embassy_rp::{Peri, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use propanemon_core::{FALLBACK_SLEEP_SECONDS, run_wake_cycle};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

const FLASH_SIZE: usize = 2 * 1024 * 1024;
const CONFIG_REGION_SIZE: u32 = 4 * 1024;
/// Last sector of flash, kept out of the program region by memory.x
const CONFIG_REGION_OFFSET: u32 = FLASH_SIZE as u32 - CONFIG_REGION_SIZE;

const GATEWAY_BAUD_RATE: u32 = 115200;

#[cfg(feature = "short_cycle")]
const SHORT_CYCLE_SECONDS: u32 = 10;

static GATEWAY_TX_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();

assign_resources! {
    strain_gauge_io: StrainGaugeResources {
        clk_pin: PIN_14,
        data_pin: PIN_15,
    },
    gateway_link: GatewayLinkResources {
        uart: UART0,
        tx_pin: PIN_0,
        alert_pin: PIN_2,
    },
    config_storage: ConfigStorageResources {
        flash: FLASH,
    }
}

bind_interrupts!(struct UartIrqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());
    let resources = split_resources!(p);

    info!("Propane monitor awake");
    let sleep_seconds = wake_cycle(
        resources.strain_gauge_io,
        resources.gateway_link,
        resources.config_storage,
    )
    .await;

    #[cfg(feature = "short_cycle")]
    let sleep_seconds = sleep_seconds.min(SHORT_CYCLE_SECONDS);

    info!("Sleeping for {} s", sleep_seconds);
    Timer::after(Duration::from_secs(sleep_seconds as u64)).await;

    // come back up with nothing carried over, as after a deep sleep
    cortex_m::peripheral::SCB::sys_reset();
}

/// One measurement and publish pass. Returns how long to sleep before the next one.
async fn wake_cycle(
    strain_gauge_io: StrainGaugeResources,
    gateway_link: GatewayLinkResources,
    config_storage: ConfigStorageResources,
) -> u32 {
    let flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(config_storage.flash);
    let flash = Mutex::<CriticalSectionRawMutex, _>::new(RefCell::new(flash));
    let config_partition = BlockingPartition::new(&flash, CONFIG_REGION_OFFSET, CONFIG_REGION_SIZE);
    let mut config_store = FlashConfigStore::new(BlockingAsync::new(config_partition));

    let clk_pin_out = Output::new(strain_gauge_io.clk_pin, Level::Low);
    let data_pin = Input::new(strain_gauge_io.data_pin, Pull::Up);
    let strain_gauge = Hx711Async::new(clk_pin_out, data_pin);
    let mut load_cell = match LoadCellReader::new(strain_gauge).await {
        Ok(load_cell) => load_cell,
        Err(e) => {
            error!("Unable to initialise load cell: {}", Debug2Format(&e));
            return FALLBACK_SLEEP_SECONDS;
        }
    };

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = GATEWAY_BAUD_RATE;
    let tx_buffer = GATEWAY_TX_BUFFER.init([0u8; 512]);
    let gateway_tx = BufferedUartTx::new(
        gateway_link.uart,
        UartIrqs,
        gateway_link.tx_pin,
        tx_buffer,
        uart_config,
    );
    let alert_pin = Output::new(gateway_link.alert_pin, Level::Low);
    let mut gateway = UartGateway::new(gateway_tx, alert_pin);

    let outcome = run_wake_cycle(&mut config_store, &mut load_cell, &mut gateway).await;
    match &outcome.result {
        Ok(report) => info!(
            "{}% full, alarm flags {=u8:#x}",
            report.tank.percent_full(),
            report.alarms.bits()
        ),
        Err(e) => error!("Wake cycle failed: {}", e),
    }

    if let Err(e) = load_cell.power_down().await {
        warn!("Unable to power down load cell: {}", Debug2Format(&e));
    }

    outcome.sleep_seconds
}
