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

mod file_config;
mod gateway;
mod scale;
mod util;

use crate::file_config::FileConfigSource;
use crate::gateway::GatewayTransport;
use crate::scale::SimulatedScale;
use crate::util::{has_flag, parse_log_level, positional_args};
use embassy_futures::block_on;
use propanemon_core::run_wake_cycle;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};

fn main() -> IoResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&args))
        .format_timestamp_millis()
        .init();

    if has_flag(&args, "--help") {
        print_usage();
        return Ok(());
    }

    let positional = positional_args(&args);
    let &[config_path, raw_reading] = positional.as_slice() else {
        print_usage();
        return Err(IoError::new(
            ErrorKind::InvalidInput,
            "expected a configuration file and a raw reading",
        ));
    };
    let raw_reading: f32 = raw_reading.parse().map_err(|e| {
        IoError::new(
            ErrorKind::InvalidInput,
            format!("raw reading {} is not a number: {}", raw_reading, e),
        )
    })?;

    log::info!("Propane Monitor Simulator");
    log::info!("==================================");
    log::info!("Configuration: {}", config_path);
    log::info!("Raw reading: {}", raw_reading);

    let mut config_source = FileConfigSource::new(config_path);
    let mut scale = SimulatedScale::new(raw_reading, has_flag(&args, "--max-depth"));
    let mut transport = GatewayTransport::new(std::io::stdout());

    let outcome = block_on(run_wake_cycle(
        &mut config_source,
        &mut scale,
        &mut transport,
    ));

    match &outcome.result {
        Ok(report) => log::info!(
            "Published {} byte status, {:.2} kg ({:.2} lb) of propane, alarms {}",
            report.payload_len,
            report.tank.net_propane_wt(),
            report.tank.net_propane_lbs(),
            report.alarms
        ),
        Err(e) => log::error!("Wake cycle failed: {:?}", e),
    }
    log::info!("Next wake in {} s", outcome.sleep_seconds);

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: propanemon-sim [--log-level <LEVEL>] [--max-depth] <CONFIG_JSON> <RAW_READING>\n\
         \n\
         Runs one wake cycle against a configuration file and a raw load cell reading,\n\
         printing each gateway frame as hex on stdout.\n\
         \n\
         Options:\n\
         \t--log-level <LEVEL>   OFF, ERROR, WARN, INFO (default), DEBUG or TRACE\n\
         \t--max-depth           Report a load cell depth fault\n\
         \n\
         Example:\n\
         \tpropanemon-sim site.json -- -189440"
    );
}
