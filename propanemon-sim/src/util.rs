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

use log::LevelFilter;

pub(crate) fn parse_log_level(args: &[String]) -> LevelFilter {
    args.iter()
        .position(|arg| arg == "--log-level")
        .and_then(|i| args.get(i + 1))
        .map(|level_str| match level_str.to_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => {
                eprintln!("Unknown log level: {}. Using INFO", level_str);
                LevelFilter::Info
            }
        })
        .unwrap_or(LevelFilter::Info)
}

pub(crate) fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Arguments that are neither flags nor the value of `--log-level`.
pub(crate) fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if arg == "--log-level" {
            skip_next = true;
        } else if !arg.starts_with("--") {
            positional.push(arg.as_str());
        }
    }
    positional
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
