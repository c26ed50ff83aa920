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

use propanemon_core::{parse_configuration, write_config_image, CONFIG_HEADER_SIZE, MAX_CONFIG_DOCUMENT_SIZE};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const FIRMWARE_PACKAGE: &str = "propanemon-firmware";
const FIRMWARE_TARGET: &str = "thumbv6m-none-eabi";
const SIM_PACKAGE: &str = "propanemon-sim";
/// Start of the last 4 KiB sector of the 2 MiB flash
const CONFIG_REGION_ADDRESS: u32 = 0x101F_F000;

#[derive(Debug, PartialEq)]
enum BuildTarget {
    Firmware,
    Sim,
}

#[derive(Debug, PartialEq)]
enum Command_ {
    Build(BuildTarget),
    Flash,
    Run(BuildTarget, Vec<String>),
    Attach,
    ConfigImage { document: PathBuf, output: PathBuf },
    Provision(PathBuf),
    Help,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = match parse_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error parsing command: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(command) {
        eprintln!("Error executing command: {}", e);
        std::process::exit(1);
    }
}

fn parse_command(args: &[String]) -> Result<Command_, String> {
    if args.is_empty() {
        return Err("No command provided".to_string());
    }

    match args[0].as_str() {
        "build" => {
            let target = match args.get(1) {
                Some(target) => parse_build_target(target)?,
                None => BuildTarget::Firmware,
            };
            Ok(Command_::Build(target))
        }
        "flash" => Ok(Command_::Flash),
        "run" => {
            let target = match args.get(1) {
                Some(target) => parse_build_target(target)?,
                None => return Err("run command requires a target (firmware or sim)".to_string()),
            };
            Ok(Command_::Run(target, args.get(2..).unwrap_or_default().to_vec()))
        }
        "attach" => Ok(Command_::Attach),
        "config-image" => match (args.get(1), args.get(2)) {
            (Some(document), Some(output)) => Ok(Command_::ConfigImage {
                document: PathBuf::from(document),
                output: PathBuf::from(output),
            }),
            _ => Err("config-image requires <CONFIG_JSON> <OUTPUT_BIN>".to_string()),
        },
        "provision" => match args.get(1) {
            Some(image) => Ok(Command_::Provision(PathBuf::from(image))),
            None => Err("provision requires an image built with config-image".to_string()),
        },
        "help" => Ok(Command_::Help),
        _ => Err(format!("Unknown command: {}", args[0])),
    }
}

fn parse_build_target(target: &str) -> Result<BuildTarget, String> {
    match target {
        "firmware" => Ok(BuildTarget::Firmware),
        "sim" => Ok(BuildTarget::Sim),
        _ => Err(format!("Unknown target: {}", target)),
    }
}

fn execute_command(cmd: Command_) -> Result<(), String> {
    match cmd {
        Command_::Build(target) => build(&target),
        Command_::Flash => {
            println!("Building and flashing firmware...");
            run_cargo_flash()?;
            println!("✓ Firmware flashed successfully");
            Ok(())
        }
        Command_::Run(target, extra_args) => run(&target, &extra_args),
        Command_::Attach => {
            println!("Attaching to firmware...");
            run_probe_rs_attach()?;
            println!("✓ Attach completed");
            Ok(())
        }
        Command_::ConfigImage { document, output } => config_image(&document, &output),
        Command_::Provision(image) => provision(&image),
        Command_::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn build(target: &BuildTarget) -> Result<(), String> {
    match target {
        BuildTarget::Firmware => {
            println!("Building firmware...");
            run_cargo(&["build", "--release", "--target", FIRMWARE_TARGET], FIRMWARE_PACKAGE, &[])?;
            generate_bin()?;
            println!("✓ Firmware built successfully");
        }
        BuildTarget::Sim => {
            println!("Building simulator...");
            run_cargo(&["build", "--release", "--package", SIM_PACKAGE], ".", &[])?;
            println!("✓ Simulator built successfully");
        }
    }
    Ok(())
}

fn run(target: &BuildTarget, extra_args: &[String]) -> Result<(), String> {
    match target {
        BuildTarget::Firmware => {
            println!("Building and running firmware...");
            run_cargo(&["run", "--release", "--target", FIRMWARE_TARGET], FIRMWARE_PACKAGE, &[])?;
        }
        BuildTarget::Sim => {
            if extra_args.is_empty() {
                println!("Usage: cargo xtask run sim <CONFIG_JSON> <RAW_READING>");
            }
            run_cargo(&["run", "--release", "--package", SIM_PACKAGE], ".", extra_args)?;
        }
    }
    println!("✓ Run completed");
    Ok(())
}

/// Validate a configuration document and wrap it in the flash image header.
fn config_image(document_path: &Path, output_path: &Path) -> Result<(), String> {
    let document = fs::read(document_path)
        .map_err(|e| format!("Failed to read {}: {}", document_path.display(), e))?;
    let image = build_config_image(&document)?;

    fs::write(output_path, &image)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;
    println!(
        "✓ Wrote {} byte configuration image to {}",
        image.len(),
        output_path.display()
    );
    Ok(())
}

fn build_config_image(document: &[u8]) -> Result<Vec<u8>, String> {
    let config = parse_configuration(document)
        .map_err(|e| format!("Configuration document is not valid: {:?}", e))?;
    println!(
        "Site '{}', tank {}{}, publishing to '{}'",
        config.site.site_name, config.tank.tank_type, config.tank.tank_num, config.site.data_topic
    );

    let mut image = vec![0u8; CONFIG_HEADER_SIZE + MAX_CONFIG_DOCUMENT_SIZE];
    let len = write_config_image(document, &mut image)
        .map_err(|e| format!("Unable to build configuration image: {:?}", e))?;
    image.truncate(len);
    Ok(image)
}

fn provision(image_path: &Path) -> Result<(), String> {
    if !image_path.exists() {
        return Err(format!(
            "Configuration image not found at {}. Build it with 'cargo xtask config-image'.",
            image_path.display()
        ));
    }

    println!("Writing configuration image to 0x{:08x}...", CONFIG_REGION_ADDRESS);
    let status = Command::new("probe-rs")
        .args(["download", "--chip", "RP2040", "--binary-format", "bin", "--base-address"])
        .arg(format!("0x{:08x}", CONFIG_REGION_ADDRESS))
        .arg(image_path)
        .status()
        .map_err(|e| format!("Failed to run probe-rs download: {}", e))?;

    if !status.success() {
        return Err("Provisioning failed".to_string());
    }

    println!("✓ Configuration provisioned");
    Ok(())
}

/// Runs cargo in `dir`. The firmware lives outside the host workspace so it is built
/// from its own directory.
fn run_cargo(cargo_args: &[&str], dir: &str, extra_args: &[String]) -> Result<(), String> {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(dir).args(cargo_args);

    if !extra_args.is_empty() {
        cmd.arg("--").args(extra_args);
    }

    let status = cmd
        .status()
        .map_err(|e| format!("Failed to run cargo {}: {}", cargo_args[0], e))?;

    if !status.success() {
        return Err(format!("cargo {} failed in {}", cargo_args[0], dir));
    }

    Ok(())
}

fn run_cargo_flash() -> Result<(), String> {
    let status = Command::new("cargo")
        .current_dir(FIRMWARE_PACKAGE)
        .args([
            "flash",
            "--release",
            "--target",
            FIRMWARE_TARGET,
            "--chip",
            "RP2040",
        ])
        .status()
        .map_err(|e| format!("Failed to run cargo flash: {}", e))?;

    if !status.success() {
        return Err(format!("Flash failed for {}", FIRMWARE_PACKAGE));
    }

    Ok(())
}

fn firmware_elf_path() -> PathBuf {
    PathBuf::from(FIRMWARE_PACKAGE)
        .join("target")
        .join(FIRMWARE_TARGET)
        .join("release")
        .join(FIRMWARE_PACKAGE)
}

fn generate_bin() -> Result<(), String> {
    let elf_path = firmware_elf_path();
    let bin_path = elf_path.with_extension("bin");

    if !elf_path.exists() {
        return Err(format!("ELF binary not found at {}", elf_path.display()));
    }

    println!("Generating .bin file for {}...", FIRMWARE_PACKAGE);

    let output = Command::new("arm-none-eabi-objcopy")
        .args(["-O", "binary"])
        .arg(&elf_path)
        .arg(&bin_path)
        .output()
        .map_err(|e| {
            format!(
                "Failed to run arm-none-eabi-objcopy: {}. Make sure arm-none-eabi-objcopy is installed.",
                e
            )
        })?;

    if !output.status.success() {
        return Err(format!(
            "Failed to generate .bin file for {}:\n{}",
            FIRMWARE_PACKAGE,
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    println!("✓ Generated {}", bin_path.display());
    Ok(())
}

fn run_probe_rs_attach() -> Result<(), String> {
    let elf_path = firmware_elf_path();

    if !elf_path.exists() {
        return Err(format!(
            "ELF binary not found at {}. Build the project first using 'cargo xtask build'.",
            elf_path.display()
        ));
    }

    let status = Command::new("probe-rs")
        .args(["attach", "--chip", "RP2040"])
        .arg(&elf_path)
        .status()
        .map_err(|e| format!("Failed to run probe-rs attach: {}", e))?;

    if !status.success() {
        return Err(format!("Attach failed for {}", FIRMWARE_PACKAGE));
    }

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <COMMAND> [ARGS]\n\
         \n\
         Commands:\n\
         \tbuild [TARGET]                       Build firmware (default, generates a .bin) or sim\n\
         \tflash                                Build and flash the firmware\n\
         \trun <TARGET> [ARGS]                  Build and run the firmware with probe-rs, or the sim\n\
         \tattach                               Attach to the running firmware with probe-rs\n\
         \tconfig-image <CONFIG_JSON> <OUT>     Validate a configuration and build its flash image\n\
         \tprovision <IMAGE>                    Download a configuration image to the device\n\
         \thelp                                 Show this help message\n\
         \n\
         Targets:\n\
         \tfirmware      RP2040 firmware\n\
         \tsim           Host simulator (x86_64)\n\
         \n\
         Examples:\n\
         \tcargo xtask build                                    # Build firmware with .bin generation\n\
         \tcargo xtask run sim site.json -- -189440             # One simulated wake cycle\n\
         \tcargo xtask run sim --log-level DEBUG site.json -- -189440\n\
         \tcargo xtask config-image site.json site.bin          # Build a configuration image\n\
         \tcargo xtask provision site.bin                       # Write it to the device"
    );
}
