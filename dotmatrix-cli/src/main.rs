mod audio;
mod config;
mod eventloop;
mod graphics;
mod input;

use clap::Parser;
use config::{AppConfig, ColorScheme, RunConfig};
use dotmatrix_core::{GameBoy, BOOT_ROM_LEN};
use std::path::Path;
use std::process::ExitCode;
use std::fs;

const EXIT_BAD_ROM: u8 = 1;
const EXIT_UNSUPPORTED_MBC: u8 = 2;

#[derive(Parser)]
#[command(about = "A cycle-accurate Game Boy (DMG) emulator")]
struct Cli {
    /// Path to a Game Boy ROM image
    rom_path: String,
    /// Path to a 256-byte DMG boot ROM; omit to start from the post-boot state
    #[arg(long = "boot-rom")]
    boot_rom_path: Option<String>,
    /// Path to a TOML config file with key bindings
    #[arg(short = 'c', long = "config")]
    config_path: Option<String>,
    #[arg(short = 'w', long = "window-width", default_value_t = 640)]
    window_width: u32,
    #[arg(short = 'l', long = "window-height", default_value_t = 576)]
    window_height: u32,
    #[arg(long = "fullscreen", default_value_t = false)]
    launch_fullscreen: bool,
    #[arg(long = "no-vsync", default_value_t = true, action = clap::ArgAction::SetFalse)]
    vsync_enabled: bool,
    #[arg(long = "integer-scaling", default_value_t = false)]
    force_integer_scaling: bool,
    #[arg(long = "no-audio", default_value_t = true, action = clap::ArgAction::SetFalse)]
    audio_enabled: bool,
    #[arg(long = "audio-sample-rate", default_value_t = dotmatrix_core::DEFAULT_AUDIO_OUTPUT_FREQUENCY)]
    audio_sample_rate: u32,
    #[arg(long = "color-scheme", value_enum, default_value_t = ColorScheme::BlackAndWhite)]
    color_scheme: ColorScheme,
    /// Print bytes the program sends over the serial port (test ROM output)
    #[arg(long = "capture-serial", default_value_t = false)]
    capture_serial: bool,
}

fn load_gameboy(run_config: &RunConfig) -> Result<GameBoy, ExitCode> {
    let rom = match fs::read(&run_config.rom_path) {
        Ok(rom) => rom,
        Err(err) => {
            eprintln!("error reading ROM file '{}': {err}", run_config.rom_path);
            return Err(ExitCode::from(EXIT_BAD_ROM));
        }
    };

    let sav_path = Path::new(&run_config.rom_path).with_extension("sav");

    let gameboy = if let Some(boot_rom_path) = &run_config.boot_rom_path {
        let boot_rom_bytes = match fs::read(boot_rom_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                eprintln!("error reading boot ROM file '{boot_rom_path}': {err}");
                return Err(ExitCode::from(EXIT_BAD_ROM));
            }
        };
        let Ok(boot_rom) = <[u8; BOOT_ROM_LEN]>::try_from(boot_rom_bytes) else {
            eprintln!("boot ROM file '{boot_rom_path}' must be exactly {BOOT_ROM_LEN} bytes");
            return Err(ExitCode::from(EXIT_BAD_ROM));
        };
        GameBoy::load_cartridge_with_boot_rom(rom, boot_rom)
    } else {
        GameBoy::load_cartridge_with_sav(rom, sav_path)
    };

    gameboy.map_err(|err| {
        eprintln!("error loading cartridge: {err}");
        if err.is_unsupported_mapper() {
            ExitCode::from(EXIT_UNSUPPORTED_MBC)
        } else {
            ExitCode::from(EXIT_BAD_ROM)
        }
    })
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Cli::parse();

    let app_config = match &args.config_path {
        Some(config_path) => match AppConfig::from_toml_file(config_path) {
            Ok(app_config) => app_config,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::from(EXIT_BAD_ROM);
            }
        },
        None => AppConfig::default(),
    };

    let run_config = RunConfig {
        rom_path: args.rom_path,
        boot_rom_path: args.boot_rom_path,
        window_width: args.window_width,
        window_height: args.window_height,
        launch_fullscreen: args.launch_fullscreen,
        vsync_enabled: args.vsync_enabled,
        force_integer_scaling: args.force_integer_scaling,
        audio_enabled: args.audio_enabled,
        audio_sample_rate: args.audio_sample_rate,
        color_scheme: args.color_scheme,
        capture_serial: args.capture_serial,
        input_config: app_config.input,
    };

    let gameboy = match load_gameboy(&run_config) {
        Ok(gameboy) => gameboy,
        Err(exit_code) => return exit_code,
    };

    if let Err(err) = eventloop::run(gameboy, &run_config) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
