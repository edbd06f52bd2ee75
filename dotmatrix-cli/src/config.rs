use sdl2::keyboard::Keycode;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub a: String,
    pub b: String,
    pub start: String,
    pub select: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            up: Keycode::Up.name(),
            down: Keycode::Down.name(),
            left: Keycode::Left.name(),
            right: Keycode::Right.name(),
            a: Keycode::Z.name(),
            b: Keycode::X.name(),
            start: Keycode::Return.name(),
            select: Keycode::RShift.name(),
        }
    }
}

impl std::fmt::Display for InputConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Up={}, Down={}, Left={}, Right={}, A={}, B={}, Start={}, Select={}",
            self.up, self.down, self.left, self.right, self.a, self.b, self.start, self.select
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ColorScheme {
    BlackAndWhite,
    GreenTint,
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Matches the clap value-enum spelling
        match self {
            Self::BlackAndWhite => write!(f, "black-and-white"),
            Self::GreenTint => write!(f, "green-tint"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("error parsing config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk configuration, loaded from an optional TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
}

impl AppConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_display = path.as_ref().display().to_string();
        let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })
    }
}

/// Everything the event loop needs to know for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rom_path: String,
    pub boot_rom_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub launch_fullscreen: bool,
    pub vsync_enabled: bool,
    pub force_integer_scaling: bool,
    pub audio_enabled: bool,
    pub audio_sample_rate: u32,
    pub color_scheme: ColorScheme,
    pub capture_serial: bool,
    pub input_config: InputConfig,
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_path: {}", self.rom_path)?;
        writeln!(f, "boot_rom_path: {:?}", self.boot_rom_path)?;
        writeln!(f, "window_width: {}", self.window_width)?;
        writeln!(f, "window_height: {}", self.window_height)?;
        writeln!(f, "launch_fullscreen: {}", self.launch_fullscreen)?;
        writeln!(f, "vsync_enabled: {}", self.vsync_enabled)?;
        writeln!(f, "force_integer_scaling: {}", self.force_integer_scaling)?;
        writeln!(f, "audio_enabled: {}", self.audio_enabled)?;
        writeln!(f, "audio_sample_rate: {}", self.audio_sample_rate)?;
        writeln!(f, "color_scheme: {:?}", self.color_scheme)?;
        writeln!(f, "capture_serial: {}", self.capture_serial)?;
        write!(f, "input: {}", self.input_config)
    }
}
