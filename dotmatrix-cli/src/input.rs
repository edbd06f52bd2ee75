use crate::config::InputConfig;
use dotmatrix_core::{
    BUTTON_A, BUTTON_B, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_SELECT, BUTTON_START,
    BUTTON_UP,
};
use sdl2::keyboard::Keycode;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyMapError {
    #[error("invalid keycode in input config: {keycode}")]
    InvalidKeycode { keycode: String },
    #[error("keycode used for multiple buttons: {keycode}")]
    DuplicateKeycode { keycode: String },
}

fn try_parse_keycode(s: &str) -> Result<Keycode, KeyMapError> {
    Keycode::from_name(s).ok_or_else(|| KeyMapError::InvalidKeycode { keycode: s.into() })
}

macro_rules! build_key_map {
    ($($config_field:expr => $button:expr),+$(,)?) => {
        {
            let mut map = HashMap::new();

            $(
                let keycode = try_parse_keycode(&$config_field)?;
                if map.insert(keycode, $button).is_some() {
                    return Err(KeyMapError::DuplicateKeycode { keycode: keycode.name() });
                }
            )*

            map
        }
    }
}

/// Maps host keycodes to bits in the core's button mask.
#[derive(Debug, Clone)]
pub struct KeyMap(HashMap<Keycode, u8>);

impl KeyMap {
    pub fn from_config(input_config: &InputConfig) -> Result<Self, KeyMapError> {
        let map = build_key_map!(
            input_config.up => BUTTON_UP,
            input_config.down => BUTTON_DOWN,
            input_config.left => BUTTON_LEFT,
            input_config.right => BUTTON_RIGHT,
            input_config.a => BUTTON_A,
            input_config.b => BUTTON_B,
            input_config.start => BUTTON_START,
            input_config.select => BUTTON_SELECT,
        );

        Ok(Self(map))
    }
}

/// The currently-pressed button mask, in the core's bit layout.
#[derive(Debug, Clone, Copy)]
pub struct JoypadState(u8);

impl JoypadState {
    pub fn new() -> Self {
        Self(0x00)
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn key_down(&mut self, keycode: Keycode, key_map: &KeyMap) {
        if let Some(&button) = key_map.0.get(&keycode) {
            self.0 |= button;
        }
    }

    pub fn key_up(&mut self, keycode: Keycode, key_map: &KeyMap) {
        if let Some(&button) = key_map.0.get(&keycode) {
            self.0 &= !button;
        }
    }
}
