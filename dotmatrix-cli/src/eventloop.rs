use crate::config::RunConfig;
use crate::graphics::GraphicsError;
use crate::input::{JoypadState, KeyMap, KeyMapError};
use crate::{audio, graphics};
use crate::audio::AudioError;
use dotmatrix_core::GameBoy;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::video::WindowBuildError;
use std::io;
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("SDL2 initialization error: {msg}")]
    SdlInit { msg: String },
    #[error("error creating window: {source}")]
    CreateWindow {
        #[from]
        source: WindowBuildError,
    },
    #[error("rendering error: {source}")]
    Rendering {
        #[from]
        source: GraphicsError,
    },
    #[error("audio playback error: {source}")]
    AudioPlayback {
        #[from]
        source: AudioError,
    },
    #[error("error processing input config: {source}")]
    InputConfig {
        #[from]
        source: KeyMapError,
    },
    #[error("error writing cartridge RAM to sav file: {source}")]
    RamPersist {
        #[source]
        source: io::Error,
    },
}

// 70224 T-cycles per frame at 4.194304 MHz
const FRAME_DURATION: Duration = Duration::from_nanos(16_742_706);

const RAM_PERSIST_FRAME_INTERVAL: u64 = 60;

/// Run the emulator until the window is closed.
pub fn run(mut gameboy: GameBoy, run_config: &RunConfig) -> Result<(), RunError> {
    log::info!("Running with config:\n{run_config}");

    let sdl = sdl2::init().map_err(|msg| RunError::SdlInit { msg })?;
    let video_subsystem = sdl.video().map_err(|msg| RunError::SdlInit { msg })?;

    let window = video_subsystem
        .window(
            &format!("dotmatrix - {}", gameboy.cartridge_title()),
            run_config.window_width,
            run_config.window_height,
        )
        .resizable()
        .build()?;
    let mut canvas = graphics::create_renderer(window, run_config)?;
    let texture_creator = canvas.texture_creator();
    let mut texture = graphics::create_frame_texture(&texture_creator)?;

    gameboy.set_audio_sample_rate(run_config.audio_sample_rate);
    let audio_queue = if run_config.audio_enabled {
        let audio_subsystem = sdl.audio().map_err(|msg| RunError::SdlInit { msg })?;
        Some(audio::initialize(&audio_subsystem, run_config.audio_sample_rate)?)
    } else {
        None
    };

    let mut event_pump = sdl.event_pump().map_err(|msg| RunError::SdlInit { msg })?;

    let key_map = KeyMap::from_config(&run_config.input_config)?;
    let mut joypad_state = JoypadState::new();

    let mut total_frames = 0_u64;
    let mut next_frame_time = Instant::now();

    'running: loop {
        {
            let frame_buffer = gameboy.run_frame();
            graphics::render_frame(frame_buffer, &mut canvas, &mut texture, run_config)?;
        }

        let samples = gameboy.drain_audio_samples();
        if let Some(audio_queue) = &audio_queue {
            audio::push_samples(audio_queue, &samples)?;
        }

        if run_config.capture_serial {
            let serial_output = gameboy.take_serial_output();
            if !serial_output.is_empty() {
                print!("{}", String::from_utf8_lossy(&serial_output));
                let _ = io::stdout().flush();
            }
        }

        for event in event_pump.poll_iter() {
            log::trace!("Received SDL event: {event:?}");
            match event {
                Event::Quit { .. } => {
                    break 'running;
                }
                Event::KeyDown { keycode: Some(Keycode::Escape), .. } => {
                    break 'running;
                }
                Event::KeyDown { keycode: Some(Keycode::F9), .. } => {
                    graphics::toggle_fullscreen(&mut canvas)?;
                }
                Event::KeyDown { keycode: Some(keycode), .. } => {
                    joypad_state.key_down(keycode, &key_map);
                    gameboy.set_button_state(joypad_state.mask());
                }
                Event::KeyUp { keycode: Some(keycode), .. } => {
                    joypad_state.key_up(keycode, &key_map);
                    gameboy.set_button_state(joypad_state.mask());
                }
                _ => {}
            }
        }

        total_frames += 1;
        if total_frames % RAM_PERSIST_FRAME_INTERVAL == 0 {
            gameboy
                .persist_cartridge_ram()
                .map_err(|source| RunError::RamPersist { source })?;
        }

        // Pace to the hardware's 59.7275Hz frame rate
        next_frame_time += FRAME_DURATION;
        let now = Instant::now();
        if next_frame_time > now {
            std::thread::sleep(next_frame_time - now);
        } else {
            // Fell behind (e.g. window drag); don't try to catch up
            next_frame_time = now;
        }
    }

    gameboy.persist_cartridge_ram().map_err(|source| RunError::RamPersist { source })?;

    Ok(())
}
