use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::AudioSubsystem;
use thiserror::Error;

const AUDIO_QUEUE_SIZE: u32 = 1024;

// Cap on the device-side queue; past this we drop instead of drifting
// further behind real time
const MAX_QUEUED_BYTES: u32 = 16 * 4 * AUDIO_QUEUE_SIZE;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("error opening audio device queue: {msg}")]
    DeviceOpen { msg: String },
    #[error("error pushing audio samples to device sample queue: {msg}")]
    Playback { msg: String },
}

pub fn initialize(
    audio_subsystem: &AudioSubsystem,
    sample_rate: u32,
) -> Result<AudioQueue<i16>, AudioError> {
    let queue = audio_subsystem
        .open_queue(
            None,
            &AudioSpecDesired {
                freq: Some(sample_rate as i32),
                channels: Some(2),
                samples: Some(AUDIO_QUEUE_SIZE as u16),
            },
        )
        .map_err(|msg| AudioError::DeviceOpen { msg })?;
    queue.resume();

    Ok(queue)
}

/// Push samples to the playback queue if there is room; excess samples are
/// dropped so emulation timing is never held hostage by the audio device.
pub fn push_samples(device_queue: &AudioQueue<i16>, samples: &[i16]) -> Result<(), AudioError> {
    if device_queue.size() >= MAX_QUEUED_BYTES {
        log::debug!("audio device queue full, dropping {} samples", samples.len());
        return Ok(());
    }

    device_queue.queue_audio(samples).map_err(|msg| AudioError::Playback { msg })
}
