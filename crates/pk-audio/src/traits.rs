//! Audio output trait and error types.

use pk_engine::Frame;

/// Error type for audio operations.
#[derive(Debug)]
pub enum AudioError {
    /// Failed to initialize audio device
    DeviceInit(String),
    /// Failed to create audio stream
    StreamCreate(String),
    /// Playback error
    Playback(String),
    /// No audio device available
    NoDevice,
    /// The device cannot carry even one track's outputs
    TooFewChannels { needed: u16, available: u16 },
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceInit(msg) => write!(f, "device init failed: {msg}"),
            AudioError::StreamCreate(msg) => write!(f, "stream creation failed: {msg}"),
            AudioError::Playback(msg) => write!(f, "playback failed: {msg}"),
            AudioError::NoDevice => write!(f, "no output device available"),
            AudioError::TooFewChannels { needed, available } => {
                write!(f, "device has {available} channels, at least {needed} needed")
            }
        }
    }
}

impl std::error::Error for AudioError {}

/// Trait for control-voltage output backends.
pub trait AudioOutput {
    /// Get the sample rate.
    fn sample_rate(&self) -> u32;

    /// Queue frames for output. Frames that do not fit are dropped.
    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError>;

    /// Start playback.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop playback.
    fn stop(&mut self) -> Result<(), AudioError>;
}
