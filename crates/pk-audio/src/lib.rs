//! Audio output backends for phrasekit.
//!
//! Control voltages leave the computer through a DC-coupled audio interface:
//! each track occupies three consecutive device channels (pitch, gate,
//! velocity), written as volts / 10.

mod cpal_backend;
mod traits;

pub use cpal_backend::{channel_value, CpalOutput};
pub use traits::{AudioError, AudioOutput};
