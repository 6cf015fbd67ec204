//! CPAL output to a DC-coupled interface.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use pk_engine::{Frame, CHANNELS_PER_TRACK};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioOutput};

/// Volts that map to a full-scale sample.
const FULL_SCALE_VOLTS: f32 = 10.0;

/// Device sample for `channel` of `frame`.
pub fn channel_value(frame: &Frame, channel: usize) -> f32 {
    (frame.channel_volts(channel) / FULL_SCALE_VOLTS).clamp(-1.0, 1.0)
}

pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Frame>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default output device at its default configuration.
    ///
    /// The device must expose at least one track's worth of channels.
    pub fn new() -> Result<(Self, HeapCons<Frame>), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .into();
        if (config.channels as usize) < CHANNELS_PER_TRACK {
            return Err(AudioError::TooFewChannels {
                needed: CHANNELS_PER_TRACK as u16,
                available: config.channels,
            });
        }
        log::info!(
            target: "audio",
            "output device: {} channels at {} Hz",
            config.channels,
            config.sample_rate.0
        );

        // ~100 ms of frames
        let rb = HeapRb::<Frame>::new(config.sample_rate.0 as usize / 10);
        let (producer, consumer) = rb.split();

        let output = Self {
            device,
            config,
            stream: None,
            producer,
            running: Arc::new(AtomicBool::new(false)),
        };
        Ok((output, consumer))
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Build and start the device stream, draining `consumer`.
    pub fn build_stream(&mut self, mut consumer: HeapCons<Frame>) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    for chunk in data.chunks_mut(channels) {
                        match consumer.try_pop() {
                            Some(frame) => {
                                for (i, sample) in chunk.iter_mut().enumerate() {
                                    *sample = channel_value(&frame, i);
                                }
                            }
                            None => chunk.fill(0.0),
                        }
                    }
                },
                |err| log::error!(target: "audio", "stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Push one frame, spinning until the ring buffer has room.
    pub fn write_spin(&mut self, frame: Frame) {
        while self.producer.try_push(frame).is_err() {
            std::hint::spin_loop();
        }
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        let pushed = self.producer.push_slice(frames);
        if pushed < frames.len() {
            log::trace!(target: "audio", "dropped {} frames", frames.len() - pushed);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(stream) = &self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(stream) = &self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_engine::TrackOutput;

    #[test]
    fn channel_values_are_scaled_volts() {
        let mut frame = Frame::silence();
        frame.num_tracks = 1;
        frame.tracks[0] = TrackOutput { cv: -5.0, gate: true, velocity: 20.0 };
        assert_eq!(channel_value(&frame, 0), -0.5);
        assert_eq!(channel_value(&frame, 1), 1.0);
        assert_eq!(channel_value(&frame, 2), 1.0);
        assert_eq!(channel_value(&frame, 3), 0.0);
    }
}
