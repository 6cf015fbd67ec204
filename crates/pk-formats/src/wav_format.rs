//! WAV encoding of rendered control voltages.
//!
//! Each track contributes three interleaved channels: pitch CV, gate and
//! velocity. Volts are scaled so that ±10 V spans the full 16-bit range.

use pk_engine::{Frame, CHANNELS_PER_TRACK};
use std::io::Write;

const FULL_SCALE_VOLTS: f32 = 10.0;

pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let num_channels = frames
        .first()
        .map_or(CHANNELS_PER_TRACK, |f| f.num_channels().max(CHANNELS_PER_TRACK))
        as u16;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = frames.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, block_align, bits_per_sample)?;
    write_data_chunk(w, frames, num_channels as usize, data_size)
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_wav(&mut buf, frames, sample_rate)?;
    Ok(buf)
}

fn volts_to_pcm(volts: f32) -> i16 {
    let scaled = (volts / FULL_SCALE_VOLTS).clamp(-1.0, 1.0) * i16::MAX as f32;
    scaled as i16
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}

fn write_data_chunk(
    w: &mut impl Write,
    frames: &[Frame],
    num_channels: usize,
    data_size: u32,
) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        for channel in 0..num_channels {
            w.write_all(&volts_to_pcm(frame.channel_volts(channel)).to_le_bytes())?;
        }
    }
    Ok(())
}
