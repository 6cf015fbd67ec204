//! Save-file formats for phrasekit.
//!
//! Banks (`.pkb`) hold every track's sequences, song and settings as raw
//! packed records. WAV export renders engine frames to multichannel PCM.

mod bank;
mod wav_format;

pub use bank::{
    load_bank, save_bank, Bank, SequenceRecord, StepRecord, TrackRecord, BANK_MAGIC, BANK_VERSION,
};
pub use wav_format::{frames_to_wav, write_wav};

use std::fmt;

/// Error type for format parsing.
#[derive(Debug)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    InvalidHeader,
    /// Unexpected end of file
    UnexpectedEof,
    /// File written by a newer (or unknown) format version
    UnsupportedVersion(u16),
    /// A record count exceeds what the sequencer can hold
    TooMany { what: &'static str, count: usize, max: usize },
    /// Structurally invalid data
    Malformed(String),
    /// I/O error
    Io(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidHeader => write!(f, "not a phrasekit bank (bad header)"),
            FormatError::UnexpectedEof => write!(f, "unexpected end of file"),
            FormatError::UnsupportedVersion(v) => write!(f, "unsupported bank version {v}"),
            FormatError::TooMany { what, count, max } => {
                write!(f, "{count} {what} in file, at most {max} supported")
            }
            FormatError::Malformed(msg) => write!(f, "malformed bank: {msg}"),
            FormatError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return FormatError::UnexpectedEof;
        }
        match err {
            binrw::Error::BadMagic { .. } => FormatError::InvalidHeader,
            binrw::Error::Io(e) => FormatError::Io(e.to_string()),
            other => FormatError::Malformed(other.to_string()),
        }
    }
}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io(err.to_string())
    }
}
