//! Input handling module
//!
//! Reads raw bytes from the input device and decodes them into keys:
//! - The static byte → key table
//! - Byte sources (blocking readers and timed channels)
//! - The escape-sequence decoder and its background thread

pub mod decoder;
pub mod keys;
pub mod source;

pub use decoder::{DecoderSettings, KeyDecoder};
pub use keys::{Key, KeyTable};
pub use source::{ByteSource, ChannelSource, ReadOutcome, ReaderSource};
