//! # EMOS E6016 Decoder
//!
//! A Rust library for decoding the 433 MHz transmissions of the EMOS E6016
//! weather station with DCF77 time.
//!
//! The station sends a 120 bit OOK PWM frame, repeated several times with a
//! decrementing counter in the last byte. This library provides:
//!
//! - Bit buffers for demodulated rows, with the textual capture notation
//! - Repeated row selection and frame validation
//! - Polarity normalization and checksum verification
//! - Table-driven field extraction into a typed reading
//! - Structured output records
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support and JSON records
//!
//! ## Example
//!
//! ```
//! use emos_e6016::{BitBuffer, Decoder};
//!
//! let mut buffer = BitBuffer::parse(
//!     "{120}555a7c006aa560e73f36daff5d38ff/\
//!      {120}555a7c006aa560e73f36daff5d38fe/\
//!      {120}555a7c006aa560e73f36daff5d38fd",
//! )?;
//! let reading = Decoder::new().decode(&mut buffer)?;
//! assert_eq!(reading.humidity, 37);
//! println!("{:.1} C", reading.temperature_c());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;
pub mod decoder;
pub mod encoding;
pub mod error;
pub mod message;
pub mod output;
pub mod protocol;

pub use crate::core::{BitBuffer, BitRow};
pub use decoder::{Decoder, DecoderBuilder};
pub use error::{DecodeError, Result};
pub use message::{DecodedReading, Dcf77Guess, Frame};
pub use output::{OutputSink, Record};
pub use protocol::{DeviceDescriptor, Stage, EMOS_E6016};

/// EMOS E6016 frame constants
pub mod device {
    /// Model name reported in every record
    pub const MODEL: &str = "EMOS-E6016";

    /// Frame length in bits
    pub const FRAME_BITS: usize = 120;

    /// Frame length in bytes
    pub const FRAME_BYTES: usize = FRAME_BITS / 8;

    /// Model signature as received, before polarity normalization
    pub const SIGNATURE: [u8; 3] = [0x55, 0x5a, 0x7c];

    /// Minimum number of identical rows
    pub const MIN_REPEATS: usize = 3;

    /// Bits compared between repeats; the trailing repeat counter is skipped
    pub const COMPARE_BITS: usize = FRAME_BITS - 8;
}
