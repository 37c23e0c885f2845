//! High-level decoder for EMOS E6016 transmissions

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use log::trace;

use crate::core::BitBuffer;
use crate::device;
use crate::encoding::Polarity;
use crate::error::{DecodeError, Result};
use crate::message::{DecodedReading, Frame, FrameValidator};
use crate::output::{OutputSink, Record};
use crate::protocol::Stage;

/// EMOS E6016 decoder
///
/// Stateless: every call takes one buffer of rows and yields at most one
/// reading. The pipeline is
///
/// 1. select a row repeated `min_repeats` times over `compare_bits`
/// 2. check its length and model signature, as received
/// 3. invert the whole buffer to payload polarity
/// 4. verify the checksum and extract fields
///
/// Step 3 mutates the caller's buffer. Its previous content is gone
/// after any call that gets past step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    /// Required number of identical rows
    pub min_repeats: usize,
    /// Leading bits compared between rows
    pub compare_bits: usize,
    /// Line polarity of received rows
    pub polarity: Polarity,
}

impl Decoder {
    /// Create a decoder with the device defaults
    pub fn new() -> Self {
        DecoderBuilder::new().build()
    }

    /// Decode one reception window
    pub fn decode(&self, buffer: &mut BitBuffer) -> Result<DecodedReading> {
        let index = buffer
            .find_repeated_row(self.min_repeats, self.compare_bits)
            .ok_or_else(|| {
                debug!("emos_e6016: repeated row fail");
                DecodeError::RowNotFound {
                    min_repeats: self.min_repeats,
                    compare_bits: self.compare_bits,
                }
            })?;
        debug!("emos_e6016: found row: {}", index);
        trace!("emos_e6016: {}", Stage::RowSelected);

        FrameValidator::validate(&buffer.rows()[index]).map_err(|err| {
            match err {
                DecodeError::LengthMismatch { .. } => debug!("emos_e6016: length check fail"),
                _ => debug!("emos_e6016: model check fail"),
            }
            err
        })?;
        trace!("emos_e6016: {}", Stage::FrameValidated);

        self.polarity.normalize(buffer);
        trace!("emos_e6016: {}", Stage::Normalized);

        let frame = Frame::from_row(&buffer.rows()[index])?;
        trace!("emos_e6016: frame {}", frame);

        let reading = frame.reading().map_err(|err| {
            debug!("emos_e6016: checksum fail");
            err
        })?;
        trace!("emos_e6016: {}", Stage::ChecksumVerified);
        Ok(reading)
    }

    /// Decode one reception window and emit the record to `sink`
    ///
    /// Nothing is emitted on failure.
    pub fn decode_to<S: OutputSink + ?Sized>(
        &self,
        buffer: &mut BitBuffer,
        sink: &mut S,
    ) -> Result<DecodedReading> {
        let reading = self.decode(buffer)?;
        sink.emit(Record::from(&reading));
        trace!("emos_e6016: {}", Stage::Emitted);
        Ok(reading)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an EMOS E6016 decoder
pub struct DecoderBuilder {
    min_repeats: usize,
    compare_bits: usize,
    polarity: Polarity,
}

impl DecoderBuilder {
    /// Create a new decoder builder with the device defaults
    pub fn new() -> Self {
        DecoderBuilder {
            min_repeats: device::MIN_REPEATS,
            compare_bits: device::COMPARE_BITS,
            polarity: Polarity::emos(),
        }
    }

    /// Set the required number of identical rows
    pub fn with_min_repeats(mut self, min_repeats: usize) -> Self {
        self.min_repeats = min_repeats;
        self
    }

    /// Set how many leading bits rows are compared over
    pub fn with_compare_bits(mut self, compare_bits: usize) -> Self {
        self.compare_bits = compare_bits;
        self
    }

    /// Set the line polarity
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Build the decoder
    pub fn build(self) -> Decoder {
        Decoder {
            min_repeats: self.min_repeats,
            compare_bits: self.compare_bits,
            polarity: self.polarity,
        }
    }
}

impl Default for DecoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
