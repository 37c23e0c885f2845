//! Frame layout and decoded readings for the EMOS E6016
//!
//! On-air layout, after polarity normalization:
//!
//! ```text
//! PP PP PP II BK KK KK KK CT TT HH SS D? XX RR
//! ```
//!
//! - P: 24 bit preamble / model signature
//! - I: 8 bit house code
//! - B: 4 bit battery indication
//! - K: 30 bit DCF77 date and time, encoding only partly known
//! - C: 2 bit channel
//! - T: 12 bit temperature, signed, tenths of a degree Celsius
//! - H: 8 bit humidity
//! - S: 8 bit wind speed in m/s
//! - D: 4 bit wind direction in 22.5 degree steps
//! - ?: 4 bit unknown
//! - X: 8 bit additive checksum over the first 13 bytes
//! - R: 8 bit repeat counter, counting down between repeats

use crate::core::BitRow;
use crate::device;
use crate::encoding::{checksum8, extract_bits, sign_extend};
use crate::error::{DecodeError, Result};

/// Whether a field is read as two's complement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Signedness {
    /// Plain binary
    Unsigned,
    /// Two's complement, sign-extended from the field width
    Signed,
}

/// Position and interpretation of one field inside a frame
///
/// `bit` counts from the most significant bit of `byte`; fields may run
/// across byte boundaries, MSB-first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldSpec {
    /// Field name
    pub name: &'static str,
    /// Byte holding the first bit
    pub byte: usize,
    /// Offset of the first bit from the MSB of `byte`
    pub bit: usize,
    /// Width in bits
    pub width: usize,
    /// Signed or unsigned
    pub signedness: Signedness,
    /// Multiplier from raw value to physical unit
    pub scale: f64,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        byte: usize,
        bit: usize,
        width: usize,
        signedness: Signedness,
        scale: f64,
    ) -> Self {
        FieldSpec {
            name,
            byte,
            bit,
            width,
            signedness,
            scale,
        }
    }

    const fn unsigned(name: &'static str, byte: usize, bit: usize, width: usize) -> Self {
        Self::new(name, byte, bit, width, Signedness::Unsigned, 1.0)
    }

    /// Absolute position of the first bit
    pub fn start(&self) -> usize {
        self.byte * 8 + self.bit
    }

    /// Raw field bits, right-aligned
    pub fn raw(&self, data: &[u8]) -> u32 {
        extract_bits(data, self.start(), self.width)
    }

    /// Field value, sign-extended when signed
    pub fn value(&self, data: &[u8]) -> i64 {
        let raw = self.raw(data);
        match self.signedness {
            Signedness::Unsigned => i64::from(raw),
            Signedness::Signed => i64::from(sign_extend(raw, self.width)),
        }
    }
}

/// Field table of the 120 bit frame
pub mod layout {
    use super::{FieldSpec, Signedness};

    pub const SIGNATURE: FieldSpec = FieldSpec::unsigned("signature", 0, 0, 24);
    pub const ID: FieldSpec = FieldSpec::unsigned("id", 3, 0, 8);
    pub const BATTERY: FieldSpec = FieldSpec::unsigned("battery", 4, 0, 4);
    pub const DATETIME: FieldSpec = FieldSpec::unsigned("datetime", 4, 4, 30);
    pub const DCF77_DAYS: FieldSpec = FieldSpec::unsigned("days", 4, 4, 13);
    pub const DCF77_HOURS: FieldSpec = FieldSpec::unsigned("hours", 6, 1, 5);
    pub const DCF77_MINUTES: FieldSpec = FieldSpec::unsigned("minutes", 6, 6, 6);
    pub const DCF77_SECONDS: FieldSpec = FieldSpec::unsigned("seconds", 7, 4, 6);
    pub const CHANNEL: FieldSpec = FieldSpec::unsigned("channel", 8, 2, 2);
    pub const TEMPERATURE: FieldSpec =
        FieldSpec::new("temperature", 8, 4, 12, Signedness::Signed, 0.1);
    pub const HUMIDITY: FieldSpec = FieldSpec::unsigned("humidity", 10, 0, 8);
    pub const WIND_SPEED: FieldSpec = FieldSpec::unsigned("wind_speed", 11, 0, 8);
    pub const WIND_DIRECTION: FieldSpec =
        FieldSpec::new("wind_direction", 12, 0, 4, Signedness::Unsigned, 22.5);
    pub const UNKNOWN: FieldSpec = FieldSpec::unsigned("unknown", 12, 4, 4);
    pub const CHECKSUM: FieldSpec = FieldSpec::unsigned("checksum", 13, 0, 8);
    pub const REPEAT: FieldSpec = FieldSpec::unsigned("repeat", 14, 0, 8);

    /// Every field in frame order, excluding the DCF77 sub-fields
    pub const FIELDS: &[FieldSpec] = &[
        SIGNATURE,
        ID,
        BATTERY,
        DATETIME,
        CHANNEL,
        TEMPERATURE,
        HUMIDITY,
        WIND_SPEED,
        WIND_DIRECTION,
        UNKNOWN,
        CHECKSUM,
        REPEAT,
    ];
}

/// Checks a selected row before any polarity change
///
/// Both checks run against the bytes as received.
pub struct FrameValidator;

impl FrameValidator {
    /// Validate the row length
    pub fn validate_length(row: &BitRow) -> Result<()> {
        if row.bit_len() != device::FRAME_BITS {
            return Err(DecodeError::LengthMismatch {
                expected: device::FRAME_BITS,
                actual: row.bit_len(),
            });
        }
        Ok(())
    }

    /// Validate the model signature
    pub fn validate_signature(row: &BitRow) -> Result<()> {
        let bytes = row.bytes();
        if bytes.len() < device::SIGNATURE.len() {
            return Err(DecodeError::insufficient_data(format!(
                "Expected {} signature bytes, got {}",
                device::SIGNATURE.len(),
                bytes.len()
            )));
        }
        if bytes[..3] != device::SIGNATURE {
            return Err(DecodeError::SignatureMismatch {
                found: [bytes[0], bytes[1], bytes[2]],
            });
        }
        Ok(())
    }

    /// Validate length, then signature
    pub fn validate(row: &BitRow) -> Result<()> {
        Self::validate_length(row)?;
        Self::validate_signature(row)
    }
}

/// Best-effort reading of the DCF77 timestamp bits
///
/// The bit boundaries are inferred from captures and not confirmed.
/// Values are not range checked; seconds may read up to 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dcf77Guess {
    /// High 13 bits, encoding unknown
    pub days: u16,
    /// 5 bits
    pub hours: u8,
    /// 6 bits
    pub minutes: u8,
    /// 6 bits
    pub seconds: u8,
}

impl Dcf77Guess {
    /// Split a raw 30 bit timestamp
    pub fn from_raw(raw: u32) -> Self {
        Dcf77Guess {
            days: (raw >> 17) as u16,
            hours: ((raw >> 12) & 0x1f) as u8,
            minutes: ((raw >> 6) & 0x3f) as u8,
            seconds: (raw & 0x3f) as u8,
        }
    }
}

impl std::fmt::Display for Dcf77Guess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}T{}:{}:{}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// A 120 bit frame in payload polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame([u8; device::FRAME_BYTES]);

impl Frame {
    /// Create a frame from its 15 bytes
    pub fn new(bytes: [u8; device::FRAME_BYTES]) -> Self {
        Frame(bytes)
    }

    /// Take the frame from a normalized row
    pub fn from_row(row: &BitRow) -> Result<Self> {
        FrameValidator::validate_length(row)?;
        Self::try_from(row.bytes())
    }

    /// Get the frame bytes
    pub fn bytes(&self) -> &[u8; device::FRAME_BYTES] {
        &self.0
    }

    /// Read one field
    pub fn field(&self, spec: &FieldSpec) -> i64 {
        spec.value(&self.0)
    }

    /// Checksum byte carried in the frame
    pub fn checksum(&self) -> u8 {
        self.0[13]
    }

    /// Checksum computed over the first 13 bytes
    pub fn computed_checksum(&self) -> u8 {
        checksum8(&self.0[..13])
    }

    /// Verify the additive checksum
    pub fn verify_checksum(&self) -> Result<()> {
        let computed = self.computed_checksum();
        if computed != self.checksum() {
            return Err(DecodeError::IntegrityFailure {
                expected: self.checksum(),
                computed,
            });
        }
        Ok(())
    }

    /// Undecoded low nibble of byte 12
    pub fn unknown_nibble(&self) -> u8 {
        layout::UNKNOWN.raw(&self.0) as u8
    }

    /// Per-repeat counter in the last byte
    pub fn repeat_counter(&self) -> u8 {
        layout::REPEAT.raw(&self.0) as u8
    }

    /// Verify the checksum and extract every field
    pub fn reading(&self) -> Result<DecodedReading> {
        self.verify_checksum()?;
        let b = &self.0;
        Ok(DecodedReading {
            id: layout::ID.raw(b) as u8,
            channel: layout::CHANNEL.raw(b) as u8 + 1,
            battery_ok: layout::BATTERY.raw(b) != 0,
            temperature_raw: layout::TEMPERATURE.value(b) as i16,
            humidity: layout::HUMIDITY.raw(b) as u8,
            wind_speed: layout::WIND_SPEED.raw(b) as u8,
            wind_dir_raw: layout::WIND_DIRECTION.raw(b) as u8,
            datetime_raw: layout::DATETIME.raw(b),
        })
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; device::FRAME_BYTES] = bytes.try_into().map_err(|_| {
            DecodeError::insufficient_data(format!(
                "Expected {} frame bytes, got {}",
                device::FRAME_BYTES,
                bytes.len()
            ))
        })?;
        Ok(Frame(bytes))
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One decoded weather station reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedReading {
    /// House code, changes on battery swap
    pub id: u8,
    /// Channel, raw value plus one
    pub channel: u8,
    /// Battery indication nibble is nonzero
    pub battery_ok: bool,
    /// Temperature in tenths of a degree Celsius
    pub temperature_raw: i16,
    /// Relative humidity in percent, not range checked
    pub humidity: u8,
    /// Average wind speed in m/s
    pub wind_speed: u8,
    /// Wind direction in 22.5 degree steps
    pub wind_dir_raw: u8,
    /// DCF77 timestamp bits, unmodified
    pub datetime_raw: u32,
}

impl DecodedReading {
    /// Model name
    pub fn model(&self) -> &'static str {
        device::MODEL
    }

    /// Temperature in degrees Celsius
    pub fn temperature_c(&self) -> f64 {
        f64::from(self.temperature_raw) * layout::TEMPERATURE.scale
    }

    /// Wind speed in m/s
    pub fn wind_speed_m_s(&self) -> f64 {
        f64::from(self.wind_speed)
    }

    /// Wind direction in degrees
    pub fn wind_dir_deg(&self) -> f64 {
        f64::from(self.wind_dir_raw) * layout::WIND_DIRECTION.scale
    }

    /// Best-effort split of the timestamp bits
    pub fn datetime_maybe(&self) -> Dcf77Guess {
        Dcf77Guess::from_raw(self.datetime_raw)
    }

    /// Integrity check used
    pub fn mic(&self) -> &'static str {
        "CHECKSUM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const SAMPLE: [u8; 15] = [
        0xaa, 0xa5, 0x83, 0xff, 0x95, 0x5a, 0x9f, 0x18, 0xc0, 0xc9, 0x25, 0x00, 0xa2, 0xc7, 0x00,
    ];

    fn with_temperature(raw12: u16) -> Frame {
        let mut bytes = SAMPLE;
        bytes[8] = (bytes[8] & 0xf0) | ((raw12 >> 8) as u8 & 0x0f);
        bytes[9] = raw12 as u8;
        bytes[13] = checksum8(&bytes[..13]);
        Frame::new(bytes)
    }

    #[test]
    fn test_sample_reading() -> Result<()> {
        let frame = Frame::new(SAMPLE);
        let reading = frame.reading()?;

        assert_eq!(reading.id, 255);
        assert_eq!(reading.channel, 1);
        assert!(reading.battery_ok);
        assert_eq!(reading.temperature_raw, 201);
        assert_approx_eq!(reading.temperature_c(), 20.1);
        assert_eq!(reading.humidity, 37);
        assert_approx_eq!(reading.wind_speed_m_s(), 0.0);
        assert_approx_eq!(reading.wind_dir_deg(), 225.0);
        assert_eq!(reading.datetime_raw, 0x156a_7c63);
        assert_eq!(reading.datetime_maybe().to_string(), "2741T7:49:35");
        assert_eq!(frame.unknown_nibble(), 2);
        assert_eq!(frame.checksum(), 0xc7);
        assert_eq!(frame.repeat_counter(), 0);
        Ok(())
    }

    #[test]
    fn test_checksum_failure() {
        let mut bytes = SAMPLE;
        bytes[10] = 0x26;
        let err = Frame::new(bytes).reading().unwrap_err();
        assert_eq!(
            err,
            DecodeError::IntegrityFailure {
                expected: 0xc7,
                computed: 0xc8
            }
        );
    }

    #[test]
    fn test_temperature_sign_extension() -> Result<()> {
        // -5.0 C
        let reading = with_temperature(0xfce).reading()?;
        assert_eq!(reading.temperature_raw, -50);
        assert_approx_eq!(reading.temperature_c(), -5.0);

        assert_eq!(with_temperature(0x0c9).reading()?.temperature_raw, 201);
        assert_eq!(with_temperature(0xfff).reading()?.temperature_raw, -1);
        assert_eq!(with_temperature(0x000).reading()?.temperature_raw, 0);
        assert_eq!(with_temperature(0x7ff).reading()?.temperature_raw, 2047);
        assert_eq!(with_temperature(0x800).reading()?.temperature_raw, -2048);
        Ok(())
    }

    #[test]
    fn test_temperature_matches_i16_shift() {
        for raw12 in 0..0x1000u16 {
            let frame = with_temperature(raw12);
            let b = frame.bytes();
            let shifted = ((u16::from(b[8] & 0x0f) << 12) | (u16::from(b[9]) << 4)) as i16 >> 4;
            assert_eq!(frame.field(&layout::TEMPERATURE), i64::from(shifted));
        }
    }

    #[test]
    fn test_channel_offset() -> Result<()> {
        for raw in 0..4u8 {
            let mut bytes = SAMPLE;
            bytes[8] = (bytes[8] & 0xcf) | (raw << 4);
            bytes[13] = checksum8(&bytes[..13]);
            assert_eq!(Frame::new(bytes).reading()?.channel, raw + 1);
        }
        Ok(())
    }

    #[test]
    fn test_wind_direction_scaling() -> Result<()> {
        for (raw, degrees) in [(0u8, 0.0), (8, 180.0), (15, 337.5)] {
            let mut bytes = SAMPLE;
            bytes[12] = (raw << 4) | (bytes[12] & 0x0f);
            bytes[13] = checksum8(&bytes[..13]);
            assert_approx_eq!(Frame::new(bytes).reading()?.wind_dir_deg(), degrees);
        }
        Ok(())
    }

    #[test]
    fn test_battery_nibble() -> Result<()> {
        let mut bytes = SAMPLE;
        bytes[4] &= 0x0f;
        bytes[13] = checksum8(&bytes[..13]);
        assert!(!Frame::new(bytes).reading()?.battery_ok);
        Ok(())
    }

    #[test]
    fn test_dcf77_subfields_match_raw_split() {
        let frame = Frame::new(SAMPLE);
        let guess = Dcf77Guess::from_raw(frame.field(&layout::DATETIME) as u32);
        assert_eq!(i64::from(guess.days), frame.field(&layout::DCF77_DAYS));
        assert_eq!(i64::from(guess.hours), frame.field(&layout::DCF77_HOURS));
        assert_eq!(i64::from(guess.minutes), frame.field(&layout::DCF77_MINUTES));
        assert_eq!(i64::from(guess.seconds), frame.field(&layout::DCF77_SECONDS));
    }

    #[test]
    fn test_layout_covers_frame() {
        let bits: usize = layout::FIELDS.iter().map(|f| f.width).sum();
        assert_eq!(bits, device::FRAME_BITS);
        for pair in layout::FIELDS.windows(2) {
            assert_eq!(pair[0].start() + pair[0].width, pair[1].start());
        }
    }

    #[test]
    fn test_validator() -> Result<()> {
        let good = BitRow::from_bytes(&[
            0x55, 0x5a, 0x7c, 0x00, 0x6a, 0xa5, 0x60, 0xe7, 0x3f, 0x36, 0xda, 0xff, 0x5d, 0x38,
            0xff,
        ]);
        FrameValidator::validate(&good)?;

        let short = BitRow::new(good.bytes().to_vec(), 119)?;
        assert_eq!(
            FrameValidator::validate(&short),
            Err(DecodeError::LengthMismatch {
                expected: 120,
                actual: 119
            })
        );

        let mut bytes = good.bytes().to_vec();
        bytes[2] = 0x7d;
        assert_eq!(
            FrameValidator::validate(&BitRow::from_bytes(&bytes)),
            Err(DecodeError::SignatureMismatch {
                found: [0x55, 0x5a, 0x7d]
            })
        );
        Ok(())
    }

    #[test]
    fn test_frame_from_short_slice() {
        assert!(Frame::try_from(&SAMPLE[..14]).is_err());
        assert!(Frame::try_from(&SAMPLE[..]).is_ok());
    }
}
