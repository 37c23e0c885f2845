//! Core bit buffer types for demodulated EMOS E6016 transmissions

use crate::error::{DecodeError, Result};

/// One demodulated transmission: bytes plus an exact bit count
///
/// Bits are stored MSB-first. Any bits past `bits` in the last byte are
/// kept cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBitRow"))]
pub struct BitRow {
    bytes: Vec<u8>,
    bits: usize,
}

/// Unchecked wire form of a [`BitRow`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawBitRow {
    bytes: Vec<u8>,
    bits: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBitRow> for BitRow {
    type Error = DecodeError;

    fn try_from(raw: RawBitRow) -> Result<Self> {
        BitRow::new(raw.bytes, raw.bits)
    }
}

impl BitRow {
    /// Create a new row, validating that `bytes` holds at least `bits` bits
    ///
    /// Surplus bytes are dropped and unused trailing bits are cleared.
    pub fn new(mut bytes: Vec<u8>, bits: usize) -> Result<Self> {
        let needed = bits.div_ceil(8);
        if bytes.len() < needed {
            return Err(DecodeError::insufficient_data(format!(
                "{} bits need {} bytes, got {}",
                bits,
                needed,
                bytes.len()
            )));
        }
        bytes.truncate(needed);
        let mut row = BitRow { bytes, bits };
        row.clear_tail();
        Ok(row)
    }

    /// Create a row holding every bit of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BitRow {
            bytes: bytes.to_vec(),
            bits: bytes.len() * 8,
        }
    }

    /// Get the row bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the exact number of bits in this row
    pub fn bit_len(&self) -> usize {
        self.bits
    }

    /// Check whether the leading `nbits` of both rows are identical
    ///
    /// Rows shorter than `nbits` never match.
    pub fn prefix_eq(&self, other: &BitRow, nbits: usize) -> bool {
        if self.bits < nbits || other.bits < nbits {
            return false;
        }
        let whole = nbits / 8;
        match (self.bytes.get(..whole), other.bytes.get(..whole)) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
        let rest = nbits % 8;
        if rest == 0 {
            return true;
        }
        let mask = 0xffu8 << (8 - rest);
        match (self.bytes.get(whole), other.bytes.get(whole)) {
            (Some(a), Some(b)) => (a & mask) == (b & mask),
            _ => false,
        }
    }

    /// Flip every bit of the row
    pub fn invert(&mut self) {
        for byte in self.bytes.iter_mut() {
            *byte = !*byte;
        }
        self.clear_tail();
    }

    fn clear_tail(&mut self) {
        let rest = self.bits % 8;
        if rest != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xffu8 << (8 - rest);
            }
        }
    }
}

impl std::fmt::Display for BitRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.bits)?;
        for byte in &self.bytes {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

/// All rows received in one transmission window, in reception order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitBuffer {
    rows: Vec<BitRow>,
}

impl BitBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        BitBuffer { rows: Vec::new() }
    }

    /// Parse the textual row notation used for captures
    ///
    /// Rows are separated by `/` or newlines. Each row is an optional
    /// `[NN]` index, an optional `{bits}` length and hex digits, with
    /// whitespace ignored:
    ///
    /// ```text
    /// [00] {120} 55 5a 7c 00 6a a5 60 e7 3f 36 da ff 5d 38 ff
    /// ```
    ///
    /// Without a `{bits}` prefix the row holds four bits per hex digit.
    pub fn parse(text: &str) -> Result<Self> {
        let mut buffer = BitBuffer::new();
        for segment in text.split(['/', '\n']) {
            let mut row = segment.trim();
            if row.is_empty() {
                continue;
            }
            if let Some(rest) = row.strip_prefix('[') {
                let end = rest
                    .find(']')
                    .ok_or_else(|| DecodeError::invalid_bits("unterminated row index"))?;
                row = rest[end + 1..].trim_start();
            }

            let mut bits = None;
            if let Some(rest) = row.strip_prefix('{') {
                let end = rest
                    .find('}')
                    .ok_or_else(|| DecodeError::invalid_bits("unterminated bit count"))?;
                let count = rest[..end].trim().parse::<usize>().map_err(|_| {
                    DecodeError::invalid_bits(format!("bad bit count {:?}", &rest[..end]))
                })?;
                bits = Some(count);
                row = &rest[end + 1..];
            }

            let nibbles = row
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| {
                    c.to_digit(16)
                        .map(|d| d as u8)
                        .ok_or_else(|| DecodeError::invalid_bits(format!("bad hex digit {:?}", c)))
                })
                .collect::<Result<Vec<u8>>>()?;

            let bytes: Vec<u8> = nibbles
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
                .collect();

            let available = nibbles.len() * 4;
            let bits = bits.unwrap_or(available);
            if bits > available {
                return Err(DecodeError::invalid_bits(format!(
                    "row declares {} bits but holds {}",
                    bits, available
                )));
            }
            buffer.push(BitRow::new(bytes, bits)?);
        }
        Ok(buffer)
    }

    /// Append a row
    pub fn push(&mut self, row: BitRow) {
        self.rows.push(row);
    }

    /// Get all rows in reception order
    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    /// Get a single row
    pub fn row(&self, index: usize) -> Option<&BitRow> {
        self.rows.get(index)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the buffer holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the first row repeated at least `min_repeats` times
    ///
    /// Rows are compared over their leading `compare_bits` only, so a
    /// trailing per-repeat counter does not prevent a match. The count
    /// includes the candidate row itself. Returns the index of the first
    /// qualifying row in reception order.
    pub fn find_repeated_row(&self, min_repeats: usize, compare_bits: usize) -> Option<usize> {
        self.rows.iter().enumerate().find_map(|(index, candidate)| {
            if candidate.bit_len() < compare_bits {
                return None;
            }
            let repeats = self
                .rows
                .iter()
                .filter(|other| candidate.prefix_eq(other, compare_bits))
                .count();
            (repeats >= min_repeats).then_some(index)
        })
    }

    /// Invert every bit of every row, in place
    pub fn invert(&mut self) {
        for row in self.rows.iter_mut() {
            row.invert();
        }
    }
}

impl FromIterator<BitRow> for BitBuffer {
    fn from_iter<I: IntoIterator<Item = BitRow>>(iter: I) -> Self {
        BitBuffer {
            rows: iter.into_iter().collect(),
        }
    }
}

impl std::str::FromStr for BitBuffer {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        BitBuffer::parse(s)
    }
}

impl std::fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, row) in self.rows.iter().enumerate() {
            writeln!(f, "[{:02}] {}", index, row)?;
        }
        Ok(())
    }
}
