//! Line polarity, checksum and bit extraction for EMOS E6016 frames

use crate::core::BitBuffer;

/// Polarity of the demodulated bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// Pulse widths map directly onto payload bits
    Normal,
    /// A short pulse carries a logical 1
    Inverted,
}

impl Polarity {
    /// Polarity used by the EMOS E6016 transmitter
    pub fn emos() -> Self {
        Polarity::Inverted
    }

    /// Bring a received buffer to payload polarity, in place
    pub fn normalize(&self, buffer: &mut BitBuffer) {
        if *self == Polarity::Inverted {
            buffer.invert();
        }
    }
}

/// Sum all bytes without truncation
pub fn add_bytes(data: &[u8]) -> u32 {
    data.iter().map(|&b| u32::from(b)).sum()
}

/// Additive checksum: sum of all bytes modulo 256
pub fn checksum8(data: &[u8]) -> u8 {
    (add_bytes(data) & 0xff) as u8
}

/// Read `width` bits (at most 32) starting at bit `start`, MSB-first
///
/// Bit 0 is the most significant bit of `data[0]`. Bits beyond the end
/// of `data` read as zero.
pub fn extract_bits(data: &[u8], start: usize, width: usize) -> u32 {
    debug_assert!(width <= 32);
    (start..start + width).fold(0u32, |acc, pos| {
        let bit = data
            .get(pos / 8)
            .map_or(0, |byte| (byte >> (7 - pos % 8)) & 1);
        (acc << 1) | u32::from(bit)
    })
}

/// Sign-extend the low `width` bits of `value` as two's complement
pub fn sign_extend(value: u32, width: usize) -> i32 {
    if width == 0 || width >= 32 {
        return value as i32;
    }
    let shift = 32 - width as u32;
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BitRow;

    #[test]
    fn test_checksum8_wraps() {
        assert_eq!(checksum8(&[]), 0);
        assert_eq!(checksum8(&[0xff, 0x02]), 0x01);
        assert_eq!(add_bytes(&[0xff, 0x02]), 0x101);
    }

    #[test]
    fn test_checksum_detects_single_bit_flips() {
        let sample = [
            0xaa, 0xa5, 0x83, 0xff, 0x95, 0x5a, 0x9f, 0x18, 0xc0, 0xc9, 0x25, 0x00, 0xa2,
        ];
        assert_eq!(checksum8(&sample), 0xc7);

        let mut prefixes = vec![sample, [0x00; 13], [0xff; 13], [0x80; 13]];
        prefixes.push(std::array::from_fn(|i| i as u8));
        prefixes.push(std::array::from_fn(|i| 0xf0 - (i as u8) * 17));
        // xorshift patterns
        let mut state = 0x2545_f491u32;
        for _ in 0..8 {
            prefixes.push(std::array::from_fn(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            }));
        }

        for prefix in prefixes {
            let mut frame = [0u8; 14];
            frame[..13].copy_from_slice(&prefix);
            frame[13] = checksum8(&prefix);
            assert_eq!(checksum8(&frame[..13]), frame[13]);

            for bit in 0..14 * 8 {
                let mut damaged = frame;
                damaged[bit / 8] ^= 0x80 >> (bit % 8);
                assert_ne!(
                    checksum8(&damaged[..13]),
                    damaged[13],
                    "prefix {:02x?} bit {}",
                    prefix,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_extract_bits_across_bytes() {
        let data = [0b1010_1100, 0b0101_0011];
        assert_eq!(extract_bits(&data, 0, 8), 0b1010_1100);
        assert_eq!(extract_bits(&data, 4, 8), 0b1100_0101);
        assert_eq!(extract_bits(&data, 14, 2), 0b11);
        assert_eq!(extract_bits(&data, 14, 4), 0b1100);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xfff, 12), -1);
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(0x7ff, 12), 2047);
        assert_eq!(sign_extend(0x000, 12), 0);
        assert_eq!(sign_extend(0xffce, 12), -50);
    }

    #[test]
    fn test_polarity_normalize() {
        let mut buffer: BitBuffer = [BitRow::from_bytes(&[0x55])].into_iter().collect();
        Polarity::Normal.normalize(&mut buffer);
        assert_eq!(buffer.rows()[0].bytes(), &[0x55]);
        Polarity::emos().normalize(&mut buffer);
        assert_eq!(buffer.rows()[0].bytes(), &[0xaa]);
    }
}
