//! Radio protocol metadata and decode pipeline stages for the EMOS E6016

use crate::device;
use crate::output::OUTPUT_FIELDS;

/// Stage reached by the decode pipeline
///
/// A decode walks these in order. Each failure is raised from the last
/// stage reached before the check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// Nothing checked yet
    Start,
    /// A repeated row was selected
    RowSelected,
    /// Length and signature checks passed
    FrameValidated,
    /// Buffer inverted to payload polarity
    Normalized,
    /// Checksum verified
    ChecksumVerified,
    /// Reading handed to the sink
    Emitted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Start => write!(f, "start"),
            Stage::RowSelected => write!(f, "row selected"),
            Stage::FrameValidated => write!(f, "frame validated"),
            Stage::Normalized => write!(f, "normalized"),
            Stage::ChecksumVerified => write!(f, "checksum verified"),
            Stage::Emitted => write!(f, "emitted"),
        }
    }
}

/// Modulation scheme used on air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Modulation {
    /// On-off keying, pulse width modulation
    OokPulsePwm,
}

impl Modulation {
    /// Short name used in flex decoder specs
    pub fn short_name(&self) -> &'static str {
        match self {
            Modulation::OokPulsePwm => "OOK_PWM",
        }
    }
}

/// Declarative registration data for a device decoder
///
/// Timings are in microseconds. The dispatcher uses these to route
/// demodulated rows; the decoder itself never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceDescriptor {
    /// Short model name
    pub model: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Modulation scheme
    pub modulation: Modulation,
    /// Nominal short pulse width
    pub short_width: u32,
    /// Nominal long pulse width
    pub long_width: u32,
    /// Maximum gap inside a message
    pub gap_limit: u32,
    /// Gap that ends a transmission
    pub reset_limit: u32,
    /// Sync pulse width
    pub sync_width: u32,
    /// Minimum number of repeated rows
    pub min_repeats: usize,
    /// Exact row length in bits
    pub frame_bits: usize,
    /// Output field keys, in emission order
    pub fields: &'static [&'static str],
}

/// The EMOS E6016 weather station with DCF77
pub const EMOS_E6016: DeviceDescriptor = DeviceDescriptor {
    model: device::MODEL,
    name: "EMOS E6016 weatherstation with DCF77",
    modulation: Modulation::OokPulsePwm,
    short_width: 280,
    long_width: 796,
    gap_limit: 3000,
    reset_limit: 804,
    sync_width: 1836,
    min_repeats: device::MIN_REPEATS,
    frame_bits: device::FRAME_BITS,
    fields: OUTPUT_FIELDS,
};

impl DeviceDescriptor {
    /// Render a flex decoder spec string
    ///
    /// The gap and tolerance are left at zero, which lets the flex
    /// decoder pick its defaults.
    pub fn flex_spec(&self) -> String {
        format!(
            "n={},m={},s={},l={},r={},g=0,t=0,y={},rows>={},bits={}",
            self.model,
            self.modulation.short_name(),
            self.short_width,
            self.long_width,
            self.reset_limit,
            self.sync_width,
            self.min_repeats,
            self.frame_bits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Start < Stage::RowSelected);
        assert!(Stage::Normalized < Stage::ChecksumVerified);
        assert!(Stage::ChecksumVerified < Stage::Emitted);
    }

    #[test]
    fn test_flex_spec() {
        assert_eq!(
            EMOS_E6016.flex_spec(),
            "n=EMOS-E6016,m=OOK_PWM,s=280,l=796,r=804,g=0,t=0,y=1836,rows>=3,bits=120"
        );
    }

    #[test]
    fn test_descriptor_fields() {
        assert_eq!(EMOS_E6016.fields.len(), 11);
        assert_eq!(EMOS_E6016.fields[0], "model");
        assert_eq!(EMOS_E6016.gap_limit, 3000);
    }
}
