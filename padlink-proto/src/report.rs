//! Report framing: marker byte, report kinds and their fixed sizes.
//!
//! The attached MCU encodes controller reports and sends each one as a
//! single marker byte followed by a fixed-size payload. The payload size is
//! not carried on the wire — both ends derive it from the configured device
//! sub-type, so a sub-type change desynchronizes the stream until the next
//! reboot. The relay only ever consumes marker + payload as one unit.

/// Marker byte prefixed to every report on the uplink.
pub const REPORT_MARKER: u8 = b'm';

/// Largest report payload any kind produces.
pub const MAX_REPORT_SIZE: usize = 27;

/// Device sub-type values. Everything up to [`subtype::ARCADE_PAD`] is an
/// XInput flavour; the exact flavour only matters to the descriptor and
/// report encoders, not to the bridge.
pub mod subtype {
    pub const GAMEPAD: u8 = 1;
    pub const WHEEL: u8 = 2;
    pub const ARCADE_STICK: u8 = 3;
    pub const FLIGHT_STICK: u8 = 4;
    pub const DANCE_PAD: u8 = 5;
    pub const GUITAR: u8 = 6;
    pub const DRUM_KIT: u8 = 7;
    pub const ARCADE_PAD: u8 = 8;
    pub const KEYBOARD: u8 = 9;
    pub const PS3_GAMEPAD: u8 = 10;
}

/// Report flavour in flight on the uplink, as selected by the sub-type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    /// XInput-style report.
    XInput,
    /// Boot-protocol keyboard report.
    Keyboard,
    /// PS3/DirectInput-style report.
    Ps3,
}

impl ReportKind {
    /// Classify a device sub-type into its report flavour.
    #[must_use]
    pub const fn from_sub_type(sub_type: u8) -> Self {
        if sub_type <= subtype::ARCADE_PAD {
            ReportKind::XInput
        } else if sub_type == subtype::KEYBOARD {
            ReportKind::Keyboard
        } else {
            ReportKind::Ps3
        }
    }

    /// Fixed payload size of one report of this kind.
    #[must_use]
    pub const fn report_size(self) -> usize {
        match self {
            ReportKind::XInput => 20,
            ReportKind::Keyboard => 8,
            ReportKind::Ps3 => 27,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_subtype_ranges() {
        assert_eq!(ReportKind::from_sub_type(subtype::GAMEPAD), ReportKind::XInput);
        assert_eq!(ReportKind::from_sub_type(subtype::ARCADE_PAD), ReportKind::XInput);
        assert_eq!(ReportKind::from_sub_type(subtype::KEYBOARD), ReportKind::Keyboard);
        assert_eq!(ReportKind::from_sub_type(subtype::PS3_GAMEPAD), ReportKind::Ps3);
        assert_eq!(ReportKind::from_sub_type(0xFF), ReportKind::Ps3);
    }

    #[test]
    fn max_report_size_covers_all_kinds() {
        for kind in [ReportKind::XInput, ReportKind::Keyboard, ReportKind::Ps3] {
            assert!(kind.report_size() <= MAX_REPORT_SIZE);
        }
    }
}
