//! Toggle-style commands: power, packet streaming and finger presence.

use super::frame::{Command, CommandFrame, Marker};

const POWER_BIT: u8 = 1 << 3;

const PKT_ON: u8 = 0x00;
const PKT_OFF: u8 = 0x01;

/// Sensing mode of the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerState {
    /// Low-power sleep, no sensing.
    Sleep,
    /// Normal sensing.
    Normal,
}

impl PowerState {
    /// The write frame selecting this state.
    ///
    /// The state lives in bit 3 of the command byte, so normal mode goes out
    /// as `0x58` and sleep as `0x50`.
    pub const fn write_frame(self) -> CommandFrame {
        let command = match self {
            PowerState::Sleep => Command::PowerState as u8,
            PowerState::Normal => Command::PowerState as u8 | POWER_BIT,
        };
        CommandFrame::new(Marker::Write, command, 0x00, 0x01)
    }

    /// The read request for the current state.
    pub const fn request_frame() -> CommandFrame {
        CommandFrame::request(Command::PowerState, 0x00, 0x01)
    }

    /// `true` for [`PowerState::Normal`].
    pub const fn is_on(self) -> bool {
        matches!(self, PowerState::Normal)
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on {
            PowerState::Normal
        } else {
            PowerState::Sleep
        }
    }
}

impl From<&[u8; 4]> for PowerState {
    fn from(resp: &[u8; 4]) -> Self {
        (resp[1] & POWER_BIT != 0).into()
    }
}

/// Whether the controller streams report frames.
///
/// The parameter polarity is inverted relative to the power bit:
/// `0x00` means streaming on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketState {
    /// Report frames are emitted.
    On,
    /// Report frames are suppressed.
    Off,
}

impl PacketState {
    /// The write frame selecting this state.
    pub const fn write_frame(self) -> CommandFrame {
        let param = match self {
            PacketState::On => PKT_ON,
            PacketState::Off => PKT_OFF,
        };
        CommandFrame::write(Command::PacketState, param, 0x01)
    }

    /// The read request for the current state.
    pub const fn request_frame() -> CommandFrame {
        CommandFrame::request(Command::PacketState, 0x00, 0x01)
    }

    /// `true` for [`PacketState::On`].
    pub const fn is_on(self) -> bool {
        matches!(self, PacketState::On)
    }
}

impl From<bool> for PacketState {
    fn from(on: bool) -> Self {
        if on {
            PacketState::On
        } else {
            PacketState::Off
        }
    }
}

impl From<&[u8; 4]> for PacketState {
    fn from(resp: &[u8; 4]) -> Self {
        if resp[2] == PKT_OFF {
            PacketState::Off
        } else {
            PacketState::On
        }
    }
}

/// Whether a finger currently rests on the panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FingerState {
    /// Nothing touches the panel.
    Off,
    /// At least one finger is present.
    On,
}

impl FingerState {
    /// The read request.
    pub const fn request_frame() -> CommandFrame {
        CommandFrame::request(Command::FingerState, 0x00, 0x01)
    }
}

impl From<&[u8; 4]> for FingerState {
    fn from(resp: &[u8; 4]) -> Self {
        if resp[2] == 0 {
            FingerState::Off
        } else {
            FingerState::On
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_write_sets_bit_three() {
        assert_eq!(
            PowerState::Normal.write_frame().bytes(),
            &[0x54, 0x58, 0x00, 0x01]
        );
        assert_eq!(
            PowerState::Sleep.write_frame().bytes(),
            &[0x54, 0x50, 0x00, 0x01]
        );
    }

    #[test]
    fn power_read_back_follows_echoed_bit() {
        assert_eq!(PowerState::from(&[0x52u8, 0x58, 0x00, 0x01]), PowerState::Normal);
        assert_eq!(PowerState::from(&[0x52u8, 0x50, 0x00, 0x01]), PowerState::Sleep);
        // Only bit 3 matters.
        assert_eq!(PowerState::from(&[0x52u8, 0x08, 0x00, 0x00]), PowerState::Normal);
        assert_eq!(PowerState::from(&[0x52u8, 0xF7, 0x00, 0x00]), PowerState::Sleep);
    }

    #[test]
    fn power_set_then_get_agrees() {
        for on in [true, false] {
            let frame = PowerState::from(on).write_frame();
            let echoed = [0x52, frame.command(), frame.param_hi(), frame.param_lo()];
            assert_eq!(PowerState::from(&echoed).is_on(), on);
        }
    }

    #[test]
    fn packet_polarity_is_inverted() {
        assert_eq!(
            PacketState::On.write_frame().bytes(),
            &[0x54, 0x8E, 0x00, 0x01]
        );
        assert_eq!(
            PacketState::Off.write_frame().bytes(),
            &[0x54, 0x8E, 0x01, 0x01]
        );
        assert_eq!(PacketState::from(&[0x52u8, 0x8E, 0x01, 0x01]), PacketState::Off);
        assert_eq!(PacketState::from(&[0x52u8, 0x8E, 0x00, 0x01]), PacketState::On);
    }

    #[test]
    fn finger_state() {
        assert_eq!(FingerState::from(&[0x52u8, 0x51, 0x00, 0x01]), FingerState::Off);
        assert_eq!(FingerState::from(&[0x52u8, 0x51, 0x01, 0x01]), FingerState::On);
        assert_eq!(
            FingerState::request_frame().bytes(),
            &[0x53, 0x51, 0x00, 0x01]
        );
    }
}
