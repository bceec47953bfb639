//! Read-only chip information: firmware version and sensor dimensions.

use super::frame::{Command, CommandFrame};

/// Packed firmware version as reported by `FW_VER`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FirmwareVersion(pub u16);

impl FirmwareVersion {
    /// The read request.
    pub const fn request_frame() -> CommandFrame {
        CommandFrame::request(Command::FwVer, 0x00, 0x01)
    }
}

impl From<&[u8; 4]> for FirmwareVersion {
    fn from(resp: &[u8; 4]) -> Self {
        Self(((resp[2] as u16) << 8) | (resp[3] & 0xF0) as u16)
    }
}

/// Read request for a sensor dimension (`WIDTH` or `HEIGHT`).
pub const fn dimension_request(command: Command) -> CommandFrame {
    CommandFrame::request(command, 0x00, 0x00)
}

/// Unpacks a 12-bit dimension: the low byte in `resp[2]`, the high nibble in
/// the upper half of `resp[3]`.
pub fn decode_dimension(resp: &[u8; 4]) -> u16 {
    (((resp[3] & 0xF0) as u16) << 4) | resp[2] as u16
}
