//! Command frames and the marker/command byte catalog.

/// Length of every solicited command and response frame.
pub const COMMAND_FRAME_LEN: usize = 4;

/// First byte of a solicited frame, selecting its intent.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Device to host reply.
    Response = 0x52,
    /// Host read request.
    Request = 0x53,
    /// Host write.
    Write = 0x54,
}

/// Second byte of a solicited frame.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Firmware version, read-only.
    FwVer = 0x00,
    /// Sleep or normal sensing mode. Bit 3 of the command byte carries the state.
    PowerState = 0x50,
    /// Whether a finger rests on the panel, read-only.
    FingerState = 0x51,
    /// Sensor height in raw units, read-only.
    Height = 0x60,
    /// Sensor width in raw units, read-only.
    Width = 0x63,
    /// Whether report frames are streamed at all.
    PacketState = 0x8E,
}

/// Four-byte broadcast messages that carry no response.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataMessage {
    /// Sent by the controller once after reset.
    Hello = 0x55,
    /// Soft reset request.
    Reset = 0x77,
    /// Repeat last report.
    Repeat = 0xA6,
    /// Recalibration request.
    Calib = 0xA8,
}

impl DataMessage {
    /// The frame for this message: the code repeated four times.
    pub const fn frame(self) -> [u8; COMMAND_FRAME_LEN] {
        [self as u8; COMMAND_FRAME_LEN]
    }
}

/// A fixed 4-byte solicited frame `[marker, command, param_hi, param_lo]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    inner: [u8; COMMAND_FRAME_LEN],
}

impl CommandFrame {
    /// Builds a frame from its four fields.
    pub const fn new(marker: Marker, command: u8, param_hi: u8, param_lo: u8) -> Self {
        Self {
            inner: [marker as u8, command, param_hi, param_lo],
        }
    }

    /// A read request for `command`.
    pub const fn request(command: Command, param_hi: u8, param_lo: u8) -> Self {
        Self::new(Marker::Request, command as u8, param_hi, param_lo)
    }

    /// A write of `command`.
    pub const fn write(command: Command, param_hi: u8, param_lo: u8) -> Self {
        Self::new(Marker::Write, command as u8, param_hi, param_lo)
    }

    /// The marker byte.
    pub const fn marker(&self) -> u8 {
        self.inner[0]
    }

    /// The command byte.
    pub const fn command(&self) -> u8 {
        self.inner[1]
    }

    /// The high parameter byte.
    pub const fn param_hi(&self) -> u8 {
        self.inner[2]
    }

    /// The low parameter byte.
    pub const fn param_lo(&self) -> u8 {
        self.inner[3]
    }

    /// The raw bytes.
    pub const fn bytes(&self) -> &[u8; COMMAND_FRAME_LEN] {
        &self.inner
    }
}

impl From<CommandFrame> for [u8; COMMAND_FRAME_LEN] {
    fn from(val: CommandFrame) -> Self {
        val.inner
    }
}

impl From<[u8; COMMAND_FRAME_LEN]> for CommandFrame {
    fn from(inner: [u8; COMMAND_FRAME_LEN]) -> Self {
        Self { inner }
    }
}
