//! Decoder for the unsolicited frames read on every interrupt.

use heapless::Vec;

/// Length of an unsolicited frame.
pub const REPORT_FRAME_LEN: usize = 25;

/// Number of finger slots in a report frame.
pub const MAX_FINGERS: usize = 5;

const SLOT_OFFSET: usize = 2;
const SLOT_LEN: usize = 3;

/// Second byte of a noise frame when the environment is noisy.
pub const VAL_NOISY: u8 = 0x41;

/// Leading byte of an unsolicited frame.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    /// Noise environment notification.
    Noise = 0x40,
    /// Hello, normally only seen right after reset.
    Hello = 0x55,
    /// Multi-touch report.
    Report = 0x5D,
    /// Calibration notification.
    Calib = 0x66,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x40 => Ok(Opcode::Noise),
            0x55 => Ok(Opcode::Hello),
            0x5D => Ok(Opcode::Report),
            0x66 => Ok(Opcode::Calib),
            other => Err(other),
        }
    }
}

/// One finger slot of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    /// The slot index (0-4).
    pub slot: u8,
    /// Raw x in sensor units.
    pub x: u16,
    /// Raw y in sensor units.
    pub y: u16,
    /// `false` when the slot was all zeroes (finger lifted or unused).
    pub present: bool,
}

/// A decoded report frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TouchFrameReport {
    /// Finger count announced in the frame header.
    pub finger_count: u8,
    /// Every slot, in slot order. Empty when `finger_count` is zero.
    pub points: Vec<TouchPoint, MAX_FINGERS>,
}

impl TouchFrameReport {
    /// `true` when the frame announces no finger at all.
    pub fn is_release(&self) -> bool {
        self.finger_count == 0
    }

    /// The slots holding a contact.
    pub fn present(&self) -> impl Iterator<Item = &TouchPoint> {
        self.points.iter().filter(|point| point.present)
    }
}

/// Decodes a report frame.
///
/// All five slots are scanned whatever the announced finger count: the
/// controller zero-fills the slots it does not use.
pub fn decode_report(frame: &[u8; REPORT_FRAME_LEN]) -> TouchFrameReport {
    let finger_count = frame[1] & 0x07;
    let mut report = TouchFrameReport {
        finger_count,
        points: Vec::new(),
    };
    if finger_count == 0 {
        return report;
    }

    for (slot, raw) in frame[SLOT_OFFSET..]
        .chunks_exact(SLOT_LEN)
        .take(MAX_FINGERS)
        .enumerate()
    {
        let point = match decode_slot([raw[0], raw[1], raw[2]]) {
            Some((x, y)) => TouchPoint {
                slot: slot as u8,
                x,
                y,
                present: true,
            },
            None => TouchPoint {
                slot: slot as u8,
                x: 0,
                y: 0,
                present: false,
            },
        };
        // Capacity equals the number of slots.
        let _ = report.points.push(point);
    }
    report
}

/// Unpacks a 3-byte slot into raw `(x, y)`, or `None` for an empty slot.
///
/// `x` takes the low nibble of byte 0 above byte 2, `y` the high nibble of
/// byte 0 above byte 1.
pub fn decode_slot(slot: [u8; SLOT_LEN]) -> Option<(u16, u16)> {
    let [b0, b1, b2] = slot;
    if b0 == 0 && b1 == 0 && b2 == 0 {
        return None;
    }
    let x = (((b0 & 0x0F) as u16) << 8) | b2 as u16;
    let y = (((b0 & 0xF0) as u16) << 4) | b1 as u16;
    Some((x, y))
}

/// Packs raw 12-bit `(x, y)` into a slot. Bits above 12 are dropped.
pub fn encode_slot(x: u16, y: u16) -> [u8; SLOT_LEN] {
    [
        (((y >> 4) & 0xF0) | ((x >> 8) & 0x0F)) as u8,
        y as u8,
        x as u8,
    ]
}
