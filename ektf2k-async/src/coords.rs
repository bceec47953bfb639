//! Mapping from raw sensor units to screen coordinates.

/// How the panel is mounted relative to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// Largest logical x.
    pub screen_max_x: u16,
    /// Largest logical y.
    pub screen_max_y: u16,
    /// Mirror the x axis.
    pub revert_x: bool,
    /// Mirror the y axis.
    pub revert_y: bool,
    /// Swap the axes. Applied last.
    pub exchange_xy: bool,
}

/// Scales `value` from `0..=sensor_max` to `0..=screen_max`, truncating.
///
/// A zero `sensor_max` maps everything to zero.
pub fn scale(value: u16, screen_max: u16, sensor_max: u16) -> u16 {
    if sensor_max == 0 {
        return 0;
    }
    let scaled = value as u32 * screen_max as u32 / sensor_max as u32;
    u16::try_from(scaled).unwrap_or(u16::MAX)
}

/// Mirrors `value` inside `0..=max`.
pub fn revert(value: u16, max: u16) -> u16 {
    max.saturating_sub(value)
}

impl Orientation {
    /// Normalizes a raw point: scale, then mirror, then swap.
    ///
    /// `sensor_max_x`/`sensor_max_y` are the width and height the controller
    /// reported at attach.
    pub fn normalize(&self, x: u16, y: u16, sensor_max_x: u16, sensor_max_y: u16) -> (u16, u16) {
        let mut x = scale(x, self.screen_max_x, sensor_max_x);
        let mut y = scale(y, self.screen_max_y, sensor_max_y);

        if self.revert_x {
            x = revert(x, self.screen_max_x);
        }
        if self.revert_y {
            y = revert(y, self.screen_max_y);
        }

        if self.exchange_xy {
            (y, x)
        } else {
            (x, y)
        }
    }
}
