//! The host side: where decoded touches go.

use core::convert::Infallible;
use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

/// Name the device registers under.
pub const DEVICE_NAME: &str = "ektf2k";

/// Largest pressure value reported.
pub const PRESSURE_MAX: u8 = 255;

/// What the device can report, registered once at attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Device name.
    pub name: &'static str,
    /// Largest reported x.
    pub x_max: u16,
    /// Largest reported y.
    pub y_max: u16,
    /// Largest reported pressure.
    pub pressure_max: u8,
    /// The panel sits on top of the screen.
    pub direct: bool,
}

impl Capabilities {
    /// Capabilities of a panel covering `0..=x_max` by `0..=y_max`.
    pub const fn new(x_max: u16, y_max: u16) -> Self {
        Self {
            name: DEVICE_NAME,
            x_max,
            y_max,
            pressure_max: PRESSURE_MAX,
            direct: true,
        }
    }
}

/// Host pointer-input subsystem.
pub trait InputSink {
    /// Error reported when registration fails.
    type Error: Debug;

    /// Registers the device with its screen bounds.
    fn register(&mut self, capabilities: &Capabilities) -> Result<(), Self::Error>;

    /// Removes the device from the host.
    fn unregister(&mut self);

    /// Touch down (`true`) or release (`false`).
    fn report_touch(&mut self, down: bool);

    /// Position of the current contact in screen units.
    fn report_position(&mut self, x: u16, y: u16);

    /// Pressure of the current contact.
    fn report_pressure(&mut self, pressure: u8);

    /// Ends the current contact within a frame.
    fn mt_sync(&mut self);

    /// Ends the frame.
    fn sync(&mut self);
}

/// A single input event as produced by [`ChannelSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Touch down or release.
    Touch(bool),
    /// Contact position.
    Position {
        /// Screen x.
        x: u16,
        /// Screen y.
        y: u16,
    },
    /// Contact pressure.
    Pressure(u8),
    /// End of one contact.
    ContactEnd,
    /// End of a frame.
    Sync,
}

/// An [`InputSink`] that forwards events into an `embassy-sync` channel.
///
/// Events are pushed without waiting; when the consumer falls behind the
/// event is dropped and logged.
pub struct ChannelSink<'ch, M: RawMutex, const N: usize> {
    sender: Sender<'ch, M, InputEvent, N>,
    capabilities: Option<Capabilities>,
}

impl<'ch, M: RawMutex, const N: usize> ChannelSink<'ch, M, N> {
    /// Creates a new `ChannelSink`.
    pub fn new(sender: Sender<'ch, M, InputEvent, N>) -> Self {
        Self {
            sender,
            capabilities: None,
        }
    }

    /// The registered capabilities, `None` when not registered.
    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.capabilities.as_ref()
    }

    fn push(&mut self, event: InputEvent) {
        if self.capabilities.is_none() {
            log::trace!("ektf2k::input dropping {event:?}, not registered");
            return;
        }
        if self.sender.try_send(event).is_err() {
            log::warn!("ektf2k::input channel full, dropping {event:?}");
        }
    }
}

impl<'ch, M: RawMutex, const N: usize> InputSink for ChannelSink<'ch, M, N> {
    type Error = Infallible;

    fn register(&mut self, capabilities: &Capabilities) -> Result<(), Self::Error> {
        self.capabilities = Some(*capabilities);
        Ok(())
    }

    fn unregister(&mut self) {
        self.capabilities = None;
    }

    fn report_touch(&mut self, down: bool) {
        self.push(InputEvent::Touch(down));
    }

    fn report_position(&mut self, x: u16, y: u16) {
        self.push(InputEvent::Position { x, y });
    }

    fn report_pressure(&mut self, pressure: u8) {
        self.push(InputEvent::Pressure(pressure));
    }

    fn mt_sync(&mut self) {
        self.push(InputEvent::ContactEnd);
    }

    fn sync(&mut self) {
        self.push(InputEvent::Sync);
    }
}
