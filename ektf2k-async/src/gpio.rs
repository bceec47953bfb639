//! GPIO capabilities the driver needs from the platform.

use core::fmt::Debug;

/// Board pins used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtpPin {
    /// Active-low reset line.
    Reset,
    /// Wake-up line.
    Wakeup,
    /// Interrupt line driven by the controller.
    Interrupt,
}

impl CtpPin {
    /// The pin's key in the board configuration.
    pub const fn name(self) -> &'static str {
        match self {
            CtpPin::Reset => "ctp_reset",
            CtpPin::Wakeup => "ctp_wakeup",
            CtpPin::Interrupt => "ctp_int_port",
        }
    }
}

/// Trigger condition of the interrupt line.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqMode {
    /// Rising edge.
    PositiveEdge = 0,
    /// Falling edge.
    NegativeEdge = 1,
    /// While high.
    HighLevel = 2,
    /// While low. The controller holds the line low until its frame is read.
    LowLevel = 3,
    /// Both edges.
    DoubleEdge = 4,
}

/// Opaque handle to a claimed pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinHandle(pub u32);

/// Platform adapter for pin control and interrupt plumbing.
pub trait CtpGpio {
    /// Error reported by the platform.
    type Error: Debug;

    /// Claims a board pin.
    fn request_pin(&mut self, pin: CtpPin) -> Result<PinHandle, Self::Error>;

    /// Returns a claimed pin to the platform.
    fn release_pin(&mut self, handle: PinHandle);

    /// Drives an output pin.
    fn set_level(&mut self, handle: PinHandle, high: bool) -> Result<(), Self::Error>;

    /// Sets the trigger mode of the interrupt pin.
    fn configure_interrupt(&mut self, handle: PinHandle, mode: IrqMode) -> Result<(), Self::Error>;

    /// Masks or unmasks the interrupt source.
    fn set_interrupt_enabled(&mut self, enabled: bool);

    /// Reads the pending flag of the interrupt line and clears it.
    fn read_and_ack_interrupt(&mut self) -> bool;
}
