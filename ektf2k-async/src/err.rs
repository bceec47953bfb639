//! Error and warning types for the eKTF2K driver.

use core::fmt::{self, Debug};

use crate::device::State;
use crate::op::Command;

/// A raw I/O failure on the two-wire bus.
pub enum TransportError<TBUSERR> {
    /// The underlying bus reported an error.
    Bus(TBUSERR),
    /// Fewer bytes than requested were transmitted.
    ShortWrite {
        /// Number of bytes the caller asked to send.
        expected: usize,
        /// Number of bytes the bus reports as sent.
        actual: usize,
    },
    /// Fewer bytes than requested were received.
    ShortRead {
        /// Number of bytes the caller asked to receive.
        expected: usize,
        /// Number of bytes the bus reports as received.
        actual: usize,
    },
}

impl<TBUSERR: Debug> Debug for TransportError<TBUSERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::ShortWrite { expected, actual } => {
                write!(f, "ShortWrite(expected: {expected}, actual: {actual})")
            }
            Self::ShortRead { expected, actual } => {
                write!(f, "ShortRead(expected: {expected}, actual: {actual})")
            }
        }
    }
}

impl<TBUSERR: PartialEq> PartialEq for TransportError<TBUSERR> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bus(a), Self::Bus(b)) => a == b,
            (
                Self::ShortWrite { expected, actual },
                Self::ShortWrite {
                    expected: e,
                    actual: a,
                },
            )
            | (
                Self::ShortRead { expected, actual },
                Self::ShortRead {
                    expected: e,
                    actual: a,
                },
            ) => expected == e && actual == a,
            _ => false,
        }
    }
}

/// The bytes on the wire do not follow the command/response protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Byte 0 of a solicited response was not the response marker.
    NotAResponse(u8),
    /// The response echoed a different command than the one requested.
    CommandMismatch {
        /// The command that was sent.
        expected: u8,
        /// The command byte found in the response.
        actual: u8,
    },
    /// The controller reported a sensor dimension of zero.
    ZeroDimension(Command),
}

/// Any failure of a solicited exchange.
pub enum BusError<TBUSERR> {
    /// Raw I/O failure.
    Transport(TransportError<TBUSERR>),
    /// Malformed or unexpected response.
    Protocol(ProtocolError),
}

impl<TBUSERR: Debug> Debug for BusError<TBUSERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Transport({err:?})"),
            Self::Protocol(err) => write!(f, "Protocol({err:?})"),
        }
    }
}

impl<TBUSERR: PartialEq> PartialEq for BusError<TBUSERR> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Transport(a), Self::Transport(b)) => a == b,
            (Self::Protocol(a), Self::Protocol(b)) => a == b,
            _ => false,
        }
    }
}

impl<TBUSERR> From<TransportError<TBUSERR>> for BusError<TBUSERR> {
    fn from(err: TransportError<TBUSERR>) -> Self {
        BusError::Transport(err)
    }
}

impl<TBUSERR> From<ProtocolError> for BusError<TBUSERR> {
    fn from(err: ProtocolError) -> Self {
        BusError::Protocol(err)
    }
}

/// Board configuration is missing or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent.
    Missing(&'static str),
    /// A key has the wrong type or an out of range value.
    Invalid(&'static str),
    /// The board declares no touch controller.
    NotInUse,
    /// The board declares a different touch controller.
    NameMismatch,
}

/// The info query that failed during attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Firmware version.
    FirmwareVersion,
    /// Sensor width.
    Width,
    /// Sensor height.
    Height,
}

/// Attach failed; every resource acquired so far has been released.
pub enum InitError<TBUSERR, TGPIOERR, TINPUTERR> {
    /// An info query transaction failed.
    Query {
        /// Which query failed.
        query: Query,
        /// The underlying failure.
        source: BusError<TBUSERR>,
    },
    /// The interrupt pin could not be claimed or configured.
    InterruptPin(TGPIOERR),
    /// The host input subsystem refused the device.
    Input(TINPUTERR),
    /// Attach was requested outside of the `Cold` state.
    State(State),
}

impl<TBUSERR: Debug, TGPIOERR: Debug, TINPUTERR: Debug> Debug
    for InitError<TBUSERR, TGPIOERR, TINPUTERR>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { query, source } => write!(f, "Query({query:?}, {source:?})"),
            Self::InterruptPin(err) => write!(f, "InterruptPin({err:?})"),
            Self::Input(err) => write!(f, "Input({err:?})"),
            Self::State(state) => write!(f, "State({state:?})"),
        }
    }
}

/// A lifecycle operation was requested in a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateError(pub State);

/// A suspend step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendStep {
    /// Turning report streaming off.
    StreamingOff,
    /// Putting the sensor to sleep.
    PowerOff,
    /// Waking the sensor.
    PowerOn,
    /// Turning report streaming on.
    StreamingOn,
}

/// A non-fatal anomaly. It is logged and handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftWarning {
    /// The post-reset hello frame did not consist of four hello bytes.
    HelloMismatch([u8; 4]),
    /// The post-reset hello frame could not be received.
    HelloUnreadable,
    /// Power did not read back as normal after resume.
    PowerReadback,
    /// Streaming did not read back as on after resume.
    StreamingReadback,
    /// A best-effort suspend or resume command failed.
    SuspendStep(SuspendStep),
}

/// Warnings collected by a single lifecycle transition.
pub type Warnings = heapless::Vec<SoftWarning, 4>;

/// Records a warning, dropping it if the list is already full.
pub(crate) fn warn(warnings: &mut Warnings, warning: SoftWarning) {
    log::warn!("ektf2k: {warning:?}");
    let _ = warnings.push(warning);
}

/// Failure of a driver operation outside attach.
pub enum DeviceError<TBUSERR> {
    /// The device is not in a state that allows the operation.
    State(State),
    /// The exchange with the controller failed.
    Bus(BusError<TBUSERR>),
}

impl<TBUSERR: Debug> Debug for DeviceError<TBUSERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(state) => write!(f, "State({state:?})"),
            Self::Bus(err) => write!(f, "Bus({err:?})"),
        }
    }
}

impl<TBUSERR: PartialEq> PartialEq for DeviceError<TBUSERR> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::State(a), Self::State(b)) => a == b,
            (Self::Bus(a), Self::Bus(b)) => a == b,
            _ => false,
        }
    }
}

impl<TBUSERR> From<StateError> for DeviceError<TBUSERR> {
    fn from(err: StateError) -> Self {
        DeviceError::State(err.0)
    }
}

impl<TBUSERR> From<BusError<TBUSERR>> for DeviceError<TBUSERR> {
    fn from(err: BusError<TBUSERR>) -> Self {
        DeviceError::Bus(err)
    }
}

impl<TBUSERR> From<TransportError<TBUSERR>> for DeviceError<TBUSERR> {
    fn from(err: TransportError<TBUSERR>) -> Self {
        DeviceError::Bus(err.into())
    }
}
