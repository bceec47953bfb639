//! An asynchronous, `no_std` protocol engine for the Elan eKTF2000-series
//! capacitive touch controllers (eKTF2K, EKT3632).
//!
//! The driver frames and validates the controller's 4-byte command/response
//! exchanges, decodes the 25-byte multi-touch reports it streams on every
//! interrupt, maps raw sensor units to screen coordinates and drives the
//! chip through attach, suspend, resume and detach.
//!
//! Everything board specific is a collaborator trait: the two-wire channel
//! ([`transport::Transport`], with an adapter for any
//! `embedded-hal-async::i2c::I2c`), pin control ([`gpio::CtpGpio`]), the host
//! input subsystem ([`input::InputSink`]) and the board configuration store
//! ([`conf::ConfigStore`]).
//!
//! # Usage
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::channel::Channel;
//! use embassy_time::Delay;
//! use ektf2k_async::{input::ChannelSink, transport::I2cTransport, Ektf2k};
//!
//! static EVENTS: Channel<CriticalSectionRawMutex, InputEvent, 32> = Channel::new();
//!
//! let touch: Ektf2k<CriticalSectionRawMutex, _, _, _, _> = Ektf2k::from_store(
//!     &board_config,
//!     |config| I2cTransport::new(i2c, config.twi_addr),
//!     Delay,
//!     board_gpio,
//!     ChannelSink::new(EVENTS.sender()),
//! )?;
//! touch.attach().await?;
//!
//! // In the task owning the interrupt line:
//! touch.run(&mut touch_int).await;
//!
//! // From the power-management task:
//! touch.enter_suspend().await?;
//! touch.leave_suspend().await?;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod conf;
pub mod coords;
pub mod ctp;
pub mod device;
pub mod dispatch;
pub mod err;
pub mod gpio;
pub mod input;
pub mod op;
pub mod report;
pub mod transport;

#[cfg(test)]
mod mock;

pub use device::{Ektf2k, SessionInfo, State};
pub use dispatch::Dispatch;
