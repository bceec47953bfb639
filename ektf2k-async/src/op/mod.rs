//! Wire-level definitions of the eKTF2K command set.

pub mod frame;
pub mod info;
pub mod state;

pub use frame::*;
pub use info::*;
pub use state::*;
