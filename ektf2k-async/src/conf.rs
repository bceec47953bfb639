//! Board configuration for the touch controller.

use heapless::String;

use crate::coords::Orientation;
use crate::err::ConfigError;

/// Section of the board configuration describing the touch panel.
pub const SECTION: &str = "ctp_para";

/// Controller name a board must declare for this driver to bind.
pub const CTP_NAME: &str = "ekt3632";

/// Longest controller name the board configuration may carry.
pub const NAME_LEN: usize = 20;

/// A typed scalar or string from the board configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValue<'a> {
    /// An integer value.
    Int(i32),
    /// A string value.
    Str(&'a str),
}

/// Read access to the board's configuration store.
pub trait ConfigStore {
    /// Looks up `key` in `section`, `None` when it is absent.
    fn fetch(&self, section: &str, key: &str) -> Option<ConfigValue<'_>>;
}

/// Everything the driver needs to know about the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Declared controller name.
    pub name: String<NAME_LEN>,
    /// Index of the two-wire bus the controller sits on.
    pub twi_id: u8,
    /// 7-bit bus address of the controller.
    pub twi_addr: u8,
    /// Screen bounds and axis transforms.
    pub orientation: Orientation,
}

impl BoardConfig {
    /// Loads and validates the configuration.
    pub fn load(store: &impl ConfigStore) -> Result<Self, ConfigError> {
        if int(store, "ctp_used")? != 1 {
            log::info!("ektf2k::conf CTP not in use");
            return Err(ConfigError::NotInUse);
        }

        let declared = string(store, "ctp_name")?;
        if declared != CTP_NAME {
            log::info!("ektf2k::conf CTP name {declared} doesn't match {CTP_NAME}");
            return Err(ConfigError::NameMismatch);
        }
        let mut name = String::new();
        name.push_str(declared)
            .map_err(|_| ConfigError::Invalid("ctp_name"))?;

        let twi_id = ranged(store, "ctp_twi_id", 0, u8::MAX as i32)? as u8;
        let twi_addr = ranged(store, "ctp_twi_addr", 0, 0x7F)? as u8;

        let orientation = Orientation {
            screen_max_x: ranged(store, "ctp_screen_max_x", 1, u16::MAX as i32)? as u16,
            screen_max_y: ranged(store, "ctp_screen_max_y", 1, u16::MAX as i32)? as u16,
            revert_x: int(store, "ctp_revert_x_flag")? != 0,
            revert_y: int(store, "ctp_revert_y_flag")? != 0,
            exchange_xy: int(store, "ctp_exchange_x_y_flag")? != 0,
        };

        log::info!("ektf2k::conf CTP {name}, twi id {twi_id}, twi addr {twi_addr:#x}");

        Ok(Self {
            name,
            twi_id,
            twi_addr,
            orientation,
        })
    }

    /// Whether the controller is wired to bus adapter `adapter`.
    pub fn matches_bus(&self, adapter: u8) -> bool {
        self.twi_id == adapter
    }
}

fn int(store: &impl ConfigStore, key: &'static str) -> Result<i32, ConfigError> {
    match store.fetch(SECTION, key) {
        Some(ConfigValue::Int(value)) => Ok(value),
        Some(ConfigValue::Str(_)) => Err(ConfigError::Invalid(key)),
        None => {
            log::error!("ektf2k::conf failed to parse value for key {key}");
            Err(ConfigError::Missing(key))
        }
    }
}

fn ranged(
    store: &impl ConfigStore,
    key: &'static str,
    min: i32,
    max: i32,
) -> Result<i32, ConfigError> {
    let value = int(store, key)?;
    if value < min || value > max {
        log::error!("ektf2k::conf value {value} for key {key} out of range");
        return Err(ConfigError::Invalid(key));
    }
    Ok(value)
}

fn string<'a>(store: &'a impl ConfigStore, key: &'static str) -> Result<&'a str, ConfigError> {
    match store.fetch(SECTION, key) {
        Some(ConfigValue::Str(value)) => Ok(value),
        Some(ConfigValue::Int(_)) => Err(ConfigError::Invalid(key)),
        None => {
            log::error!("ektf2k::conf failed to parse value for key {key}");
            Err(ConfigError::Missing(key))
        }
    }
}
