//! Sensor variants and driver options.

use super::raw::{BURST_LEN_TP, BURST_LEN_TPH};

/// Which chip the driver talks to.
///
/// Resolved once at construction. The driver does not probe for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// Temperature, pressure and humidity.
    Bme280,
    /// Temperature and pressure only.
    Bmp280,
}

/// Resolution of the pressure display split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressurePrecision {
    /// Hectopascal with two decimals.
    Hectopascal,
    /// Whole Pascal, truncated.
    WholePascal,
}

impl Variant {
    /// Expected content of the `id` register.
    pub const fn chip_id(self) -> u8 {
        match self {
            Variant::Bme280 => 0x60,
            Variant::Bmp280 => 0x58,
        }
    }

    pub const fn has_humidity(self) -> bool {
        matches!(self, Variant::Bme280)
    }

    /// Bytes in the `press_msb..` burst read.
    pub const fn burst_len(self) -> usize {
        match self {
            Variant::Bme280 => BURST_LEN_TPH,
            Variant::Bmp280 => BURST_LEN_TP,
        }
    }

    /// Clamp the reported temperature to the -40..85 °C operating range.
    pub const fn clamps_temperature(self) -> bool {
        matches!(self, Variant::Bme280)
    }

    pub const fn pressure_precision(self) -> PressurePrecision {
        match self {
            Variant::Bme280 => PressurePrecision::Hectopascal,
            Variant::Bmp280 => PressurePrecision::WholePascal,
        }
    }
}

/// Construction-time feature set of a driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Options {
    pub variant: Variant,
    /// Refuse to read while the status register reports a conversion or an
    /// NVM copy in progress.
    pub check_status: bool,
    /// Keep trailing-window averages of temperature and humidity.
    pub averaging: bool,
    /// Altitude of the measurement site above sea level, in meters.
    pub site_altitude_m: Option<i32>,
}

impl Options {
    pub const fn new(variant: Variant) -> Self {
        Options {
            variant,
            check_status: false,
            averaging: false,
            site_altitude_m: None,
        }
    }

    #[must_use]
    pub const fn with_status_check(mut self, enabled: bool) -> Self {
        self.check_status = enabled;
        self
    }

    #[must_use]
    pub const fn with_averaging(mut self, enabled: bool) -> Self {
        self.averaging = enabled;
        self
    }

    #[must_use]
    pub const fn with_site_altitude(mut self, meters: i32) -> Self {
        self.site_altitude_m = Some(meters);
        self
    }
}
