//! Register map and configuration register image.
//!
//! Register addresses come from the BME280 datasheet, Table 18 (Memory Map).
//! The configuration lives in three registers which are packed and unpacked
//! with explicit shifts and masks, never through struct overlays.

/// Register addresses.
pub mod reg {
    pub const CALIB_00: u8 = 0x88;
    pub const CALIB_25: u8 = 0xA1;
    pub const CHIP_ID: u8 = 0xD0;
    pub const SOFT_RESET: u8 = 0xE0;
    pub const CALIB_26: u8 = 0xE1;
    pub const CTRL_HUM: u8 = 0xF2;
    pub const STATUS: u8 = 0xF3;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const CONFIG: u8 = 0xF5;
    pub const PRESS_MSB: u8 = 0xF7;
}

/// Written to [`reg::SOFT_RESET`] to run the complete power-on-reset procedure.
pub const SOFT_RESET_CMD: u8 = 0xB6;

/// Mode bits `mode[1:0]` of `ctrl_meas`.
pub const MODE_MASK: u8 = 0b0000_0011;

const OSRS_MASK: u8 = 0b111;
const OSRS_P_POS: u8 = 2;
const OSRS_T_POS: u8 = 5;
const FILTER_POS: u8 = 2;
const STANDBY_POS: u8 = 5;
const SPI3W_EN: u8 = 0b1;

const STATUS_MEASURING: u8 = 0b0000_1000;
const STATUS_IM_UPDATE: u8 = 0b0000_0001;

/// Oversampling for temperature, pressure, and humidity.
///
/// Higher oversampling increases resolution and measurement duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement. The channel output is held at its reset value.
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

impl Oversampling {
    /// Decode a 3-bit `osrs_x` field. Codes above `0b101` all mean ×16.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & OSRS_MASK {
            0b000 => Oversampling::Skipped,
            0b001 => Oversampling::X1,
            0b010 => Oversampling::X2,
            0b011 => Oversampling::X4,
            0b100 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }

    /// Number of samples averaged by the sensor, `0` when skipped.
    pub const fn factor(self) -> u32 {
        match self {
            Oversampling::Skipped => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

/// Power mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Sleep = 0b00,
    /// One conversion, then back to sleep. The sensor clears its own mode bits.
    Forced = 0b01,
    Normal = 0b11,
}

impl Mode {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & MODE_MASK {
            0b00 => Mode::Sleep,
            0b11 => Mode::Normal,
            _ => Mode::Forced,
        }
    }
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

impl Filter {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Filter::Off,
            0b001 => Filter::X2,
            0b010 => Filter::X4,
            0b011 => Filter::X8,
            _ => Filter::X16,
        }
    }
}

/// Inactive duration t<sub>standby</sub> between conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

impl Standby {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Standby::Ms0_5,
            0b001 => Standby::Ms62_5,
            0b010 => Standby::Ms125,
            0b011 => Standby::Ms250,
            0b100 => Standby::Ms500,
            0b101 => Standby::Ms1000,
            0b110 => Standby::Ms10,
            _ => Standby::Ms20,
        }
    }
}

/// Which measurement time estimate to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementTime {
    Typical,
    Max,
}

/// Target configuration: the image of `ctrl_hum`, `ctrl_meas` and `config`.
///
/// All setters are `const`, so a configuration can be built at compile time:
///
/// ```
/// use bme280::{Filter, Mode, Oversampling, Settings, Standby};
///
/// const SETTINGS: Settings = Settings::new()
///     .with_mode(Mode::Normal)
///     .with_filter(Filter::X4)
///     .with_standby(Standby::Ms1000)
///     .with_osrs_h(Oversampling::X2);
///
/// assert_eq!(SETTINGS.to_bytes(), [0b010, 0b101_101_11, 0b101_010_0_0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub osrs_h: Oversampling,
    pub osrs_p: Oversampling,
    pub osrs_t: Oversampling,
    pub mode: Mode,
    pub filter: Filter,
    pub standby: Standby,
    pub spi3w_en: bool,
}

impl Settings {
    /// ×16 oversampling on every channel, forced mode, filter off,
    /// 0.5 ms standby, 4-wire SPI.
    ///
    /// With the filter off, ×16 gives the full 20-bit resolution for
    /// temperature and pressure.
    pub const fn new() -> Self {
        Settings {
            osrs_h: Oversampling::X16,
            osrs_p: Oversampling::X16,
            osrs_t: Oversampling::X16,
            mode: Mode::Forced,
            filter: Filter::Off,
            standby: Standby::Ms0_5,
            spi3w_en: false,
        }
    }

    #[must_use]
    pub const fn with_osrs_h(mut self, os: Oversampling) -> Self {
        self.osrs_h = os;
        self
    }

    #[must_use]
    pub const fn with_osrs_p(mut self, os: Oversampling) -> Self {
        self.osrs_p = os;
        self
    }

    #[must_use]
    pub const fn with_osrs_t(mut self, os: Oversampling) -> Self {
        self.osrs_t = os;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn with_standby(mut self, standby: Standby) -> Self {
        self.standby = standby;
        self
    }

    #[must_use]
    pub const fn with_spi3w(mut self, enabled: bool) -> Self {
        self.spi3w_en = enabled;
        self
    }

    /// `ctrl_hum` register: `osrs_h[2:0]`.
    pub const fn ctrl_hum(&self) -> u8 {
        self.osrs_h as u8
    }

    /// `ctrl_meas` register: `osrs_t[7:5] osrs_p[4:2] mode[1:0]`.
    pub const fn ctrl_meas(&self) -> u8 {
        ((self.osrs_t as u8) << OSRS_T_POS) | ((self.osrs_p as u8) << OSRS_P_POS) | self.mode as u8
    }

    /// `config` register: `t_sb[7:5] filter[4:2] spi3w_en[0]`.
    pub const fn config(&self) -> u8 {
        let spi3w = if self.spi3w_en { SPI3W_EN } else { 0 };
        ((self.standby as u8) << STANDBY_POS) | ((self.filter as u8) << FILTER_POS) | spi3w
    }

    /// Register bytes in the order `[ctrl_hum, ctrl_meas, config]`.
    pub const fn to_bytes(&self) -> [u8; 3] {
        [self.ctrl_hum(), self.ctrl_meas(), self.config()]
    }

    /// Decode `[ctrl_hum, ctrl_meas, config]`. Reserved bits are ignored.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        let [ctrl_hum, ctrl_meas, config] = bytes;
        Settings {
            osrs_h: Oversampling::from_bits(ctrl_hum),
            osrs_p: Oversampling::from_bits(ctrl_meas >> OSRS_P_POS),
            osrs_t: Oversampling::from_bits(ctrl_meas >> OSRS_T_POS),
            mode: Mode::from_bits(ctrl_meas),
            filter: Filter::from_bits(config >> FILTER_POS),
            standby: Standby::from_bits(config >> STANDBY_POS),
            spi3w_en: config & SPI3W_EN != 0,
        }
    }

    /// Compare a register read-back with this configuration.
    ///
    /// In forced mode the sensor drops back to sleep after its single
    /// conversion, so the mode bits are excluded from the comparison. Without
    /// humidity there is no `ctrl_hum` register and byte 0 is not compared.
    pub fn matches_readback(&self, readback: [u8; 3], has_humidity: bool) -> bool {
        let mode_mask = match self.mode {
            Mode::Forced => !MODE_MASK,
            _ => 0xFF,
        };
        let written = self.to_bytes();

        (!has_humidity || readback[0] == written[0])
            && readback[1] & mode_mask == written[1] & mode_mask
            && readback[2] == written[2]
    }

    /// Duration of one conversion cycle in milliseconds, rounded to nearest.
    ///
    /// Datasheet section 9.1, with skipped channels contributing nothing.
    pub fn measurement_time_ms(&self, kind: MeasurementTime) -> u32 {
        let (base, per_sample, overhead) = match kind {
            MeasurementTime::Typical => (1000, 2000, 500),
            MeasurementTime::Max => (1250, 2300, 575),
        };
        let channel = |os: Oversampling, extra: u32| match os {
            Oversampling::Skipped => 0,
            _ => per_sample * os.factor() + extra,
        };

        let micros = base
            + channel(self.osrs_t, 0)
            + channel(self.osrs_p, overhead)
            + channel(self.osrs_h, overhead);

        (micros + 500) / 1000
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

/// Content of the `status` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    /// A conversion is running.
    pub const fn measuring(&self) -> bool {
        self.0 & STATUS_MEASURING != 0
    }

    /// NVM data is being copied to the image registers.
    pub const fn im_update(&self) -> bool {
        self.0 & STATUS_IM_UPDATE != 0
    }

    pub const fn is_busy(&self) -> bool {
        self.measuring() || self.im_update()
    }
}
