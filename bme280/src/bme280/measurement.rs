//! Compensated values and the per-sensor measurement state.

use super::average::RollingAverage;
use super::raw::{BoundaryFlags, RawSample};
use super::registers::Status;
use super::variant::PressurePrecision;

/// Integer and fractional display components of a fixed-point value.
///
/// `fraction` is never negative. The sign lives in `negative`, so values
/// between -1 and 0 keep their sign even though `integer` is zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayParts {
    pub negative: bool,
    pub integer: i32,
    pub fraction: u8,
}

impl DisplayParts {
    /// Split a value in hundredths for display.
    ///
    /// The divisor is 100 when the whole-unit part exceeds 9 in magnitude and
    /// 10 otherwise. Values below ten units are therefore grouped as
    /// tenths-of-a-unit integers, matching the established display format.
    pub fn from_hundredths(value: i32) -> Self {
        let divisor = if (value / 100).abs() > 9 { 100 } else { 10 };
        Self::split(value, divisor)
    }

    /// Split a value in hundredths at the decimal point, always by 100.
    pub fn from_hundredths_exact(value: i32) -> Self {
        Self::split(value, 100)
    }

    fn split(value: i32, divisor: i32) -> Self {
        DisplayParts {
            negative: value < 0,
            integer: value / divisor,
            fraction: (value % divisor).unsigned_abs() as u8,
        }
    }
}

/// Temperature in hundredths of a degree Celsius.
///
/// A value of `2350` represents **23.50 °C**.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    pub fn display(&self) -> DisplayParts {
        DisplayParts::from_hundredths(self.0)
    }
}

/// Pressure in Pascal.
///
/// A value of `101325` represents **1013.25 hPa**.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub u32);

impl Pressure {
    /// Split according to the variant's precision.
    ///
    /// `Hectopascal` yields hPa with two decimals, `WholePascal` the integer
    /// Pa value with no fractional part.
    pub fn display(&self, precision: PressurePrecision) -> DisplayParts {
        match precision {
            PressurePrecision::Hectopascal => DisplayParts {
                negative: false,
                integer: (self.0 / 100) as i32,
                fraction: (self.0 % 100) as u8,
            },
            PressurePrecision::WholePascal => DisplayParts {
                negative: false,
                integer: self.0 as i32,
                fraction: 0,
            },
        }
    }
}

/// Relative humidity in hundredths of a percent.
///
/// A value of `4523` represents **45.23 %RH**.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub u32);

impl Humidity {
    pub fn display(&self) -> DisplayParts {
        DisplayParts::from_hundredths(self.0 as i32)
    }
}

/// One successful, fully compensated measurement.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub temperature: Temperature,
    /// `None` when pressure oversampling is skipped.
    pub pressure: Option<Pressure>,
    /// Station pressure reduced to sea level, if a site altitude is configured.
    pub sea_level_pressure: Option<Pressure>,
    /// Present on the BME280 only, and only when humidity is not skipped.
    pub humidity: Option<Humidity>,
    /// Shared intermediate of the pressure and humidity formulas.
    pub t_fine: i32,
}

/// Means of the populated averaging windows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Averages {
    pub temperature: Option<i32>,
    pub humidity: Option<i32>,
}

impl Averages {
    pub fn temperature_display(&self) -> Option<DisplayParts> {
        self.temperature.map(DisplayParts::from_hundredths_exact)
    }

    pub fn humidity_display(&self) -> Option<DisplayParts> {
        self.humidity.map(DisplayParts::from_hundredths_exact)
    }
}

/// Caller-owned state of one sensor's measurement cycle.
///
/// Raw counts, status and fault flags describe the latest cycle and are
/// overwritten every time. `reading` and the averages only change when a
/// cycle succeeds, so they always hold the last valid values.
/// `N` is the length of the averaging windows.
#[derive(Debug)]
pub struct MeasurementState<const N: usize> {
    pub raw: RawSample,
    pub status: Option<Status>,
    pub boundaries: BoundaryFlags,
    pub divide_by_zero: bool,
    pub reading: Option<Reading>,
    pub averages: Averages,
    pub(crate) temperature_window: RollingAverage<N>,
    pub(crate) humidity_window: RollingAverage<N>,
}

impl<const N: usize> MeasurementState<N> {
    pub const fn new() -> Self {
        MeasurementState {
            raw: RawSample {
                adc_p: 0,
                adc_t: 0,
                adc_h: None,
            },
            status: None,
            boundaries: BoundaryFlags {
                temperature: None,
                pressure: None,
                humidity: None,
            },
            divide_by_zero: false,
            reading: None,
            averages: Averages {
                temperature: None,
                humidity: None,
            },
            temperature_window: RollingAverage::new(),
            humidity_window: RollingAverage::new(),
        }
    }

    pub fn temperature_window(&self) -> &RollingAverage<N> {
        &self.temperature_window
    }

    pub fn humidity_window(&self) -> &RollingAverage<N> {
        &self.humidity_window
    }

    /// Clear the per-cycle diagnostics before a new read.
    pub(crate) fn begin_cycle(&mut self) {
        self.raw = RawSample::default();
        self.status = None;
        self.boundaries = BoundaryFlags::default();
        self.divide_by_zero = false;
    }
}

impl<const N: usize> Default for MeasurementState<N> {
    fn default() -> Self {
        Self::new()
    }
}
