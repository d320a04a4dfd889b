//! Driver for the Bosch BME280 temperature, humidity, and pressure sensor,
//! and its humidity-less sibling, the BMP280.
//!
//! The driver configures the sensor, verifies the configuration was accepted,
//! reads the raw ADC counts and converts them with the vendor's 32-bit
//! fixed-point compensation formulas. No FPU is required.
//!
//! Units used throughout:
//! - temperature: hundredths of a degree Celsius (`2508` = 25.08 °C)
//! - pressure: Pascal (`100656` = 1006.56 hPa)
//! - humidity: hundredths of a percent (`5499` = 54.99 %RH)

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod bme280;
pub mod format;
pub mod schedule;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export the public API things
// This avoids having to do bme280::bme280::bme280::Bme280, etc
pub use bme280::{
    average::RollingAverage,
    bme280::{Bme280, ConfigStatus, CONFIG_ATTEMPTS, RESET_SETTLE_MS},
    calibration::{CalibrationSet, HumidityCalibration},
    compensation::{compensate_humidity, compensate_pressure, compensate_temperature},
    error::{Error, ErrorState},
    measurement::{
        Averages, DisplayParts, Humidity, MeasurementState, Pressure, Reading, Temperature,
    },
    raw::{BoundaryFlags, BoundaryViolation, Channel, Limit, RawSample},
    registers::{
        Filter, MeasurementTime, Mode, Oversampling, Settings, Standby, Status,
    },
    sea_level::sea_level_pressure,
    variant::{Options, PressurePrecision, Variant},
};
pub use schedule::{Clock, MeasurementSchedule};
pub use transport::{Address, I2cTransport, Retry, SpiTransport, Transport, TransportError};
