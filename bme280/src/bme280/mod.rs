pub mod average;
#[allow(clippy::module_inception)]
pub mod bme280;
pub mod calibration;
pub mod compensation;
pub mod error;
pub mod measurement;
pub mod raw;
pub mod registers;
pub mod sea_level;
pub mod variant;
