//! Display strings for readings, with a comma as decimal separator.
//!
//! ```
//! use bme280::format;
//! use bme280::{Pressure, Temperature};
//!
//! assert_eq!(format::temperature(Temperature(2508)), "25,08");
//! assert_eq!(format::pressure_hpa(Pressure(99325)), " 993,25");
//! ```

use core::fmt::Write;

use heapless::String;

use crate::bme280::measurement::{DisplayParts, Humidity, Pressure, Temperature};
use crate::bme280::variant::PressurePrecision;

/// Long enough for any `i32` plus sign, separator and two decimals.
pub const DISPLAY_LEN: usize = 16;

pub type DisplayString = String<DISPLAY_LEN>;

/// `"<integer>,<fraction>"` with a two-digit fraction.
///
/// A negative value with a zero integer part keeps its minus sign.
pub fn parts(parts: DisplayParts) -> DisplayString {
    let mut s = DisplayString::new();
    let sign = if parts.negative && parts.integer == 0 { "-" } else { "" };
    // Cannot overflow, see DISPLAY_LEN.
    let _ = write!(s, "{}{},{:02}", sign, parts.integer, parts.fraction);
    s
}

pub fn temperature(t: Temperature) -> DisplayString {
    parts(t.display())
}

pub fn humidity(h: Humidity) -> DisplayString {
    parts(h.display())
}

/// Pressure in hPa, right-aligned to four integer digits.
pub fn pressure_hpa(p: Pressure) -> DisplayString {
    let mut s = DisplayString::new();
    let _ = write!(s, "{:>4},{:02}", p.0 / 100, p.0 % 100);
    s
}

/// Pressure at the precision of the sensor variant.
pub fn pressure(p: Pressure, precision: PressurePrecision) -> DisplayString {
    match precision {
        PressurePrecision::Hectopascal => pressure_hpa(p),
        PressurePrecision::WholePascal => {
            let mut s = DisplayString::new();
            let _ = write!(s, "{}", p.display(precision).integer);
            s
        }
    }
}
