//! Reduction of station pressure to sea level.
//!
//! Uses Babinet's baric step, `h = 8000 m * (1 + 0.004 t) / p`, refined once:
//! the first pass gives an approximate sea-level pressure, the second pass
//! repeats the step with the mean pressure and mean temperature of the air
//! column between sea level and the sensor.

use super::measurement::{Pressure, Temperature};

/// Temperature gradient of the air column in hundredths of a degree per
/// 5 m, i.e. 0.6 °C / 100 m.
const LAPSE_RATE_PER_5M: i64 = 3;

/// Baric step in mm/hPa for a temperature in hundredths of a degree and a
/// pressure in Pa.
fn baric_step(temperature: i64, pressure: i64) -> Option<i64> {
    if pressure == 0 {
        return None;
    }
    let step = 8000 * (100_000 + 4 * temperature) / pressure;
    (step != 0).then_some(step)
}

fn reduce(pressure: i64, altitude: i64, step: i64) -> i64 {
    pressure + altitude * 100_000 / step
}

/// Reduce `pressure` measured at `altitude_m` meters above sea level.
///
/// Returns `None` if the pressure is zero or the baric step collapses to zero.
pub fn sea_level_pressure(
    pressure: Pressure,
    temperature: Temperature,
    altitude_m: i32,
) -> Option<Pressure> {
    let p = pressure.0 as i64;
    let t = temperature.0 as i64;
    let alt = altitude_m as i64;

    let p0 = reduce(p, alt, baric_step(t, p)?);
    let p_mean = (p + p0) / 2;
    let t_top = t + LAPSE_RATE_PER_5M * alt / 5;
    let t_mean = (t + t_top) / 2;

    let sea = reduce(p, alt, baric_step(t_mean, p_mean)?);
    u32::try_from(sea).ok().map(Pressure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_site() {
        // 1006.56 hPa at 25.08 °C, 205 m above sea level
        let sea = sea_level_pressure(Pressure(100656), Temperature(2508), 205);
        assert_eq!(sea, Some(Pressure(103022)));
    }

    #[test]
    fn refinement_differs_from_single_pass() {
        let p = 100656;
        let single = reduce(p, 205, baric_step(2508, p).unwrap());
        assert_eq!(single, 103000);
        assert_ne!(
            sea_level_pressure(Pressure(p as u32), Temperature(2508), 205),
            Some(Pressure(single as u32))
        );
    }

    #[test]
    fn sea_level_site_is_unchanged() {
        let sea = sea_level_pressure(Pressure(101325), Temperature(1500), 0);
        assert_eq!(sea, Some(Pressure(101325)));
    }

    #[test]
    fn zero_pressure_is_rejected() {
        assert_eq!(sea_level_pressure(Pressure(0), Temperature(2000), 205), None);
    }
}
