//! 32-bit fixed-point compensation formulas from the BME280 datasheet.
//!
//! All functions are pure: the same counts and coefficients always give the
//! same result. Integer division truncates toward zero, right shifts are
//! arithmetic and intermediates wrap in two's complement, exactly like the
//! vendor's C reference code. Any in-range count gives a value, never a panic.

use super::calibration::{CalibrationSet, HumidityCalibration};
use super::measurement::{Humidity, Pressure, Temperature};

/// Lower end of the operating range, -40.00 °C.
pub const TEMPERATURE_MIN: i32 = -4000;
/// Upper end of the operating range, 85.00 °C.
pub const TEMPERATURE_MAX: i32 = 8500;

/// Largest humidity in Q22.10 %RH, i.e. 100.00 %.
const HUMIDITY_MAX_Q10: u32 = 102_400;
/// Clamp on the humidity intermediate before the final shift.
const HUMIDITY_VAR_MAX: i32 = 419_430_400;

/// Compensate a raw temperature count.
///
/// Returns `t_fine`, which the pressure and humidity formulas need, and the
/// temperature in hundredths of a degree. The temperature is not clamped.
pub fn compensate_temperature(adc_t: u32, cal: &CalibrationSet) -> (i32, Temperature) {
    let adc_t = adc_t as i32;
    let t1 = cal.dig_t1 as i32;

    let var1 = (adc_t / 8 - t1 * 2).wrapping_mul(cal.dig_t2 as i32) / 2048;
    let var2 = adc_t / 16 - t1;
    let var2 = (var2.wrapping_mul(var2) / 4096).wrapping_mul(cal.dig_t3 as i32) / 16384;

    let t_fine = var1.wrapping_add(var2);
    (t_fine, Temperature(t_fine.wrapping_mul(5).wrapping_add(128) / 256))
}

/// Clamp a temperature to the sensor's operating range.
pub fn clamp_temperature(temperature: Temperature) -> Temperature {
    Temperature(temperature.0.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX))
}

/// Compensate a raw pressure count. Returns the pressure in Pa.
///
/// `None` when the denominator of the formula is zero, which only happens
/// with a corrupt calibration set.
pub fn compensate_pressure(adc_p: u32, t_fine: i32, cal: &CalibrationSet) -> Option<Pressure> {
    let p1 = cal.dig_p1 as i32;
    let p2 = cal.dig_p2 as i32;
    let p3 = cal.dig_p3 as i32;
    let p4 = cal.dig_p4 as i32;
    let p5 = cal.dig_p5 as i32;
    let p6 = cal.dig_p6 as i32;
    let p7 = cal.dig_p7 as i32;
    let p8 = cal.dig_p8 as i32;
    let p9 = cal.dig_p9 as i32;

    let mut var1 = (t_fine >> 1).wrapping_sub(64000);
    let square = (var1 >> 2).wrapping_mul(var1 >> 2);
    let mut var2 = (square >> 11).wrapping_mul(p6);
    var2 = var2.wrapping_add(var1.wrapping_mul(p5) << 1);
    var2 = (var2 >> 2).wrapping_add(p4 << 16);
    var1 = ((p3.wrapping_mul(square >> 13) >> 3).wrapping_add(p2.wrapping_mul(var1) >> 1)) >> 18;
    var1 = 32768i32.wrapping_add(var1).wrapping_mul(p1) >> 15;

    if var1 == 0 {
        return None;
    }

    let mut p = (1_048_576 - adc_p as i32).wrapping_sub(var2 >> 12) as u32;
    p = p.wrapping_mul(3125);
    // Keep the intermediate inside 32 bits.
    p = if p < 0x8000_0000 {
        (p << 1) / var1 as u32
    } else {
        (p / var1 as u32).wrapping_mul(2)
    };

    let var1 = p9.wrapping_mul(((p >> 3).wrapping_mul(p >> 3) >> 13) as i32) >> 12;
    let var2 = ((p >> 2) as i32).wrapping_mul(p8) >> 13;
    let p = (p as i32).wrapping_add(var1.wrapping_add(var2).wrapping_add(p7) >> 4) as u32;

    Some(Pressure(p))
}

/// Compensate a raw humidity count. Returns hundredths of a percent.
pub fn compensate_humidity(adc_h: u16, t_fine: i32, cal: &HumidityCalibration) -> Humidity {
    let h2 = cal.dig_h2 as i32;
    let h3 = cal.dig_h3 as i32;
    let h4 = cal.dig_h4 as i32;
    let h5 = cal.dig_h5 as i32;
    let h6 = cal.dig_h6 as i32;

    let var1 = t_fine.wrapping_sub(76800);
    let var2 = adc_h as i32 * 16384;
    let var3 = h4.wrapping_mul(1_048_576);
    let var4 = h5.wrapping_mul(var1);
    let var5 = var2.wrapping_sub(var3).wrapping_sub(var4).wrapping_add(16384) / 32768;

    let var2 = var1.wrapping_mul(h6) / 1024;
    let var3 = var1.wrapping_mul(h3) / 2048;
    let var4 = (var2.wrapping_mul(var3.wrapping_add(32768)) / 1024).wrapping_add(2_097_152);
    let var2 = var4.wrapping_mul(h2).wrapping_add(8192) / 16384;
    let var3 = var5.wrapping_mul(var2);
    let var4 = (var3 / 32768).wrapping_mul(var3 / 32768) / 128;
    let var5 = var3.wrapping_sub(var4.wrapping_mul(cal.dig_h1 as i32) / 16);
    let var5 = var5.clamp(0, HUMIDITY_VAR_MAX);

    // Q22.10 %RH
    let q10 = ((var5 / 4096) as u32).min(HUMIDITY_MAX_Q10);
    Humidity(q10 * 100 / 1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{datasheet_calibration, DATASHEET_ADC_P, DATASHEET_ADC_T};

    #[test]
    fn temperature_datasheet_example() {
        let cal = datasheet_calibration();
        let (t_fine, temperature) = compensate_temperature(DATASHEET_ADC_T, &cal);

        assert_eq!(t_fine, 128423);
        assert_eq!(temperature, Temperature(2508));
    }

    #[test]
    fn pressure_datasheet_example() {
        let cal = datasheet_calibration();
        let (t_fine, _) = compensate_temperature(DATASHEET_ADC_T, &cal);

        // The 32-bit formula gives 100656 Pa where the 64-bit one gives 100653.27.
        assert_eq!(compensate_pressure(DATASHEET_ADC_P, t_fine, &cal), Some(Pressure(100656)));
    }

    #[test]
    fn formulas_are_deterministic() {
        let cal = datasheet_calibration();
        let first = compensate_temperature(DATASHEET_ADC_T, &cal);
        for _ in 0..3 {
            assert_eq!(compensate_temperature(DATASHEET_ADC_T, &cal), first);
        }
    }

    #[test]
    fn zero_pressure_denominator_is_reported() {
        let mut cal = datasheet_calibration();
        cal.dig_p1 = 0;
        let (t_fine, _) = compensate_temperature(DATASHEET_ADC_T, &cal);

        assert_eq!(compensate_pressure(DATASHEET_ADC_P, t_fine, &cal), None);
    }

    #[test]
    fn humidity_reference_values() {
        let cal = datasheet_calibration();
        let hum = cal.humidity.unwrap();
        let (t_fine, _) = compensate_temperature(DATASHEET_ADC_T, &cal);

        assert_eq!(compensate_humidity(30000, t_fine, &hum), Humidity(5499));
        assert_eq!(compensate_humidity(27000, t_fine, &hum), Humidity(3827));
        assert_eq!(compensate_humidity(0x7FFF, t_fine, &hum), Humidity(7035));
    }

    #[test]
    fn humidity_saturates_at_one_hundred_percent() {
        let cal = datasheet_calibration();
        let hum = cal.humidity.unwrap();
        let (t_fine, _) = compensate_temperature(DATASHEET_ADC_T, &cal);

        assert_eq!(compensate_humidity(0xFFFE, t_fine, &hum), Humidity(10000));
    }

    #[test]
    fn humidity_never_goes_negative() {
        let cal = datasheet_calibration();
        let hum = cal.humidity.unwrap();
        let (t_fine, _) = compensate_temperature(DATASHEET_ADC_T, &cal);

        assert_eq!(compensate_humidity(1, t_fine, &hum), Humidity(0));
    }

    #[test]
    fn extreme_counts_do_not_overflow() {
        let cal = datasheet_calibration();
        let hum = cal.humidity.unwrap();

        for adc_t in [0x1, 0x1_0000, 0x2_0000, 0xE_0000, 0xF_FFEF] {
            let (t_fine, _) = compensate_temperature(adc_t, &cal);
            for adc_p in [0x1, 0x8_0000, 0xF_FFEF] {
                assert!(compensate_pressure(adc_p, t_fine, &cal).is_some());
            }
            for adc_h in [0x1, 0x8000, 0xFFFE] {
                assert!(compensate_humidity(adc_h, t_fine, &hum).0 <= 10000);
            }
        }
    }

    #[test]
    fn temperature_clamp() {
        assert_eq!(clamp_temperature(Temperature(-4100)), Temperature(TEMPERATURE_MIN));
        assert_eq!(clamp_temperature(Temperature(9000)), Temperature(TEMPERATURE_MAX));
        assert_eq!(clamp_temperature(Temperature(2508)), Temperature(2508));
    }
}
