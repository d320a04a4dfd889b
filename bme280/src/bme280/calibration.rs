//! Factory calibration coefficients.
//!
//! The coefficients sit in two disjoint NVM blocks: `0x88..=0x9F` holds the
//! 24 bytes of temperature and pressure words, `0xA1` holds `dig_H1` and
//! `0xE1..=0xE7` the remaining humidity coefficients (BME280 only).

/// Length of the temperature and pressure block starting at `0x88`.
pub const PT_CALIB_LEN: usize = 24;
/// Length of the humidity block starting at `0xE1`.
pub const H_CALIB_LEN: usize = 7;

/// Per-device compensation coefficients, immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSet {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub humidity: Option<HumidityCalibration>,
}

/// Humidity coefficients. Any of these may legitimately be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HumidityCalibration {
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibrationSet {
    /// Decode the little-endian temperature and pressure block.
    pub fn from_pt_bytes(buf: &[u8; PT_CALIB_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([buf[i], buf[i + 1]]);

        CalibrationSet {
            dig_t1: u16_at(0),
            dig_t2: i16_at(2),
            dig_t3: i16_at(4),
            dig_p1: u16_at(6),
            dig_p2: i16_at(8),
            dig_p3: i16_at(10),
            dig_p4: i16_at(12),
            dig_p5: i16_at(14),
            dig_p6: i16_at(16),
            dig_p7: i16_at(18),
            dig_p8: i16_at(20),
            dig_p9: i16_at(22),
            humidity: None,
        }
    }

    #[must_use]
    pub fn with_humidity(mut self, humidity: HumidityCalibration) -> Self {
        self.humidity = Some(humidity);
        self
    }

    /// A zero temperature or pressure coefficient means a failed or torn read.
    ///
    /// Humidity coefficients are not part of this check.
    pub fn has_zero_coefficient(&self) -> bool {
        self.dig_t1 == 0
            || self.dig_t2 == 0
            || self.dig_t3 == 0
            || self.dig_p1 == 0
            || [
                self.dig_p2,
                self.dig_p3,
                self.dig_p4,
                self.dig_p5,
                self.dig_p6,
                self.dig_p7,
                self.dig_p8,
                self.dig_p9,
            ]
            .contains(&0)
    }
}

impl HumidityCalibration {
    /// Decode `dig_H1` (register `0xA1`) and the block at `0xE1..=0xE7`.
    ///
    /// `dig_H4` and `dig_H5` are 12-bit signed values sharing register `0xE5`.
    pub fn from_bytes(h1: u8, buf: &[u8; H_CALIB_LEN]) -> Self {
        HumidityCalibration {
            dig_h1: h1,
            dig_h2: i16::from_le_bytes([buf[0], buf[1]]),
            dig_h3: buf[2],
            dig_h4: ((buf[3] as i8 as i16) << 4) | (buf[4] & 0x0F) as i16,
            dig_h5: ((buf[5] as i8 as i16) << 4) | (buf[4] >> 4) as i16,
            dig_h6: buf[6] as i8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DATASHEET_H_BYTES, DATASHEET_PT_BYTES};

    #[test]
    fn decodes_datasheet_coefficients() {
        let cal = CalibrationSet::from_pt_bytes(&DATASHEET_PT_BYTES);

        assert_eq!(cal.dig_t1, 27504);
        assert_eq!(cal.dig_t2, 26435);
        assert_eq!(cal.dig_t3, -1000);
        assert_eq!(cal.dig_p1, 36477);
        assert_eq!(cal.dig_p2, -10685);
        assert_eq!(cal.dig_p3, 3024);
        assert_eq!(cal.dig_p4, 2855);
        assert_eq!(cal.dig_p5, 140);
        assert_eq!(cal.dig_p6, -7);
        assert_eq!(cal.dig_p7, 15500);
        assert_eq!(cal.dig_p8, -14600);
        assert_eq!(cal.dig_p9, 6000);
        assert!(!cal.has_zero_coefficient());
    }

    #[test]
    fn decodes_split_humidity_nibbles() {
        let hum = HumidityCalibration::from_bytes(75, &DATASHEET_H_BYTES);

        assert_eq!(
            hum,
            HumidityCalibration {
                dig_h1: 75,
                dig_h2: 362,
                dig_h3: 0,
                dig_h4: 313,
                dig_h5: 50,
                dig_h6: 30,
            }
        );
    }

    #[test]
    fn negative_h4_h5_are_sign_extended() {
        // H4 = 0xF8 << 4 | 0x1 = -127, H5 = 0xFF << 4 | 0xE = -2
        let hum = HumidityCalibration::from_bytes(0, &[0, 0, 0, 0xF8, 0xE1, 0xFF, 0]);
        assert_eq!(hum.dig_h4, -127);
        assert_eq!(hum.dig_h5, -2);
    }

    #[test]
    fn any_zero_pt_word_is_rejected() {
        for word in 0..PT_CALIB_LEN / 2 {
            let mut bytes = DATASHEET_PT_BYTES;
            bytes[2 * word] = 0;
            bytes[2 * word + 1] = 0;
            assert!(
                CalibrationSet::from_pt_bytes(&bytes).has_zero_coefficient(),
                "word {} not checked",
                word
            );
        }
    }

    #[test]
    fn zero_humidity_coefficients_are_accepted() {
        let cal = CalibrationSet::from_pt_bytes(&DATASHEET_PT_BYTES)
            .with_humidity(HumidityCalibration::from_bytes(0, &[0; H_CALIB_LEN]));
        assert!(!cal.has_zero_coefficient());
    }
}
