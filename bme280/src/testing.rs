//! Simulated sensor and reference data for the driver tests.

use core::cell::Cell;

use crate::bme280::calibration::{CalibrationSet, HumidityCalibration, H_CALIB_LEN, PT_CALIB_LEN};
use crate::bme280::registers::{reg, MODE_MASK, SOFT_RESET_CMD};
use crate::schedule::Clock;
use crate::transport::Transport;

/// Temperature and pressure coefficients of the datasheet example,
/// `dig_T1 = 27504` through `dig_P9 = 6000`.
pub const DATASHEET_PT_BYTES: [u8; PT_CALIB_LEN] = [
    0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C,
    0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
];

/// `dig_H1`, register `0xA1`.
pub const DATASHEET_H1: u8 = 75;

/// `0xE1..=0xE7`: `dig_H2 = 362`, `dig_H3 = 0`, `dig_H4 = 313`,
/// `dig_H5 = 50`, `dig_H6 = 30`.
pub const DATASHEET_H_BYTES: [u8; H_CALIB_LEN] = [0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];

pub const DATASHEET_ADC_T: u32 = 519888;
pub const DATASHEET_ADC_P: u32 = 415148;
pub const DATASHEET_ADC_H: u16 = 30000;

/// `press_msb..hum_lsb` encoding the three counts above.
pub const DATASHEET_BURST: [u8; 8] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];

/// Burst bytes `press_msb..hum_lsb` for the given counts.
pub fn burst(adc_p: u32, adc_t: u32, adc_h: u16) -> [u8; 8] {
    let p = adc_p << 4;
    let t = adc_t << 4;
    [
        (p >> 16) as u8,
        (p >> 8) as u8,
        p as u8,
        (t >> 16) as u8,
        (t >> 8) as u8,
        t as u8,
        (adc_h >> 8) as u8,
        adc_h as u8,
    ]
}

pub fn datasheet_calibration() -> CalibrationSet {
    CalibrationSet::from_pt_bytes(&DATASHEET_PT_BYTES).with_humidity(
        HumidityCalibration::from_bytes(DATASHEET_H1, &DATASHEET_H_BYTES),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// A register file behaving like a BME280 or BMP280.
///
/// Writes land in `regs` except for the reset command, which is counted and
/// zeroes the control registers. Every transaction is logged.
pub struct FakeSensor {
    pub regs: [u8; 256],
    /// `(register, value)` of every byte written.
    pub writes: Vec<(u8, u8)>,
    /// `(start register, length)` of every read.
    pub reads: Vec<(u8, usize)>,
    pub resets: usize,
    /// Forced mode returns to sleep as soon as it is written.
    pub self_clear_forced: bool,
    /// Number of upcoming `ctrl_meas` read-backs to corrupt.
    pub corrupt_readbacks: usize,
    /// Fail every transaction.
    pub offline: bool,
    /// Fail writes only.
    pub fail_writes: bool,
}

impl FakeSensor {
    /// A BME280 holding the datasheet calibration and sample.
    pub fn bme280() -> Self {
        let mut sensor = Self::blank(0x60);
        let h1 = reg::CALIB_25 as usize;
        let h = reg::CALIB_26 as usize;
        sensor.regs[h1] = DATASHEET_H1;
        sensor.regs[h..h + H_CALIB_LEN].copy_from_slice(&DATASHEET_H_BYTES);
        sensor.set_burst(&DATASHEET_BURST);
        sensor
    }

    /// A BMP280 holding the datasheet calibration and sample.
    pub fn bmp280() -> Self {
        let mut sensor = Self::blank(0x58);
        sensor.set_burst(&DATASHEET_BURST[..6]);
        sensor
    }

    fn blank(chip_id: u8) -> Self {
        let mut regs = [0u8; 256];
        regs[reg::CHIP_ID as usize] = chip_id;
        let calib = reg::CALIB_00 as usize;
        regs[calib..calib + PT_CALIB_LEN].copy_from_slice(&DATASHEET_PT_BYTES);

        FakeSensor {
            regs,
            writes: Vec::new(),
            reads: Vec::new(),
            resets: 0,
            self_clear_forced: false,
            corrupt_readbacks: 0,
            offline: false,
            fail_writes: false,
        }
    }

    pub fn set_burst(&mut self, burst: &[u8]) {
        let start = reg::PRESS_MSB as usize;
        self.regs[start..start + burst.len()].copy_from_slice(burst);
    }

    pub fn zero_calibration_word(&mut self, word: usize) {
        let at = reg::CALIB_00 as usize + 2 * word;
        self.regs[at] = 0;
        self.regs[at + 1] = 0;
    }

    /// Values written to `reg`, in order.
    pub fn written_to(&self, reg: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn transactions(&self) -> usize {
        self.writes.len() + self.reads.len()
    }

    pub fn was_read(&self, reg: u8) -> bool {
        self.reads.iter().any(|(r, _)| *r == reg)
    }
}

impl Transport for FakeSensor {
    type Error = BusFault;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        if self.offline {
            return Err(BusFault);
        }
        self.reads.push((reg, buf.len()));

        let start = reg as usize;
        buf.copy_from_slice(&self.regs[start..start + buf.len()]);

        let ctrl_meas = reg::CTRL_MEAS as usize;
        if self.corrupt_readbacks > 0 && (start..start + buf.len()).contains(&ctrl_meas) {
            self.corrupt_readbacks -= 1;
            // flip osrs_p[0]
            buf[ctrl_meas - start] ^= 0b0000_0100;
        }
        Ok(())
    }

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), BusFault> {
        if self.offline || self.fail_writes {
            return Err(BusFault);
        }
        for (offset, &value) in data.iter().enumerate() {
            let addr = reg + offset as u8;
            self.writes.push((addr, value));

            if addr == reg::SOFT_RESET {
                if value == SOFT_RESET_CMD {
                    self.resets += 1;
                    for ctrl in [reg::CTRL_HUM, reg::CTRL_MEAS, reg::CONFIG] {
                        self.regs[ctrl as usize] = 0;
                    }
                }
                continue;
            }

            self.regs[addr as usize] = value;
            if addr == reg::CTRL_MEAS && self.self_clear_forced && value & MODE_MASK == 0b01 {
                self.regs[addr as usize] &= !MODE_MASK;
            }
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub fn at(ms: u32) -> Self {
        ManualClock { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
