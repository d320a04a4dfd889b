use super::calibration::{CalibrationSet, HumidityCalibration, H_CALIB_LEN, PT_CALIB_LEN};
use super::compensation::{
    clamp_temperature, compensate_humidity, compensate_pressure, compensate_temperature,
};
use super::error::{Error, ErrorState};
use super::measurement::{MeasurementState, Reading};
use super::raw::{RawSample, BURST_LEN_TPH};
use super::registers::{reg, Mode, Oversampling, Settings, Status, SOFT_RESET_CMD};
use super::sea_level::sea_level_pressure;
use super::variant::Options;
use crate::schedule::Clock;
use crate::transport::Transport;

/// Configuration attempts after one reset before the failure is latched.
pub const CONFIG_ATTEMPTS: u8 = 3;

/// Time the sensor needs after a soft reset, in milliseconds.
pub const RESET_SETTLE_MS: u32 = 3;

/// Successful outcome of [`Bme280::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigStatus {
    /// Configuration written, verified and calibration loaded.
    Ready,
    /// A reset is settling. Call `configure` again later.
    RetryAfterReset,
}

impl ConfigStatus {
    /// `0` ready, `4` retry after reset.
    pub const fn code(&self) -> u8 {
        match self {
            ConfigStatus::Ready => 0,
            ConfigStatus::RetryAfterReset => 4,
        }
    }
}

/// A BME280 or BMP280 behind a [`Transport`].
///
/// The driver owns the calibration and the configuration error flags. The
/// per-cycle measurement state is owned by the caller and passed to
/// [`read_measurement`](Self::read_measurement), so several sensors can be
/// driven side by side.
pub struct Bme280<T> {
    transport: T,
    options: Options,
    settings: Settings,
    calibration: Option<CalibrationSet>,
    errors: ErrorState,
    /// Timestamp of a reset that has not been followed by configuration yet.
    reset_at: Option<u32>,
}

impl<T: Transport> Bme280<T> {
    pub fn new(transport: T, options: Options) -> Self {
        Bme280 {
            transport,
            options,
            settings: Settings::new(),
            calibration: None,
            errors: ErrorState::CLEAR,
            reset_at: None,
        }
    }

    /// Content of the `id` register.
    ///
    /// Compare against [`Variant::chip_id`](super::variant::Variant::chip_id)
    /// as a sanity check of the bus.
    pub fn chip_id(&mut self) -> Result<u8, Error<T::Error>> {
        let mut data = [0u8; 1];
        self.transport.read(reg::CHIP_ID, &mut data)?;
        Ok(data[0])
    }

    pub fn status(&mut self) -> Result<Status, Error<T::Error>> {
        let mut data = [0u8; 1];
        self.transport.read(reg::STATUS, &mut data)?;
        Ok(Status(data[0]))
    }

    /// Reset the sensor and bring it into `settings`.
    ///
    /// The first call issues a soft reset and returns
    /// [`ConfigStatus::RetryAfterReset`]; so do later calls until
    /// [`RESET_SETTLE_MS`] have passed on `clock`. The next call then makes up
    /// to [`CONFIG_ATTEMPTS`] attempts at writing the configuration,
    /// verifying the read-back and loading the calibration.
    ///
    /// Once every attempt has failed, the flags observed across all attempts
    /// are latched and returned as [`Error::Configuration`]; measurements are
    /// refused until a later `configure` succeeds. Either way, the call after
    /// that starts over with a fresh reset.
    pub fn configure<C: Clock>(
        &mut self,
        settings: Settings,
        clock: &C,
    ) -> Result<ConfigStatus, Error<T::Error>> {
        let reset_at = match self.reset_at {
            Some(at) => at,
            None => {
                self.soft_reset(clock.now_ms())?;
                return Ok(ConfigStatus::RetryAfterReset);
            }
        };
        if clock.now_ms().wrapping_sub(reset_at) < RESET_SETTLE_MS {
            return Ok(ConfigStatus::RetryAfterReset);
        }
        self.reset_at = None;
        self.settings = settings;

        let mut seen = ErrorState::CLEAR;
        for attempt in 1..=CONFIG_ATTEMPTS {
            let (errors, calibration) = self.try_configure(&settings)?;
            if !errors.is_set() {
                debug!("configuration accepted on attempt {}", attempt);
                self.calibration = Some(calibration);
                self.errors.clear();
                return Ok(ConfigStatus::Ready);
            }
            warn!("configuration attempt {} failed: {}", attempt, errors);
            seen.merge(errors);
        }

        error!("configuration failed: {}", seen);
        self.calibration = None;
        self.errors = seen;
        Err(Error::Configuration(seen))
    }

    fn soft_reset(&mut self, now: u32) -> Result<(), Error<T::Error>> {
        self.transport.write(reg::SOFT_RESET, &[SOFT_RESET_CMD])?;
        debug!("soft reset at {} ms", now);
        // the reset drops the old configuration
        self.calibration = None;
        self.reset_at = Some(now);
        Ok(())
    }

    /// One write, read-back and calibration cycle.
    fn try_configure(
        &mut self,
        settings: &Settings,
    ) -> Result<(ErrorState, CalibrationSet), Error<T::Error>> {
        let has_humidity = self.options.variant.has_humidity();

        // ctrl_hum only takes effect after the following ctrl_meas write
        if has_humidity {
            self.transport.write(reg::CTRL_HUM, &[settings.ctrl_hum()])?;
        }
        self.transport
            .write(reg::CTRL_MEAS, &[settings.ctrl_meas(), settings.config()])?;

        let mut readback = [0u8; 3];
        if has_humidity {
            // ctrl_hum, status, ctrl_meas, config
            let mut buf = [0u8; 4];
            self.transport.read(reg::CTRL_HUM, &mut buf)?;
            readback = [buf[0], buf[2], buf[3]];
        } else {
            self.transport.read(reg::CTRL_MEAS, &mut readback[1..])?;
        }

        let calibration = self.read_calibration()?;
        let errors = ErrorState {
            calibration: calibration.has_zero_coefficient(),
            registers: !settings.matches_readback(readback, has_humidity),
        };
        Ok((errors, calibration))
    }

    fn read_calibration(&mut self) -> Result<CalibrationSet, Error<T::Error>> {
        let mut pt = [0u8; PT_CALIB_LEN];
        self.transport.read(reg::CALIB_00, &mut pt)?;
        let mut calibration = CalibrationSet::from_pt_bytes(&pt);

        if self.options.variant.has_humidity() {
            let mut h1 = [0u8; 1];
            let mut h = [0u8; H_CALIB_LEN];
            self.transport.read(reg::CALIB_25, &mut h1)?;
            self.transport.read(reg::CALIB_26, &mut h)?;
            calibration = calibration.with_humidity(HumidityCalibration::from_bytes(h1[0], &h));
        }
        trace!("calibration: {}", calibration);
        Ok(calibration)
    }

    /// Read, check and compensate one sample.
    ///
    /// Every failure leaves `state.reading` and the averages at their last
    /// valid values. The raw counts, status and fault flags in `state` always
    /// describe this cycle. In forced mode the next conversion is armed after
    /// the sample has been read, also when the sample itself was rejected.
    ///
    /// Channels configured as [`Oversampling::Skipped`] are reported as `None`.
    /// Skipping temperature is refused with [`Error::Configuration`] since
    /// every other channel is compensated from it.
    pub fn read_measurement<const N: usize>(
        &mut self,
        state: &mut MeasurementState<N>,
    ) -> Result<Reading, Error<T::Error>> {
        let calibration = match self.calibration {
            Some(calibration) if !self.errors.is_set() => calibration,
            _ => {
                warn!("measurement refused, sensor not configured");
                return Err(Error::Configuration(self.errors));
            }
        };
        if self.settings.osrs_t == Oversampling::Skipped {
            warn!("measurement refused, temperature is skipped");
            return Err(Error::Configuration(self.errors));
        }
        state.begin_cycle();

        if self.options.check_status {
            let status = self.status()?;
            state.status = Some(status);
            if status.is_busy() {
                warn!("sensor busy: {}", status.0);
                return Err(Error::SensorBusy);
            }
        }

        let variant = self.options.variant;
        let measures_pressure = self.settings.osrs_p != Oversampling::Skipped;
        let measures_humidity =
            variant.has_humidity() && self.settings.osrs_h != Oversampling::Skipped;

        let mut buf = [0u8; BURST_LEN_TPH];
        let burst = &mut buf[..variant.burst_len()];
        self.transport.read(reg::PRESS_MSB, burst)?;
        let mut raw = RawSample::from_burst(burst);
        // a skipped channel holds its reset value, not a reading
        if !measures_humidity {
            raw.adc_h = None;
        }
        trace!("raw: {}", raw);
        state.raw = raw;

        state.boundaries = raw.check_boundaries();
        if !measures_pressure {
            state.boundaries.pressure = None;
        }
        if let Some(violation) = state.boundaries.first_violation() {
            warn!("raw value out of range: {}", violation);
            self.rearm_after_fault();
            return Err(Error::OutOfRange(violation));
        }

        let (t_fine, mut temperature) = compensate_temperature(raw.adc_t, &calibration);
        if variant.clamps_temperature() {
            temperature = clamp_temperature(temperature);
        }

        let pressure = if measures_pressure {
            match compensate_pressure(raw.adc_p, t_fine, &calibration) {
                Some(pressure) => Some(pressure),
                None => {
                    warn!("pressure compensation divided by zero");
                    state.divide_by_zero = true;
                    self.rearm_after_fault();
                    return Err(Error::DivideByZero);
                }
            }
        } else {
            None
        };

        let humidity = match (calibration.humidity, raw.adc_h) {
            (Some(cal), Some(adc_h)) => Some(compensate_humidity(adc_h, t_fine, &cal)),
            _ => None,
        };

        let sea_level_pressure = match (pressure, self.options.site_altitude_m) {
            (Some(pressure), Some(altitude)) => sea_level_pressure(pressure, temperature, altitude),
            _ => None,
        };

        let reading = Reading {
            temperature,
            pressure,
            sea_level_pressure,
            humidity,
            t_fine,
        };

        self.rearm()?;

        if self.options.averaging {
            state.averages.temperature = Some(state.temperature_window.push(temperature.0));
            if let Some(humidity) = humidity {
                state.averages.humidity = Some(state.humidity_window.push(humidity.0 as i32));
            }
        }
        state.reading = Some(reading);
        Ok(reading)
    }

    /// Start the next single-shot conversion when in forced mode.
    fn rearm(&mut self) -> Result<(), Error<T::Error>> {
        if self.settings.mode == Mode::Forced {
            trace!("re-arming forced conversion");
            self.transport
                .write(reg::CTRL_MEAS, &[self.settings.ctrl_meas()])?;
        }
        Ok(())
    }

    /// Re-arm after a rejected sample. The data fault is what the caller
    /// needs to see, so a bus error here is only logged.
    fn rearm_after_fault(&mut self) {
        if self.rearm().is_err() {
            warn!("re-arming after a data fault failed");
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The configuration last passed to [`configure`](Self::configure).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Calibration loaded by the last successful configuration.
    pub fn calibration(&self) -> Option<&CalibrationSet> {
        self.calibration.as_ref()
    }

    pub fn error_state(&self) -> ErrorState {
        self.errors
    }

    /// Free the transport.
    pub fn free(self) -> T {
        self.transport
    }
}
