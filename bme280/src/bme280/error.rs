use super::raw::BoundaryViolation;

/// Status code reported for a bus fault by either entry point.
pub const BUS_FAULT_CODE: u8 = 0xFF;

/// Configuration faults accumulated across attempts.
///
/// Flags are only ever added while configuring; a successful configuration
/// is the only thing that clears them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorState {
    /// A temperature or pressure coefficient read back as zero.
    pub calibration: bool,
    /// The configuration registers did not read back as written.
    pub registers: bool,
}

impl ErrorState {
    pub const CLEAR: ErrorState = ErrorState {
        calibration: false,
        registers: false,
    };

    pub const fn is_set(&self) -> bool {
        self.calibration || self.registers
    }

    /// `0` clear, `1` calibration, `2` register mismatch, `3` both.
    pub const fn code(&self) -> u8 {
        (self.calibration as u8) | ((self.registers as u8) << 1)
    }

    /// Add the flags of `other`. Flags already set stay set.
    pub fn merge(&mut self, other: ErrorState) {
        self.calibration |= other.calibration;
        self.registers |= other.registers;
    }

    pub fn clear(&mut self) {
        *self = ErrorState::CLEAR;
    }
}

impl core::ops::BitOr for ErrorState {
    type Output = ErrorState;

    fn bitor(mut self, rhs: ErrorState) -> ErrorState {
        self.merge(rhs);
        self
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Transport error.
    Bus(E),
    /// The sensor is not configured, or configuration failed on every attempt.
    Configuration(ErrorState),
    /// A conversion or an NVM copy is in progress.
    SensorBusy,
    /// A raw count is at or beyond its conversion limit.
    OutOfRange(BoundaryViolation),
    /// The pressure formula's denominator is zero.
    DivideByZero,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

impl<E> Error<E> {
    /// Status code of a failed `configure` call.
    ///
    /// A configuration error reports its flags, everything else is a bus
    /// fault since configuring never yields the measurement errors.
    pub fn configure_code(&self) -> u8 {
        match self {
            Error::Configuration(state) => state.code(),
            _ => BUS_FAULT_CODE,
        }
    }

    /// Status code of a failed `read_measurement` call.
    pub fn measurement_code(&self) -> u8 {
        match self {
            Error::Configuration(_) => 1,
            Error::SensorBusy => 2,
            Error::OutOfRange(_) => 3,
            Error::DivideByZero => 4,
            Error::Bus(_) => BUS_FAULT_CODE,
        }
    }

    /// The cycle may be retried on the next period tick without reconfiguring.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::SensorBusy | Error::OutOfRange(_) | Error::DivideByZero
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bme280::raw::{Channel, Limit};

    #[test]
    fn flag_codes() {
        assert_eq!(ErrorState::CLEAR.code(), 0);
        let calib = ErrorState {
            calibration: true,
            registers: false,
        };
        let config = ErrorState {
            calibration: false,
            registers: true,
        };
        assert_eq!(calib.code(), 1);
        assert_eq!(config.code(), 2);
        assert_eq!((calib | config).code(), 3);
    }

    #[test]
    fn merge_never_overwrites() {
        let mut state = ErrorState {
            calibration: true,
            registers: false,
        };
        state.merge(ErrorState::CLEAR);
        assert_eq!(state.code(), 1);

        state.merge(ErrorState {
            calibration: false,
            registers: true,
        });
        assert_eq!(state.code(), 3);

        state.clear();
        assert!(!state.is_set());
    }

    #[test]
    fn measurement_codes() {
        let violation = BoundaryViolation {
            channel: Channel::Pressure,
            limit: Limit::Upper,
        };
        assert_eq!(Error::<()>::Configuration(ErrorState::CLEAR).measurement_code(), 1);
        assert_eq!(Error::<()>::SensorBusy.measurement_code(), 2);
        assert_eq!(Error::<()>::OutOfRange(violation).measurement_code(), 3);
        assert_eq!(Error::<()>::DivideByZero.measurement_code(), 4);
        assert_eq!(Error::Bus(()).measurement_code(), BUS_FAULT_CODE);
    }

    #[test]
    fn configure_codes() {
        let both = ErrorState {
            calibration: true,
            registers: true,
        };
        assert_eq!(Error::<()>::Configuration(both).configure_code(), 3);
        assert_eq!(Error::Bus(()).configure_code(), BUS_FAULT_CODE);
    }
}
