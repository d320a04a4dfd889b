//! Period timer bookkeeping shared between a tick interrupt and the main loop.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Millisecond time source.
///
/// Only differences between two readings are meaningful; the counter wraps.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// A 1 ms tick counter and a "measurement due" flag.
///
/// `on_tick` is meant to be called from the timer interrupt and never
/// touches the bus. The main loop polls [`take_due`](Self::take_due), which
/// reads and clears the flag in one atomic swap, so a tick landing between
/// the read and the clear cannot be lost.
///
/// ```
/// use bme280::MeasurementSchedule;
///
/// static SCHEDULE: MeasurementSchedule = MeasurementSchedule::new(3);
///
/// for _ in 0..3 {
///     SCHEDULE.on_tick();
/// }
/// assert!(SCHEDULE.take_due());
/// assert!(!SCHEDULE.take_due());
/// ```
#[derive(Debug)]
pub struct MeasurementSchedule {
    ticks: AtomicU32,
    period_ms: u32,
    due: AtomicBool,
}

impl MeasurementSchedule {
    /// `period_ms` of zero is treated as one.
    pub const fn new(period_ms: u32) -> Self {
        MeasurementSchedule {
            ticks: AtomicU32::new(0),
            period_ms: if period_ms == 0 { 1 } else { period_ms },
            due: AtomicBool::new(false),
        }
    }

    /// Advance by one millisecond.
    pub fn on_tick(&self) {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if now % self.period_ms == 0 {
            self.due.store(true, Ordering::Release);
        }
    }

    /// Whether a measurement is due, clearing the flag.
    pub fn take_due(&self) -> bool {
        self.due.swap(false, Ordering::Acquire)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

impl Clock for MeasurementSchedule {
    fn now_ms(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_once_per_period() {
        let schedule = MeasurementSchedule::new(1000);

        for _ in 0..999 {
            schedule.on_tick();
        }
        assert!(!schedule.take_due());

        schedule.on_tick();
        assert_eq!(schedule.now_ms(), 1000);
        assert!(schedule.take_due());
        assert!(!schedule.take_due());
    }

    #[test]
    fn missed_periods_collapse_into_one() {
        let schedule = MeasurementSchedule::new(10);
        for _ in 0..35 {
            schedule.on_tick();
        }
        assert!(schedule.take_due());
        assert!(!schedule.take_due());
    }

    #[test]
    fn zero_period_is_every_tick() {
        let schedule = MeasurementSchedule::new(0);
        assert_eq!(schedule.period_ms(), 1);
        schedule.on_tick();
        assert!(schedule.take_due());
    }
}
