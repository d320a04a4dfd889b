//! Trailing-window average of compensated samples.

use heapless::HistoryBuffer;

/// The last `N` samples of one channel, in hundredths of a unit.
///
/// While filling, samples are appended; once full, the oldest one drops out.
#[derive(Debug)]
pub struct RollingAverage<const N: usize> {
    window: HistoryBuffer<i32, N>,
}

impl<const N: usize> RollingAverage<N> {
    pub const fn new() -> Self {
        RollingAverage {
            window: HistoryBuffer::new(),
        }
    }

    /// Append `sample` and return the mean of the populated window.
    ///
    /// The mean is the sum divided by the count, truncated toward zero.
    pub fn push(&mut self, sample: i32) -> i32 {
        self.window.write(sample);
        self.mean().unwrap_or(sample)
    }

    pub fn mean(&self) -> Option<i32> {
        let count = self.window.len() as i64;
        if count == 0 {
            return None;
        }
        let sum: i64 = self.window.as_slice().iter().map(|&s| s as i64).sum();
        Some((sum / count) as i32)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window.capacity()
    }

    /// Samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = i32> + '_ {
        self.window.oldest_ordered().copied()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl<const N: usize> Default for RollingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}
