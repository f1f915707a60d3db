use super::OrientationFilter;
use crate::orientation::Orientation;
use std::collections::VecDeque;

/// Bounded FIFO of recent samples for one axis
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl SmoothingWindow {
    /// # Panics
    ///
    /// Panics if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Window size must be greater than 0");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Push a sample, evicting the oldest once over capacity
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Median of the window; even lengths average the two middle values
    pub fn median(&self) -> f64 {
        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Median filter over yaw, pitch and roll
pub struct MedianFilter {
    yaw: SmoothingWindow,
    pitch: SmoothingWindow,
    roll: SmoothingWindow,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            yaw: SmoothingWindow::new(window_size),
            pitch: SmoothingWindow::new(window_size),
            roll: SmoothingWindow::new(window_size),
        }
    }

    /// Number of samples currently held per axis
    pub fn len(&self) -> usize {
        self.yaw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yaw.is_empty()
    }
}

impl OrientationFilter for MedianFilter {
    fn apply(&mut self, sample: Orientation) -> Orientation {
        self.yaw.push(sample.yaw);
        self.pitch.push(sample.pitch);
        self.roll.push(sample.roll);

        Orientation::new(self.yaw.median(), self.pitch.median(), self.roll.median())
    }

    fn reset(&mut self) {
        self.yaw.clear();
        self.pitch.clear();
        self.roll.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
