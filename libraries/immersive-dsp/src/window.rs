//! Sliding-window maximum over the limiter's look-ahead
//!
//! The limiter records one peak magnitude per sample position and needs the
//! maximum of the most recent `capacity` values before every output sample.
//! Two interchangeable strategies are provided:
//!
//! - [`NaiveWindow`] keeps a ring of the values and rescans it on each query
//! - [`MonotonicWindow`] keeps a queue of candidate maxima, so each value is
//!   pushed and popped at most once (amortised O(1) per sample)

use std::collections::VecDeque;

use immersive_core::PeakSearch;

/// Maximum over the last `capacity` pushed magnitudes
///
/// Values are magnitudes (`>= 0`); an empty or zero-capacity window reports `0.0`.
pub trait LookaheadWindow: Send {
    /// Record the magnitude of the newest sample position
    fn push(&mut self, value: f32);

    /// Maximum over the window
    fn max(&self) -> f32;

    /// Forget every recorded value
    fn clear(&mut self);

    /// Number of positions covered
    fn capacity(&self) -> usize;

    /// Number of values currently held by the strategy
    fn len(&self) -> usize;

    /// Whether nothing is held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the complete internal state
    fn state(&self) -> WindowState;
}

/// Internal state of a [`LookaheadWindow`], comparable with `==`
#[derive(Debug, Clone, PartialEq)]
pub enum WindowState {
    Naive {
        values: Vec<f32>,
        write_pos: usize,
    },
    Tracked {
        candidates: Vec<(u64, f32)>,
        position: u64,
    },
}

/// Build the window for a search strategy
pub fn create_window(search: PeakSearch, capacity: usize) -> Box<dyn LookaheadWindow> {
    match search {
        PeakSearch::Naive => Box::new(NaiveWindow::new(capacity)),
        PeakSearch::Tracked => Box::new(MonotonicWindow::new(capacity)),
    }
}

/// Ring of recent values, rescanned on every query
#[derive(Debug, Clone)]
pub struct NaiveWindow {
    values: Vec<f32>,
    write_pos: usize,
}

impl NaiveWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
            write_pos: 0,
        }
    }
}

impl LookaheadWindow for NaiveWindow {
    fn push(&mut self, value: f32) {
        if self.values.is_empty() {
            return;
        }
        self.values[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % self.values.len();
    }

    fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0_f32, f32::max)
    }

    fn clear(&mut self) {
        self.values.fill(0.0);
        self.write_pos = 0;
    }

    fn capacity(&self) -> usize {
        self.values.len()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn state(&self) -> WindowState {
        WindowState::Naive {
            values: self.values.clone(),
            write_pos: self.write_pos,
        }
    }
}

/// Monotonically decreasing queue of `(position, value)` candidates
///
/// The front is always the window maximum. A new value evicts every older
/// candidate that is not larger, and candidates leave from the front once
/// their position slides out of the window.
#[derive(Debug, Clone)]
pub struct MonotonicWindow {
    candidates: VecDeque<(u64, f32)>,
    capacity: usize,
    position: u64,
}

impl MonotonicWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            candidates: VecDeque::with_capacity(capacity),
            capacity,
            position: 0,
        }
    }
}

impl LookaheadWindow for MonotonicWindow {
    fn push(&mut self, value: f32) {
        if self.capacity == 0 {
            return;
        }

        while matches!(self.candidates.back(), Some(&(_, v)) if v <= value) {
            self.candidates.pop_back();
        }
        self.candidates.push_back((self.position, value));
        self.position += 1;

        let span = self.capacity as u64;
        while matches!(self.candidates.front(), Some(&(p, _)) if p + span < self.position) {
            self.candidates.pop_front();
        }
    }

    fn max(&self) -> f32 {
        self.candidates.front().map_or(0.0, |&(_, v)| v)
    }

    fn clear(&mut self) {
        self.candidates.clear();
        self.position = 0;
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn state(&self) -> WindowState {
        WindowState::Tracked {
            candidates: self.candidates.iter().copied().collect(),
            position: self.position,
        }
    }
}
