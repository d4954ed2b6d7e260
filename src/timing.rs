//! Wall-clock timing for per-generation statistics.

use crate::error::GaError;
use std::time::Instant;

/// A start/stop timer measuring elapsed seconds.
#[derive(Debug, Default)]
pub struct Chronometer {
    start: Option<Instant>,
}

impl Chronometer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the timer.
    pub fn tic(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Returns the seconds elapsed since the last [`tic`](Self::tic).
    pub fn toc(&self) -> Result<f64, GaError> {
        self.start
            .map(|start| start.elapsed().as_secs_f64())
            .ok_or(GaError::ChronometerNotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_before_tic_fails() {
        let timer = Chronometer::new();
        assert!(matches!(timer.toc(), Err(GaError::ChronometerNotStarted)));
    }

    #[test]
    fn test_elapsed_is_nonnegative_and_monotonic() {
        let mut timer = Chronometer::new();
        timer.tic();
        let first = timer.toc().unwrap();
        let second = timer.toc().unwrap();
        assert!(first >= 0.0);
        assert!(second >= first);
    }
}
