//! # Timing Harness
//!
//! Scoped wall-clock measurement. A [`Timer`] reports its elapsed time exactly once,
//! either when stopped explicitly or when dropped, so early returns, `?` propagation,
//! panics and abandoned streams are all accounted for.
//!
//! Time is read from [`tokio::time::Instant`], which follows the real clock normally and
//! the paused clock under `tokio::time::pause`.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Reports the wall-clock time between its creation and its end of scope.
///
/// # Example
///
/// ```
/// use sortbatch::timing::Timer;
///
/// let timer = Timer::start("tokenize");
/// // ... work ...
/// let elapsed = timer.stop();
/// assert!(elapsed.as_secs() < 60);
/// ```
#[derive(Debug)]
pub struct Timer {
    label: String,
    start: Instant,

    /// Set once the measurement has been logged
    reported: bool,
}

impl Timer {
    /// Starts timing a unit of work named `label`.
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
            reported: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time elapsed so far, without reporting.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Ends the measurement, reports it, and returns the elapsed time.
    pub fn stop(mut self) -> Duration {
        self.report()
    }

    fn report(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.reported {
            self.reported = true;
            tracing::info!(
                label = %self.label,
                elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
                "execution time"
            );
        }
        elapsed
    }
}

impl Drop for Timer {
    /// Reports the measurement if it was not stopped explicitly.
    fn drop(&mut self) {
        self.report();
    }
}

/// Runs `work` under a [`Timer`] named `label`.
///
/// # Returns
///
/// The result of `work` together with the time it took
pub fn timed<T>(label: impl Into<String>, work: impl FnOnce() -> T) -> (T, Duration) {
    let timer = Timer::start(label);
    let output = work();
    (output, timer.stop())
}

/// Awaits `work` under a [`Timer`] named `label`.
///
/// If the returned future is dropped before completion, the timer still reports.
pub async fn timed_async<F>(label: impl Into<String>, work: F) -> (F::Output, Duration)
where F: Future
{
    let timer = Timer::start(label);
    let output = work.await;
    (output, timer.stop())
}
