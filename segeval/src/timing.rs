//! Wall-clock timing of device work.
//!
//! Device backends dispatch asynchronously, so a timed region is bracketed by
//! [`Backend::sync`] on both ends; the measured time then covers completed
//! device work rather than the return of the dispatch call.

use std::time::{Duration, Instant};

use burn::tensor::backend::Backend;

/// Accumulates the time spent inside timed regions.
///
/// A disabled timer runs regions without synchronizing or reading the clock
/// and reports zero throughput.
#[derive(Debug, Clone, Default)]
pub struct InferenceTimer {
    enabled: bool,
    elapsed: Duration,
    regions: usize,
}

impl InferenceTimer {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            elapsed: Duration::ZERO,
            regions: 0,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `region`, timing it between two device synchronization barriers.
    pub fn time<B: Backend, R>(&mut self, device: &B::Device, region: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return region();
        }

        B::sync(device);
        let start = Instant::now();
        let output = region();
        B::sync(device);

        self.elapsed += start.elapsed();
        self.regions += 1;
        output
    }

    /// Total time spent in timed regions.
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of timed regions.
    pub const fn regions(&self) -> usize {
        self.regions
    }

    /// Samples per second given the number of samples processed in the timed
    /// regions: `1 / (elapsed / samples)`. Zero when the timer is disabled.
    pub fn throughput(&self, samples: usize) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let seconds_per_sample = self.elapsed.as_secs_f64() / samples as f64;
        1.0 / seconds_per_sample
    }
}

#[cfg(test)]
mod tests {
    use super::InferenceTimer;
    use burn::backend::ndarray::NdArray;
    use std::time::Duration;

    type TestBackend = NdArray;

    #[test]
    fn test_disabled_timer_reports_zero() {
        let device = Default::default();
        let mut timer = InferenceTimer::new(false);

        let value = timer.time::<TestBackend, _>(&device, || {
            std::thread::sleep(Duration::from_millis(5));
            7
        });

        assert_eq!(value, 7);
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(timer.regions(), 0);
        assert_eq!(timer.throughput(4), 0.0);
    }

    #[test]
    fn test_enabled_timer_accumulates() {
        let device = Default::default();
        let mut timer = InferenceTimer::new(true);

        for _ in 0..2 {
            timer.time::<TestBackend, _>(&device, || std::thread::sleep(Duration::from_millis(5)));
        }

        assert!(timer.is_enabled());
        assert_eq!(timer.regions(), 2);
        assert!(timer.elapsed() >= Duration::from_millis(10));

        let fps = timer.throughput(4);
        let expected = 4.0 / timer.elapsed().as_secs_f64();
        assert!((fps - expected).abs() < 1e-9 * expected);
    }
}
