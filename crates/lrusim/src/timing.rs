//! Latency comparison of puts into full caches of two sizes

use std::fmt;
use std::time::{Duration, Instant};

use lrucache::{LruCache, Result};
use tracing::info;

/// Average put latency at one capacity
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub capacity: usize,
    pub avg: Duration,
}

/// Fill a cache to `capacity`, then time `samples` puts of new keys
///
/// Every timed put evicts.
pub fn measure(capacity: usize, samples: u64) -> Result<Measurement> {
    let mut cache = LruCache::new(capacity)?;
    let capacity_keys = capacity as u64;
    for i in 0..capacity_keys {
        cache.put(i, i.to_string());
    }
    info!(capacity, "cache filled");

    let mut total = Duration::ZERO;
    for i in capacity_keys..capacity_keys + samples {
        let value = i.to_string();
        let start = Instant::now();
        cache.put(i, value);
        total += start.elapsed();
    }

    let avg = if samples == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(total.as_secs_f64() / samples as f64)
    };
    Ok(Measurement { capacity, avg })
}

/// Both measurements and the verdict
#[derive(Debug, Clone, Copy)]
pub struct TimingReport {
    pub small: Measurement,
    pub large: Measurement,
    pub tolerance: Duration,
}

impl TimingReport {
    pub fn difference(&self) -> Duration {
        self.large.avg.abs_diff(self.small.avg)
    }

    pub fn is_within_tolerance(&self) -> bool {
        self.difference() <= self.tolerance
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "capacity {:>10}: {:?} per put",
            self.small.capacity, self.small.avg
        )?;
        writeln!(
            f,
            "capacity {:>10}: {:?} per put",
            self.large.capacity, self.large.avg
        )?;
        write!(
            f,
            "difference {:?} (tolerance {:?}): {}",
            self.difference(),
            self.tolerance,
            if self.is_within_tolerance() {
                "pass"
            } else {
                "FAIL"
            }
        )
    }
}

pub fn compare(small: usize, large: usize, samples: u64, tolerance: Duration) -> Result<TimingReport> {
    Ok(TimingReport {
        small: measure(small, samples)?,
        large: measure(large, samples)?,
        tolerance,
    })
}
