use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

const LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Token bucket pacing fetch attempts. `acquire` blocks until a token is free.
#[derive(Debug, Clone)]
pub struct Throttle {
    rate_per_sec: f64,
    burst: f64,
    tokens: f64,
    last_refill: Instant,
    waited_since_log: Duration,
    last_log: Instant,
}

impl Throttle {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        let now = Instant::now();
        let burst = f64::from(burst.max(1));
        Self {
            rate_per_sec: f64::from(rate_per_sec.max(1)),
            burst,
            tokens: burst,
            last_refill: now,
            waited_since_log: Duration::ZERO,
            last_log: now,
        }
    }

    /// Take a token, sleeping the current thread while the bucket is empty.
    pub fn acquire(&mut self) {
        loop {
            match self.try_acquire(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    debug!("throttled for {} ms", wait.as_millis());
                    self.waited_since_log += wait;
                    thread::sleep(wait);
                }
            }
        }
    }

    /// Consume a token at `now`, or report how long until one is available.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        let elapsed = now
            .saturating_duration_since(self.last_refill)
            .as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.burst);
            self.last_refill = now;
        }
        self.log_waits_if_needed(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / self.rate_per_sec))
        }
    }

    fn log_waits_if_needed(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_log) >= LOG_INTERVAL {
            if !self.waited_since_log.is_zero() {
                info!(
                    "throttle waited {} ms in the last minute",
                    self.waited_since_log.as_millis()
                );
            }
            self.waited_since_log = Duration::ZERO;
            self.last_log = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_refill_at_rate() {
        let mut throttle = Throttle::new(2, 3);
        let start = throttle.last_refill;
        for _ in 0..3 {
            assert!(throttle.try_acquire(start).is_ok());
        }
        let wait = throttle.try_acquire(start).unwrap_err();
        assert_eq!(wait, Duration::from_millis(500));

        assert!(throttle.try_acquire(start + Duration::from_millis(500)).is_ok());
        assert!(throttle.try_acquire(start + Duration::from_millis(500)).is_err());
    }

    #[test]
    fn bucket_never_exceeds_burst() {
        let mut throttle = Throttle::new(10, 2);
        let later = throttle.last_refill + Duration::from_secs(30);
        assert!(throttle.try_acquire(later).is_ok());
        assert!(throttle.try_acquire(later).is_ok());
        assert!(throttle.try_acquire(later).is_err());
    }

    #[test]
    fn zero_settings_fall_back_to_one() {
        let mut throttle = Throttle::new(0, 0);
        let start = throttle.last_refill;
        assert!(throttle.try_acquire(start).is_ok());
        assert_eq!(throttle.try_acquire(start), Err(Duration::from_secs(1)));
    }
}
