use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;

/// Jittered delay between sequential calls of one provider flow
///
/// The first call goes out immediately; each later call waits a random
/// delay drawn from `[min, max]`.
#[derive(Debug)]
pub struct Pacer {
    min: Duration,
    max: Duration,
    rng: StdRng,
    started: bool,
}

impl Pacer {
    pub fn new(min: Duration, max: Duration, rng: StdRng) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            rng,
            started: false,
        }
    }

    /// Delay to apply before the next call
    pub fn next_delay(&mut self) -> Duration {
        if !self.started {
            self.started = true;
            return Duration::ZERO;
        }
        if self.min == self.max {
            return self.min;
        }
        let millis = self
            .rng
            .gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    /// Waits out the delay before the next call
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!("Pacing next request by {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_first_call_is_immediate() {
        let mut pacer = Pacer::new(
            Duration::from_millis(500),
            Duration::from_millis(1500),
            StdRng::seed_from_u64(3),
        );
        assert_eq!(pacer.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_later_delays_stay_in_range() {
        let mut pacer = Pacer::new(
            Duration::from_millis(500),
            Duration::from_millis(1500),
            StdRng::seed_from_u64(3),
        );
        pacer.next_delay();
        for _ in 0..50 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_fixed_delay() {
        let mut pacer = Pacer::new(Duration::ZERO, Duration::ZERO, StdRng::seed_from_u64(3));
        pacer.next_delay();
        assert_eq!(pacer.next_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_wait_without_delay_returns() {
        let mut pacer = Pacer::new(Duration::ZERO, Duration::ZERO, StdRng::seed_from_u64(3));
        pacer.wait().await;
        pacer.wait().await;
    }
}
