//! Exponential backoff schedule.

use std::time::Duration;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_FACTOR: f64 = 1.5;
const DEFAULT_JITTER: f64 = 0.4;
const DEFAULT_STEPS: u32 = 10;

/// Exponential backoff configuration.
///
/// The default schedule sleeps roughly 0, 0.5s, 0.75s, 1.1s, ... between ten
/// attempts, around 40s in total once jitter is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Delay before the second attempt.
    pub initial: Duration,
    /// Multiplier applied to the delay after every attempt. Values below 1 are treated as 1.
    pub factor: f64,
    /// Each delay is extended by a random fraction of itself, up to `jitter`.
    pub jitter: f64,
    /// Maximum number of attempts. At least one attempt is always made.
    pub steps: u32,
    /// Upper bound for the un-jittered delay.
    pub cap: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_DELAY,
            factor: DEFAULT_FACTOR,
            jitter: DEFAULT_JITTER,
            steps: DEFAULT_STEPS,
            cap: None,
        }
    }
}

impl Backoff {
    /// `steps` attempts with no delay in between.
    pub fn immediate(steps: u32) -> Self {
        Self {
            initial: Duration::ZERO,
            factor: 1.0,
            jitter: 0.0,
            steps,
            cap: None,
        }
    }

    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Delay to sleep before each attempt. The first attempt is immediate.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.capped(self.initial),
            factor: self.factor.max(1.0),
            jitter: self.jitter.max(0.0),
            cap: self.cap,
            remaining: self.steps.max(1),
            first: true,
        }
    }

    fn capped(&self, delay: Duration) -> Duration {
        match self.cap {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

/// Iterator over the per-attempt delays of a [`Backoff`].
#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    factor: f64,
    jitter: f64,
    cap: Option<Duration>,
    remaining: u32,
    first: bool,
}

/// `delay * by`, saturating at [`Duration::MAX`].
fn scale(delay: Duration, by: f64) -> Duration {
    if delay.is_zero() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(delay.as_secs_f64() * by).unwrap_or(Duration::MAX)
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if self.first {
            self.first = false;
            return Some(Duration::ZERO);
        }

        let base = self.next;
        let grown = scale(base, self.factor);
        self.next = match self.cap {
            Some(cap) => grown.min(cap),
            None => grown,
        };

        if self.jitter > 0.0 && !base.is_zero() {
            Some(base.saturating_add(scale(base, self.jitter * rand::random::<f64>())))
        } else {
            Some(base)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Delays {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_is_immediate() {
        let mut delays = Backoff::default().delays();
        assert_eq!(delays.next(), Some(Duration::ZERO));
        assert_eq!(delays.len(), 9);
    }

    #[test]
    fn test_exponential_growth_without_jitter() {
        let backoff = Backoff {
            initial: Duration::from_millis(100),
            factor: 2.0,
            jitter: 0.0,
            steps: 5,
            cap: None,
        };
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_cap_limits_delay() {
        let backoff = Backoff {
            initial: Duration::from_millis(100),
            factor: 10.0,
            jitter: 0.0,
            steps: 4,
            cap: None,
        }
        .with_cap(Duration::from_millis(300));
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(delays[3], Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = Backoff {
            initial: Duration::from_millis(100),
            factor: 1.0,
            jitter: 0.5,
            steps: 50,
            cap: None,
        };
        for delay in backoff.delays().skip(1) {
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_huge_factor_saturates() {
        let backoff = Backoff {
            initial: Duration::from_secs(1),
            factor: 1e300,
            jitter: 0.4,
            steps: 4,
            cap: None,
        };
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(delays.len(), 4);
        assert_eq!(delays[2], Duration::MAX);
        assert_eq!(delays[3], Duration::MAX);
    }

    #[test]
    fn test_huge_factor_respects_cap() {
        let backoff = Backoff {
            initial: Duration::from_secs(1),
            factor: f64::MAX,
            jitter: 0.0,
            steps: 4,
            cap: None,
        }
        .with_cap(Duration::from_secs(30));
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(delays[2], Duration::from_secs(30));
        assert_eq!(delays[3], Duration::from_secs(30));
    }

    #[test]
    fn test_zero_steps_still_attempts_once() {
        assert_eq!(Backoff::immediate(0).delays().count(), 1);
        assert_eq!(Backoff::immediate(3).delays().count(), 3);
    }

    #[test]
    fn test_shrinking_factor_is_clamped() {
        let backoff = Backoff {
            initial: Duration::from_millis(100),
            factor: 0.1,
            jitter: 0.0,
            steps: 3,
            cap: None,
        };
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(delays[2], Duration::from_millis(100));
    }
}
