//! 指数退避

use std::time::Duration;

/// 指数退避策略
///
/// 第 n 次重试前等待 `min(base * 2^n, max)`，n 从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map(|delay| delay.min(self.max))
            .unwrap_or(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(30_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let backoff = Backoff::default();
        let delays: Vec<u128> = (1..=3).map(|n| backoff.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![2000, 4000, 8000]);
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(4), Duration::from_millis(16_000));
        assert_eq!(backoff.delay(5), Duration::from_millis(30_000));
        assert_eq!(backoff.delay(40), Duration::from_millis(30_000));
    }
}
