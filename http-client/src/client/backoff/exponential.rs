use super::Backoff;
use std::time::Duration;

/// 指数退避
///
/// 第 n 次重试的退避时长为 `base * 2 ^ (n - 1)`，最长不超过 `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    /// 创建指数退避
    #[inline]
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }
}

impl Default for ExponentialBackoff {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(10))
    }
}

impl Backoff for ExponentialBackoff {
    fn time(&self, attempts: usize) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31) as u32;
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
