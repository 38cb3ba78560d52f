use super::Backoff;
use std::time::Duration;

/// 固定时长的退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    /// 创建固定时长的退避
    #[inline]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 不退避
    #[inline]
    pub const fn no_delay() -> Self {
        Self::new(Duration::ZERO)
    }

    /// 获取退避时长
    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedBackoff {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl Backoff for FixedBackoff {
    #[inline]
    fn time(&self, _attempts: usize) -> Duration {
        self.delay
    }
}
