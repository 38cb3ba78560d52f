use super::Backoff;
use rand::{thread_rng, Rng};
use std::time::Duration;

/// 随机化退避
///
/// 在基础退避时长的 `[minification, magnification)` 倍之间随机选取退避时长
#[derive(Debug, Clone)]
pub struct RandomizedBackoff<B> {
    base_backoff: B,
    minification: f64,
    magnification: f64,
}

impl<B> RandomizedBackoff<B> {
    /// 创建随机化退避
    #[inline]
    pub fn new(base_backoff: B, minification: f64, magnification: f64) -> Self {
        Self {
            base_backoff,
            minification,
            magnification,
        }
    }

    /// 获取基础退避
    #[inline]
    pub fn base_backoff(&self) -> &B {
        &self.base_backoff
    }
}

impl<B: Default> Default for RandomizedBackoff<B> {
    #[inline]
    fn default() -> Self {
        Self::new(B::default(), 0.5, 1.5)
    }
}

impl<B: Backoff> Backoff for RandomizedBackoff<B> {
    fn time(&self, attempts: usize) -> Duration {
        let duration = self.base_backoff.time(attempts);
        let minified = duration.mul_f64(self.minification);
        let magnified = duration.mul_f64(self.magnification);
        if minified >= magnified {
            return minified;
        }
        thread_rng().gen_range(minified..magnified)
    }
}
