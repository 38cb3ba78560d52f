mod exponential;
mod fixed;
mod randomized;

pub use exponential::ExponentialBackoff;
pub use fixed::FixedBackoff;
pub use randomized::RandomizedBackoff;

use auto_impl::auto_impl;
use std::{fmt::Debug, time::Duration};

/// 退避时长获取接口
#[auto_impl(&, &mut, Box, Arc)]
pub trait Backoff: Debug + Sync + Send {
    /// 获取第 `attempts` 次重试前的退避时长，`attempts` 从 1 开始
    fn time(&self, attempts: usize) -> Duration;
}
