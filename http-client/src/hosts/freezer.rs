use assert_impl::assert_impl;
use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// 默认的主机冻结时长
pub(crate) const DEFAULT_FREEZE_DURATION: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct FrozenHost {
    unfreeze_at: Instant,
    cause: Arc<str>,
}

/// 主机冻结器
///
/// 记录因为请求失败而被暂时冻结的主机，冻结时长过后主机自动恢复可用。
/// 克隆得到的冻结器共享同一份冻结记录，因此可以在多个客户端之间共享。
#[derive(Debug, Clone, Default)]
pub struct HostFreezer {
    frozen: Arc<DashMap<Box<str>, FrozenHost>>,
}

impl HostFreezer {
    /// 创建主机冻结器
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// 冻结主机
    ///
    /// 冻结时长为零时不做任何事
    pub fn freeze(&self, host: &str, cause: &str, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.frozen.insert(
            host.into(),
            FrozenHost {
                unfreeze_at: Instant::now() + duration,
                cause: cause.into(),
            },
        );
    }

    /// 解冻主机
    #[inline]
    pub fn unfreeze(&self, host: &str) {
        self.frozen.remove(host);
    }

    /// 主机当前是否被冻结
    #[inline]
    pub fn is_frozen(&self, host: &str) -> bool {
        self.frozen_cause(host).is_some()
    }

    /// 如果主机当前被冻结，返回冻结原因
    ///
    /// 已经过期的冻结记录将被顺便移除
    pub fn frozen_cause(&self, host: &str) -> Option<Arc<str>> {
        let now = Instant::now();
        let cause = self.frozen.get(host).map(|frozen| {
            if frozen.unfreeze_at > now {
                Ok(frozen.cause.to_owned())
            } else {
                Err(())
            }
        })?;
        match cause {
            Ok(cause) => Some(cause),
            Err(()) => {
                self.frozen.remove_if(host, |_, frozen| frozen.unfreeze_at <= now);
                None
            }
        }
    }

    /// 清空所有冻结记录
    #[inline]
    pub fn clear(&self) {
        self.frozen.clear();
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_freeze_and_unfreeze() {
        env_logger::builder().is_test(true).try_init().ok();

        let freezer = HostFreezer::new();
        assert!(!freezer.is_frozen("up.qiniup.com"));

        freezer.freeze("up.qiniup.com", "timeout", Duration::from_millis(100));
        assert!(freezer.is_frozen("up.qiniup.com"));
        assert_eq!(freezer.frozen_cause("up.qiniup.com").as_deref(), Some("timeout"));
        assert!(!freezer.is_frozen("upload.qiniup.com"));

        thread::sleep(Duration::from_millis(150));
        assert!(!freezer.is_frozen("up.qiniup.com"));

        freezer.freeze("up.qiniup.com", "timeout", Duration::from_secs(60));
        freezer.unfreeze("up.qiniup.com");
        assert!(!freezer.is_frozen("up.qiniup.com"));
    }

    #[test]
    fn test_zero_duration_is_noop() {
        let freezer = HostFreezer::new();
        freezer.freeze("up.qiniup.com", "timeout", Duration::ZERO);
        assert!(!freezer.is_frozen("up.qiniup.com"));
    }

    #[test]
    fn test_shared_between_clones_and_threads() {
        let freezer = HostFreezer::new();
        let threads = (0..4)
            .map(|i| {
                let freezer = freezer.to_owned();
                thread::spawn(move || freezer.freeze(&format!("host-{i}"), "error", Duration::from_secs(60)))
            })
            .collect::<Vec<_>>();
        threads.into_iter().for_each(|thread| thread.join().unwrap());
        for i in 0..4 {
            assert!(freezer.is_frozen(&format!("host-{i}")));
        }
        freezer.clear();
        assert!(!freezer.is_frozen("host-0"));
    }
}
