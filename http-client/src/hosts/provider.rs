use super::HostFreezer;
use auto_impl::auto_impl;
use std::{fmt::Debug, sync::Arc, time::Duration};
use thiserror::Error;

/// 主机提供者错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostProviderError {
    /// 没有配置任何主机
    #[error("no host is configured")]
    NoHost,

    /// 所有主机都已经被冻结
    #[error("all hosts are frozen, last frozen cause: {0}")]
    AllFrozen(String),
}

/// 主机提供者结果
pub type HostProviderResult<T> = Result<T, HostProviderError>;

/// 主机提供者
///
/// 为主机重试拦截器提供下一个可用的主机，并接受对失败主机的冻结
#[auto_impl(&, &mut, Box, Arc)]
pub trait HostProvider: Debug + Send + Sync {
    /// 返回一个当前没有被冻结的主机
    fn provider(&self) -> HostProviderResult<String>;

    /// 冻结主机，冻结时长为零时不做任何事
    fn freeze(&self, host: &str, cause: &str, duration: Duration) -> HostProviderResult<()>;
}

/// 基于主机列表的主机提供者
///
/// 总是按照列表顺序返回第一个没有被冻结的主机
#[derive(Debug, Clone)]
pub struct ArrayHostProvider {
    hosts: Arc<[String]>,
    freezer: HostFreezer,
}

impl ArrayHostProvider {
    /// 创建基于主机列表的主机提供者
    #[inline]
    pub fn new(hosts: impl IntoIterator<Item = impl Into<String>>, freezer: HostFreezer) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            freezer,
        }
    }

    /// 获取全部主机
    #[inline]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

impl HostProvider for ArrayHostProvider {
    fn provider(&self) -> HostProviderResult<String> {
        let mut last_cause = None;
        for host in self.hosts.iter() {
            match self.freezer.frozen_cause(host) {
                None => return Ok(host.to_owned()),
                Some(cause) => last_cause = Some(cause),
            }
        }
        match last_cause {
            Some(cause) => Err(HostProviderError::AllFrozen(cause.to_string())),
            None => Err(HostProviderError::NoHost),
        }
    }

    #[inline]
    fn freeze(&self, host: &str, cause: &str, duration: Duration) -> HostProviderResult<()> {
        self.freezer.freeze(host, cause, duration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_never_returns_frozen_host_while_alternative_exists() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let provider = ArrayHostProvider::new(["host-a", "host-b", "host-c"], HostFreezer::new());
        assert_eq!(provider.provider()?, "host-a");

        provider.freeze("host-a", "timeout", Duration::from_secs(60))?;
        assert_eq!(provider.provider()?, "host-b");

        provider.freeze("host-c", "timeout", Duration::from_secs(60))?;
        assert_eq!(provider.provider()?, "host-b");

        provider.freeze("host-b", "service unavailable", Duration::from_millis(100))?;
        assert_eq!(
            provider.provider(),
            Err(HostProviderError::AllFrozen("timeout".to_owned()))
        );

        sleep(Duration::from_millis(150));
        assert_eq!(provider.provider()?, "host-b");
        Ok(())
    }

    #[test]
    fn test_empty_hosts() {
        let provider = ArrayHostProvider::new(Vec::<String>::new(), HostFreezer::new());
        assert_eq!(provider.provider(), Err(HostProviderError::NoHost));
    }

    #[test]
    fn test_freezer_shared_between_providers() -> anyhow::Result<()> {
        let freezer = HostFreezer::new();
        let provider1 = ArrayHostProvider::new(["host-a", "host-b"], freezer.to_owned());
        let provider2 = ArrayHostProvider::new(["host-a", "host-c"], freezer);
        provider1.freeze("host-a", "timeout", Duration::from_secs(60))?;
        assert_eq!(provider2.provider()?, "host-c");
        Ok(())
    }
}
