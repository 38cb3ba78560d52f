use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 区域缓存键
///
/// 由 UC 主机列表，查询方式，是否加速上传，以及 AccessKey 和存储空间名称共同决定
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub(super) fn new<'a>(
        uc_hosts: impl IntoIterator<Item = &'a str>,
        query_mode: &str,
        accelerate_uploading: bool,
        access_key: &str,
        bucket: &str,
    ) -> Self {
        let mut uc_hosts = uc_hosts.into_iter().collect::<Vec<_>>();
        uc_hosts.sort_unstable();
        let mut hasher = Md5::new();
        for uc_host in uc_hosts {
            hasher.update(uc_host.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(query_mode.as_bytes());
        hasher.update(b"\n");
        hasher.update(if accelerate_uploading { "accelerated" } else { "normal" });
        Self(format!(
            "qiniu-cache-key-v2:{}:{}:{}",
            hex::encode(hasher.finalize()),
            access_key,
            bucket
        ))
    }

    /// 获取缓存键字符串
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
