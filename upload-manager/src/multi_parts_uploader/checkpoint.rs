use super::{
    v1::BlockProgress,
    v2::{PartEtag, UploadSession},
    PartProgress,
};
use qiniu_http_client::Region;
use serde::{Deserialize, Serialize};

/// 断点恢复记录
///
/// 以 `version` 字段区分协议版本，无法识别的版本按照无记录处理
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub(crate) enum Checkpoint {
    V1(CheckpointRecord<(), BlockProgress>),
    V2(CheckpointRecord<UploadSession, PartEtag>),
}

/// 一个上传会话的断点恢复记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CheckpointRecord<S, P> {
    pub(crate) region: Region,
    pub(crate) file_size: u64,
    pub(crate) file_modified: u64,
    pub(crate) session: S,
    pub(crate) progresses: Vec<P>,
}

impl<S, P: PartProgress> CheckpointRecord<S, P> {
    /// 记录是否可以用于恢复上传
    ///
    /// 文件大小和修改时间都必须一致，区域必须相同，并且会话和所有分片都没有过期
    pub(crate) fn is_reusable(
        &self,
        region: &Region,
        file_size: u64,
        file_modified: u64,
        session_expired_at: Option<u64>,
        now: u64,
    ) -> bool {
        self.file_size == file_size
            && self.file_modified == file_modified
            && &self.region == region
            && session_expired_at.map_or(true, |expired_at| expired_at > now)
            && self
                .progresses
                .iter()
                .all(|progress| progress.expired_at().map_or(true, |expired_at| expired_at > now))
    }
}

impl Checkpoint {
    pub(crate) fn from_slice(record: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(record)
    }

    pub(crate) fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
