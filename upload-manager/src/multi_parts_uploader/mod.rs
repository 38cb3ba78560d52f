mod checkpoint;
mod v1;
mod v2;

pub(crate) use checkpoint::{Checkpoint, CheckpointRecord};
pub(crate) use v1::MultiPartsV1Uploader;
pub(crate) use v2::MultiPartsV2Uploader;

use super::{DataChunk, MultiPartsVersion, ObjectParams, UploadToken};
use qiniu_http_client::{
    http::Method, ApiResult, Authorization, Client, Region, RequestBuilder, ResponseError, ResponseErrorKind,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// 一次上传所针对的目标
///
/// 包含本次尝试所用的区域，上传凭证和对象参数
#[derive(Debug, Clone, Copy)]
pub(crate) struct UploadTarget<'a> {
    pub(crate) client: &'a Client,
    pub(crate) region: &'a Region,
    pub(crate) token: &'a UploadToken,
    pub(crate) params: &'a ObjectParams,
}

impl<'a> UploadTarget<'a> {
    /// 创建发往区域上传服务的请求，响应体将被完整读入内存
    pub(crate) fn request(&self, method: Method, path: impl Into<String>) -> RequestBuilder<'a> {
        self.client
            .request(method, self.client.host_provider(self.region.up().hosts()))
            .path(path)
            .context(self.params.context().to_owned())
            .buffer_response()
    }

    #[inline]
    pub(crate) fn authorization(&self) -> Authorization {
        Authorization::uptoken(self.token.as_str())
    }
}

/// 已经上传的分片信息
pub(crate) trait PartProgress {
    /// 分片编号，从 1 开始
    fn part_number(&self) -> u64;

    /// 分片在数据源中的偏移量
    fn offset(&self) -> u64;

    /// 分片大小
    fn size(&self) -> u64;

    /// 分片在服务器上的过期时间，UNIX 时间戳，单位为秒
    fn expired_at(&self) -> Option<u64> {
        None
    }
}

/// 分片上传协议
///
/// 初始化，逐个上传分片，最后合并所有分片。
/// 同一个会话的分片可能在多个线程中并发上传
pub(crate) trait MultiPartsUploader: Debug + Sync {
    /// 分片上传会话信息
    type Session: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// 分片上传进度
    type Progress: PartProgress + Clone + Debug + Serialize + DeserializeOwned + Send;

    /// 协议版本
    const VERSION: MultiPartsVersion;

    /// 服务器返回该状态码表示会话或分片已经过期，断点恢复记录不再可用
    const EXPIRED_STATUS_CODE: u16;

    /// 初始化分片上传会话
    fn initialize_parts(&self, target: &UploadTarget<'_>) -> ApiResult<Self::Session>;

    /// 上传一个分片
    fn upload_part(
        &self,
        target: &UploadTarget<'_>,
        session: &Self::Session,
        chunk: &DataChunk,
    ) -> ApiResult<Self::Progress>;

    /// 合并所有分片，`progresses` 已经按照分片编号排序
    fn complete_parts(
        &self,
        target: &UploadTarget<'_>,
        session: &Self::Session,
        progresses: &[Self::Progress],
    ) -> ApiResult<Value>;

    /// 会话在服务器上的过期时间，UNIX 时间戳，单位为秒
    fn session_expired_at(&self, _session: &Self::Session) -> Option<u64> {
        None
    }

    /// 将会话记录包装为带有版本的断点恢复记录
    fn wrap_checkpoint(record: CheckpointRecord<Self::Session, Self::Progress>) -> Checkpoint;

    /// 从断点恢复记录中取出会话记录，版本不匹配时返回 [`None`]
    fn unwrap_checkpoint(checkpoint: Checkpoint) -> Option<CheckpointRecord<Self::Session, Self::Progress>>;

    /// 错误是否意味着会话已经过期
    fn is_expired_error(&self, err: &ResponseError) -> bool {
        err.status_code()
            .map_or(false, |status_code| status_code.as_u16() == Self::EXPIRED_STATUS_CODE)
    }
}

/// 数据与服务器返回的校验值不一致
pub(super) fn integrity_error(msg: String) -> ResponseError {
    ResponseError::new_with_msg(ResponseErrorKind::ParseResponseError, msg)
}

/// 按照 KEY 排序，保证生成的请求稳定
pub(crate) fn sorted_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Vec<(&'a str, &'a str)> {
    let mut pairs = pairs
        .into_iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect::<Vec<_>>();
    pairs.sort_unstable();
    pairs
}
