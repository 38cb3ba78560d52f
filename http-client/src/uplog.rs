use auto_impl::auto_impl;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

/// 打点日志事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "log_type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum UplogEvent {
    /// 单次 HTTP 请求
    Request(RequestEvent),

    /// 上传结束
    Upload(UploadEvent),
}

/// HTTP 请求事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// 请求方法
    pub method: String,

    /// 请求主机
    pub host: String,

    /// 请求路径
    pub path: String,

    /// 响应状态码，请求失败时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// 响应的 X-ReqId
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_reqid: Option<String>,

    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 耗时，单位为毫秒
    pub elapsed_ms: u64,
}

/// 上传事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    /// 上传方式，`form`，`v1` 或 `v2`
    pub method: String,

    /// 区域 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,

    /// 上传数据大小
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// 从断点恢复的分片数
    pub recovered_chunks: usize,

    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 耗时，单位为毫秒
    pub elapsed_ms: u64,
}

/// 打点日志接收器
///
/// 事件的发送是即发即弃的，接收器不能阻塞调用方
#[auto_impl(&, &mut, Box, Arc)]
pub trait UplogSink: Debug + Send + Sync {
    /// 接收打点日志事件
    fn emit(&self, event: UplogEvent);
}

/// 将打点日志事件以 JSON 格式输出到 `debug` 日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LogUplogSink;

impl UplogSink for LogUplogSink {
    fn emit(&self, event: UplogEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => debug!("uplog: {}", json),
            Err(err) => debug!("uplog: failed to serialize {:?}: {}", event, err),
        }
    }
}

/// 丢弃所有打点日志事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUplogSink;

impl UplogSink for NoopUplogSink {
    #[inline]
    fn emit(&self, _event: UplogEvent) {}
}

/// 将耗时转换为毫秒数，超出 `u64` 范围时取最大值
pub(crate) fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
