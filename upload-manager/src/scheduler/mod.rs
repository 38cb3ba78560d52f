mod concurrent_multi_parts_uploader_scheduler;

pub(crate) use concurrent_multi_parts_uploader_scheduler::ConcurrentMultiPartsUploaderScheduler;

use qiniu_http_client::ApiResult;
use serde_json::Value;

/// 分片上传调度结果
#[derive(Debug)]
pub(crate) struct SchedulerOutcome {
    /// 合并分片的响应
    pub(crate) result: ApiResult<Value>,

    /// 从断点恢复记录中恢复的分片数量
    pub(crate) recovered_parts: usize,
}
