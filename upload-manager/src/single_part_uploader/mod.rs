mod form_uploader;

pub(crate) use form_uploader::FormUploader;

use super::{multi_parts_uploader::UploadTarget, DataSource};
use qiniu_http_client::ApiResult;
use serde_json::Value;
use std::fmt::Debug;

/// 单请求上传
///
/// 整个数据源通过一个请求上传，失败时只能从头开始
pub(crate) trait SinglePartUploader: Debug {
    /// 上传数据源
    fn upload(&self, target: &UploadTarget<'_>, source: &dyn DataSource) -> ApiResult<Value>;
}
