mod dummy;
mod file;

pub use dummy::DummyResumableRecorder;
pub use file::FileSystemResumableRecorder;

use super::SourceKey;
use auto_impl::auto_impl;
use std::{fmt::Debug, io::Result as IoResult};

/// 断点恢复记录器
///
/// 以 [`SourceKey`] 为 KEY 保存上传会话的断点恢复记录。
/// 同一个 KEY 的记录每次都被完整地覆盖写入，多个上传会话同时写入同一个 KEY 时，以最后一次写入为准
#[auto_impl(&, &mut, Box, Arc)]
pub trait ResumableRecorder: Debug + Sync + Send {
    /// 读取记录，记录不存在时返回 [`None`]
    fn get(&self, source_key: &SourceKey) -> IoResult<Option<Vec<u8>>>;

    /// 写入记录，覆盖已有的记录
    fn set(&self, source_key: &SourceKey, record: &[u8]) -> IoResult<()>;

    /// 删除记录，记录不存在时不返回错误
    fn delete(&self, source_key: &SourceKey) -> IoResult<()>;
}
