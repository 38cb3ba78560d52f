use super::{ResumableRecorder, SourceKey};
use std::io::Result as IoResult;

/// 无断点恢复记录器
///
/// 实现了断点恢复记录器接口，但总是返回找不到记录，写入的记录也将被丢弃
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyResumableRecorder;

impl DummyResumableRecorder {
    /// 创建无断点恢复记录器
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl ResumableRecorder for DummyResumableRecorder {
    #[inline]
    fn get(&self, _source_key: &SourceKey) -> IoResult<Option<Vec<u8>>> {
        Ok(None)
    }

    #[inline]
    fn set(&self, _source_key: &SourceKey, _record: &[u8]) -> IoResult<()> {
        Ok(())
    }

    #[inline]
    fn delete(&self, _source_key: &SourceKey) -> IoResult<()> {
        Ok(())
    }
}
