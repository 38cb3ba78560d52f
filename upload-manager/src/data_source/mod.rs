mod file;
mod reader;
mod seekable;
mod source_key;
mod unseekable;

pub use file::{FileDataSource, FileIdentity};
pub use reader::DataChunk;
pub use seekable::SeekableDataSource;
pub use source_key::SourceKey;
pub use unseekable::UnseekableDataSource;

pub(crate) use reader::ChunkReader;

use auto_impl::auto_impl;
use std::{fmt::Debug, io::Result as IoResult};

/// 数据源接口
///
/// 提供上传所用的数据源，多个上传线程通过 [`DataSource::slice`] 并发地获取分片，
/// 实现需要保证每个分片只会被读取一次
#[auto_impl(&, &mut, Box, Arc)]
pub trait DataSource: Debug + Sync + Send {
    /// 读取下一个分片
    ///
    /// 数据读完后返回 [`None`]
    fn slice(&self, size: u64) -> IoResult<Option<DataChunk>>;

    /// 重置数据源，下一次读取将从第一个分片开始
    ///
    /// 无法重置的数据源在读取过数据后将返回错误
    fn reset(&self) -> IoResult<()>;

    /// 获取数据源大小
    ///
    /// 大小未知时返回 [`None`]
    fn total_size(&self) -> IoResult<Option<u64>>;

    /// 获取数据源对应的本地文件信息
    ///
    /// 只有本地文件才能从断点恢复记录中恢复上传
    #[inline]
    fn file_identity(&self) -> IoResult<Option<FileIdentity>> {
        Ok(None)
    }
}
