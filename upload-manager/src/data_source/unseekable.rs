use super::{ChunkReader, DataChunk, DataSource};
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
    sync::{Mutex, PoisonError},
};

/// 不可寻址的数据源
///
/// 数据源大小未知，也无法从断点恢复记录中恢复，读取过数据后不能重置
pub struct UnseekableDataSource<R>(Mutex<ChunkReader<R>>);

impl<R: Read + Send> UnseekableDataSource<R> {
    /// 创建不可寻址的数据源
    #[inline]
    pub fn new(reader: R) -> Self {
        Self(Mutex::new(ChunkReader::new(reader)))
    }
}

impl<R: Read + Send> DataSource for UnseekableDataSource<R> {
    fn slice(&self, size: u64) -> IoResult<Option<DataChunk>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).next_chunk(size)
    }

    fn reset(&self) -> IoResult<()> {
        if self.0.lock().unwrap_or_else(PoisonError::into_inner).offset() > 0 {
            Err(IoError::new(
                IoErrorKind::Unsupported,
                "unseekable data source can not be reset after read",
            ))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn total_size(&self) -> IoResult<Option<u64>> {
        Ok(None)
    }
}

impl<R> Debug for UnseekableDataSource<R> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnseekableDataSource").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseekable_data_source_can_not_be_reset_after_read() -> anyhow::Result<()> {
        let source = UnseekableDataSource::new(b"0123456789".as_slice());
        assert_eq!(source.total_size()?, None);
        source.reset()?;

        assert_eq!(source.slice(6)?.map(|chunk| chunk.size()), Some(6));
        assert_eq!(source.reset().map_err(|err| err.kind()), Err(IoErrorKind::Unsupported));
        assert_eq!(source.slice(6)?.map(|chunk| (chunk.part_number(), chunk.offset())), Some((2, 6)));
        assert!(source.slice(6)?.is_none());
        Ok(())
    }
}
