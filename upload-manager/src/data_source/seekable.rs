use super::{ChunkReader, DataChunk, DataSource};
use std::{
    fmt::{self, Debug},
    io::{Read, Result as IoResult, Seek},
    sync::{Mutex, PoisonError},
};

/// 可寻址的数据源
///
/// 从输入流的当前位置开始读取，可以重置，因此支持区域切换后重新上传
pub struct SeekableDataSource<R> {
    reader: Mutex<ChunkReader<R>>,
    size: u64,
}

impl<R: Read + Seek + Send> SeekableDataSource<R> {
    /// 创建可寻址的数据源
    pub fn new(reader: R) -> IoResult<Self> {
        let mut reader = ChunkReader::seekable(reader)?;
        let size = reader.remaining_size()?;
        Ok(Self {
            reader: Mutex::new(reader),
            size,
        })
    }
}

impl<R: Read + Seek + Send> DataSource for SeekableDataSource<R> {
    fn slice(&self, size: u64) -> IoResult<Option<DataChunk>> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner).next_chunk(size)
    }

    fn reset(&self) -> IoResult<()> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner).rewind()
    }

    #[inline]
    fn total_size(&self) -> IoResult<Option<u64>> {
        Ok(Some(self.size))
    }
}

impl<R> Debug for SeekableDataSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeekableDataSource")
            .field("reader", &self.reader)
            .field("size", &self.size)
            .finish()
    }
}
