use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Seek, SeekFrom},
};

/// 数据分片
///
/// 分片数据完整保存在内存中，因此分片上传请求总是可以重试的
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    part_number: u64,
    offset: u64,
    data: Vec<u8>,
}

impl DataChunk {
    /// 获取分片编号，从 1 开始
    #[inline]
    pub fn part_number(&self) -> u64 {
        self.part_number
    }

    /// 获取分片在数据源中的偏移量
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 获取分片大小
    #[inline]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// 获取分片数据
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// 分片阅读器
///
/// 将输入流按照固定大小切分为分片，除了最后一片，每一片都恰好为指定大小
pub(crate) struct ChunkReader<R> {
    reader: R,
    start: u64,
    offset: u64,
    next_part_number: u64,
}

impl<R: Read> ChunkReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self::with_start(reader, 0)
    }

    fn with_start(reader: R, start: u64) -> Self {
        Self {
            reader,
            start,
            offset: 0,
            next_part_number: 1,
        }
    }

    /// 读取下一个分片，数据读完后返回 [`None`]
    pub(crate) fn next_chunk(&mut self, size: u64) -> IoResult<Option<DataChunk>> {
        if size == 0 {
            return Err(IoError::new(IoErrorKind::InvalidInput, "chunk size must not be zero"));
        }
        let mut data = Vec::new();
        self.reader.by_ref().take(size).read_to_end(&mut data)?;
        if data.is_empty() {
            return Ok(None);
        }
        let chunk = DataChunk {
            part_number: self.next_part_number,
            offset: self.offset,
            data,
        };
        self.offset += chunk.size();
        self.next_part_number += 1;
        Ok(Some(chunk))
    }

    /// 已经读取的字节数
    #[inline]
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}

impl<R: Read + Seek> ChunkReader<R> {
    /// 以输入流当前的位置作为起始位置
    pub(crate) fn seekable(mut reader: R) -> IoResult<Self> {
        let start = reader.stream_position()?;
        Ok(Self::with_start(reader, start))
    }

    /// 获取起始位置之后的剩余数据大小，不改变当前读取位置
    pub(crate) fn remaining_size(&mut self) -> IoResult<u64> {
        let current = self.reader.stream_position()?;
        let end = self.reader.seek(SeekFrom::End(0))?;
        self.reader.seek(SeekFrom::Start(current))?;
        Ok(end.saturating_sub(self.start))
    }

    /// 回到起始位置，分片编号从 1 重新开始
    pub(crate) fn rewind(&mut self) -> IoResult<()> {
        self.reader.seek(SeekFrom::Start(self.start))?;
        self.offset = 0;
        self.next_part_number = 1;
        Ok(())
    }
}

impl<R> Debug for ChunkReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkReader")
            .field("start", &self.start)
            .field("offset", &self.offset)
            .field("next_part_number", &self.next_part_number)
            .finish()
    }
}
