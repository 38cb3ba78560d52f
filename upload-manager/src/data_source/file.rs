use super::{DataChunk, DataSource, SeekableDataSource};
use std::{
    fmt::{self, Debug},
    fs::File,
    io::Result as IoResult,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

/// 本地文件信息
///
/// 断点恢复记录中保存了文件的大小和修改时间，只有两者都没有变化时才能恢复上传
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    path: PathBuf,
    size: u64,
    modified: u64,
}

impl FileIdentity {
    /// 获取文件的绝对路径
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 获取文件大小
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 获取文件修改时间，UNIX 时间戳，单位为毫秒
    #[inline]
    pub fn modified(&self) -> u64 {
        self.modified
    }
}

/// 文件数据源
///
/// 打开时记录文件信息，上传过程中如果文件被修改，恢复上传时将不再使用旧的断点恢复记录
pub struct FileDataSource {
    source: SeekableDataSource<File>,
    identity: FileIdentity,
}

impl FileDataSource {
    /// 打开文件数据源
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref().canonicalize()?;
        let file = File::open(&path)?;
        let metadata = file.metadata()?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        Ok(Self {
            identity: FileIdentity {
                size: metadata.len(),
                modified,
                path,
            },
            source: SeekableDataSource::new(file)?,
        })
    }
}

impl DataSource for FileDataSource {
    #[inline]
    fn slice(&self, size: u64) -> IoResult<Option<DataChunk>> {
        self.source.slice(size)
    }

    #[inline]
    fn reset(&self) -> IoResult<()> {
        self.source.reset()
    }

    #[inline]
    fn total_size(&self) -> IoResult<Option<u64>> {
        Ok(Some(self.identity.size))
    }

    #[inline]
    fn file_identity(&self) -> IoResult<Option<FileIdentity>> {
        Ok(Some(self.identity.to_owned()))
    }
}

impl Debug for FileDataSource {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDataSource").field("identity", &self.identity).finish()
    }
}
