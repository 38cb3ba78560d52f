use super::{ResumableRecorder, SourceKey};
use std::{
    env::temp_dir,
    fs::{read, remove_file, rename, write, DirBuilder},
    io::{ErrorKind as IoErrorKind, Result as IoResult},
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicUsize, Ordering::Relaxed},
};

const DEFAULT_DIRECTORY_NAME: &str = ".qiniu-rust-sdk";

static TMP_FILE_SEQ: AtomicUsize = AtomicUsize::new(0);

/// 文件系统断点恢复记录器
///
/// 每个记录保存为目录下的一个文件，文件名为 [`SourceKey`] 的十六进制表示
#[derive(Debug, Clone)]
pub struct FileSystemResumableRecorder {
    path: PathBuf,
}

impl Default for FileSystemResumableRecorder {
    #[inline]
    fn default() -> Self {
        Self::new(temp_dir().join(DEFAULT_DIRECTORY_NAME))
    }
}

impl FileSystemResumableRecorder {
    /// 创建文件系统断点恢复记录器，传入一个目录路径用于储存断点记录
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 获取储存断点记录的目录
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_of(&self, source_key: &SourceKey) -> PathBuf {
        self.path.join(source_key.to_string())
    }

    fn create_directory(&self) -> IoResult<()> {
        DirBuilder::new().recursive(true).create(&self.path)
    }
}

impl ResumableRecorder for FileSystemResumableRecorder {
    fn get(&self, source_key: &SourceKey) -> IoResult<Option<Vec<u8>>> {
        match read(self.path_of(source_key)) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, source_key: &SourceKey, record: &[u8]) -> IoResult<()> {
        self.create_directory()?;
        let path = self.path_of(source_key);
        // 先写入临时文件再重命名，读取方不会读到写了一半的记录
        let tmp_path = path.with_extension(format!("{}-{}.tmp", process::id(), TMP_FILE_SEQ.fetch_add(1, Relaxed)));
        write(&tmp_path, record)?;
        rename(&tmp_path, &path).map_err(|err| {
            remove_file(&tmp_path).ok();
            err
        })
    }

    fn delete(&self, source_key: &SourceKey) -> IoResult<()> {
        match remove_file(self.path_of(source_key)) {
            Err(err) if err.kind() != IoErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rand::{thread_rng, RngCore};
    use tempfile::tempdir;

    #[test]
    fn test_file_system_resumable_recorder() -> Result<()> {
        let dir = tempdir()?;
        let source_key = SourceKey::digest([b"test-source".as_slice()]);
        let recorder = FileSystemResumableRecorder::new(dir.path().join("records"));
        assert_eq!(recorder.get(&source_key)?, None);
        recorder.delete(&source_key)?;

        let mut buf = vec![0u8; 1 << 20];
        thread_rng().fill_bytes(&mut buf);
        recorder.set(&source_key, &buf)?;
        assert_eq!(recorder.get(&source_key)?.as_deref(), Some(buf.as_slice()));
        assert!(dir.path().join("records").join(source_key.to_string()).is_file());

        recorder.set(&source_key, b"last writer wins")?;
        assert_eq!(recorder.get(&source_key)?.as_deref(), Some(b"last writer wins".as_slice()));

        recorder.delete(&source_key)?;
        assert_eq!(recorder.get(&source_key)?, None);
        Ok(())
    }
}
