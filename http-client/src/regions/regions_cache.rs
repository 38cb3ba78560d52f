use super::{super::ApiResult, CacheKey, Region};
use assert_impl::assert_impl;
use dashmap::DashMap;
use fs4::FileExt;
use log::{info, warn};
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env::temp_dir,
    ffi::OsString,
    fs::{create_dir_all, remove_file, rename, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Result as IoResult, Write},
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

static DEFAULT_REGIONS_CACHE: Lazy<RegionsCache> =
    Lazy::new(|| RegionsCache::load_or_create_from(RegionsCache::default_persistent_path()));

type Inflight = Arc<OnceCell<ApiResult<Vec<Region>>>>;

/// 区域缓存
///
/// 内存中的缓存在首次访问时从持久化文件加载。
/// 每次更新时在文件锁的保护下读取文件，合并本次变更后再原子地替换文件，
/// 因此多个区域缓存实例，甚至多个进程，可以共享同一个持久化文件。
/// 持久化失败不影响缓存的使用，只会输出警告日志。
/// 克隆得到的区域缓存共享同一份数据，因此可以在多个区域查询器之间共享。
#[derive(Debug, Clone)]
pub struct RegionsCache {
    inner: Arc<RegionsCacheInner>,
}

#[derive(Debug)]
struct RegionsCacheInner {
    entries: OnceCell<DashMap<CacheKey, CacheValue>>,
    persistent_path: Option<PathBuf>,
    inflight: DashMap<CacheKey, Inflight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheValue {
    value: Vec<Region>,
    deadline: u64,
}

enum Change {
    Set(CacheKey, CacheValue),
    Remove(CacheKey),
    Clear,
}

impl CacheValue {
    #[inline]
    fn is_fresh(&self, now: u64) -> bool {
        self.deadline > now
    }
}

impl RegionsCache {
    /// 创建区域缓存构建器
    #[inline]
    pub fn builder() -> RegionsCacheBuilder {
        Default::default()
    }

    /// 创建仅存储在内存中的区域缓存
    #[inline]
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    /// 创建持久化到指定文件的区域缓存
    #[inline]
    pub fn load_or_create_from(path: impl Into<PathBuf>) -> Self {
        Self::builder().persistent_path(path).build()
    }

    /// 进程内共享的默认区域缓存，持久化到 [`RegionsCache::default_persistent_path`]
    #[inline]
    pub fn shared() -> Self {
        DEFAULT_REGIONS_CACHE.to_owned()
    }

    /// 默认的持久化文件路径
    pub fn default_persistent_path() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(temp_dir);
        path.push(".qiniu-rust-sdk");
        path.push("regions-cache.json");
        path
    }

    /// 获取持久化文件路径
    #[inline]
    pub fn persistent_path(&self) -> Option<&Path> {
        self.inner.persistent_path.as_deref()
    }

    /// 获取尚未过期的缓存
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Region>> {
        let now = unix_now();
        self.entries()
            .get(key)
            .filter(|value| value.is_fresh(now))
            .map(|value| value.value.to_owned())
    }

    /// 设置缓存，缓存在 `lifetime` 之后过期
    pub fn set(&self, key: CacheKey, regions: Vec<Region>, lifetime: Duration) {
        let value = CacheValue {
            value: regions,
            deadline: unix_now().saturating_add(lifetime.as_secs()),
        };
        self.entries().insert(key.to_owned(), value.to_owned());
        self.persist(Change::Set(key, value));
    }

    /// 删除缓存
    pub fn remove(&self, key: &CacheKey) {
        if self.entries().remove(key).is_some() {
            self.persist(Change::Remove(key.to_owned()));
        }
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.entries().clear();
        self.persist(Change::Clear);
    }

    /// 获取缓存，缓存不存在或已经过期时调用 `f` 查询
    ///
    /// 对于同一个缓存键，同一时刻只有一个查询在进行，其他调用者等待并共享它的结果。
    /// `f` 返回区域列表和它的有效期，查询成功后写入缓存，查询失败不写入。
    pub fn get_or_resolve(
        &self,
        key: &CacheKey,
        f: impl FnOnce() -> ApiResult<(Vec<Region>, Duration)>,
    ) -> ApiResult<Vec<Region>> {
        if let Some(regions) = self.get(key) {
            return Ok(regions);
        }
        let inflight = self.inner.inflight.entry(key.to_owned()).or_default().to_owned();
        let mut is_leader = false;
        let result = inflight.get_or_init(|| {
            is_leader = true;
            if let Some(regions) = self.get(key) {
                return Ok(regions);
            }
            let (regions, lifetime) = f()?;
            self.set(key.to_owned(), regions.to_owned(), lifetime);
            Ok(regions)
        });
        if is_leader {
            self.inner
                .inflight
                .remove_if(key, |_, current| Arc::ptr_eq(current, &inflight));
        }
        match result {
            Ok(regions) => Ok(regions.to_owned()),
            Err(err) => Err(err.duplicate()),
        }
    }

    fn entries(&self) -> &DashMap<CacheKey, CacheValue> {
        self.inner.entries.get_or_init(|| {
            let entries = DashMap::new();
            if let Some(path) = self.persistent_path() {
                match load_from(path) {
                    Ok(loaded) => {
                        let now = unix_now();
                        for (key, value) in loaded.into_iter().filter(|(_, value)| value.is_fresh(now)) {
                            entries.insert(key, value);
                        }
                        info!("loaded {} regions cache entries from {}", entries.len(), path.display());
                    }
                    Err(err) if err.kind() == IoErrorKind::NotFound => {}
                    Err(err) => warn!("failed to load regions cache from {}: {}", path.display(), err),
                }
            }
            entries
        })
    }

    fn persist(&self, change: Change) {
        if let Some(path) = self.persistent_path() {
            if let Err(err) = merge_into(path, change) {
                warn!("failed to persist regions cache to {}: {}", path.display(), err);
            }
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Default for RegionsCache {
    #[inline]
    fn default() -> Self {
        Self::shared()
    }
}

/// 区域缓存构建器
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RegionsCacheBuilder {
    persistent_path: Option<PathBuf>,
}

impl RegionsCacheBuilder {
    /// 设置持久化文件路径，不设置则仅存储在内存中
    #[inline]
    pub fn persistent_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistent_path = Some(path.into());
        self
    }

    /// 构建区域缓存
    #[inline]
    pub fn build(self) -> RegionsCache {
        RegionsCache {
            inner: Arc::new(RegionsCacheInner {
                entries: OnceCell::new(),
                persistent_path: self.persistent_path,
                inflight: Default::default(),
            }),
        }
    }
}

fn load_from(path: &Path) -> IoResult<HashMap<CacheKey, CacheValue>> {
    let lock_file = open_lock_file(path)?;
    lock_file.lock_shared()?;
    let result = read_entries(path);
    lock_file.unlock()?;
    result
}

fn merge_into(path: &Path, change: Change) -> IoResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let lock_file = open_lock_file(path)?;
    lock_file.lock_exclusive()?;
    let result = rewrite(path, change);
    lock_file.unlock()?;
    result
}

fn rewrite(path: &Path, change: Change) -> IoResult<()> {
    let mut entries = match read_entries(path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == IoErrorKind::NotFound => HashMap::new(),
        Err(err) => {
            warn!("discard unreadable regions cache file {}: {}", path.display(), err);
            HashMap::new()
        }
    };
    let now = unix_now();
    entries.retain(|_, value| value.is_fresh(now));
    match change {
        Change::Set(key, value) => {
            entries.insert(key, value);
        }
        Change::Remove(key) => {
            entries.remove(&key);
        }
        Change::Clear => entries.clear(),
    }
    save_to(path, &entries)
}

fn read_entries(path: &Path) -> IoResult<HashMap<CacheKey, CacheValue>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn save_to(path: &Path, entries: &HashMap<CacheKey, CacheValue>) -> IoResult<()> {
    let tmp_path = sibling_path(path, &format!(".{}-{:08x}.tmp", process::id(), rand::random::<u32>()));
    let result = write_entries(&tmp_path, entries).and_then(|_| rename(&tmp_path, path));
    if result.is_err() {
        remove_file(&tmp_path).ok();
    }
    result
}

fn write_entries(path: &Path, entries: &HashMap<CacheKey, CacheValue>) -> IoResult<()> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, entries)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn open_lock_file(path: &Path) -> IoResult<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .open(sibling_path(path, ".lock"))
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = OsString::from(path.as_os_str());
    sibling.push(suffix);
    PathBuf::from(sibling)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
