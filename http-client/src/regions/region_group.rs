use super::Region;
use assert_impl::assert_impl;
use std::sync::{Arc, Mutex, MutexGuard};

/// 区域组
///
/// 按优先级排列的候选区域，以及一个只能向前移动的游标。
/// 用于在一次逻辑操作中依次尝试多个区域。
/// 克隆得到的区域组共享区域列表，但拥有独立的游标，初始位置与原游标相同。
#[derive(Debug)]
pub struct RegionGroup {
    regions: Arc<[Region]>,
    cursor: Mutex<usize>,
}

impl RegionGroup {
    /// 创建区域组
    #[inline]
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        Self {
            regions: regions.into_iter().collect(),
            cursor: Mutex::new(0),
        }
    }

    /// 获取游标指向的区域，区域组为空时返回 [`None`]
    pub fn current(&self) -> Option<Region> {
        let cursor = *self.lock_cursor();
        self.regions.get(cursor).cloned()
    }

    /// 将游标移动到下一个区域
    ///
    /// 已经是最后一个区域时游标保持不动，返回 `false`
    pub fn advance(&self) -> bool {
        let mut cursor = self.lock_cursor();
        if *cursor + 1 < self.regions.len() {
            *cursor += 1;
            true
        } else {
            false
        }
    }

    /// 获取全部区域
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// 获取区域数量
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// 区域组是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn lock_cursor(&self) -> MutexGuard<'_, usize> {
        // 游标只是一个整数，持锁线程 panic 也不会破坏它
        self.cursor.lock().unwrap_or_else(|err| err.into_inner())
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Clone for RegionGroup {
    fn clone(&self) -> Self {
        Self {
            regions: self.regions.to_owned(),
            cursor: Mutex::new(*self.lock_cursor()),
        }
    }
}

impl From<Region> for RegionGroup {
    #[inline]
    fn from(region: Region) -> Self {
        Self::new([region])
    }
}

impl From<Vec<Region>> for RegionGroup {
    #[inline]
    fn from(regions: Vec<Region>) -> Self {
        Self::new(regions)
    }
}
