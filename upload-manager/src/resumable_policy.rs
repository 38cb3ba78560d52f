use std::fmt;

const MIB: u64 = 1 << 20;

/// V1 分片上传的块大小，固定为 4 MiB
pub const V1_BLOCK_SIZE: u64 = 4 * MIB;

/// 分片上传协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum MultiPartsVersion {
    /// 基于块的分片上传，每个块固定为 4 MiB，块内可以再切分为多个片
    V1,

    /// 基于分片的分片上传，分片大小可以配置
    #[default]
    V2,
}

impl MultiPartsVersion {
    /// 获取版本名称
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for MultiPartsVersion {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可恢复上传策略
///
/// 决定何时使用表单上传，何时使用分片上传，以及分片上传的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumablePolicy {
    threshold: u64,
    version: MultiPartsVersion,
    part_size: u64,
    v1_chunk_size: u64,
    concurrency: usize,
}

impl Default for ResumablePolicy {
    #[inline]
    fn default() -> Self {
        Self {
            threshold: 4 * MIB,
            version: Default::default(),
            part_size: 4 * MIB,
            v1_chunk_size: V1_BLOCK_SIZE,
            concurrency: 3,
        }
    }
}

impl ResumablePolicy {
    /// 创建可恢复上传策略构建器
    #[inline]
    pub fn builder() -> ResumablePolicyBuilder {
        ResumablePolicyBuilder(Default::default())
    }

    /// 获取表单上传的阈值
    ///
    /// 大小已知且小于阈值的数据使用表单上传
    #[inline]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// 获取分片上传协议版本
    #[inline]
    pub fn version(&self) -> MultiPartsVersion {
        self.version
    }

    /// 获取 V2 分片上传的分片大小
    #[inline]
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// 获取 V1 分片上传中，每个块切分出的片的大小
    #[inline]
    pub fn v1_chunk_size(&self) -> u64 {
        self.v1_chunk_size
    }

    /// 获取并发上传的线程数
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 获取数据源的切分大小
    ///
    /// V1 总是按块切分，V2 按分片大小切分
    #[inline]
    pub(crate) fn slice_size(&self, version: MultiPartsVersion) -> u64 {
        match version {
            MultiPartsVersion::V1 => V1_BLOCK_SIZE,
            MultiPartsVersion::V2 => self.part_size,
        }
    }
}

/// 可恢复上传策略构建器
#[must_use]
#[derive(Debug, Clone)]
pub struct ResumablePolicyBuilder(ResumablePolicy);

impl ResumablePolicyBuilder {
    /// 设置表单上传的阈值
    #[inline]
    pub fn threshold(mut self, threshold: u64) -> Self {
        self.0.threshold = threshold;
        self
    }

    /// 设置分片上传协议版本
    #[inline]
    pub fn version(mut self, version: MultiPartsVersion) -> Self {
        self.0.version = version;
        self
    }

    /// 设置 V2 分片上传的分片大小
    #[inline]
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.0.part_size = part_size.max(1);
        self
    }

    /// 设置 V1 分片上传中，每个块切分出的片的大小，不能超过块大小
    #[inline]
    pub fn v1_chunk_size(mut self, v1_chunk_size: u64) -> Self {
        self.0.v1_chunk_size = v1_chunk_size.clamp(1, V1_BLOCK_SIZE);
        self
    }

    /// 设置并发上传的线程数
    #[inline]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.0.concurrency = concurrency.max(1);
        self
    }

    /// 构建可恢复上传策略
    #[inline]
    pub fn build(self) -> ResumablePolicy {
        self.0
    }
}
