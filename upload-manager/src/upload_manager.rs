use super::{
    multi_parts_uploader::{MultiPartsV1Uploader, MultiPartsV2Uploader, UploadTarget},
    scheduler::{ConcurrentMultiPartsUploaderScheduler, SchedulerOutcome},
    single_part_uploader::{FormUploader, SinglePartUploader},
    DataSource, FileDataSource, FileSystemResumableRecorder, MultiPartsVersion, ObjectParams, ResumablePolicy,
    ResumableRecorder, SeekableDataSource, UnseekableDataSource, UploadToken,
};
use assert_impl::assert_impl;
use log::{info, warn};
use qiniu_http_client::{
    is_error_host_retryable, ApiResult, Client, Region, RegionGroup, RegionResolver, ResponseError,
    ResponseErrorKind, UplogEvent, UploadEvent,
};
use serde_json::Value;
use std::{
    io::{Cursor, Read},
    path::Path,
    sync::Arc,
    time::Instant,
};

/// 上传管理器
///
/// 根据数据大小选择表单上传或分片上传，并在多个区域之间依次重试。
/// 克隆的上传管理器共享同一个客户端和断点恢复记录器
#[derive(Debug, Clone)]
pub struct UploadManager(Arc<UploadManagerInner>);

#[derive(Debug)]
struct UploadManagerInner {
    client: Client,
    regions: Regions,
    recorder: Arc<dyn ResumableRecorder>,
    policy: ResumablePolicy,
}

#[derive(Debug)]
enum Regions {
    Resolver(RegionResolver),
    Static(Vec<Region>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadMethod {
    Form,
    MultiParts(MultiPartsVersion),
}

impl UploadMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::MultiParts(version) => version.as_str(),
        }
    }
}

impl UploadManager {
    /// 创建上传管理器构建器
    #[inline]
    pub fn builder(client: Client) -> UploadManagerBuilder {
        UploadManagerBuilder {
            client,
            resolver: None,
            regions: Vec::new(),
            recorder: None,
            policy: Default::default(),
        }
    }

    /// 获取 HTTP 客户端
    #[inline]
    pub fn client(&self) -> &Client {
        &self.0.client
    }

    /// 获取可恢复策略
    #[inline]
    pub fn resumable_policy(&self) -> &ResumablePolicy {
        &self.0.policy
    }

    /// 上传本地文件
    ///
    /// 分片上传时会写入断点恢复记录，上传失败后再次上传同一个文件可以跳过已经上传的分片
    pub fn upload_path(&self, path: impl AsRef<Path>, token: &UploadToken, params: ObjectParams) -> ApiResult<Value> {
        self.upload(&FileDataSource::open(path)?, token, params)
    }

    /// 上传输入流
    ///
    /// 输入流大小未知，总是使用分片上传，并且无法切换区域重新上传
    pub fn upload_reader<R: Read + Send>(
        &self,
        reader: R,
        token: &UploadToken,
        params: ObjectParams,
    ) -> ApiResult<Value> {
        self.upload(&UnseekableDataSource::new(reader), token, params)
    }

    /// 上传内存数据
    pub fn upload_bytes(
        &self,
        data: impl Into<Vec<u8>>,
        token: &UploadToken,
        params: ObjectParams,
    ) -> ApiResult<Value> {
        self.upload(&SeekableDataSource::new(Cursor::new(data.into()))?, token, params)
    }

    /// 上传数据源
    ///
    /// 大小已知且小于阈值的数据源使用表单上传，其他数据源按照可恢复策略使用 V1 或 V2 分片上传。
    /// 如果当前区域的上传失败可以通过切换区域解决，将重置数据源并在下一个区域重新上传
    pub fn upload(&self, source: &dyn DataSource, token: &UploadToken, params: ObjectParams) -> ApiResult<Value> {
        let started_at = Instant::now();
        let size = source.total_size()?;
        let method = self.choose_method(size);
        let regions = self.region_group(token)?;
        let mut region_id = None;
        let mut recovered_chunks = 0;
        let result = loop {
            let region = match regions.current() {
                Some(region) => region,
                None => {
                    break Err(ResponseError::new_with_msg(
                        ResponseErrorKind::NoTry,
                        "no region is available for uploading",
                    ))
                }
            };
            region_id = Some(region.region_id().to_owned());
            let target = UploadTarget {
                client: &self.0.client,
                region: &region,
                token,
                params: &params,
            };
            let outcome = self.upload_to_region(method, target, source);
            recovered_chunks = outcome.recovered_parts;
            match outcome.result {
                Err(err) if is_region_retryable(&err) && regions.advance() => {
                    if let Err(reset_err) = source.reset() {
                        warn!("Data source can not be reset for uploading in the next region: {reset_err}");
                        break Err(err);
                    }
                    info!(
                        "Failed to upload to region {}, retry in the next region: {err}",
                        region.region_id()
                    );
                }
                result => break result,
            }
        };
        self.0.client.uplog_sink().emit(UplogEvent::Upload(UploadEvent {
            method: method.as_str().to_owned(),
            region_id,
            size,
            recovered_chunks,
            error: result.as_ref().err().map(ToString::to_string),
            elapsed_ms: u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        }));
        result
    }

    fn choose_method(&self, size: Option<u64>) -> UploadMethod {
        match size {
            Some(size) if size < self.0.policy.threshold() => UploadMethod::Form,
            _ => UploadMethod::MultiParts(self.0.policy.version()),
        }
    }

    fn region_group(&self, token: &UploadToken) -> ApiResult<RegionGroup> {
        match &self.0.regions {
            Regions::Resolver(resolver) => resolver.resolve(token.access_key(), token.bucket()),
            Regions::Static(regions) => Ok(RegionGroup::new(regions.to_owned())),
        }
    }

    fn upload_to_region(
        &self,
        method: UploadMethod,
        target: UploadTarget<'_>,
        source: &dyn DataSource,
    ) -> SchedulerOutcome {
        let recorder = self.0.recorder.as_ref();
        let policy = &self.0.policy;
        match method {
            UploadMethod::Form => SchedulerOutcome {
                result: FormUploader.upload(&target, source),
                recovered_parts: 0,
            },
            UploadMethod::MultiParts(MultiPartsVersion::V1) => ConcurrentMultiPartsUploaderScheduler::new(
                MultiPartsV1Uploader::new(policy.v1_chunk_size()),
                target,
                recorder,
                policy,
            )
            .upload(source),
            UploadMethod::MultiParts(MultiPartsVersion::V2) => {
                ConcurrentMultiPartsUploaderScheduler::new(MultiPartsV2Uploader, target, recorder, policy)
                    .upload(source)
            }
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// 切换区域能否解决该错误
///
/// 主机都不可用时请求不会被发出，这种情况也应该尝试下一个区域
fn is_region_retryable(err: &ResponseError) -> bool {
    is_error_host_retryable(err) || err.kind() == ResponseErrorKind::NoTry
}

/// 上传管理器构建器
#[must_use]
#[derive(Debug)]
pub struct UploadManagerBuilder {
    client: Client,
    resolver: Option<RegionResolver>,
    regions: Vec<Region>,
    recorder: Option<Arc<dyn ResumableRecorder>>,
    policy: ResumablePolicy,
}

impl UploadManagerBuilder {
    /// 添加固定的上传区域，按照添加顺序依次尝试
    ///
    /// 设置了固定区域后将不再查询区域
    #[inline]
    pub fn region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    /// 设置区域查询器
    ///
    /// 默认使用上传管理器的客户端创建区域查询器
    #[inline]
    pub fn region_resolver(mut self, resolver: RegionResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 设置断点恢复记录器
    ///
    /// 默认为 [`FileSystemResumableRecorder`]
    #[inline]
    pub fn resumable_recorder(mut self, recorder: impl ResumableRecorder + 'static) -> Self {
        self.recorder = Some(Arc::new(recorder));
        self
    }

    /// 设置可恢复策略
    #[inline]
    pub fn resumable_policy(mut self, policy: ResumablePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 构建上传管理器
    pub fn build(self) -> UploadManager {
        let regions = if self.regions.is_empty() {
            Regions::Resolver(
                self.resolver
                    .unwrap_or_else(|| RegionResolver::builder(self.client.to_owned()).build()),
            )
        } else {
            Regions::Static(self.regions)
        };
        UploadManager(Arc::new(UploadManagerInner {
            client: self.client,
            regions,
            recorder: self
                .recorder
                .unwrap_or_else(|| Arc::new(FileSystemResumableRecorder::default())),
            policy: self.policy,
        }))
    }
}
