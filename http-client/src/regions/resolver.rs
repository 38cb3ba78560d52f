use super::{
    super::{ApiResult, Client, ResponseError, ResponseErrorKind},
    structs::{V2ResponseBody, V4ResponseBody},
    CacheKey, Region, RegionGroup, RegionsCache,
};
use log::info;
use qiniu_http::Method;
use std::{sync::Arc, time::Duration};

const DEFAULT_UC_HOSTS: &[&str] = &["uc.qiniuapi.com", "kodo-config.qiniuapi.com"];

/// 区域查询接口版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QueryVersion {
    /// `/v2/query`，总是返回单个区域
    V2,

    /// `/v4/query`，返回按优先级排列的多个区域
    #[default]
    V4,
}

impl QueryVersion {
    fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V4 => "v4",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::V2 => "/v2/query",
            Self::V4 => "/v4/query",
        }
    }
}

/// 区域查询器
///
/// 通过 AccessKey 和存储空间名称查询存储空间所在的区域，
/// 查询结果按照服务器返回的有效期缓存，并发的相同查询只会实际发出一次请求。
///
/// ```no_run
/// use qiniu_http_client::{RegionResolver, RegionsCache};
///
/// # fn main() -> anyhow::Result<()> {
/// let resolver = RegionResolver::builder(Default::default())
///     .cache(RegionsCache::in_memory())
///     .build();
/// let group = resolver.resolve("access-key", "bucket")?;
/// for region in group.regions() {
///     println!("{}", region.region_id());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegionResolver {
    client: Client,
    uc_hosts: Arc<[String]>,
    cache: RegionsCache,
    version: QueryVersion,
    accelerate_uploading: bool,
}

impl RegionResolver {
    /// 创建区域查询器构建器
    #[inline]
    pub fn builder(client: Client) -> RegionResolverBuilder {
        RegionResolverBuilder {
            client,
            uc_hosts: DEFAULT_UC_HOSTS.iter().map(|host| host.to_string()).collect(),
            cache: None,
            version: Default::default(),
            accelerate_uploading: false,
        }
    }

    /// 查询存储空间所在的区域
    ///
    /// 使用 V2 接口时区域组只有一个区域
    pub fn resolve(&self, access_key: &str, bucket: &str) -> ApiResult<RegionGroup> {
        let key = CacheKey::new(
            self.uc_hosts.iter().map(String::as_str),
            self.version.as_str(),
            self.accelerate_uploading,
            access_key,
            bucket,
        );
        let regions = self.cache.get_or_resolve(&key, || self.query(access_key, bucket))?;
        Ok(RegionGroup::new(regions))
    }

    /// 获取区域缓存
    #[inline]
    pub fn cache(&self) -> &RegionsCache {
        &self.cache
    }

    fn query(&self, access_key: &str, bucket: &str) -> ApiResult<(Vec<Region>, Duration)> {
        let response = self
            .client
            .request(Method::GET, self.client.host_provider(self.uc_hosts.iter().cloned()))
            .path(self.version.path())
            .query_pair("ak", access_key)
            .query_pair("bucket", bucket)
            .buffer_response()
            .call()?;
        let (regions, lifetime) = match self.version {
            QueryVersion::V4 => response.parse_json::<V4ResponseBody>()?.into_regions(),
            QueryVersion::V2 => {
                let (region, lifetime) = response
                    .parse_json::<V2ResponseBody>()?
                    .into_region(self.accelerate_uploading);
                (vec![region], lifetime)
            }
        };
        if regions.is_empty() {
            return Err(ResponseError::new_with_msg(
                ResponseErrorKind::ParseResponseError,
                format!("no region is found for bucket {bucket}"),
            ));
        }
        info!(
            "resolved regions [{}] for bucket {}, cached for {:?}",
            regions.iter().map(Region::region_id).collect::<Vec<_>>().join(", "),
            bucket,
            lifetime
        );
        Ok((regions, lifetime))
    }
}

/// 区域查询器构建器
#[derive(Debug)]
#[must_use]
pub struct RegionResolverBuilder {
    client: Client,
    uc_hosts: Vec<String>,
    cache: Option<RegionsCache>,
    version: QueryVersion,
    accelerate_uploading: bool,
}

impl RegionResolverBuilder {
    /// 设置 UC 服务主机列表
    #[inline]
    pub fn uc_hosts(mut self, uc_hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.uc_hosts = uc_hosts.into_iter().map(Into::into).collect();
        self
    }

    /// 设置区域缓存，默认使用进程内共享的 [`RegionsCache::shared`]
    #[inline]
    pub fn cache(mut self, cache: RegionsCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 设置查询接口版本，默认为 V4
    #[inline]
    pub fn version(mut self, version: QueryVersion) -> Self {
        self.version = version;
        self
    }

    /// 设置是否使用加速上传域名，仅对 V2 接口有效
    #[inline]
    pub fn accelerate_uploading(mut self, accelerate_uploading: bool) -> Self {
        self.accelerate_uploading = accelerate_uploading;
        self
    }

    /// 构建区域查询器
    pub fn build(self) -> RegionResolver {
        RegionResolver {
            client: self.client,
            uc_hosts: self.uc_hosts.into(),
            cache: self.cache.unwrap_or_default(),
            version: self.version,
            accelerate_uploading: self.accelerate_uploading,
        }
    }
}
