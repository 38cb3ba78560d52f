use super::{Endpoints, EndpointsBuilder, ServiceName};
use assert_impl::assert_impl;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 七牛存储区域
///
/// 提供七牛不同服务的终端地址列表，一旦构建就不可修改
///
/// ```
/// use qiniu_http_client::Region;
///
/// let region = Region::builder("z0")
///     .add_uc_preferred_endpoint("uc.qbox.me")
///     .add_up_preferred_endpoint("upload.qiniup.com")
///     .add_up_preferred_endpoint("up.qiniup.com")
///     .add_up_alternative_endpoint("up.qbox.me")
///     .add_rs_preferred_endpoint("rs.qbox.me")
///     .add_rsf_preferred_endpoint("rsf.qbox.me")
///     .add_api_preferred_endpoint("api.qiniu.com")
///     .build();
/// assert_eq!(region.up().preferred().len(), 2);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region {
    inner: Arc<RegionInner>,
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize)]
struct RegionInner {
    region_id: Box<str>,
    #[serde(default)]
    s3_region_id: Box<str>,
    #[serde(default)]
    up: Endpoints,
    #[serde(default)]
    io: Endpoints,
    #[serde(default)]
    uc: Endpoints,
    #[serde(default)]
    rs: Endpoints,
    #[serde(default)]
    rsf: Endpoints,
    #[serde(default)]
    api: Endpoints,
    #[serde(default)]
    s3: Endpoints,
}

impl Region {
    /// 创建区域构建器
    #[inline]
    pub fn builder(region_id: impl Into<String>) -> RegionBuilder {
        RegionBuilder {
            region_id: region_id.into(),
            s3_region_id: None,
            up: Default::default(),
            io: Default::default(),
            uc: Default::default(),
            rs: Default::default(),
            rsf: Default::default(),
            api: Default::default(),
            s3: Default::default(),
        }
    }

    /// 获取区域 ID
    #[inline]
    pub fn region_id(&self) -> &str {
        &self.inner.region_id
    }

    /// 获取 S3 区域 ID
    #[inline]
    pub fn s3_region_id(&self) -> &str {
        &self.inner.s3_region_id
    }

    /// 获取上传服务终端列表
    #[inline]
    pub fn up(&self) -> &Endpoints {
        &self.inner.up
    }

    /// 获取下载服务终端列表
    #[inline]
    pub fn io(&self) -> &Endpoints {
        &self.inner.io
    }

    /// 获取存储空间管理服务终端列表
    #[inline]
    pub fn uc(&self) -> &Endpoints {
        &self.inner.uc
    }

    /// 获取元数据管理服务终端列表
    #[inline]
    pub fn rs(&self) -> &Endpoints {
        &self.inner.rs
    }

    /// 获取元数据列举服务终端列表
    #[inline]
    pub fn rsf(&self) -> &Endpoints {
        &self.inner.rsf
    }

    /// 获取 API 入口服务终端列表
    #[inline]
    pub fn api(&self) -> &Endpoints {
        &self.inner.api
    }

    /// 获取 S3 入口服务终端列表
    #[inline]
    pub fn s3(&self) -> &Endpoints {
        &self.inner.s3
    }

    /// 根据服务名称获取终端列表
    pub fn endpoints(&self, service_name: ServiceName) -> &Endpoints {
        match service_name {
            ServiceName::Up => self.up(),
            ServiceName::Io => self.io(),
            ServiceName::Uc => self.uc(),
            ServiceName::Rs => self.rs(),
            ServiceName::Rsf => self.rsf(),
            ServiceName::Api => self.api(),
            ServiceName::S3 => self.s3(),
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// 区域构建器
#[derive(Debug)]
#[must_use]
pub struct RegionBuilder {
    region_id: String,
    s3_region_id: Option<String>,
    up: EndpointsBuilder,
    io: EndpointsBuilder,
    uc: EndpointsBuilder,
    rs: EndpointsBuilder,
    rsf: EndpointsBuilder,
    api: EndpointsBuilder,
    s3: EndpointsBuilder,
}

macro_rules! impl_add_endpoint {
    ($service:ident, $add_preferred:ident, $add_alternative:ident, $doc:literal) => {
        #[doc = concat!("添加", $doc, "主要终端地址")]
        #[inline]
        pub fn $add_preferred(mut self, host: impl Into<String>) -> Self {
            self.$service = self.$service.add_preferred(host);
            self
        }

        #[doc = concat!("添加", $doc, "备选终端地址")]
        #[inline]
        pub fn $add_alternative(mut self, host: impl Into<String>) -> Self {
            self.$service = self.$service.add_alternative(host);
            self
        }
    };
}

impl RegionBuilder {
    /// 设置 S3 区域 ID，默认与区域 ID 相同
    #[inline]
    pub fn s3_region_id(mut self, s3_region_id: impl Into<String>) -> Self {
        self.s3_region_id = Some(s3_region_id.into());
        self
    }

    impl_add_endpoint!(up, add_up_preferred_endpoint, add_up_alternative_endpoint, "上传服务");
    impl_add_endpoint!(io, add_io_preferred_endpoint, add_io_alternative_endpoint, "下载服务");
    impl_add_endpoint!(uc, add_uc_preferred_endpoint, add_uc_alternative_endpoint, "存储空间管理服务");
    impl_add_endpoint!(rs, add_rs_preferred_endpoint, add_rs_alternative_endpoint, "元数据管理服务");
    impl_add_endpoint!(rsf, add_rsf_preferred_endpoint, add_rsf_alternative_endpoint, "元数据列举服务");
    impl_add_endpoint!(api, add_api_preferred_endpoint, add_api_alternative_endpoint, "API 入口服务");
    impl_add_endpoint!(s3, add_s3_preferred_endpoint, add_s3_alternative_endpoint, "S3 入口服务");

    /// 构建区域
    pub fn build(self) -> Region {
        let s3_region_id = self.s3_region_id.unwrap_or_else(|| self.region_id.to_owned());
        Region {
            inner: Arc::new(RegionInner {
                region_id: self.region_id.into(),
                s3_region_id: s3_region_id.into(),
                up: self.up.build(),
                io: self.io.build(),
                uc: self.uc.build(),
                rs: self.rs.build(),
                rsf: self.rsf.build(),
                api: self.api.build(),
                s3: self.s3.build(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_serde() -> anyhow::Result<()> {
        let region = Region::builder("z1")
            .s3_region_id("cn-north-1")
            .add_up_preferred_endpoint("upload-z1.qiniup.com")
            .add_up_alternative_endpoint("up-z1.qbox.me")
            .add_io_preferred_endpoint("iovip-z1.qbox.me")
            .build();
        assert_eq!(region.s3_region_id(), "cn-north-1");
        assert_eq!(
            region.endpoints(ServiceName::Up).hosts().collect::<Vec<_>>(),
            ["upload-z1.qiniup.com", "up-z1.qbox.me"]
        );
        assert!(region.rs().is_empty());

        let json = serde_json::to_string(&region)?;
        assert_eq!(serde_json::from_str::<Region>(&json)?, region);
        Ok(())
    }
}
