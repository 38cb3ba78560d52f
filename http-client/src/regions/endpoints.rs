use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
};

/// 终端地址列表
///
/// 存储一个七牛服务的多个主机地址，包含主要地址列表和备选地址列表。
/// 主机地址可以是 `host`，`host:port` 或者带有协议的 `scheme://host:port`
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    preferred: Arc<[String]>,
    alternative: Arc<[String]>,
}

impl Endpoints {
    /// 创建终端地址列表构建器
    #[inline]
    pub fn builder() -> EndpointsBuilder {
        Default::default()
    }

    /// 创建只包含主要地址的终端地址列表
    #[inline]
    pub fn new(preferred: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            preferred: preferred.into_iter().map(Into::into).collect(),
            alternative: Arc::new([]),
        }
    }

    /// 返回主要终端地址列表
    #[inline]
    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    /// 返回备选终端地址列表
    #[inline]
    pub fn alternative(&self) -> &[String] {
        &self.alternative
    }

    /// 按照先主要后备选的顺序返回所有地址
    #[inline]
    pub fn hosts(&self) -> impl Iterator<Item = &str> + '_ {
        self.preferred
            .iter()
            .chain(self.alternative.iter())
            .map(String::as_str)
    }

    /// 是否没有任何地址
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.preferred.is_empty() && self.alternative.is_empty()
    }
}

impl Default for Endpoints {
    #[inline]
    fn default() -> Self {
        Self {
            preferred: Arc::new([]),
            alternative: Arc::new([]),
        }
    }
}

/// 终端地址列表构建器
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct EndpointsBuilder {
    preferred: Vec<String>,
    alternative: Vec<String>,
}

impl EndpointsBuilder {
    /// 添加主要地址
    #[inline]
    pub fn add_preferred(mut self, host: impl Into<String>) -> Self {
        self.preferred.push(host.into());
        self
    }

    /// 添加备选地址
    #[inline]
    pub fn add_alternative(mut self, host: impl Into<String>) -> Self {
        self.alternative.push(host.into());
        self
    }

    /// 构建终端地址列表
    #[inline]
    pub fn build(self) -> Endpoints {
        Endpoints {
            preferred: self.preferred.into(),
            alternative: self.alternative.into(),
        }
    }
}

/// 七牛服务名称
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ServiceName {
    /// 上传服务
    Up,

    /// 下载服务
    Io,

    /// 存储空间管理服务
    Uc,

    /// 元数据管理服务
    Rs,

    /// 元数据列举服务
    Rsf,

    /// API 入口服务
    Api,

    /// S3 入口服务
    S3,
}

impl ServiceName {
    fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Io => "io",
            Self::Uc => "uc",
            Self::Rs => "rs",
            Self::Rsf => "rsf",
            Self::Api => "api",
            Self::S3 => "s3",
        }
    }
}

impl Display for ServiceName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 非法的服务名称
#[derive(Debug, Clone)]
pub struct InvalidServiceName(Box<str>);

impl FromStr for ServiceName {
    type Err = InvalidServiceName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "io" => Ok(Self::Io),
            "uc" => Ok(Self::Uc),
            "rs" => Ok(Self::Rs),
            "rsf" => Ok(Self::Rsf),
            "api" => Ok(Self::Api),
            "s3" => Ok(Self::S3),
            service_name => Err(InvalidServiceName(service_name.into())),
        }
    }
}

impl Display for InvalidServiceName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid service name: {}", self.0)
    }
}

impl Error for InvalidServiceName {}
