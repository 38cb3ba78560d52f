use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io::{Error as IoError, ErrorKind as IoErrorKind},
};
use url::Url;

/// HTTP 响应错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 非法的请求 / 响应错误
    InvalidRequestResponse,

    /// 非法的 URL
    InvalidUrl,

    /// 非法的 HTTP 头
    InvalidHeader,

    /// 网络连接失败
    ConnectError,

    /// 代理连接失败
    ProxyError,

    /// DNS 服务器连接失败
    DnsServerError,

    /// 域名解析失败
    UnknownHostError,

    /// 发送失败
    SendError,

    /// 接受失败
    ReceiveError,

    /// 本地 IO 失败
    LocalIoError,

    /// 超时失败
    TimeoutError,

    /// SSL 错误
    SslError,

    /// 重定向次数过多
    TooManyRedirect,

    /// 用户取消
    UserCanceled,

    /// 未知错误
    UnknownError,
}

/// HTTP 响应错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
    url: Option<Url>,
}

impl Error {
    /// 创建 HTTP 响应错误
    #[inline]
    pub fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Self {
            kind,
            error: err.into(),
            url: None,
        }
    }

    /// 创建 HTTP 响应错误
    #[inline]
    pub fn new_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self::new(kind, AnyError::msg(msg))
    }

    /// 设置出错的 URL
    #[inline]
    #[must_use]
    pub fn url(mut self, url: &Url) -> Self {
        self.url = Some(url.to_owned());
        self
    }

    /// 获取 HTTP 响应错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取出错的 URL
    #[inline]
    pub fn url_ref(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// 转换为内部错误
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(url) = self.url.as_ref() {
            write!(f, "[{url}]")?;
        }
        write!(f, " {}", self.error)
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        let kind = match err.kind() {
            IoErrorKind::TimedOut | IoErrorKind::WouldBlock => ErrorKind::TimeoutError,
            IoErrorKind::ConnectionRefused | IoErrorKind::NotConnected => ErrorKind::ConnectError,
            IoErrorKind::ConnectionReset | IoErrorKind::ConnectionAborted | IoErrorKind::BrokenPipe => {
                ErrorKind::SendError
            }
            IoErrorKind::UnexpectedEof => ErrorKind::ReceiveError,
            IoErrorKind::Interrupted => ErrorKind::UserCanceled,
            _ => ErrorKind::LocalIoError,
        };
        Self::new(kind, err)
    }
}
