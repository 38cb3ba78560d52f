use super::super::super::{X_LOG_HEADER_NAME, X_REQ_ID_HEADER_NAME};
use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use qiniu_http::{
    HeaderValue, ResponseError as HttpResponseError, ResponseErrorKind as HttpResponseErrorKind, ResponseParts,
    StatusCode,
};
use serde_json::Error as JsonError;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io::{Error as IoError, Read, Result as IoResult},
};

/// HTTP 响应错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// HTTP 客户端错误
    HttpError(HttpResponseErrorKind),

    /// 响应状态码错误
    StatusCodeError(StatusCode),

    /// 未预期的状态码（例如 0 - 199 或 300 - 399，理论上应该由 HttpCaller 自动处理）
    UnexpectedStatusCode(StatusCode),

    /// 解析响应体错误
    ParseResponseError,

    /// 响应体提前结束
    UnexpectedEof,

    /// 疑似响应被劫持
    MaliciousResponse,

    /// 系统调用失败
    SystemCallError,

    /// 没有尝试
    NoTry,
}

/// HTTP 响应错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
    x_headers: XHeaders,
    response_body_sample: Vec<u8>,
    retried: usize,
}

const RESPONSE_BODY_SAMPLE_LEN_LIMIT: u64 = 1024;

impl Error {
    /// 创建 HTTP 响应错误
    #[inline]
    pub fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Error {
            kind,
            error: err.into(),
            x_headers: Default::default(),
            response_body_sample: Default::default(),
            retried: 0,
        }
    }

    /// 创建 HTTP 响应错误
    #[inline]
    pub fn new_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self::new(kind, AnyError::msg(msg))
    }

    /// 设置 HTTP 响应信息
    #[inline]
    #[must_use]
    pub fn response_parts(mut self, response_parts: &ResponseParts) -> Self {
        self.x_headers = response_parts.into();
        self
    }

    /// 设置重试次数
    #[inline]
    #[must_use]
    pub fn retried(mut self, retried: usize) -> Self {
        self.retried = retried;
        self
    }

    /// 直接设置响应体样本
    #[inline]
    #[must_use]
    pub fn set_response_body_sample(mut self, mut body: Vec<u8>) -> Self {
        body.truncate(RESPONSE_BODY_SAMPLE_LEN_LIMIT as usize);
        self.response_body_sample = body;
        self
    }

    /// 设置响应体样本
    #[inline]
    pub fn read_response_body_sample<R: Read>(mut self, body: R) -> IoResult<Self> {
        body.take(RESPONSE_BODY_SAMPLE_LEN_LIMIT)
            .read_to_end(&mut self.response_body_sample)?;
        Ok(self)
    }

    /// 获取 HTTP 响应错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取响应状态码，仅对状态码错误有效
    #[inline]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self.kind {
            ErrorKind::StatusCodeError(status_code) | ErrorKind::UnexpectedStatusCode(status_code) => {
                Some(status_code)
            }
            _ => None,
        }
    }

    /// 获取响应体样本
    #[inline]
    pub fn response_body_sample(&self) -> &[u8] {
        &self.response_body_sample
    }

    /// 获取 HTTP 响应的 X-Log 信息
    #[inline]
    pub fn x_log(&self) -> Option<&HeaderValue> {
        self.x_headers.x_log.as_ref()
    }

    /// 获取 HTTP 响应的 X-ReqId 信息
    #[inline]
    pub fn x_reqid(&self) -> Option<&HeaderValue> {
        self.x_headers.x_reqid.as_ref()
    }

    /// 获取重试次数
    #[inline]
    pub fn retried_count(&self) -> usize {
        self.retried
    }

    /// 转换为内部错误
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    /// 使用相同的错误类型，响应头信息和错误信息创建一份新的错误
    ///
    /// 内部错误无法克隆，因此新错误只保留它的描述
    pub fn duplicate(&self) -> Self {
        Self {
            kind: self.kind,
            error: AnyError::msg(self.error.to_string()),
            x_headers: self.x_headers.to_owned(),
            response_body_sample: self.response_body_sample.to_owned(),
            retried: self.retried,
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

#[derive(Debug, Default, Clone)]
struct XHeaders {
    x_log: Option<HeaderValue>,
    x_reqid: Option<HeaderValue>,
}

impl From<&ResponseParts> for XHeaders {
    #[inline]
    fn from(parts: &ResponseParts) -> Self {
        Self {
            x_log: parts.header(X_LOG_HEADER_NAME).cloned(),
            x_reqid: parts.header(X_REQ_ID_HEADER_NAME).cloned(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if self.retried > 0 {
            write!(f, "[retried: {}]", self.retried)?;
        }
        if let Some(x_reqid) = self.x_headers.x_reqid.as_ref() {
            write!(f, "[{x_reqid:?}]")?;
        }
        if let Some(x_log) = self.x_headers.x_log.as_ref() {
            write!(f, "[{x_log:?}]")?;
        }
        write!(f, " {}", self.error)?;
        if !self.response_body_sample.is_empty() {
            write!(f, " [{}]", String::from_utf8_lossy(&self.response_body_sample))?;
        }
        Ok(())
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

impl From<HttpResponseError> for Error {
    #[inline]
    fn from(error: HttpResponseError) -> Self {
        Self::new(ErrorKind::HttpError(error.kind()), error)
    }
}

impl From<HttpResponseErrorKind> for ErrorKind {
    #[inline]
    fn from(kind: HttpResponseErrorKind) -> Self {
        ErrorKind::HttpError(kind)
    }
}

impl From<JsonError> for Error {
    #[inline]
    fn from(error: JsonError) -> Self {
        Self::new(ErrorKind::ParseResponseError, error)
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(error: IoError) -> Self {
        Self::new(ErrorKind::HttpError(HttpResponseErrorKind::LocalIoError), error)
    }
}
