use super::error::Error as ResponseError;
use assert_impl::assert_impl;
use http::{
    header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue},
    Extensions, StatusCode, Version,
};
use std::{
    fmt::{self, Debug},
    io::{copy, sink, Cursor, Read, Result as IoResult},
    mem::take,
    net::IpAddr,
    ops::{Deref, DerefMut},
};

enum ResponseBodyInner {
    Reader(Box<dyn Read + Send + Sync>),
    Bytes(Cursor<Vec<u8>>),
}

/// HTTP 响应体
pub struct ResponseBody(ResponseBodyInner);

impl ResponseBody {
    /// 通过输入流创建 HTTP 响应体
    #[inline]
    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        Self(ResponseBodyInner::Reader(Box::new(reader)))
    }

    /// 通过二进制数据创建 HTTP 响应体
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(ResponseBodyInner::Bytes(Cursor::new(bytes.into())))
    }

    /// 响应体是否已经被读入内存
    #[inline]
    pub fn is_buffered(&self) -> bool {
        matches!(&self.0, ResponseBodyInner::Bytes(_))
    }

    /// 将输入流中剩余的数据全部读入内存
    pub fn buffer(&mut self) -> IoResult<()> {
        if let ResponseBodyInner::Reader(reader) = &mut self.0 {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            self.0 = ResponseBodyInner::Bytes(Cursor::new(buf));
        }
        Ok(())
    }

    /// 丢弃响应体中剩余的数据
    #[inline]
    pub fn drain(&mut self) -> IoResult<u64> {
        copy(self, &mut sink())
    }

    /// 如果响应体已经被读入内存，返回全部内存数据
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.0 {
            ResponseBodyInner::Bytes(bytes) => Some(bytes.get_ref()),
            ResponseBodyInner::Reader(_) => None,
        }
    }

    /// 读取剩余的全部数据
    #[inline]
    pub fn read_all(&mut self) -> IoResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Default for ResponseBody {
    #[inline]
    fn default() -> Self {
        Self::from_bytes(Vec::new())
    }
}

impl Read for ResponseBody {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.0 {
            ResponseBodyInner::Reader(reader) => reader.read(buf),
            ResponseBodyInner::Bytes(bytes) => bytes.read(buf),
        }
    }
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ResponseBodyInner::Reader(_) => f.debug_tuple("Reader").finish(),
            ResponseBodyInner::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.get_ref().len()).finish(),
        }
    }
}

/// HTTP 响应信息
///
/// 不包含响应体信息
#[derive(Debug, Default)]
pub struct ResponseParts {
    status_code: StatusCode,
    version: Version,
    headers: HeaderMap,
    server_ip: Option<IpAddr>,
    extensions: Extensions,
}

impl ResponseParts {
    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// 获取 HTTP 版本
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// 获取 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取 HTTP Header 值
    #[inline]
    pub fn header(&self, name: impl AsHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// 获取服务器 IP 地址
    #[inline]
    pub fn server_ip(&self) -> Option<IpAddr> {
        self.server_ip
    }

    /// 获取扩展信息
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// 获取扩展信息的可变引用
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// HTTP 响应
#[derive(Debug, Default)]
pub struct Response {
    parts: ResponseParts,
    body: ResponseBody,
}

impl Response {
    /// 创建 HTTP 响应构建器
    #[inline]
    pub fn builder() -> ResponseBuilder {
        Default::default()
    }

    /// 获取 HTTP 响应体
    #[inline]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// 获取 HTTP 响应体的可变引用
    #[inline]
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// 取走 HTTP 响应体
    #[inline]
    pub fn take_body(&mut self) -> ResponseBody {
        take(&mut self.body)
    }

    /// 转换为 HTTP 响应体
    #[inline]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// 转换为 HTTP 响应信息和响应体
    #[inline]
    pub fn into_parts_and_body(self) -> (ResponseParts, ResponseBody) {
        (self.parts, self.body)
    }

    /// 通过 HTTP 响应信息和响应体创建 HTTP 响应
    #[inline]
    pub fn from_parts_and_body(parts: ResponseParts, body: ResponseBody) -> Self {
        Self { parts, body }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Deref for Response {
    type Target = ResponseParts;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}

impl DerefMut for Response {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parts
    }
}

/// HTTP 响应构建器
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// 设置 HTTP 状态码
    #[inline]
    #[must_use]
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.inner.parts.status_code = status_code;
        self
    }

    /// 设置 HTTP 版本
    #[inline]
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.inner.parts.version = version;
        self
    }

    /// 添加 HTTP Header
    #[inline]
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner.parts.headers.insert(name, value);
        self
    }

    /// 设置 HTTP Headers
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.inner.parts.headers = headers;
        self
    }

    /// 设置服务器 IP 地址
    #[inline]
    #[must_use]
    pub fn server_ip(mut self, server_ip: IpAddr) -> Self {
        self.inner.parts.server_ip = Some(server_ip);
        self
    }

    /// 设置扩展信息
    #[inline]
    #[must_use]
    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.inner.parts.extensions = extensions;
        self
    }

    /// 设置 HTTP 响应体
    #[inline]
    #[must_use]
    pub fn body(mut self, body: ResponseBody) -> Self {
        self.inner.body = body;
        self
    }

    /// 构建 HTTP 响应
    #[inline]
    pub fn build(self) -> Response {
        self.inner
    }
}

/// HTTP 响应结果
pub type ResponseResult = Result<Response, ResponseError>;
