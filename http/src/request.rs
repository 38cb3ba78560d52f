use super::context::Context;
use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Extensions, Method, Version,
};
use once_cell::sync::Lazy;
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Result as IoResult, Seek, SeekFrom},
    ops::{Deref, DerefMut},
};
use url::Url;

static FULL_USER_AGENT: Lazy<String> = Lazy::new(|| {
    format!(
        "QiniuRust/qiniu-http-{}/rust-{}",
        env!("CARGO_PKG_VERSION"),
        env!("RUSTC_VERSION"),
    )
});

/// 数据重置器
///
/// 请求体只有能够被重置，才能在重试时重新发送
pub trait Reset {
    /// 将数据流重置到起始位置
    fn reset(&mut self) -> IoResult<()>;
}

impl<T: Seek> Reset for T {
    #[inline]
    fn reset(&mut self) -> IoResult<()> {
        self.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

trait ReadReset: Read + Reset + Send + Sync {}
impl<T: Read + Reset + Send + Sync> ReadReset for T {}

enum RequestBodyInner {
    Bytes(Cursor<Vec<u8>>),
    Resettable { reader: Box<dyn ReadReset>, size: u64 },
    Unresettable { reader: Box<dyn Read + Send + Sync>, size: u64 },
}

/// HTTP 请求体
pub struct RequestBody(RequestBodyInner);

impl RequestBody {
    /// 通过二进制数据创建请求体
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(RequestBodyInner::Bytes(Cursor::new(bytes.into())))
    }

    /// 通过可重置的输入流创建请求体，这样的请求体可以被重试
    #[inline]
    pub fn from_resettable_reader(reader: impl Read + Reset + Send + Sync + 'static, size: u64) -> Self {
        Self(RequestBodyInner::Resettable {
            reader: Box::new(reader),
            size,
        })
    }

    /// 通过不可重置的输入流创建请求体，这样的请求体只能被发送一次
    #[inline]
    pub fn from_reader(reader: impl Read + Send + Sync + 'static, size: u64) -> Self {
        Self(RequestBodyInner::Unresettable {
            reader: Box::new(reader),
            size,
        })
    }

    /// 请求体长度
    #[inline]
    pub fn size(&self) -> u64 {
        match &self.0 {
            RequestBodyInner::Bytes(bytes) => bytes.get_ref().len() as u64,
            RequestBodyInner::Resettable { size, .. } | RequestBodyInner::Unresettable { size, .. } => *size,
        }
    }

    /// 请求体是否可以被重复发送
    #[inline]
    pub fn is_resettable(&self) -> bool {
        !matches!(&self.0, RequestBodyInner::Unresettable { .. })
    }

    /// 如果请求体是内存数据，则返回它
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.0 {
            RequestBodyInner::Bytes(bytes) => Some(bytes.get_ref()),
            _ => None,
        }
    }

    /// 重置请求体
    pub fn reset(&mut self) -> IoResult<()> {
        match &mut self.0 {
            RequestBodyInner::Bytes(bytes) => {
                bytes.set_position(0);
                Ok(())
            }
            RequestBodyInner::Resettable { reader, .. } => reader.reset(),
            RequestBodyInner::Unresettable { .. } => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "request body can not be reset",
            )),
        }
    }
}

impl Default for RequestBody {
    #[inline]
    fn default() -> Self {
        Self::from_bytes(Vec::new())
    }
}

impl Read for RequestBody {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.0 {
            RequestBodyInner::Bytes(bytes) => bytes.read(buf),
            RequestBodyInner::Resettable { reader, .. } => reader.read(buf),
            RequestBodyInner::Unresettable { reader, .. } => reader.read(buf),
        }
    }
}

impl Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RequestBodyInner::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.get_ref().len()).finish(),
            RequestBodyInner::Resettable { size, .. } => f.debug_tuple("Resettable").field(size).finish(),
            RequestBodyInner::Unresettable { size, .. } => f.debug_tuple("Unresettable").field(size).finish(),
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for RequestBody {
    #[inline]
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

/// HTTP 请求信息
///
/// 不包含请求体信息
#[derive(Debug)]
pub struct RequestParts {
    method: Method,
    url: Url,
    version: Version,
    headers: HeaderMap,
    appended_user_agent: String,
    context: Context,
    extensions: Extensions,
}

impl RequestParts {
    /// 获取请求 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 获取请求 HTTP 方法的可变引用
    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// 获取 HTTP 请求 URL
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 获取 HTTP 请求 URL 的可变引用
    #[inline]
    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// 获取请求 HTTP 版本
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// 获取请求 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取请求 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取用户代理
    #[inline]
    pub fn user_agent(&self) -> String {
        FULL_USER_AGENT.to_owned() + &self.appended_user_agent
    }

    /// 获取追加的用户代理
    #[inline]
    pub fn appended_user_agent(&self) -> &str {
        &self.appended_user_agent
    }

    /// 获取请求上下文
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
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

/// HTTP 请求
///
/// 封装 HTTP 请求相关字段
#[derive(Debug)]
pub struct Request {
    parts: RequestParts,
    body: RequestBody,
}

impl Request {
    /// 创建 HTTP 请求构建器
    #[inline]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// 获取请求体
    #[inline]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// 获取请求体的可变引用
    #[inline]
    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    /// 同时获取请求信息和请求体的可变引用
    #[inline]
    pub fn parts_and_body_mut(&mut self) -> (&mut RequestParts, &mut RequestBody) {
        (&mut self.parts, &mut self.body)
    }

    /// 转换为请求信息和请求体
    #[inline]
    pub fn into_parts_and_body(self) -> (RequestParts, RequestBody) {
        (self.parts, self.body)
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Deref for Request {
    type Target = RequestParts;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}

impl DerefMut for Request {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parts
    }
}

/// HTTP 请求构建器
#[derive(Debug)]
pub struct RequestBuilder {
    parts: RequestParts,
    body: RequestBody,
}

impl RequestBuilder {
    /// 创建 HTTP 请求构建器
    #[inline]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            parts: RequestParts {
                method,
                url,
                version: Version::default(),
                headers: Default::default(),
                appended_user_agent: Default::default(),
                context: Default::default(),
                extensions: Default::default(),
            },
            body: Default::default(),
        }
    }

    /// 设置请求 HTTP 版本
    #[inline]
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.parts.version = version;
        self
    }

    /// 添加请求 HTTP Header
    #[inline]
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.parts.headers.insert(name, value);
        self
    }

    /// 设置请求 HTTP Headers
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.parts.headers = headers;
        self
    }

    /// 设置追加的用户代理
    #[inline]
    #[must_use]
    pub fn appended_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.parts.appended_user_agent = user_agent.into();
        self
    }

    /// 设置请求上下文
    #[inline]
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.parts.context = context;
        self
    }

    /// 添加扩展信息
    #[inline]
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(mut self, extension: T) -> Self {
        self.parts.extensions.insert(extension);
        self
    }

    /// 设置请求体
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// 构建 HTTP 请求，构建器中的请求体将被取走
    #[inline]
    pub fn build(self) -> Request {
        Request {
            parts: self.parts,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use std::io::{empty, Read};

    #[test]
    fn test_resettable_body() -> anyhow::Result<()> {
        let mut body = RequestBody::from_resettable_reader(Cursor::new(b"hello world".to_vec()), 11);
        assert!(body.is_resettable());
        assert_eq!(body.size(), 11);

        let mut buf = String::new();
        body.read_to_string(&mut buf)?;
        assert_eq!(buf, "hello world");

        body.reset()?;
        buf.clear();
        body.read_to_string(&mut buf)?;
        assert_eq!(buf, "hello world");
        Ok(())
    }

    #[test]
    fn test_unresettable_body() {
        let mut body = RequestBody::from_reader(empty(), 0);
        assert!(!body.is_resettable());
        assert!(body.reset().is_err());
        assert!(RequestBody::default().is_resettable());
    }

    #[test]
    fn test_build_request() -> anyhow::Result<()> {
        let request = Request::builder(Method::POST, "http://upload.qiniup.com/".parse()?)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .appended_user_agent("/test")
            .body(b"{}".to_vec())
            .build();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().host_str(), Some("upload.qiniup.com"));
        assert_eq!(request.body().as_bytes(), Some(b"{}".as_slice()));
        assert!(request.user_agent().starts_with("QiniuRust/qiniu-http-"));
        assert!(request.user_agent().ends_with("/test"));
        Ok(())
    }
}
