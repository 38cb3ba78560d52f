mod multipart;

pub use multipart::{Multipart, Part};

use super::{ApiResult, Authorization, Client, Response, ResponseError, ResponseErrorKind};
use super::super::HostProvider;
use mime::{Mime, APPLICATION_JSON, APPLICATION_OCTET_STREAM};
use qiniu_http::{
    header::CONTENT_TYPE, Context, HeaderMap, HeaderName, HeaderValue, Method, Request as HttpRequest, RequestBody,
    ResponseErrorKind as HttpResponseErrorKind, Url,
};
use serde::Serialize;
use std::{fmt, sync::Arc};

/// 请求使用的主机信息，供主机重试拦截器使用
#[derive(Debug, Clone)]
pub(crate) struct RequestHosts {
    pub(crate) provider: Arc<dyn HostProvider>,
    pub(crate) current_host: String,
    pub(crate) use_https: bool,
}

/// 标记请求需要将响应体完整读入内存
#[derive(Debug, Clone, Copy)]
pub(crate) struct BufferResponse;

/// 请求构建器
///
/// 通过 [`Client::request`] 创建，请求发送时会从主机提供者中获取第一个可用的主机
#[must_use]
pub struct RequestBuilder<'c> {
    client: &'c Client,
    method: Method,
    hosts: Arc<dyn HostProvider>,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    context: Context,
    authorization: Option<Authorization>,
    buffer_response: bool,
}

impl<'c> RequestBuilder<'c> {
    pub(super) fn new(client: &'c Client, method: Method, hosts: Arc<dyn HostProvider>) -> Self {
        Self {
            client,
            method,
            hosts,
            path: "/".to_owned(),
            query: Default::default(),
            headers: Default::default(),
            body: Default::default(),
            context: Default::default(),
            authorization: None,
            buffer_response: false,
        }
    }

    /// 设置请求路径
    #[inline]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// 追加查询参数
    #[inline]
    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 设置 HTTP 请求头
    #[inline]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// 设置请求体，同时设置 Content-Type
    #[inline]
    pub fn body(mut self, body: impl Into<RequestBody>, content_type: &Mime) -> Self {
        self.body = body.into();
        self.set_content_type(content_type.as_ref());
        self
    }

    /// 设置二进制请求体
    #[inline]
    pub fn octet_stream_body(self, body: impl Into<RequestBody>) -> Self {
        self.body(body, &APPLICATION_OCTET_STREAM)
    }

    /// 设置 JSON 请求体
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> ApiResult<Self> {
        let bytes =
            serde_json::to_vec(body).map_err(|err| ResponseError::new(ResponseErrorKind::SystemCallError, err))?;
        Ok(self.body(bytes, &APPLICATION_JSON))
    }

    /// 设置 Multipart 表单请求体
    #[inline]
    pub fn multipart(mut self, multipart: Multipart) -> Self {
        let content_type = multipart.content_type();
        self.body = multipart.into_bytes().into();
        self.set_content_type(&content_type);
        self
    }

    /// 设置请求上下文
    #[inline]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// 设置鉴权签名方式
    #[inline]
    pub fn authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// 将响应体完整读入内存后再返回
    ///
    /// 读取响应体的失败也将被重试
    #[inline]
    pub fn buffer_response(mut self) -> Self {
        self.buffer_response = true;
        self
    }

    /// 发送请求
    pub fn call(self) -> ApiResult<Response> {
        let Self {
            client,
            method,
            hosts,
            path,
            query,
            headers,
            body,
            context,
            authorization,
            buffer_response,
        } = self;
        let host = hosts
            .provider()
            .map_err(|err| ResponseError::new(ResponseErrorKind::NoTry, err))?;
        let mut url = base_url(&host, client.use_https())?;
        url.set_path(&path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut builder = HttpRequest::builder(method, url)
            .headers(headers)
            .appended_user_agent(client.appended_user_agent())
            .context(context)
            .body(body)
            .extension(RequestHosts {
                provider: hosts,
                current_host: host,
                use_https: client.use_https(),
            });
        if let Some(authorization) = authorization {
            builder = builder.extension(authorization);
        }
        if buffer_response {
            builder = builder.extension(BufferResponse);
        }
        client.do_request(builder.build())
    }

    fn set_content_type(&mut self, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }
}

impl fmt::Debug for RequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("hosts", &self.hosts)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

/// 主机可以是 `host`，`host:port` 或是带有协议的 `scheme://host:port`
pub(crate) fn base_url(host: &str, use_https: bool) -> ApiResult<Url> {
    let url = if host.contains("://") {
        Url::parse(host)
    } else {
        Url::parse(&format!("{}://{}", if use_https { "https" } else { "http" }, host))
    };
    url.map_err(|err| ResponseError::new(HttpResponseErrorKind::InvalidUrl.into(), err))
}

/// 将 URL 中的协议，主机和端口替换为指定主机的
pub(crate) fn replace_host(url: &mut Url, host: &str, use_https: bool) -> ApiResult<()> {
    let base = base_url(host, use_https)?;
    let invalid_url = |reason: &str| {
        ResponseError::new_with_msg(
            HttpResponseErrorKind::InvalidUrl.into(),
            format!("can not replace host of {url} to {host}: {reason}"),
        )
    };
    let mut replaced = url.to_owned();
    replaced
        .set_scheme(base.scheme())
        .map_err(|_| invalid_url("invalid scheme"))?;
    replaced
        .set_host(base.host_str())
        .map_err(|err| invalid_url(&err.to_string()))?;
    replaced.set_port(base.port()).map_err(|_| invalid_url("invalid port"))?;
    *url = replaced;
    Ok(())
}
