mod anti_hijacking;
mod auth;
mod buffer_response;
mod debug;
mod default_header;
mod hosts_retry;
mod simple_retry;
mod uplog;

pub use anti_hijacking::AntiHijackingInterceptor;
pub use auth::AuthInterceptor;
pub use buffer_response::BufferResponseInterceptor;
pub use debug::DebugInterceptor;
pub use default_header::DefaultHeaderInterceptor;
pub use hosts_retry::HostsRetryInterceptor;
pub use simple_retry::SimpleRetryInterceptor;
pub use uplog::UplogInterceptor;

use super::{ApiResult, ResponseError, ResponseErrorKind};
use auto_impl::auto_impl;
use qiniu_http::{HttpCaller, Request as HttpRequest, Response as HttpResponse};
use std::fmt::{self, Debug};

/// 拦截器优先级
///
/// 数值越小，拦截器越靠外层，越早拦截到请求，越晚拦截到响应
pub mod priority {
    /// 主机重试
    pub const HOSTS_RETRY: u32 = 100;
    /// 单主机重试
    pub const SIMPLE_RETRY: u32 = 200;
    /// 默认请求头
    pub const DEFAULT_HEADER: u32 = 300;
    /// 用户拦截器的默认优先级
    pub const NORMAL: u32 = 400;
    /// 鉴权签名
    pub const AUTH: u32 = 500;
    /// 防劫持
    pub const ANTI_HIJACKING: u32 = 600;
    /// 读取响应体
    pub const BUFFER_RESPONSE: u32 = 650;
    /// 打点日志
    pub const UPLOG: u32 = 700;
    /// 调试输出
    pub const DEBUG: u32 = 800;
}

/// HTTP 请求拦截器
///
/// 拦截器可以在调用 `next` 前修改请求，也可以检查或替换 `next` 返回的结果，
/// 甚至多次调用 `next` 以实现重试。
/// 传给 `next` 的响应总是原样返回，即使状态码不是 2xx。
#[auto_impl(&, &mut, Box, Arc)]
pub trait Interceptor: Debug + Send + Sync {
    /// 拦截器优先级
    #[inline]
    fn priority(&self) -> u32 {
        priority::NORMAL
    }

    /// 拦截请求
    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse>;
}

/// 调用链中剩余的处理器
#[derive(Clone, Copy)]
pub struct Handler<'a> {
    interceptors: &'a [Box<dyn Interceptor>],
    http_caller: &'a dyn HttpCaller,
}

impl<'a> Handler<'a> {
    pub(super) fn new(interceptors: &'a [Box<dyn Interceptor>], http_caller: &'a dyn HttpCaller) -> Self {
        Self {
            interceptors,
            http_caller,
        }
    }

    /// 将请求交给下一个拦截器，最内层为 HTTP 客户端
    pub fn call(self, request: &mut HttpRequest) -> ApiResult<HttpResponse> {
        match self.interceptors.split_first() {
            Some((interceptor, rest)) => interceptor.intercept(request, Self::new(rest, self.http_caller)),
            None => self.http_caller.call(request).map_err(ResponseError::from),
        }
    }
}

impl Debug for Handler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("interceptors", &self.interceptors)
            .field("http_caller", &self.http_caller)
            .finish()
    }
}

/// 丢弃响应体，以便连接可以被复用
fn drain_response(result: &mut ApiResult<HttpResponse>) {
    if let Ok(response) = result {
        response.body_mut().drain().ok();
    }
}

/// 描述请求结果，用作日志和冻结原因
fn describe_result(result: &ApiResult<HttpResponse>) -> String {
    match result {
        Ok(response) => format!("status code {}", response.status_code().as_u16()),
        Err(err) => err.to_string(),
    }
}
