#![deny(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! # qiniu-http-client
//!
//! ## 七牛 HTTP 客户端
//!
//! 在 [`qiniu_http::HttpCaller`] 之上提供可靠的请求调用能力：
//!
//! - 由优先级排序的拦截器组成的调用链，内置默认请求头，鉴权签名，防劫持，重试，主机切换等拦截器；
//! - 主机冻结记录和主机提供者，请求失败的主机在一段时间内不会被再次选中；
//! - 区域查询，带有持久化缓存，相同的并发查询只会实际发出一次；
//! - 区域组，供上层在多个区域之间依次重试。

mod client;
mod hosts;
mod regions;
mod uplog;

#[cfg(test)]
mod test_utils;

pub extern crate qiniu_credential as credential;
pub extern crate qiniu_http as http;

pub use client::{
    is_error_host_retryable, is_error_retryable, is_status_code_host_retryable, is_status_code_retryable, priority,
    AntiHijackingInterceptor, ApiResult, AuthInterceptor, Authorization, Backoff, BufferResponseInterceptor, Client,
    ClientBuilder, DebugInterceptor, DefaultHeaderInterceptor, ExponentialBackoff, FixedBackoff, Handler,
    HostsRetryInterceptor, Interceptor, Multipart, Part, RandomizedBackoff, RequestBuilder, Response, ResponseError,
    ResponseErrorKind, SimpleRetryInterceptor, UplogInterceptor,
};
pub use hosts::{ArrayHostProvider, HostFreezer, HostProvider, HostProviderError, HostProviderResult};
pub use regions::{
    CacheKey, Endpoints, EndpointsBuilder, InvalidServiceName, QueryVersion, Region, RegionBuilder, RegionGroup,
    RegionResolver, RegionResolverBuilder, RegionsCache, RegionsCacheBuilder, ServiceName,
};
pub use uplog::{LogUplogSink, NoopUplogSink, RequestEvent, UplogEvent, UplogSink, UploadEvent};

/// 七牛服务器返回的请求 ID 响应头
pub const X_REQ_ID_HEADER_NAME: &str = "x-reqid";

/// 七牛服务器返回的日志响应头
pub const X_LOG_HEADER_NAME: &str = "x-log";
