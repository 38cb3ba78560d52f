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

//! # qiniu-http
//!
//! ## 七牛 HTTP 接口
//!
//! 为不同的 HTTP 客户端实现提供相同的基础接口，
//! 便于七牛 SDK 使用统一的接口调用不同的 HTTP 客户端实现。
//!
//! 这里只定义阻塞接口，请求通过 [`Context`] 传递取消信号，HTTP 客户端实现在发送请求体时需要检查它。

mod context;
mod error;
mod request;
mod response;

pub use context::Context;
pub use error::{Error as ResponseError, ErrorKind as ResponseErrorKind};
pub use request::{Request, RequestBody, RequestBuilder, RequestParts, Reset};
pub use response::{Response, ResponseBody, ResponseBuilder, ResponseParts, ResponseResult};

pub use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Extensions, Method, StatusCode, Version,
};
pub use url::{self, Url};

use auto_impl::auto_impl;
use std::fmt::Debug;

/// HTTP 请求处理接口
///
/// 实现该接口，即可处理所有七牛 SDK 发送的 HTTP 请求。
/// 非 2xx 的状态码不应该作为错误返回，由上层自行判断。
#[auto_impl(&, &mut, Box, Arc)]
pub trait HttpCaller: Debug + Send + Sync {
    /// 阻塞发送 HTTP 请求
    fn call(&self, request: &mut Request) -> ResponseResult;
}
