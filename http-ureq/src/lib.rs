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

//! # qiniu-ureq
//!
//! ## 七牛 Ureq HTTP 客户端实现
//!
//! 基于 Ureq 库提供 HTTP 客户端接口实现，仅提供阻塞接口的实现。
//! 发送请求体期间会检查请求上下文，一旦上下文被取消，请求将以 [`qiniu_http::ResponseErrorKind::UserCanceled`] 失败。

mod client;

pub use client::Client;

pub use qiniu_http as http;
pub use ureq;
