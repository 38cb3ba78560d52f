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

//! # qiniu-credential
//!
//! ## 七牛认证信息
//!
//! 负责存储调用七牛 API 所必要的认证信息，提供 [`CredentialProvider`] 方便扩展获取认证信息的方式。
//! 同时提供请求签名和上传凭证签名的算法实现。

use assert_impl::assert_impl;
use auto_impl::auto_impl;
use hmac::{Hmac, Mac};
use http::{
    header::{HeaderMap, CONTENT_TYPE},
    HeaderValue, Method,
};
use mime::APPLICATION_OCTET_STREAM;
use qiniu_utils::base64;
use sha1::Sha1;
use std::{
    env,
    fmt::{self, Debug},
    io::{Error, ErrorKind, Result},
};
pub use url::Url;

/// 认证信息
///
/// 包含 AccessKey 和 SecretKey，输出调试信息时 SecretKey 不会被打印
#[derive(Clone, Eq, PartialEq)]
pub struct Credential {
    access_key: String,
    secret_key: String,
}

impl Credential {
    /// 创建认证信息
    #[inline]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// 获取认证信息的 AccessKey
    #[inline]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// 获取认证信息的 SecretKey
    #[inline]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// 使用七牛签名算法对数据进行签名
    ///
    /// 返回 `<AccessKey>:<Base64(HMAC-SHA1(data))>`
    pub fn sign(&self, data: &[u8]) -> String {
        self.access_key.to_owned() + ":" + &base64ed_hmac_digest(&self.secret_key, data)
    }

    /// 使用七牛签名算法对数据进行签名，并同时给出签名和原数据
    ///
    /// 上传凭证即由该方法对上传策略签名得到
    pub fn sign_with_data(&self, data: &[u8]) -> String {
        let encoded_data = base64::urlsafe(data);
        self.sign(encoded_data.as_bytes()) + ":" + &encoded_data
    }

    /// 使用七牛签名算法 V2 对 HTTP 请求进行签名，返回 Authorization 的值
    pub fn authorization_v2_for_request(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: &[u8],
    ) -> String {
        "Qiniu ".to_owned() + &sign_request_v2(self, method, url, headers, body)
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"CENSORED")
            .finish()
    }
}

fn sign_request_v2(cred: &Credential, method: &Method, url: &Url, headers: &HeaderMap, body: &[u8]) -> String {
    let mut data_to_sign = Vec::with_capacity(1024);
    data_to_sign.extend_from_slice(method.as_str().as_bytes());
    data_to_sign.extend_from_slice(b" ");
    data_to_sign.extend_from_slice(url.path().as_bytes());
    if let Some(query) = url.query() {
        if !query.is_empty() {
            data_to_sign.extend_from_slice(b"?");
            data_to_sign.extend_from_slice(query.as_bytes());
        }
    }
    data_to_sign.extend_from_slice(b"\nHost: ");
    data_to_sign.extend_from_slice(url.host_str().unwrap_or_default().as_bytes());
    if let Some(port) = url.port() {
        data_to_sign.extend_from_slice(b":");
        data_to_sign.extend_from_slice(port.to_string().as_bytes());
    }
    data_to_sign.extend_from_slice(b"\n");

    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        data_to_sign.extend_from_slice(b"Content-Type: ");
        data_to_sign.extend_from_slice(content_type.as_bytes());
        data_to_sign.extend_from_slice(b"\n");
        sign_data_for_x_qiniu_headers(&mut data_to_sign, headers);
        data_to_sign.extend_from_slice(b"\n");
        if !body.is_empty() && will_push_body_v2(content_type) {
            data_to_sign.extend_from_slice(body);
        }
    } else {
        sign_data_for_x_qiniu_headers(&mut data_to_sign, headers);
        data_to_sign.extend_from_slice(b"\n");
    }
    return cred.sign(&data_to_sign);

    fn sign_data_for_x_qiniu_headers(data_to_sign: &mut Vec<u8>, headers: &HeaderMap) {
        const PREFIX: &str = "x-qiniu-";
        let mut x_qiniu_headers = headers
            .iter()
            .filter(|(key, _)| key.as_str().len() > PREFIX.len() && key.as_str().starts_with(PREFIX))
            .map(|(key, value)| (canonical_header_name(key.as_str()), value.as_bytes()))
            .collect::<Vec<_>>();
        x_qiniu_headers.sort_unstable();
        for (header_key, header_value) in x_qiniu_headers {
            data_to_sign.extend_from_slice(header_key.as_bytes());
            data_to_sign.extend_from_slice(b": ");
            data_to_sign.extend_from_slice(header_value);
            data_to_sign.extend_from_slice(b"\n");
        }
    }
}

/// `x-qiniu-meta` => `X-Qiniu-Meta`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn base64ed_hmac_digest(secret_key: &str, data: &[u8]) -> String {
    let mut hmac = Hmac::<Sha1>::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts keys of any length");
    hmac.update(data);
    base64::urlsafe(&hmac.finalize().into_bytes())
}

#[inline]
fn will_push_body_v2(content_type: &HeaderValue) -> bool {
    APPLICATION_OCTET_STREAM.as_ref() != content_type
}

/// 认证信息提供者
///
/// 为认证信息提供者的实现提供接口支持
#[auto_impl(&, &mut, Box, Arc)]
pub trait CredentialProvider: Debug + Sync + Send {
    /// 返回七牛认证信息
    fn get(&self) -> Result<Credential>;
}

impl CredentialProvider for Credential {
    #[inline]
    fn get(&self) -> Result<Credential> {
        Ok(self.to_owned())
    }
}

/// 设置七牛 AccessKey 的环境变量
pub const QINIU_ACCESS_KEY_ENV_KEY: &str = "QINIU_ACCESS_KEY";
/// 设置七牛 SecretKey 的环境变量
pub const QINIU_SECRET_KEY_ENV_KEY: &str = "QINIU_SECRET_KEY";

/// 环境变量认证信息提供者，可以将认证信息配置在环境变量中
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn get(&self) -> Result<Credential> {
        match (env::var(QINIU_ACCESS_KEY_ENV_KEY), env::var(QINIU_SECRET_KEY_ENV_KEY)) {
            (Ok(access_key), Ok(secret_key)) if !access_key.is_empty() && !secret_key.is_empty() => {
                Ok(Credential::new(access_key, secret_key))
            }
            _ => Err(Error::new(
                ErrorKind::Other,
                format!(
                    "EnvCredentialProvider is not setuped, please set environment variable `{QINIU_ACCESS_KEY_ENV_KEY}` and `{QINIU_SECRET_KEY_ENV_KEY}`"
                ),
            )),
        }
    }
}
