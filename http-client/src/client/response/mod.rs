mod error;

pub use error::{Error as ResponseError, ErrorKind as ResponseErrorKind};

use super::super::{X_LOG_HEADER_NAME, X_REQ_ID_HEADER_NAME};
use qiniu_http::{HeaderValue, Response as HttpResponse, ResponseBody};
use serde::de::DeserializeOwned;
use std::{
    io::Read,
    ops::{Deref, DerefMut},
};

/// API 响应结果
pub type ApiResult<T> = Result<T, ResponseError>;

/// HTTP 响应
///
/// 由 [`super::Client`] 返回，状态码总是 2xx
#[derive(Debug)]
pub struct Response(HttpResponse);

impl Response {
    #[inline]
    pub(super) fn new(response: HttpResponse) -> Self {
        Self(response)
    }

    /// 获取 HTTP 响应的 X-ReqId 信息
    #[inline]
    pub fn x_reqid(&self) -> Option<&HeaderValue> {
        self.0.header(X_REQ_ID_HEADER_NAME)
    }

    /// 获取 HTTP 响应的 X-Log 信息
    #[inline]
    pub fn x_log(&self) -> Option<&HeaderValue> {
        self.0.header(X_LOG_HEADER_NAME)
    }

    /// 解析 JSON 响应体
    pub fn parse_json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let (parts, mut body) = self.0.into_parts_and_body();
        let mut buf = Vec::new();
        body.read_to_end(&mut buf)
            .map_err(|err| ResponseError::from(err).response_parts(&parts))?;
        serde_json::from_slice(&buf).map_err(|err| {
            ResponseError::new(ResponseErrorKind::ParseResponseError, err)
                .response_parts(&parts)
                .set_response_body_sample(buf)
        })
    }

    /// 转换为响应体
    #[inline]
    pub fn into_body(self) -> ResponseBody {
        self.0.into_body()
    }

    /// 转换为 HTTP 响应
    #[inline]
    pub fn into_inner(self) -> HttpResponse {
        self.0
    }
}

impl Deref for Response {
    type Target = HttpResponse;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Response {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
