use super::{ApiResult, ResponseError};
use qiniu_credential::CredentialProvider;
use qiniu_http::{header::AUTHORIZATION, HeaderValue, Request as HttpRequest, ResponseErrorKind as HttpResponseErrorKind};
use std::sync::Arc;

/// 七牛鉴权签名
///
/// 可以设置在单个请求上，也可以通过 [`super::ClientBuilder::credential`] 为所有请求设置默认的签名方式
#[derive(Debug, Clone)]
pub enum Authorization {
    /// 使用上传凭证签名
    UpToken(Arc<str>),

    /// 使用七牛签名算法 V2 对请求签名
    V2(Arc<dyn CredentialProvider>),
}

impl Authorization {
    /// 使用上传凭证签名
    #[inline]
    pub fn uptoken(upload_token: impl Into<Arc<str>>) -> Self {
        Self::UpToken(upload_token.into())
    }

    /// 使用七牛签名算法 V2 对请求签名
    #[inline]
    pub fn v2(credential: impl CredentialProvider + 'static) -> Self {
        Self::V2(Arc::new(credential))
    }

    /// 对 HTTP 请求签名，签名结果设置在 `Authorization` 头中
    ///
    /// 请求体为输入流时签名不包含请求体
    pub fn sign(&self, request: &mut HttpRequest) -> ApiResult<()> {
        let authorization = match self {
            Self::UpToken(upload_token) => "UpToken ".to_owned() + upload_token,
            Self::V2(credential) => credential.get()?.authorization_v2_for_request(
                request.method(),
                request.url(),
                request.headers(),
                request.body().as_bytes().unwrap_or_default(),
            ),
        };
        let value = HeaderValue::from_str(&authorization).map_err(|err| {
            ResponseError::new(HttpResponseErrorKind::InvalidHeader.into(), err)
        })?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
