use super::{
    super::super::{X_LOG_HEADER_NAME, X_REQ_ID_HEADER_NAME},
    priority, ApiResult, Handler, Interceptor, ResponseError, ResponseErrorKind,
};
use qiniu_http::{Request as HttpRequest, Response as HttpResponse};

/// 防劫持拦截器
///
/// 七牛服务器返回的响应总是带有 `X-ReqId` 或 `X-Log`，两者都没有则认为响应被劫持
#[derive(Debug, Clone, Copy, Default)]
pub struct AntiHijackingInterceptor;

impl Interceptor for AntiHijackingInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::ANTI_HIJACKING
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let mut response = next.call(request)?;
        if response.header(X_REQ_ID_HEADER_NAME).is_none() && response.header(X_LOG_HEADER_NAME).is_none() {
            response.body_mut().drain().ok();
            return Err(ResponseError::new_with_msg(
                ResponseErrorKind::MaliciousResponse,
                format!(
                    "response of {} has neither {} nor {}",
                    request.url(),
                    X_REQ_ID_HEADER_NAME,
                    X_LOG_HEADER_NAME
                ),
            )
            .response_parts(&response));
        }
        Ok(response)
    }
}
