use super::{priority, ApiResult, Handler, Interceptor, ResponseError};
use chrono::Utc;
use qiniu_http::{
    header::USER_AGENT, HeaderName, HeaderValue, Request as HttpRequest, Response as HttpResponse,
    ResponseErrorKind as HttpResponseErrorKind,
};

const X_QINIU_DATE: &str = "x-qiniu-date";

/// 设置默认请求头
///
/// 总是覆盖请求中的 `User-Agent` 和 `X-Qiniu-Date`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHeaderInterceptor;

impl Interceptor for DefaultHeaderInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::DEFAULT_HEADER
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let user_agent = header_value(&request.user_agent())?;
        let date = header_value(&Utc::now().format("%Y%m%dT%H%M%SZ").to_string())?;
        let headers = request.headers_mut();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(HeaderName::from_static(X_QINIU_DATE), date);
        next.call(request)
    }
}

fn header_value(value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| ResponseError::new(HttpResponseErrorKind::InvalidHeader.into(), err))
}
