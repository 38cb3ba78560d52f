use super::{super::request::BufferResponse, priority, ApiResult, Handler, Interceptor, ResponseError};
use qiniu_http::{Request as HttpRequest, Response as HttpResponse, ResponseErrorKind as HttpResponseErrorKind};

/// 读取响应体拦截器
///
/// 仅对要求读取响应体的请求生效，读取失败将作为接收错误返回，因此可以被外层重试
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferResponseInterceptor;

impl Interceptor for BufferResponseInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::BUFFER_RESPONSE
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let mut response = next.call(request)?;
        if request.extensions().get::<BufferResponse>().is_some() {
            if let Err(err) = response.body_mut().buffer() {
                return Err(ResponseError::new(HttpResponseErrorKind::ReceiveError.into(), err).response_parts(&response));
            }
        }
        Ok(response)
    }
}
