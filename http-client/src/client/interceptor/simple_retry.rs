use super::{
    super::{
        backoff::{Backoff, FixedBackoff},
        retry::is_result_retryable,
    },
    describe_result, drain_response, priority, ApiResult, Handler, Interceptor, ResponseError,
};
use log::warn;
use qiniu_http::{Request as HttpRequest, Response as HttpResponse, ResponseErrorKind as HttpResponseErrorKind};
use std::sync::Arc;

const DEFAULT_RETRY_MAX: usize = 2;

/// 单主机重试拦截器
///
/// 在同一个主机上重试可重试的失败，最多额外重试 `retry_max` 次。
/// 请求体无法重置的请求不会被重试。
#[derive(Debug, Clone)]
pub struct SimpleRetryInterceptor {
    retry_max: usize,
    backoff: Arc<dyn Backoff>,
}

impl SimpleRetryInterceptor {
    /// 创建单主机重试拦截器
    #[inline]
    pub fn new(retry_max: usize, backoff: Arc<dyn Backoff>) -> Self {
        Self { retry_max, backoff }
    }

    /// 获取最大重试次数
    #[inline]
    pub fn retry_max(&self) -> usize {
        self.retry_max
    }
}

impl Default for SimpleRetryInterceptor {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_MAX, Arc::new(FixedBackoff::default()))
    }
}

impl Interceptor for SimpleRetryInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::SIMPLE_RETRY
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let mut retried = 0;
        loop {
            let mut result = next.call(request);
            if retried >= self.retry_max || !request.body().is_resettable() || !is_result_retryable(&result) {
                return result.map_err(|err| err.retried(retried));
            }
            retried += 1;
            warn!(
                "retry request {} {} ({}/{}): {}",
                request.method(),
                request.url(),
                retried,
                self.retry_max,
                describe_result(&result)
            );
            drain_response(&mut result);
            request.body_mut().reset()?;
            if !request.context().sleep(self.backoff.time(retried)) {
                return Err(ResponseError::new_with_msg(
                    HttpResponseErrorKind::UserCanceled.into(),
                    "request is cancelled during backoff",
                ));
            }
        }
    }
}
