use super::{
    super::{
        backoff::{Backoff, FixedBackoff},
        request::{replace_host, RequestHosts},
        retry::is_result_host_retryable,
    },
    super::super::hosts::DEFAULT_FREEZE_DURATION,
    describe_result, drain_response, priority, ApiResult, Handler, Interceptor, ResponseError,
};
use log::warn;
use qiniu_http::{Request as HttpRequest, Response as HttpResponse, ResponseErrorKind as HttpResponseErrorKind};
use std::{sync::Arc, time::Duration};

const DEFAULT_RETRY_MAX: usize = 3;

/// 主机重试拦截器
///
/// 请求失败后冻结当前主机，从主机提供者获取下一个主机并替换请求 URL 后重试。
/// 主机提供者无法提供主机时返回最后一次的结果。
/// 仅对通过 [`super::super::Client::request`] 发出的请求生效。
#[derive(Debug, Clone)]
pub struct HostsRetryInterceptor {
    retry_max: usize,
    freeze_duration: Duration,
    backoff: Arc<dyn Backoff>,
}

impl HostsRetryInterceptor {
    /// 创建主机重试拦截器
    #[inline]
    pub fn new(retry_max: usize, freeze_duration: Duration, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            retry_max,
            freeze_duration,
            backoff,
        }
    }

    /// 获取主机冻结时长
    #[inline]
    pub fn freeze_duration(&self) -> Duration {
        self.freeze_duration
    }
}

impl Default for HostsRetryInterceptor {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_MAX, DEFAULT_FREEZE_DURATION, Arc::new(FixedBackoff::default()))
    }
}

impl Interceptor for HostsRetryInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::HOSTS_RETRY
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let mut hosts = match request.extensions().get::<RequestHosts>() {
            Some(hosts) => hosts.to_owned(),
            None => return next.call(request),
        };
        let mut switched = 0;
        loop {
            let mut result = next.call(request);
            if !is_result_host_retryable(&result) {
                return result;
            }
            let cause = describe_result(&result);
            if let Err(err) = hosts.provider.freeze(&hosts.current_host, &cause, self.freeze_duration) {
                warn!("failed to freeze host {}: {}", hosts.current_host, err);
                return result;
            }
            switched += 1;
            if switched > self.retry_max || !request.body().is_resettable() {
                return result;
            }
            let next_host = match hosts.provider.provider() {
                Ok(host) => host,
                Err(err) => {
                    warn!("no more host to retry after {} failed: {}", hosts.current_host, err);
                    return result;
                }
            };
            warn!(
                "host {} is frozen for {:?} ({}), switch to {} ({}/{})",
                hosts.current_host, self.freeze_duration, cause, next_host, switched, self.retry_max
            );
            drain_response(&mut result);
            replace_host(request.url_mut(), &next_host, hosts.use_https)?;
            hosts.current_host = next_host;
            request.extensions_mut().insert(hosts.to_owned());
            request.body_mut().reset()?;
            if !request.context().sleep(self.backoff.time(switched)) {
                return Err(ResponseError::new_with_msg(
                    HttpResponseErrorKind::UserCanceled.into(),
                    "request is cancelled during backoff",
                ));
            }
        }
    }
}
