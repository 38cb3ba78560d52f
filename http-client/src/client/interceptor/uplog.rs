use super::{
    super::super::{
        uplog::{elapsed_millis, RequestEvent, UplogEvent, UplogSink},
        X_REQ_ID_HEADER_NAME,
    },
    priority, ApiResult, Handler, Interceptor,
};
use qiniu_http::{Request as HttpRequest, Response as HttpResponse};
use std::{sync::Arc, time::Instant};

/// 打点日志拦截器
///
/// 记录每一次实际发出的 HTTP 请求，重试产生的每次请求都会被单独记录
#[derive(Debug, Clone)]
pub struct UplogInterceptor {
    sink: Arc<dyn UplogSink>,
}

impl UplogInterceptor {
    /// 创建打点日志拦截器
    #[inline]
    pub fn new(sink: Arc<dyn UplogSink>) -> Self {
        Self { sink }
    }
}

impl Interceptor for UplogInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::UPLOG
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let begin_at = Instant::now();
        let result = next.call(request);
        let mut event = RequestEvent {
            method: request.method().to_string(),
            host: request.url().host_str().unwrap_or_default().to_owned(),
            path: request.url().path().to_owned(),
            status_code: None,
            x_reqid: None,
            error: None,
            elapsed_ms: elapsed_millis(begin_at.elapsed()),
        };
        match &result {
            Ok(response) => {
                event.status_code = Some(response.status_code().as_u16());
                event.x_reqid = response
                    .header(X_REQ_ID_HEADER_NAME)
                    .and_then(|value| value.to_str().ok())
                    .map(ToOwned::to_owned);
            }
            Err(err) => {
                event.status_code = err.status_code().map(|code| code.as_u16());
                event.error = Some(err.to_string());
            }
        }
        self.sink.emit(UplogEvent::Request(event));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::super::super::test_utils::{make_client_builder, make_response, FakeHttpCaller},
        *,
    };
    use qiniu_http::Method;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CollectedEvents(Mutex<Vec<UplogEvent>>);

    impl UplogSink for CollectedEvents {
        fn emit(&self, event: UplogEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_uplog_records_every_attempt() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, nth| {
            if nth == 0 {
                Ok(make_response(503, ""))
            } else {
                Ok(make_response(200, "{}"))
            }
        });
        let events = Arc::new(CollectedEvents::default());
        let client = make_client_builder(caller.to_owned())
            .uplog_sink(events.to_owned())
            .retry_max(1)
            .build();
        client
            .request(Method::POST, client.host_provider(["up.qiniup.com"]))
            .path("/mkblk/4")
            .octet_stream_body(b"data".to_vec())
            .call()?;

        let events = events.0.lock().unwrap().to_owned();
        assert_eq!(events.len(), 2);
        let status_codes = events
            .iter()
            .map(|event| match event {
                UplogEvent::Request(event) => {
                    assert_eq!(event.host, "up.qiniup.com");
                    assert_eq!(event.path, "/mkblk/4");
                    event.status_code
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(status_codes, [Some(503), Some(200)]);
        match &events[1] {
            UplogEvent::Request(event) => assert_eq!(event.x_reqid.as_deref(), Some("fake-reqid")),
            _ => unreachable!(),
        }
        Ok(())
    }
}
