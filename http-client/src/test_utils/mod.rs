use super::{
    client::{Backoff, ClientBuilder, FixedBackoff},
    uplog::NoopUplogSink,
    Client, X_REQ_ID_HEADER_NAME,
};
use qiniu_http::{
    HeaderValue, HttpCaller, Request as HttpRequest, Response as HttpResponse, ResponseBody, ResponseResult,
    StatusCode, Url,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

type Handler = Box<dyn Fn(&mut HttpRequest, usize) -> ResponseResult + Send + Sync>;

/// 按照脚本返回响应的 HTTP 客户端，并记录每次请求的 URL
pub(crate) struct FakeHttpCaller {
    handler: Handler,
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
}

impl FakeHttpCaller {
    pub(crate) fn new(
        handler: impl Fn(&mut HttpRequest, usize) -> ResponseResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Default::default(),
            urls: Default::default(),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().to_owned()
    }
}

impl HttpCaller for FakeHttpCaller {
    fn call(&self, request: &mut HttpRequest) -> ResponseResult {
        let nth = self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(request.url().to_owned());
        (self.handler)(request, nth)
    }
}

impl fmt::Debug for FakeHttpCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeHttpCaller").field("calls", &self.calls).finish()
    }
}

/// 创建带有 X-ReqId 的响应
pub(crate) fn make_response(status_code: u16, body: impl Into<Vec<u8>>) -> HttpResponse {
    HttpResponse::builder()
        .status_code(StatusCode::from_u16(status_code).unwrap())
        .header(
            X_REQ_ID_HEADER_NAME.parse().unwrap(),
            HeaderValue::from_static("fake-reqid"),
        )
        .body(ResponseBody::from_bytes(body))
        .build()
}

/// 创建不等待退避，不输出打点日志的客户端构建器
pub(crate) fn make_client_builder(http_caller: Arc<FakeHttpCaller>) -> ClientBuilder {
    Client::builder(http_caller)
        .backoff(FixedBackoff::no_delay())
        .uplog_sink(NoopUplogSink)
}

/// 记录每次被询问的重试次数和返回的退避时长，第 n 次重试退避 n 倍的 `unit`
#[derive(Debug, Default)]
pub(crate) struct RecordingBackoff {
    unit: Duration,
    asked: Mutex<Vec<(usize, Duration)>>,
}

impl RecordingBackoff {
    pub(crate) fn new(unit: Duration) -> Arc<Self> {
        Arc::new(Self {
            unit,
            asked: Default::default(),
        })
    }

    pub(crate) fn asked(&self) -> Vec<(usize, Duration)> {
        self.asked.lock().unwrap().to_owned()
    }
}

impl Backoff for RecordingBackoff {
    fn time(&self, attempts: usize) -> Duration {
        let delay = self.unit * attempts as u32;
        self.asked.lock().unwrap().push((attempts, delay));
        delay
    }
}
