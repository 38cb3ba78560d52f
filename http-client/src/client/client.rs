use super::{
    super::{
        hosts::{ArrayHostProvider, HostFreezer, HostProvider, DEFAULT_FREEZE_DURATION},
        uplog::{LogUplogSink, UplogSink},
    },
    backoff::{Backoff, FixedBackoff},
    interceptor::{
        AntiHijackingInterceptor, AuthInterceptor, BufferResponseInterceptor, DebugInterceptor,
        DefaultHeaderInterceptor, Handler, HostsRetryInterceptor, Interceptor, SimpleRetryInterceptor,
        UplogInterceptor,
    },
    ApiResult, Authorization, RequestBuilder, Response, ResponseError, ResponseErrorKind,
};
use assert_impl::assert_impl;
use qiniu_credential::CredentialProvider;
use qiniu_http::{HttpCaller, Method, Request as HttpRequest, Response as HttpResponse};
use serde::Deserialize;
use std::{fmt, io::Read, sync::Arc, time::Duration};

const DEFAULT_RETRY_MAX: usize = 2;
const DEFAULT_HOST_RETRY_MAX: usize = 3;

/// HTTP 客户端
///
/// 请求依次经过按优先级排列的拦截器，最后交给 [`HttpCaller`] 发出。
/// 克隆的客户端共享同一套拦截器和主机冻结记录。
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_caller: Box<dyn HttpCaller>,
    interceptors: Box<[Box<dyn Interceptor>]>,
    use_https: bool,
    appended_user_agent: Box<str>,
    host_freezer: HostFreezer,
    uplog_sink: Arc<dyn UplogSink>,
}

impl Client {
    /// 创建 HTTP 客户端构建器
    #[inline]
    pub fn builder(http_caller: impl HttpCaller + 'static) -> ClientBuilder {
        ClientBuilder::new(http_caller)
    }

    /// 使用默认配置创建 HTTP 客户端
    #[inline]
    pub fn new(http_caller: impl HttpCaller + 'static) -> Self {
        Self::builder(http_caller).build()
    }

    /// 创建请求构建器，请求将发往主机提供者提供的主机
    #[inline]
    pub fn request(&self, method: Method, hosts: Arc<dyn HostProvider>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, hosts)
    }

    /// 使用客户端的主机冻结记录创建基于主机列表的主机提供者
    #[inline]
    pub fn host_provider(&self, hosts: impl IntoIterator<Item = impl Into<String>>) -> Arc<dyn HostProvider> {
        Arc::new(ArrayHostProvider::new(hosts, self.inner.host_freezer.to_owned()))
    }

    /// 发送 HTTP 请求
    ///
    /// 请求经过所有拦截器，最终响应的状态码不是 2xx 时，将被转换为错误返回
    pub fn do_request(&self, mut request: HttpRequest) -> ApiResult<Response> {
        let response = Handler::new(&self.inner.interceptors, self.inner.http_caller.as_ref()).call(&mut request)?;
        if response.status_code().is_success() {
            Ok(Response::new(response))
        } else {
            Err(status_code_error(response))
        }
    }

    /// 是否使用 HTTPS
    #[inline]
    pub fn use_https(&self) -> bool {
        self.inner.use_https
    }

    /// 获取追加的 UserAgent
    #[inline]
    pub fn appended_user_agent(&self) -> &str {
        &self.inner.appended_user_agent
    }

    /// 获取主机冻结记录
    #[inline]
    pub fn host_freezer(&self) -> &HostFreezer {
        &self.inner.host_freezer
    }

    /// 获取打点日志接收器
    #[inline]
    pub fn uplog_sink(&self) -> &Arc<dyn UplogSink> {
        &self.inner.uplog_sink
    }

    /// 获取按优先级排列的拦截器
    #[inline]
    pub fn interceptors(&self) -> &[Box<dyn Interceptor>] {
        &self.inner.interceptors
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

#[cfg(feature = "ureq")]
impl Default for Client {
    #[inline]
    fn default() -> Self {
        Self::new(qiniu_ureq::Client::default())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("http_caller", &self.inner.http_caller)
            .field("interceptors", &self.inner.interceptors)
            .field("use_https", &self.inner.use_https)
            .field("appended_user_agent", &self.inner.appended_user_agent)
            .finish()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn status_code_error(response: HttpResponse) -> ResponseError {
    let status_code = response.status_code();
    let kind = if status_code.as_u16() >= 400 {
        ResponseErrorKind::StatusCodeError(status_code)
    } else {
        ResponseErrorKind::UnexpectedStatusCode(status_code)
    };
    let (parts, body) = response.into_parts_and_body();
    let mut sample = Vec::new();
    let read_result = body.take(1024).read_to_end(&mut sample);
    let message = serde_json::from_slice::<ErrorBody>(&sample)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("status code {}", status_code.as_u16()));
    let err = ResponseError::new_with_msg(kind, message).response_parts(&parts);
    match read_result {
        Ok(_) => err.set_response_body_sample(sample),
        Err(_) => err,
    }
}

/// HTTP 客户端构建器
#[must_use]
pub struct ClientBuilder {
    http_caller: Box<dyn HttpCaller>,
    interceptors: Vec<Box<dyn Interceptor>>,
    use_https: bool,
    appended_user_agent: String,
    retry_max: usize,
    host_retry_max: usize,
    host_freeze_duration: Duration,
    backoff: Arc<dyn Backoff>,
    authorization: Option<Authorization>,
    uplog_sink: Arc<dyn UplogSink>,
    host_freezer: HostFreezer,
    anti_hijacking: bool,
    debug: bool,
}

impl ClientBuilder {
    /// 创建 HTTP 客户端构建器
    #[inline]
    pub fn new(http_caller: impl HttpCaller + 'static) -> Self {
        Self {
            http_caller: Box::new(http_caller),
            interceptors: Default::default(),
            use_https: true,
            appended_user_agent: Default::default(),
            retry_max: DEFAULT_RETRY_MAX,
            host_retry_max: DEFAULT_HOST_RETRY_MAX,
            host_freeze_duration: DEFAULT_FREEZE_DURATION,
            backoff: Arc::new(FixedBackoff::default()),
            authorization: None,
            uplog_sink: Arc::new(LogUplogSink),
            host_freezer: Default::default(),
            anti_hijacking: true,
            debug: false,
        }
    }

    /// 设置是否使用 HTTPS，默认为使用
    #[inline]
    pub fn use_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    /// 设置追加的 UserAgent
    #[inline]
    pub fn appended_user_agent(mut self, appended_user_agent: impl Into<String>) -> Self {
        self.appended_user_agent = appended_user_agent.into();
        self
    }

    /// 添加用户拦截器
    #[inline]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// 设置单主机最大重试次数，默认为 2
    #[inline]
    pub fn retry_max(mut self, retry_max: usize) -> Self {
        self.retry_max = retry_max;
        self
    }

    /// 设置最多切换主机的次数，默认为 3
    #[inline]
    pub fn host_retry_max(mut self, host_retry_max: usize) -> Self {
        self.host_retry_max = host_retry_max;
        self
    }

    /// 设置主机冻结时长，默认为 600 秒
    #[inline]
    pub fn host_freeze_duration(mut self, host_freeze_duration: Duration) -> Self {
        self.host_freeze_duration = host_freeze_duration;
        self
    }

    /// 设置重试退避时长
    #[inline]
    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// 设置默认使用的认证信息，所有没有单独设置签名方式的请求都将使用七牛签名算法 V2 签名
    #[inline]
    pub fn credential(mut self, credential: impl CredentialProvider + 'static) -> Self {
        self.authorization = Some(Authorization::v2(credential));
        self
    }

    /// 设置打点日志接收器
    #[inline]
    pub fn uplog_sink(mut self, uplog_sink: impl UplogSink + 'static) -> Self {
        self.uplog_sink = Arc::new(uplog_sink);
        self
    }

    /// 设置主机冻结记录，可以在多个客户端之间共享
    #[inline]
    pub fn host_freezer(mut self, host_freezer: HostFreezer) -> Self {
        self.host_freezer = host_freezer;
        self
    }

    /// 设置是否检查响应被劫持，默认为检查
    #[inline]
    pub fn anti_hijacking(mut self, anti_hijacking: bool) -> Self {
        self.anti_hijacking = anti_hijacking;
        self
    }

    /// 设置是否输出调试日志
    #[inline]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 构建 HTTP 客户端
    pub fn build(self) -> Client {
        let Self {
            http_caller,
            mut interceptors,
            use_https,
            appended_user_agent,
            retry_max,
            host_retry_max,
            host_freeze_duration,
            backoff,
            authorization,
            uplog_sink,
            host_freezer,
            anti_hijacking,
            debug,
        } = self;
        interceptors.push(Box::new(HostsRetryInterceptor::new(
            host_retry_max,
            host_freeze_duration,
            backoff.to_owned(),
        )));
        interceptors.push(Box::new(SimpleRetryInterceptor::new(retry_max, backoff)));
        interceptors.push(Box::new(DefaultHeaderInterceptor));
        interceptors.push(Box::new(AuthInterceptor::new(authorization)));
        if anti_hijacking {
            interceptors.push(Box::new(AntiHijackingInterceptor));
        }
        interceptors.push(Box::new(BufferResponseInterceptor));
        interceptors.push(Box::new(UplogInterceptor::new(uplog_sink.to_owned())));
        if debug {
            interceptors.push(Box::new(DebugInterceptor));
        }
        interceptors.sort_by_key(|interceptor| interceptor.priority());
        Client {
            inner: Arc::new(ClientInner {
                http_caller,
                interceptors: interceptors.into_boxed_slice(),
                use_https,
                appended_user_agent: appended_user_agent.into_boxed_str(),
                host_freezer,
                uplog_sink,
            }),
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("http_caller", &self.http_caller)
            .field("use_https", &self.use_https)
            .field("retry_max", &self.retry_max)
            .field("host_retry_max", &self.host_retry_max)
            .field("host_freeze_duration", &self.host_freeze_duration)
            .field("anti_hijacking", &self.anti_hijacking)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::super::test_utils::{make_client_builder, make_response, FakeHttpCaller, RecordingBackoff},
        super::priority,
        super::super::X_LOG_HEADER_NAME,
        *,
    };
    use qiniu_http::{
        header::{AUTHORIZATION, USER_AGENT},
        HeaderName, HeaderValue, Request as HttpRequest, RequestBody, ResponseBody,
        ResponseErrorKind as HttpResponseErrorKind, StatusCode,
    };
    use qiniu_http::Context;
    use std::{
        io::Cursor,
        thread::{self, sleep},
        time::Instant,
    };

    #[derive(Debug)]
    struct OrderRecorder(u32);

    impl Interceptor for OrderRecorder {
        fn priority(&self) -> u32 {
            self.0
        }

        fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
            next.call(request)
        }
    }

    #[test]
    fn test_interceptors_are_sorted_by_priority() {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(200, "{}")));
        let client = make_client_builder(caller)
            .interceptor(OrderRecorder(750))
            .interceptor(OrderRecorder(50))
            .debug(true)
            .build();
        let priorities = client
            .interceptors()
            .iter()
            .map(|interceptor| interceptor.priority())
            .collect::<Vec<_>>();
        assert_eq!(
            priorities,
            vec![
                50,
                priority::HOSTS_RETRY,
                priority::SIMPLE_RETRY,
                priority::DEFAULT_HEADER,
                priority::AUTH,
                priority::ANTI_HIJACKING,
                priority::BUFFER_RESPONSE,
                priority::UPLOG,
                750,
                priority::DEBUG,
            ]
        );
    }

    #[test]
    fn test_simple_retry_retries_exactly_retry_max_times() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(503, "{\"error\":\"service unavailable\"}")));
        let client = make_client_builder(caller.to_owned())
            .retry_max(2)
            .host_retry_max(0)
            .build();
        let err = client
            .request(Method::POST, client.host_provider(["up.qiniup.com"]))
            .path("/mkblk/4")
            .octet_stream_body(b"data".to_vec())
            .call()
            .unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::StatusCodeError(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("service unavailable"));
        assert_eq!(caller.calls(), 3);
        Ok(())
    }

    #[test]
    fn test_unresettable_body_is_never_retried() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(503, "")));
        let client = make_client_builder(caller.to_owned()).build();
        let body = RequestBody::from_reader(Cursor::new(b"data".to_vec()), 4);
        let err = client
            .request(Method::POST, client.host_provider(["up-a.qiniup.com", "up-b.qiniup.com"]))
            .octet_stream_body(body)
            .call()
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(caller.calls(), 1);
        Ok(())
    }

    #[test]
    fn test_permanent_errors_are_never_retried() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        for status_code in [400u16, 401, 612, 579, 701] {
            let caller = FakeHttpCaller::new(move |_, _| Ok(make_response(status_code, "")));
            let client = make_client_builder(caller.to_owned()).build();
            let err = client
                .request(Method::GET, client.host_provider(["rs-a.qbox.me", "rs-b.qbox.me"]))
                .call()
                .unwrap_err();
            assert_eq!(err.status_code().map(|code| code.as_u16()), Some(status_code));
            assert_eq!(caller.calls(), 1);
        }
        Ok(())
    }

    #[test]
    fn test_hosts_retry_freezes_failed_host() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|request, _| {
            if request.url().host_str() == Some("up-a.qiniup.com") {
                Ok(make_response(502, ""))
            } else {
                Ok(make_response(200, "{\"ok\":true}"))
            }
        });
        let client = make_client_builder(caller.to_owned()).retry_max(0).build();
        let response = client
            .request(Method::POST, client.host_provider(["up-a.qiniup.com", "up-b.qiniup.com"]))
            .path("/buckets/test/objects/~/uploads")
            .query_pair("x", "1")
            .call()?;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(client.host_freezer().is_frozen("up-a.qiniup.com"));
        assert!(!client.host_freezer().is_frozen("up-b.qiniup.com"));

        let urls = caller.urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://up-a.qiniup.com/buckets/test/objects/~/uploads?x=1");
        assert_eq!(urls[1].as_str(), "https://up-b.qiniup.com/buckets/test/objects/~/uploads?x=1");

        // 被冻结的主机不会被再次选中
        client
            .request(Method::POST, client.host_provider(["up-a.qiniup.com", "up-b.qiniup.com"]))
            .call()?;
        assert_eq!(caller.urls()[2].host_str(), Some("up-b.qiniup.com"));
        Ok(())
    }

    #[test]
    fn test_hosts_retry_returns_last_failure_when_all_frozen() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(504, "")));
        let client = make_client_builder(caller.to_owned()).retry_max(0).build();
        let err = client
            .request(Method::GET, client.host_provider(["uc-a.qbox.me", "uc-b.qbox.me"]))
            .call()
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::GATEWAY_TIMEOUT));
        assert_eq!(caller.calls(), 2);

        let err = client
            .request(Method::GET, client.host_provider(["uc-a.qbox.me", "uc-b.qbox.me"]))
            .call()
            .unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::NoTry);
        assert_eq!(caller.calls(), 2);
        Ok(())
    }

    #[test]
    fn test_anti_hijacking() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| {
            Ok(HttpResponse::builder()
                .status_code(StatusCode::OK)
                .body(ResponseBody::from_bytes(b"<html>hijacked</html>".to_vec()))
                .build())
        });
        let client = make_client_builder(caller.to_owned()).build();
        let err = client
            .request(Method::GET, client.host_provider(["rs.qbox.me"]))
            .call()
            .unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::MaliciousResponse);
        assert_eq!(caller.calls(), 1);

        let caller = FakeHttpCaller::new(|_, _| {
            Ok(HttpResponse::builder()
                .status_code(StatusCode::OK)
                .header(HeaderName::from_static(X_LOG_HEADER_NAME), HeaderValue::from_static("fake-xlog"))
                .body(ResponseBody::from_bytes(b"{}".to_vec()))
                .build())
        });
        let client = make_client_builder(caller.to_owned()).build();
        let response = client.request(Method::GET, client.host_provider(["rs.qbox.me"])).call()?;
        assert_eq!(response.x_log(), Some(&HeaderValue::from_static("fake-xlog")));

        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(200, "{}")));
        let client = make_client_builder(caller.to_owned()).build();
        let response = client.request(Method::GET, client.host_provider(["rs.qbox.me"])).call()?;
        assert_eq!(response.x_reqid(), Some(&HeaderValue::from_static("fake-reqid")));
        Ok(())
    }

    #[test]
    fn test_default_headers_and_authorization() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|request, _| {
            let user_agent = request.headers().get(USER_AGENT).unwrap().to_str().unwrap();
            assert!(user_agent.starts_with("QiniuRust/qiniu-http-"));
            assert!(user_agent.ends_with("/test-suite"));
            assert!(request.headers().contains_key("x-qiniu-date"));
            assert_eq!(
                request.headers().get(AUTHORIZATION),
                Some(&HeaderValue::from_static("UpToken fake-upload-token"))
            );
            Ok(make_response(200, "{\"key\":\"fake-key\"}"))
        });
        let client = make_client_builder(caller.to_owned())
            .appended_user_agent("/test-suite")
            .build();
        let value: serde_json::Value = client
            .request(Method::POST, client.host_provider(["up.qiniup.com"]))
            .authorization(Authorization::uptoken("fake-upload-token"))
            .buffer_response()
            .call()?
            .parse_json()?;
        assert_eq!(value["key"], "fake-key");
        assert_eq!(caller.calls(), 1);
        Ok(())
    }

    #[test]
    fn test_transport_errors_are_retried() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|request, nth| {
            if nth == 0 {
                Err(qiniu_http::ResponseError::new_with_msg(
                    HttpResponseErrorKind::ConnectError,
                    "connection refused",
                )
                .url(request.url()))
            } else {
                Ok(make_response(200, "{}"))
            }
        });
        let client = make_client_builder(caller.to_owned()).build();
        client
            .request(Method::PUT, client.host_provider(["up.qiniup.com"]))
            .octet_stream_body(b"part".to_vec())
            .call()?;
        assert_eq!(caller.calls(), 2);
        assert!(!client.host_freezer().is_frozen("up.qiniup.com"));
        Ok(())
    }

    #[test]
    fn test_no_host_is_no_try() {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(200, "{}")));
        let client = make_client_builder(caller.to_owned()).build();
        let err = client
            .request(Method::GET, client.host_provider(Vec::<String>::new()))
            .call()
            .unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::NoTry);
        assert_eq!(caller.calls(), 0);
    }

    #[test]
    fn test_simple_retry_waits_for_backoff() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(503, "")));
        let backoff = RecordingBackoff::new(Duration::from_millis(20));
        let client = make_client_builder(caller.to_owned())
            .backoff(backoff.to_owned())
            .retry_max(2)
            .host_retry_max(0)
            .build();
        let begin_at = Instant::now();
        client
            .request(Method::POST, client.host_provider(["up.qiniup.com"]))
            .octet_stream_body(b"data".to_vec())
            .call()
            .unwrap_err();
        assert_eq!(caller.calls(), 3);
        assert_eq!(
            backoff.asked(),
            vec![(1, Duration::from_millis(20)), (2, Duration::from_millis(40))]
        );
        assert!(begin_at.elapsed() >= Duration::from_millis(60));
        Ok(())
    }

    #[test]
    fn test_hosts_retry_waits_for_backoff() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(502, "")));
        let backoff = RecordingBackoff::new(Duration::from_millis(10));
        let client = make_client_builder(caller.to_owned())
            .backoff(backoff.to_owned())
            .retry_max(0)
            .host_retry_max(3)
            .build();
        let err = client
            .request(
                Method::GET,
                client.host_provider(["uc-a.qbox.me", "uc-b.qbox.me", "uc-c.qbox.me"]),
            )
            .call()
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(caller.calls(), 3);
        assert_eq!(
            backoff.asked(),
            vec![(1, Duration::from_millis(10)), (2, Duration::from_millis(20))]
        );
        assert_eq!(
            caller
                .urls()
                .iter()
                .map(|url| url.host_str().unwrap_or_default().to_owned())
                .collect::<Vec<_>>(),
            ["uc-a.qbox.me", "uc-b.qbox.me", "uc-c.qbox.me"]
        );
        Ok(())
    }

    #[test]
    fn test_cancel_during_backoff() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        let caller = FakeHttpCaller::new(|_, _| Ok(make_response(503, "")));
        let client = make_client_builder(caller.to_owned())
            .backoff(FixedBackoff::new(Duration::from_secs(1)))
            .retry_max(2)
            .host_retry_max(0)
            .build();
        let context = Context::background();
        let canceller = {
            let context = context.to_owned();
            thread::spawn(move || {
                sleep(Duration::from_millis(100));
                context.cancel();
            })
        };
        let begin_at = Instant::now();
        let err = client
            .request(Method::POST, client.host_provider(["up.qiniup.com"]))
            .octet_stream_body(b"data".to_vec())
            .context(context)
            .call()
            .unwrap_err();
        canceller.join().unwrap();
        assert_eq!(err.kind(), ResponseErrorKind::HttpError(HttpResponseErrorKind::UserCanceled));
        assert!(begin_at.elapsed() < Duration::from_millis(900));
        assert_eq!(caller.calls(), 1);
        Ok(())
    }

    #[test]
    fn test_default_host_freeze_duration() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();
        assert_eq!(HostsRetryInterceptor::default().freeze_duration(), DEFAULT_FREEZE_DURATION);
        assert_eq!(DEFAULT_FREEZE_DURATION, Duration::from_secs(600));

        let caller = FakeHttpCaller::new(|request, _| {
            if request.url().host_str() == Some("up-a.qiniup.com") {
                Ok(make_response(502, ""))
            } else {
                Ok(make_response(200, "{}"))
            }
        });
        let freezer = HostFreezer::default();
        let client = make_client_builder(caller.to_owned())
            .host_freezer(freezer.to_owned())
            .retry_max(0)
            .build();
        client
            .request(Method::GET, client.host_provider(["up-a.qiniup.com", "up-b.qiniup.com"]))
            .call()?;
        assert!(freezer.is_frozen("up-a.qiniup.com"));
        assert!(freezer.frozen_cause("up-a.qiniup.com").is_some());
        Ok(())
    }
}
