use super::{priority, ApiResult, Handler, Interceptor};
use log::debug;
use qiniu_http::{header::AUTHORIZATION, HeaderMap, Request as HttpRequest, Response as HttpResponse};

/// 调试拦截器
///
/// 将请求和响应的首行及头部输出到 `debug` 日志，`Authorization` 头会被隐藏
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugInterceptor;

impl Interceptor for DebugInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::DEBUG
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        debug!(
            "> {} {} {:?}\n{}",
            request.method(),
            request.url(),
            request.version(),
            dump_headers(request.headers(), "> ")
        );
        let result = next.call(request);
        match &result {
            Ok(response) => debug!(
                "< {:?} {}\n{}",
                response.version(),
                response.status_code(),
                dump_headers(response.headers(), "< ")
            ),
            Err(err) => debug!("< {} {}: {}", request.method(), request.url(), err),
        }
        result
    }
}

fn dump_headers(headers: &HeaderMap, prefix: &str) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                "***"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{prefix}{name}: {value}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use qiniu_http::HeaderValue;

    #[test]
    fn test_dump_headers_hides_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Qiniu ak:sign"));
        headers.insert("x-reqid", HeaderValue::from_static("fake-reqid"));
        let dumped = dump_headers(&headers, "> ");
        assert!(dumped.contains("> authorization: ***"));
        assert!(dumped.contains("> x-reqid: fake-reqid"));
        assert!(!dumped.contains("ak:sign"));
    }
}
