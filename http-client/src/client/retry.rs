use super::{ApiResult, ResponseError, ResponseErrorKind};
use qiniu_http::{Response as HttpResponse, ResponseErrorKind as HttpResponseErrorKind, StatusCode};

/// 这些状态码代表的是永久性的业务错误，即使属于 5xx 也不重试
const NEVER_RETRY_STATUS_CODES: &[u16] = &[
    501, 509, 573, 579, 608, 612, 614, 616, 618, 630, 631, 632, 640, 701,
];

/// 状态码是否值得在同一个主机上重试
pub fn is_status_code_retryable(status_code: StatusCode) -> bool {
    let code = status_code.as_u16();
    code >= 500 && !NEVER_RETRY_STATUS_CODES.contains(&code)
}

/// 状态码是否值得切换主机后重试
///
/// 除了可以重试的状态码以外，3xx 和 404 往往意味着请求到了错误的主机上
pub fn is_status_code_host_retryable(status_code: StatusCode) -> bool {
    is_status_code_retryable(status_code) || status_code.is_redirection() || status_code == StatusCode::NOT_FOUND
}

/// 错误是否值得重试
pub fn is_error_retryable(error: &ResponseError) -> bool {
    match error.kind() {
        ResponseErrorKind::HttpError(kind) => is_http_error_kind_retryable(kind),
        ResponseErrorKind::StatusCodeError(status_code) => is_status_code_retryable(status_code),
        ResponseErrorKind::UnexpectedEof => true,
        _ => false,
    }
}

/// 错误是否值得切换主机后重试
///
/// 疑似被劫持的响应不会在原主机上重试，但是应该切换主机
pub fn is_error_host_retryable(error: &ResponseError) -> bool {
    match error.kind() {
        ResponseErrorKind::StatusCodeError(status_code) | ResponseErrorKind::UnexpectedStatusCode(status_code) => {
            is_status_code_host_retryable(status_code)
        }
        ResponseErrorKind::MaliciousResponse => true,
        _ => is_error_retryable(error),
    }
}

fn is_http_error_kind_retryable(kind: HttpResponseErrorKind) -> bool {
    matches!(
        kind,
        HttpResponseErrorKind::ConnectError
            | HttpResponseErrorKind::ProxyError
            | HttpResponseErrorKind::DnsServerError
            | HttpResponseErrorKind::UnknownHostError
            | HttpResponseErrorKind::SendError
            | HttpResponseErrorKind::ReceiveError
            | HttpResponseErrorKind::TimeoutError
            | HttpResponseErrorKind::SslError
    )
}

/// 请求结果是否值得在同一个主机上重试
pub(super) fn is_result_retryable(result: &ApiResult<HttpResponse>) -> bool {
    match result {
        Ok(response) => is_status_code_retryable(response.status_code()),
        Err(err) => is_error_retryable(err),
    }
}

/// 请求结果是否值得切换主机后重试
pub(super) fn is_result_host_retryable(result: &ApiResult<HttpResponse>) -> bool {
    match result {
        Ok(response) => is_status_code_host_retryable(response.status_code()),
        Err(err) => is_error_host_retryable(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_retryable() -> anyhow::Result<()> {
        for code in [500u16, 502, 503, 504, 599, 571, 600] {
            assert!(is_status_code_retryable(StatusCode::from_u16(code)?), "{code}");
        }
        for code in [200u16, 301, 400, 401, 404, 413] {
            assert!(!is_status_code_retryable(StatusCode::from_u16(code)?), "{code}");
        }
        for code in NEVER_RETRY_STATUS_CODES {
            assert!(!is_status_code_retryable(StatusCode::from_u16(*code)?), "{code}");
            assert!(!is_status_code_host_retryable(StatusCode::from_u16(*code)?), "{code}");
        }
        Ok(())
    }

    #[test]
    fn test_status_code_host_retryable() -> anyhow::Result<()> {
        for code in [301u16, 302, 307, 404, 502, 503] {
            assert!(is_status_code_host_retryable(StatusCode::from_u16(code)?), "{code}");
        }
        for code in [200u16, 400, 401, 403, 612] {
            assert!(!is_status_code_host_retryable(StatusCode::from_u16(code)?), "{code}");
        }
        Ok(())
    }

    #[test]
    fn test_error_retryable() {
        let timeout = ResponseError::new_with_msg(HttpResponseErrorKind::TimeoutError.into(), "timeout");
        assert!(is_error_retryable(&timeout));
        assert!(is_error_host_retryable(&timeout));

        let local = ResponseError::new_with_msg(HttpResponseErrorKind::LocalIoError.into(), "disk failure");
        assert!(!is_error_retryable(&local));
        assert!(!is_error_host_retryable(&local));

        let cancelled = ResponseError::new_with_msg(HttpResponseErrorKind::UserCanceled.into(), "cancelled");
        assert!(!is_error_retryable(&cancelled));

        let malicious = ResponseError::new_with_msg(ResponseErrorKind::MaliciousResponse, "hijacked");
        assert!(!is_error_retryable(&malicious));
        assert!(is_error_host_retryable(&malicious));
    }
}
