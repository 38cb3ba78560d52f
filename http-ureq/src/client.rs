use anyhow::Error as AnyError;
use qiniu_http::{
    header::{CONTENT_LENGTH, USER_AGENT},
    Context, HeaderName, HeaderValue, HttpCaller, Request, RequestBody, RequestParts, Response, ResponseBody,
    ResponseError, ResponseErrorKind, ResponseResult, StatusCode, Version,
};
use std::{
    fmt::Display,
    io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
};
use ureq::{Agent, Error as UreqError, ErrorKind as UreqErrorKind, Request as UreqRequest, Response as UreqResponse};

/// Ureq 客户端
#[derive(Debug, Clone)]
pub struct Client {
    client: Agent,
}

impl Client {
    /// 创建 Ureq 客户端
    #[inline]
    pub fn new(client: Agent) -> Self {
        Self { client }
    }
}

impl From<Agent> for Client {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::new(agent)
    }
}

impl Default for Client {
    #[inline]
    fn default() -> Self {
        Self { client: ureq::agent() }
    }
}

impl HttpCaller for Client {
    fn call(&self, request: &mut Request) -> ResponseResult {
        let ureq_request = make_ureq_request(&self.client, request)?;
        let (parts, body) = request.parts_and_body_mut();
        let mut cancelled = false;
        let result = ureq_request.send(CancellableBody {
            body,
            context: parts.context(),
            cancelled: &mut cancelled,
        });
        match result {
            Ok(response) => make_response(response, parts),
            Err(UreqError::Status(_, response)) => make_response(response, parts),
            Err(UreqError::Transport(transport)) if cancelled => {
                Err(ResponseError::new(ResponseErrorKind::UserCanceled, transport).url(parts.url()))
            }
            Err(UreqError::Transport(transport)) => {
                let kind = transport.kind();
                Err(from_ureq_error(kind, AnyError::new(transport), parts))
            }
        }
    }
}

fn make_ureq_request(agent: &Agent, request: &Request) -> Result<UreqRequest, ResponseError> {
    let mut request_builder = agent.request(request.method().as_str(), request.url().as_str());
    for (header_name, header_value) in request.headers() {
        request_builder = set_header_for_request_builder(request_builder, request, header_name, header_value)?;
    }
    let user_agent = request.user_agent() + "/qiniu-ureq";
    request_builder = request_builder.set(USER_AGENT.as_str(), &user_agent);
    request_builder = request_builder.set(CONTENT_LENGTH.as_str(), &request.body().size().to_string());
    Ok(request_builder)
}

fn make_response(response: UreqResponse, request: &RequestParts) -> ResponseResult {
    let mut response_builder = Response::builder()
        .status_code(status_code_of_response(&response, request)?)
        .version(parse_http_version(response.http_version(), request)?);
    for header_name_str in response.headers_names().into_iter() {
        if let Some(header_value_str) = response.header(&header_name_str) {
            let header_name = HeaderName::from_bytes(header_name_str.as_bytes())
                .map_err(|err| build_header_error(request, &header_name_str, &err))?;
            let header_value = HeaderValue::from_bytes(header_value_str.as_bytes())
                .map_err(|err| build_header_error(request, header_value_str, &err))?;
            response_builder = response_builder.header(header_name, header_value);
        }
    }
    Ok(response_builder
        .body(ResponseBody::from_reader(response.into_reader()))
        .build())
}

fn build_header_error(request: &RequestParts, header: &str, err: &dyn Display) -> ResponseError {
    ResponseError::new_with_msg(ResponseErrorKind::InvalidHeader, format!("invalid header({header}): {err}"))
        .url(request.url())
}

fn set_header_for_request_builder(
    request_builder: UreqRequest,
    request: &RequestParts,
    header_name: &HeaderName,
    header_value: &HeaderValue,
) -> Result<UreqRequest, ResponseError> {
    let value = header_value
        .to_str()
        .map_err(|err| build_header_error(request, header_name.as_str(), &err))?;
    Ok(request_builder.set(header_name.as_str(), value))
}

fn status_code_of_response(response: &UreqResponse, request: &RequestParts) -> Result<StatusCode, ResponseError> {
    StatusCode::from_u16(response.status()).map_err(|err| {
        ResponseError::new_with_msg(
            ResponseErrorKind::InvalidRequestResponse,
            format!("invalid status code({}): {}", response.status(), err),
        )
        .url(request.url())
    })
}

fn parse_http_version(version: &str, request: &RequestParts) -> Result<Version, ResponseError> {
    match version {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3.0" => Ok(Version::HTTP_3),
        _ => Err(ResponseError::new_with_msg(
            ResponseErrorKind::InvalidRequestResponse,
            format!("invalid http version: {version}"),
        )
        .url(request.url())),
    }
}

fn from_ureq_error(kind: UreqErrorKind, err: AnyError, request: &RequestParts) -> ResponseError {
    let response_error_kind = match kind {
        UreqErrorKind::InvalidUrl => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::UnknownScheme => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::Dns => ResponseErrorKind::DnsServerError,
        UreqErrorKind::ConnectionFailed => ResponseErrorKind::ConnectError,
        UreqErrorKind::TooManyRedirects => ResponseErrorKind::TooManyRedirect,
        UreqErrorKind::BadStatus => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::BadHeader => ResponseErrorKind::InvalidHeader,
        UreqErrorKind::Io => io_error_kind(&err),
        UreqErrorKind::InvalidProxyUrl => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyConnect => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyUnauthorized => ResponseErrorKind::ProxyError,
        UreqErrorKind::HTTP => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::InsecureRequestHttpsOnly => ResponseErrorKind::SslError,
    };
    ResponseError::new(response_error_kind, err).url(request.url())
}

fn io_error_kind(err: &AnyError) -> ResponseErrorKind {
    let io_kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<IoError>())
        .map(|io_err| io_err.kind());
    match io_kind {
        Some(IoErrorKind::TimedOut) | Some(IoErrorKind::WouldBlock) => ResponseErrorKind::TimeoutError,
        Some(IoErrorKind::ConnectionRefused) => ResponseErrorKind::ConnectError,
        Some(IoErrorKind::ConnectionReset) | Some(IoErrorKind::ConnectionAborted) | Some(IoErrorKind::BrokenPipe) => {
            ResponseErrorKind::SendError
        }
        Some(IoErrorKind::UnexpectedEof) => ResponseErrorKind::ReceiveError,
        _ => ResponseErrorKind::LocalIoError,
    }
}

struct CancellableBody<'a> {
    body: &'a mut RequestBody,
    context: &'a Context,
    cancelled: &'a mut bool,
}

impl Read for CancellableBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if self.context.is_cancelled() {
            *self.cancelled = true;
            return Err(IoError::new(IoErrorKind::Other, "request is cancelled by context"));
        }
        self.body.read(buf)
    }
}
