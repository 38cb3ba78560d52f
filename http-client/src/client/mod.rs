mod authorization;
mod backoff;
mod client;
mod interceptor;
mod request;
mod response;
mod retry;

pub use authorization::Authorization;
pub use backoff::{Backoff, ExponentialBackoff, FixedBackoff, RandomizedBackoff};
pub use client::{Client, ClientBuilder};
pub use interceptor::{
    priority, AntiHijackingInterceptor, AuthInterceptor, BufferResponseInterceptor, DebugInterceptor,
    DefaultHeaderInterceptor, Handler, HostsRetryInterceptor, Interceptor, SimpleRetryInterceptor, UplogInterceptor,
};
pub use request::{Multipart, Part, RequestBuilder};
pub use response::{ApiResult, Response, ResponseError, ResponseErrorKind};
pub use retry::{is_error_host_retryable, is_error_retryable, is_status_code_host_retryable, is_status_code_retryable};
