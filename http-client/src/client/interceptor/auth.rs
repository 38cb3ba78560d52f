use super::{super::Authorization, priority, ApiResult, Handler, Interceptor};
use qiniu_http::{Request as HttpRequest, Response as HttpResponse};

/// 鉴权签名拦截器
///
/// 优先使用请求上设置的签名方式，否则使用客户端默认的签名方式，两者都没有时不做任何事
#[derive(Debug, Clone, Default)]
pub struct AuthInterceptor {
    default_authorization: Option<Authorization>,
}

impl AuthInterceptor {
    /// 创建鉴权签名拦截器
    #[inline]
    pub fn new(default_authorization: Option<Authorization>) -> Self {
        Self { default_authorization }
    }
}

impl Interceptor for AuthInterceptor {
    #[inline]
    fn priority(&self) -> u32 {
        priority::AUTH
    }

    fn intercept(&self, request: &mut HttpRequest, next: Handler<'_>) -> ApiResult<HttpResponse> {
        let authorization = request
            .extensions()
            .get::<Authorization>()
            .or(self.default_authorization.as_ref())
            .cloned();
        if let Some(authorization) = authorization {
            authorization.sign(request)?;
        }
        next.call(request)
    }
}
