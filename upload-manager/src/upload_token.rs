use assert_impl::assert_impl;
use qiniu_credential::Credential;
use qiniu_utils::base64;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

/// 上传凭证
///
/// 格式为 `<AccessKey>:<Sign>:<Base64 编码的上传策略>`，解析后可以从中得到 AccessKey 和存储空间名称，
/// 它们用于查询区域和生成断点恢复记录的 KEY
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadToken {
    token: Arc<str>,
    access_key: Arc<str>,
    bucket: Arc<str>,
    deadline: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UploadPolicy {
    scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deadline: Option<u64>,
}

impl UploadToken {
    /// 解析上传凭证
    pub fn parse(token: impl Into<String>) -> ParseResult<Self> {
        let token = token.into();
        let mut fields = token.splitn(3, ':');
        let (access_key, encoded_policy) = match (fields.next(), fields.next(), fields.next()) {
            (Some(access_key), Some(_), Some(encoded_policy)) if !access_key.is_empty() => {
                (access_key.to_owned(), encoded_policy)
            }
            _ => return Err(ParseError::InvalidUploadTokenFormat),
        };
        let policy: UploadPolicy = serde_json::from_slice(&base64::decode(encoded_policy.as_bytes())?)?;
        let bucket = policy
            .scope
            .split(':')
            .next()
            .filter(|bucket| !bucket.is_empty())
            .ok_or(ParseError::MissingBucket)?
            .to_owned();
        Ok(Self {
            access_key: access_key.into(),
            bucket: bucket.into(),
            deadline: policy.deadline,
            token: token.into(),
        })
    }

    /// 使用认证信息为存储空间签发上传凭证
    ///
    /// 如果指定了对象名称，凭证只能用于上传该对象
    pub fn sign(credential: &Credential, bucket: &str, object_name: Option<&str>, lifetime: Duration) -> Self {
        let deadline = SystemTime::now()
            .checked_add(lifetime)
            .unwrap_or_else(SystemTime::now)
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs());
        let policy = UploadPolicy {
            scope: match object_name {
                Some(object_name) => format!("{bucket}:{object_name}"),
                None => bucket.to_owned(),
            },
            deadline: Some(deadline),
        };
        // 只包含字符串和整数的结构体序列化不会失败
        let policy = serde_json::to_vec(&policy).unwrap_or_default();
        Self {
            token: credential.sign_with_data(&policy).into(),
            access_key: credential.access_key().into(),
            bucket: bucket.into(),
            deadline: Some(deadline),
        }
    }

    /// 获取 AccessKey
    #[inline]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// 获取存储空间名称
    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// 获取上传凭证的过期时间，UNIX 时间戳，单位为秒
    #[inline]
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// 获取上传凭证字符串
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl FromStr for UploadToken {
    type Err = ParseError;

    #[inline]
    fn from_str(token: &str) -> ParseResult<Self> {
        Self::parse(token)
    }
}

impl fmt::Display for UploadToken {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// 上传凭证解析错误
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// 上传凭证格式错误
    #[error("Invalid upload token format")]
    InvalidUploadTokenFormat,

    /// 上传策略 Base64 解码错误
    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    /// 上传策略 JSON 解析错误
    #[error("JSON decode error: {0}")]
    JsonDecodeError(#[from] serde_json::Error),

    /// 上传策略中缺少存储空间名称
    #[error("Upload policy has no bucket in scope")]
    MissingBucket,
}

/// 上传凭证解析结果
pub type ParseResult<T> = Result<T, ParseError>;
