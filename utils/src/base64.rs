//! Base64 计算库
//!
//! 提供简单的 URLSafe Base64 计算库，对象名称、上传凭证和自定义变量都使用它编码

pub use base64::DecodeError;

/// 以 URL 安全的方式，将指定的二进制数据编码为 Base64 字符串
#[inline]
pub fn urlsafe(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE)
}

/// 以 URL 安全的方式，将指定的二进制数据编码后追加到字符串末尾
#[inline]
pub fn urlsafe_buf(data: &[u8], encoded: &mut String) {
    base64::encode_config_buf(data, base64::URL_SAFE, encoded)
}

/// 以 URL 安全的方式，将指定的 Base64 字符串解码为二进制数据
///
/// 同时接受有填充和无填充的输入
pub fn decode(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let trimmed = data.strip_suffix(b"==").or_else(|| data.strip_suffix(b"=")).unwrap_or(data);
    base64::decode_config(trimmed, base64::URL_SAFE_NO_PAD)
}
