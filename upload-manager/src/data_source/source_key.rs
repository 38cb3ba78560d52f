use digest::{Digest, Output as DigestOutput};
use sha1::Sha1;
use std::fmt::{self, Debug, Display};

/// 数据源 KEY
///
/// 用于区分不同的上传会话，断点恢复记录器以它作为记录的 KEY
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceKey(DigestOutput<Sha1>);

impl SourceKey {
    /// 使用 SHA-1 对多个字段计算数据源 KEY
    ///
    /// 字段之间使用换行符分隔，避免字段拼接后产生歧义
    pub fn digest<'a>(fields: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha1::new();
        for (idx, field) in fields.into_iter().enumerate() {
            if idx > 0 {
                hasher.update(b"\n");
            }
            hasher.update(field);
        }
        Self(hasher.finalize())
    }

    /// 获取数据源 KEY 的二进制表示
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Display for SourceKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl Debug for SourceKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceKey").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key() {
        let key = SourceKey::digest([b"hello".as_slice()]);
        assert_eq!(key.to_string(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");

        let joined = SourceKey::digest([b"ab".as_slice(), b"c".as_slice()]);
        let shifted = SourceKey::digest([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(joined, shifted);
    }
}
