use assert_impl::assert_impl;
use mime::Mime;
use qiniu_http_client::http::Context;
use std::{collections::HashMap, mem::take};

const CUSTOM_VAR_PREFIX: &str = "x:";
const METADATA_PREFIX: &str = "x-qn-meta-";

/// 对象上传参数
///
/// 表单上传和分片上传共用同一套参数
#[derive(Debug, Default, Clone)]
pub struct ObjectParams {
    object_name: Option<String>,
    file_name: Option<String>,
    content_type: Option<Mime>,
    metadata: HashMap<String, String>,
    custom_vars: HashMap<String, String>,
    context: Context,
}

impl ObjectParams {
    /// 创建对象上传参数构建器
    #[inline]
    pub fn builder() -> ObjectParamsBuilder {
        Default::default()
    }

    /// 获取对象名称
    #[inline]
    pub fn object_name(&self) -> Option<&str> {
        self.object_name.as_deref()
    }

    /// 获取文件名称
    #[inline]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// 获取 MIME 类型
    #[inline]
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// 获取对象元信息
    ///
    /// 所有的 KEY 都以 `x-qn-meta-` 开头
    #[inline]
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// 获取对象自定义变量
    ///
    /// 所有的 KEY 都以 `x:` 开头
    #[inline]
    pub fn custom_vars(&self) -> &HashMap<String, String> {
        &self.custom_vars
    }

    /// 获取上传上下文
    ///
    /// 取消该上下文将中止上传，已经上传的分片仍然记录在断点恢复记录中
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// 对象上传参数构建器
#[derive(Debug, Default)]
pub struct ObjectParamsBuilder(ObjectParams);

impl ObjectParamsBuilder {
    /// 设置对象名称
    #[inline]
    pub fn object_name(&mut self, object_name: impl Into<String>) -> &mut Self {
        self.0.object_name = Some(object_name.into());
        self
    }

    /// 设置文件名称
    #[inline]
    pub fn file_name(&mut self, file_name: impl Into<String>) -> &mut Self {
        self.0.file_name = Some(file_name.into());
        self
    }

    /// 设置 MIME 类型
    #[inline]
    pub fn content_type(&mut self, content_type: Mime) -> &mut Self {
        self.0.content_type = Some(content_type);
        self
    }

    /// 添加对象元信息
    ///
    /// KEY 如果不以 `x-qn-meta-` 开头，将会自动加上该前缀
    #[inline]
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.metadata.insert(with_prefix(key.into(), METADATA_PREFIX), value.into());
        self
    }

    /// 添加对象自定义变量
    ///
    /// KEY 如果不以 `x:` 开头，将会自动加上该前缀
    #[inline]
    pub fn insert_custom_var(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.custom_vars.insert(with_prefix(key.into(), CUSTOM_VAR_PREFIX), value.into());
        self
    }

    /// 设置上传上下文
    #[inline]
    pub fn context(&mut self, context: Context) -> &mut Self {
        self.0.context = context;
        self
    }

    /// 构建对象上传参数
    #[inline]
    pub fn build(&mut self) -> ObjectParams {
        take(&mut self.0)
    }
}

fn with_prefix(mut key: String, prefix: &str) -> String {
    if !key.starts_with(prefix) {
        key.insert_str(0, prefix);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_vars_are_prefixed() {
        let params = ObjectParams::builder()
            .object_name("test-key")
            .insert_custom_var("name", "value")
            .insert_custom_var("x:already", "prefixed")
            .insert_metadata("color", "blue")
            .build();
        assert_eq!(params.object_name(), Some("test-key"));
        assert_eq!(params.custom_vars().get("x:name").map(String::as_str), Some("value"));
        assert_eq!(params.custom_vars().get("x:already").map(String::as_str), Some("prefixed"));
        assert_eq!(params.custom_vars().len(), 2);
        assert_eq!(
            params.metadata().get("x-qn-meta-color").map(String::as_str),
            Some("blue")
        );
        assert!(!params.context().is_cancelled());
    }
}
