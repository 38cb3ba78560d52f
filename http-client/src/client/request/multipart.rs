use mime::Mime;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rand::random;
use std::fmt::Write;

/// Multipart 表单组件
#[derive(Debug, Clone, Default)]
pub struct Part {
    body: Vec<u8>,
    file_name: Option<String>,
    mime: Option<Mime>,
}

impl Part {
    /// 创建字符串表单组件
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::bytes(value.into().into_bytes())
    }

    /// 创建二进制数据表单组件
    #[inline]
    #[must_use]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            body: value.into(),
            ..Default::default()
        }
    }

    /// 设置表单组件的文件名
    #[inline]
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// 设置表单组件的 MIME 类型
    #[inline]
    #[must_use]
    pub fn mime(mut self, mime: Mime) -> Self {
        self.mime = Some(mime);
        self
    }
}

/// Multipart 表单
///
/// 表单组件都保存在内存中，适合较小的请求体
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    parts: Vec<(String, Part)>,
}

impl Default for Multipart {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// 创建 Multipart 表单
    #[inline]
    pub fn new() -> Self {
        Self {
            boundary: gen_boundary(),
            parts: Default::default(),
        }
    }

    /// 添加 Multipart 表单组件
    #[inline]
    #[must_use]
    pub fn add_part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.parts.push((name.into(), part));
        self
    }

    /// 获取表单边界
    #[inline]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// 获取表单的 Content-Type
    #[inline]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// 编码为请求体
    pub fn into_bytes(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.parts.iter().map(|(_, part)| part.body.len() + 256).sum());
        for (name, part) in self.parts {
            buf.extend_from_slice(b"--");
            buf.extend_from_slice(self.boundary.as_bytes());
            buf.extend_from_slice(b"\r\n");
            buf.extend_from_slice(&encode_headers(&name, &part));
            buf.extend_from_slice(b"\r\n\r\n");
            buf.extend_from_slice(&part.body);
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(self.boundary.as_bytes());
        buf.extend_from_slice(b"--\r\n");
        buf
    }
}

fn gen_boundary() -> String {
    let mut b = String::with_capacity(32);
    write!(b, "{:016x}{:016x}", random::<u64>(), random::<u64>()).ok();
    b
}

fn encode_headers(name: &str, part: &Part) -> Vec<u8> {
    let mut buf = b"content-disposition: form-data; ".to_vec();
    buf.extend_from_slice(format_parameter("name", name).as_bytes());
    if let Some(file_name) = part.file_name.as_ref() {
        buf.extend_from_slice(b"; ");
        buf.extend_from_slice(format_file_name(file_name).as_bytes());
    }
    if let Some(mime) = part.mime.as_ref() {
        buf.extend_from_slice(b"\r\ncontent-type: ");
        buf.extend_from_slice(mime.as_ref().as_bytes());
    }
    buf
}

fn format_file_name(filename: &str) -> String {
    let mut formatted = String::from("filename=\"");
    for c in filename.chars() {
        match c {
            '\\' => formatted.push_str("\\\\"),
            '"' => formatted.push_str("\\\""),
            '\r' => formatted.push_str("\\\r"),
            '\n' => formatted.push_str("\\\n"),
            c => formatted.push(c),
        }
    }
    formatted.push('"');
    formatted
}

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

fn format_parameter(name: &str, value: &str) -> String {
    let legal_value = utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string();
    if value.len() == legal_value.len() {
        format!("{name}=\"{value}\"")
    } else {
        format!("{name}*=utf-8''{legal_value}")
    }
}
