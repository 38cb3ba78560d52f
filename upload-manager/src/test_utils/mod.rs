use md5::{Digest, Md5};
use qiniu_http_client::{
    http::{
        header::CONTENT_TYPE, HeaderValue, HttpCaller, Method, Request as HttpRequest, Response as HttpResponse,
        ResponseBody, ResponseError as HttpResponseError, ResponseErrorKind as HttpResponseErrorKind,
        ResponseResult, StatusCode,
    },
    Client, FixedBackoff, NoopUplogSink, X_REQ_ID_HEADER_NAME,
};
use qiniu_utils::base64;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::{SystemTime, UNIX_EPOCH},
};

type Hook = Box<dyn Fn(&Method, &str) -> Option<(u16, &'static str)> + Send + Sync>;
type ChunkCallback = Box<dyn Fn(usize) + Send + Sync>;

const FAKE_BUCKET: &str = "fake-bucket";
const FAKE_HASH: &str = "fake-hash";

/// 在内存中模拟七牛上传服务，支持表单上传，V1 和 V2 分片上传
pub(crate) struct FakeUploadServer {
    corrupt_crc32: bool,
    hook: Option<Hook>,
    on_chunk: Option<ChunkCallback>,
    unreachable_hosts: Vec<String>,
    chunk_uploads: AtomicUsize,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    paths: Vec<String>,
    hosts: Vec<String>,
    next_id: usize,
    blocks: HashMap<String, Vec<u8>>,
    uploads: HashMap<String, HashMap<u64, Vec<u8>>>,
    objects: HashMap<String, Vec<u8>>,
    form_fields: HashMap<String, String>,
}

#[derive(Default)]
pub(crate) struct FakeUploadServerBuilder {
    corrupt_crc32: bool,
    hook: Option<Hook>,
    on_chunk: Option<ChunkCallback>,
    unreachable_hosts: Vec<String>,
}

impl FakeUploadServerBuilder {
    /// 服务器返回错误的 crc32
    pub(crate) fn corrupt_crc32(mut self) -> Self {
        self.corrupt_crc32 = true;
        self
    }

    /// 在处理请求之前调用，返回 `Some` 时直接使用它作为响应状态码和响应体
    pub(crate) fn hook(
        mut self,
        hook: impl Fn(&Method, &str) -> Option<(u16, &'static str)> + Send + Sync + 'static,
    ) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// 每个分片上传成功后调用，参数为已经上传成功的分片总数
    pub(crate) fn on_chunk(mut self, on_chunk: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_chunk = Some(Box::new(on_chunk));
        self
    }

    /// 发往该主机的请求总是连接失败
    pub(crate) fn unreachable_host(mut self, host: impl Into<String>) -> Self {
        self.unreachable_hosts.push(host.into());
        self
    }

    pub(crate) fn build(self) -> Arc<FakeUploadServer> {
        Arc::new(FakeUploadServer {
            corrupt_crc32: self.corrupt_crc32,
            hook: self.hook,
            on_chunk: self.on_chunk,
            unreachable_hosts: self.unreachable_hosts,
            chunk_uploads: Default::default(),
            state: Default::default(),
        })
    }
}

impl FakeUploadServer {
    #[allow(clippy::new_ret_no_self)]
    pub(crate) fn new() -> FakeUploadServerBuilder {
        Default::default()
    }

    /// 创建不等待退避，不输出打点日志的客户端
    pub(crate) fn client(self: &Arc<Self>) -> Client {
        Client::builder(self.to_owned())
            .backoff(FixedBackoff::no_delay())
            .uplog_sink(NoopUplogSink)
            .build()
    }

    pub(crate) fn upload_token(&self) -> String {
        let policy = json!({ "scope": FAKE_BUCKET, "deadline": unix_now() + 3600 });
        format!("fake-ak:fake-sign:{}", base64::urlsafe(policy.to_string().as_bytes()))
    }

    /// 服务器收到的所有请求路径
    pub(crate) fn paths(&self) -> Vec<String> {
        self.lock_state().paths.to_owned()
    }

    /// 所有请求尝试连接的主机，包括无法连接的主机
    pub(crate) fn hosts(&self) -> Vec<String> {
        self.lock_state().hosts.to_owned()
    }

    pub(crate) fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.lock_state().objects.get(key).cloned()
    }

    pub(crate) fn form_field(&self, name: &str) -> Option<String> {
        self.lock_state().form_fields.get(name).cloned()
    }

    /// 上传成功的分片总数，V1 只统计 `mkblk`
    pub(crate) fn chunk_uploads(&self) -> usize {
        self.chunk_uploads.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn chunk_uploaded(&self) {
        let uploaded = self.chunk_uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(on_chunk) = self.on_chunk.as_ref() {
            on_chunk(uploaded);
        }
    }

    fn route(&self, method: &Method, path: &str, body: &[u8], content_type: &str) -> (u16, Value) {
        let segments = path.trim_start_matches('/').split('/').collect::<Vec<_>>();
        match (method, segments.as_slice()) {
            (&Method::POST, [""]) => self.form_upload(body, content_type),
            (&Method::POST, ["mkblk", _]) => self.put_block(None, body),
            (&Method::POST, ["bput", ctx, offset]) => match offset.parse() {
                Ok(offset) => self.put_block(Some((ctx, offset)), body),
                Err(_) => (400, json!({ "error": "invalid offset" })),
            },
            (&Method::POST, ["mkfile", size, params @ ..]) => self.make_file(size, params, body),
            (&Method::POST, ["buckets", _, "objects", _, "uploads"]) => self.init_parts(),
            (&Method::PUT, ["buckets", _, "objects", _, "uploads", upload_id, part_number]) => {
                self.upload_part(upload_id, part_number, body)
            }
            (&Method::POST, ["buckets", _, "objects", key, "uploads", upload_id]) => {
                self.complete_parts(key, upload_id, body)
            }
            _ => (404, json!({ "error": "no such route" })),
        }
    }

    fn put_block(&self, previous: Option<(&str, usize)>, body: &[u8]) -> (u16, Value) {
        let mut state = self.lock_state();
        let mut block = match previous {
            None => Vec::new(),
            Some((ctx, offset)) => match state.blocks.get(ctx) {
                Some(block) if block.len() == offset => block.to_owned(),
                Some(_) => return (400, json!({ "error": "offset mismatch" })),
                None => return (701, json!({ "error": "no such ctx" })),
            },
        };
        block.extend_from_slice(body);
        state.next_id += 1;
        let ctx = format!("ctx-{}", state.next_id);
        let offset = block.len();
        state.blocks.insert(ctx.to_owned(), block);
        drop(state);

        let mut crc32 = crc32fast::hash(body);
        if self.corrupt_crc32 {
            crc32 ^= 1;
        }
        if previous.is_none() {
            self.chunk_uploaded();
        }
        (
            200,
            json!({ "ctx": ctx, "crc32": crc32, "offset": offset, "expired_at": unix_now() + 86400 }),
        )
    }

    fn make_file(&self, size: &str, params: &[&str], body: &[u8]) -> (u16, Value) {
        let key = params
            .chunks(2)
            .find(|pair| pair[0] == "key")
            .and_then(|pair| pair.get(1))
            .and_then(|encoded| base64::decode(encoded.as_bytes()).ok())
            .and_then(|key| String::from_utf8(key).ok())
            .unwrap_or_else(|| FAKE_HASH.to_owned());
        let mut state = self.lock_state();
        let mut object = Vec::new();
        for ctx in String::from_utf8_lossy(body).split(',').filter(|ctx| !ctx.is_empty()) {
            match state.blocks.get(ctx) {
                Some(block) => object.extend_from_slice(block),
                None => return (701, json!({ "error": "no such ctx" })),
            }
        }
        if size.parse::<usize>().ok() != Some(object.len()) {
            return (400, json!({ "error": "file size mismatch" }));
        }
        state.objects.insert(key.to_owned(), object);
        (200, json!({ "key": key, "hash": FAKE_HASH }))
    }

    fn init_parts(&self) -> (u16, Value) {
        let mut state = self.lock_state();
        state.next_id += 1;
        let upload_id = format!("upload-{}", state.next_id);
        state.uploads.insert(upload_id.to_owned(), Default::default());
        (
            200,
            json!({ "uploadId": upload_id, "expireAt": unix_now() + 7 * 86400 }),
        )
    }

    fn upload_part(&self, upload_id: &str, part_number: &str, body: &[u8]) -> (u16, Value) {
        let part_number = match part_number.parse::<u64>() {
            Ok(part_number) => part_number,
            Err(_) => return (400, json!({ "error": "invalid part number" })),
        };
        match self.lock_state().uploads.get_mut(upload_id) {
            Some(parts) => parts.insert(part_number, body.to_vec()),
            None => return (612, json!({ "error": "no such uploadId" })),
        };
        self.chunk_uploaded();
        (
            200,
            json!({ "etag": format!("etag-{part_number}"), "md5": hex::encode(Md5::digest(body)) }),
        )
    }

    fn complete_parts(&self, encoded_key: &str, upload_id: &str, body: &[u8]) -> (u16, Value) {
        let request: Value = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(_) => return (400, json!({ "error": "invalid json" })),
        };
        let key = match encoded_key {
            "~" => FAKE_HASH.to_owned(),
            encoded => match base64::decode(encoded.as_bytes()).ok().and_then(|key| String::from_utf8(key).ok()) {
                Some(key) => key,
                None => return (400, json!({ "error": "invalid key" })),
            },
        };
        let mut state = self.lock_state();
        let parts = match state.uploads.remove(upload_id) {
            Some(parts) => parts,
            None => return (612, json!({ "error": "no such uploadId" })),
        };
        let mut object = Vec::new();
        for part in request["parts"].as_array().into_iter().flatten() {
            match part["partNumber"].as_u64().and_then(|part_number| parts.get(&part_number)) {
                Some(data) => object.extend_from_slice(data),
                None => return (400, json!({ "error": "no such part" })),
            }
        }
        state.objects.insert(key.to_owned(), object);
        (200, json!({ "key": key, "hash": FAKE_HASH, "fname": request["fname"] }))
    }

    fn form_upload(&self, body: &[u8], content_type: &str) -> (u16, Value) {
        let boundary = match content_type.split("boundary=").nth(1) {
            Some(boundary) => boundary,
            None => return (400, json!({ "error": "not a multipart request" })),
        };
        let mut state = self.lock_state();
        let mut file = None;
        for (name, data) in parse_multipart(body, boundary) {
            if name == "file" {
                file = Some(data);
            } else {
                state
                    .form_fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
        let file = match file {
            Some(file) => file,
            None => return (400, json!({ "error": "file is missing" })),
        };
        if state.form_fields.get("crc32") != Some(&crc32fast::hash(&file).to_string()) {
            return (406, json!({ "error": "crc32 mismatch" }));
        }
        let key = state
            .form_fields
            .get("key")
            .cloned()
            .unwrap_or_else(|| FAKE_HASH.to_owned());
        state.objects.insert(key.to_owned(), file);
        (200, json!({ "key": key, "hash": FAKE_HASH }))
    }
}

impl HttpCaller for FakeUploadServer {
    fn call(&self, request: &mut HttpRequest) -> ResponseResult {
        let host = request.url().host_str().unwrap_or_default().to_owned();
        self.lock_state().hosts.push(host.to_owned());
        if self.unreachable_hosts.contains(&host) {
            return Err(HttpResponseError::new_with_msg(
                HttpResponseErrorKind::ConnectError,
                format!("{host} is unreachable"),
            ));
        }
        let method = request.method().to_owned();
        let path = request.url().path().to_owned();
        self.lock_state().paths.push(path.to_owned());
        if let Some((status_code, body)) = self.hook.as_ref().and_then(|hook| hook(&method, &path)) {
            return Ok(make_response(status_code, body));
        }
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = request.body().as_bytes().unwrap_or_default().to_vec();
        let (status_code, body) = self.route(&method, &path, &body, &content_type);
        Ok(make_response(status_code, body.to_string()))
    }
}

impl fmt::Debug for FakeUploadServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeUploadServer")
            .field("chunk_uploads", &self.chunk_uploads)
            .finish()
    }
}

fn make_response(status_code: u16, body: impl Into<Vec<u8>>) -> HttpResponse {
    HttpResponse::builder()
        .status_code(StatusCode::from_u16(status_code).unwrap())
        .header(
            X_REQ_ID_HEADER_NAME.parse().unwrap(),
            HeaderValue::from_static("fake-reqid"),
        )
        .body(ResponseBody::from_bytes(body))
        .build()
}

fn parse_multipart(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
    let delimiter = format!("--{boundary}\r\n");
    let closing = format!("\r\n--{boundary}");
    let mut parts = Vec::new();
    for segment in split_bytes(body, delimiter.as_bytes()).into_iter().skip(1) {
        let pieces = split_bytes(segment, closing.as_bytes());
        let segment = match pieces.as_slice() {
            [last, _, ..] => *last,
            _ => segment.strip_suffix(b"\r\n").unwrap_or(segment),
        };
        let headers_end = match find_bytes(segment, b"\r\n\r\n") {
            Some(headers_end) => headers_end,
            None => continue,
        };
        let headers = String::from_utf8_lossy(&segment[..headers_end]);
        let name = headers
            .split("form-data; name=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap_or_default()
            .to_owned();
        parts.push((name, segment[headers_end + 4..].to_vec()));
    }
    parts
}

fn split_bytes<'a>(mut haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    while let Some(found) = find_bytes(haystack, needle) {
        pieces.push(&haystack[..found]);
        haystack = &haystack[found + needle.len()..];
    }
    pieces.push(haystack);
    pieces
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}
