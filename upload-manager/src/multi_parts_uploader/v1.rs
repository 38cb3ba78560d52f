use super::{
    integrity_error, sorted_pairs, Checkpoint, CheckpointRecord, DataChunk, MultiPartsUploader, MultiPartsVersion,
    PartProgress, UploadTarget,
};
use mime::TEXT_PLAIN_UTF_8;
use qiniu_http_client::{http::Method, ApiResult};
use qiniu_utils::base64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// V1 分片上传
///
/// 数据按照 4 MiB 切分为块，每个块通过 `mkblk` 上传第一片，再通过 `bput` 依次上传其余的片，
/// 最后通过 `mkfile` 将所有块合并为对象
#[derive(Debug, Clone, Copy)]
pub(crate) struct MultiPartsV1Uploader {
    chunk_size: u64,
}

impl MultiPartsV1Uploader {
    pub(crate) fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

/// 已经上传的块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BlockProgress {
    index: u64,
    offset: u64,
    size: u64,
    ctx: String,
    crc32: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expired_at: Option<u64>,
}

impl BlockProgress {
    #[cfg(test)]
    pub(crate) fn new(index: u64, offset: u64, size: u64, ctx: String, crc32: u32, expired_at: Option<u64>) -> Self {
        Self {
            index,
            offset,
            size,
            ctx,
            crc32,
            expired_at,
        }
    }
}

impl PartProgress for BlockProgress {
    #[inline]
    fn part_number(&self) -> u64 {
        self.index
    }

    #[inline]
    fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    fn expired_at(&self) -> Option<u64> {
        self.expired_at
    }
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    ctx: String,
    crc32: u32,
    offset: u64,
    // 没有返回过期时间的块视为不会过期
    #[serde(default)]
    expired_at: Option<u64>,
}

impl MultiPartsUploader for MultiPartsV1Uploader {
    type Session = ();
    type Progress = BlockProgress;

    const VERSION: MultiPartsVersion = MultiPartsVersion::V1;
    const EXPIRED_STATUS_CODE: u16 = 701;

    #[inline]
    fn initialize_parts(&self, _target: &UploadTarget<'_>) -> ApiResult<Self::Session> {
        Ok(())
    }

    fn upload_part(&self, target: &UploadTarget<'_>, _session: &(), chunk: &DataChunk) -> ApiResult<BlockProgress> {
        let block = chunk.data();
        let mut last_response: Option<BlockResponse> = None;
        for piece in block.chunks(usize::try_from(self.chunk_size).unwrap_or(usize::MAX)) {
            let (path, expected_offset) = match &last_response {
                None => (format!("/mkblk/{}", block.len()), piece.len() as u64),
                Some(response) => (
                    format!("/bput/{}/{}", response.ctx, response.offset),
                    response.offset + piece.len() as u64,
                ),
            };
            let response: BlockResponse = target
                .request(Method::POST, path)
                .authorization(target.authorization())
                .octet_stream_body(piece.to_vec())
                .call()?
                .parse_json()?;
            let crc32 = crc32fast::hash(piece);
            if response.crc32 != crc32 {
                return Err(integrity_error(format!(
                    "crc32 mismatch in block {}: expected {crc32}, server returned {}",
                    chunk.part_number(),
                    response.crc32
                )));
            }
            if response.offset != expected_offset {
                return Err(integrity_error(format!(
                    "offset mismatch in block {}: expected {expected_offset}, server returned {}",
                    chunk.part_number(),
                    response.offset
                )));
            }
            last_response = Some(response);
        }
        let response = last_response.ok_or_else(|| integrity_error("empty block can not be uploaded".to_owned()))?;
        Ok(BlockProgress {
            index: chunk.part_number(),
            offset: chunk.offset(),
            size: chunk.size(),
            ctx: response.ctx,
            crc32: crc32fast::hash(block),
            expired_at: response.expired_at,
        })
    }

    fn complete_parts(
        &self,
        target: &UploadTarget<'_>,
        _session: &(),
        progresses: &[BlockProgress],
    ) -> ApiResult<Value> {
        let file_size = progresses.iter().map(|progress| progress.size).sum();
        let body = progresses
            .iter()
            .map(|progress| progress.ctx.as_str())
            .collect::<Vec<_>>()
            .join(",");
        target
            .request(Method::POST, mkfile_path(target, file_size))
            .authorization(target.authorization())
            .body(body, &TEXT_PLAIN_UTF_8)
            .call()?
            .parse_json()
    }

    #[inline]
    fn wrap_checkpoint(record: CheckpointRecord<(), BlockProgress>) -> Checkpoint {
        Checkpoint::V1(record)
    }

    #[inline]
    fn unwrap_checkpoint(checkpoint: Checkpoint) -> Option<CheckpointRecord<(), BlockProgress>> {
        match checkpoint {
            Checkpoint::V1(record) => Some(record),
            _ => None,
        }
    }
}

fn mkfile_path(target: &UploadTarget<'_>, file_size: u64) -> String {
    let params = target.params;
    let mut path = format!("/mkfile/{file_size}");
    let mut append = |name: &str, value: &str| {
        path.push('/');
        path.push_str(name);
        path.push('/');
        base64::urlsafe_buf(value.as_bytes(), &mut path);
    };
    if let Some(object_name) = params.object_name() {
        append("key", object_name);
    }
    if let Some(file_name) = params.file_name() {
        append("fname", file_name);
    }
    if let Some(content_type) = params.content_type() {
        append("mimeType", content_type.as_ref());
    }
    for (name, value) in sorted_pairs(params.metadata()) {
        append(name, value);
    }
    for (name, value) in sorted_pairs(params.custom_vars()) {
        append(name, value);
    }
    path
}
