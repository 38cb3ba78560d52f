use super::{
    integrity_error, sorted_pairs, Checkpoint, CheckpointRecord, DataChunk, MultiPartsUploader, MultiPartsVersion,
    PartProgress, UploadTarget,
};
use md5::{Digest, Md5};
use qiniu_http_client::{
    http::{HeaderName, HeaderValue, Method, ResponseErrorKind as HttpResponseErrorKind},
    ApiResult, ResponseError,
};
use qiniu_utils::base64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const CONTENT_MD5: &str = "content-md5";

/// V2 分片上传
///
/// 先初始化得到 `uploadId`，然后以任意顺序上传分片，最后按照分片编号合并所有分片
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MultiPartsV2Uploader;

/// V2 分片上传会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UploadSession {
    upload_id: String,
    expired_at: u64,
}

/// 已经上传的分片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PartEtag {
    part_number: u64,
    offset: u64,
    size: u64,
    etag: String,
}

impl PartProgress for PartEtag {
    #[inline]
    fn part_number(&self) -> u64 {
        self.part_number
    }

    #[inline]
    fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitPartsResponse {
    upload_id: String,
    expire_at: u64,
}

#[derive(Debug, Deserialize)]
struct UploadPartResponse {
    etag: String,
    #[serde(default)]
    md5: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletePartsRequest<'a> {
    parts: Vec<CompletedPart<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_vars: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletedPart<'a> {
    part_number: u64,
    etag: &'a str,
}

impl MultiPartsUploader for MultiPartsV2Uploader {
    type Session = UploadSession;
    type Progress = PartEtag;

    const VERSION: MultiPartsVersion = MultiPartsVersion::V2;
    const EXPIRED_STATUS_CODE: u16 = 612;

    fn initialize_parts(&self, target: &UploadTarget<'_>) -> ApiResult<UploadSession> {
        let response: InitPartsResponse = target
            .request(Method::POST, uploads_path(target))
            .authorization(target.authorization())
            .call()?
            .parse_json()?;
        Ok(UploadSession {
            upload_id: response.upload_id,
            expired_at: response.expire_at,
        })
    }

    fn upload_part(
        &self,
        target: &UploadTarget<'_>,
        session: &UploadSession,
        chunk: &DataChunk,
    ) -> ApiResult<PartEtag> {
        let md5 = hex::encode(Md5::digest(chunk.data()));
        let content_md5 = HeaderValue::from_str(&md5)
            .map_err(|err| ResponseError::new(HttpResponseErrorKind::InvalidHeader.into(), err))?;
        let response: UploadPartResponse = target
            .request(
                Method::PUT,
                format!(
                    "{}/{}/{}",
                    uploads_path(target),
                    session.upload_id,
                    chunk.part_number()
                ),
            )
            .authorization(target.authorization())
            .header(HeaderName::from_static(CONTENT_MD5), content_md5)
            .octet_stream_body(chunk.data().to_vec())
            .call()?
            .parse_json()?;
        if !response.md5.is_empty() && response.md5 != md5 {
            return Err(integrity_error(format!(
                "md5 mismatch in part {}: expected {md5}, server returned {}",
                chunk.part_number(),
                response.md5
            )));
        }
        Ok(PartEtag {
            part_number: chunk.part_number(),
            offset: chunk.offset(),
            size: chunk.size(),
            etag: response.etag,
        })
    }

    fn complete_parts(
        &self,
        target: &UploadTarget<'_>,
        session: &UploadSession,
        progresses: &[PartEtag],
    ) -> ApiResult<Value> {
        let params = target.params;
        let to_map = |pairs: Vec<(&str, &str)>| {
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_owned(), Value::String(value.to_owned())))
                .collect::<Map<_, _>>()
        };
        let request = CompletePartsRequest {
            parts: progresses
                .iter()
                .map(|progress| CompletedPart {
                    part_number: progress.part_number,
                    etag: &progress.etag,
                })
                .collect(),
            fname: params.file_name(),
            mime_type: params.content_type().map(ToString::to_string),
            metadata: to_map(sorted_pairs(params.metadata())),
            custom_vars: to_map(sorted_pairs(params.custom_vars())),
        };
        target
            .request(
                Method::POST,
                format!("{}/{}", uploads_path(target), session.upload_id),
            )
            .authorization(target.authorization())
            .json(&request)?
            .call()?
            .parse_json()
    }

    #[inline]
    fn session_expired_at(&self, session: &UploadSession) -> Option<u64> {
        Some(session.expired_at)
    }

    #[inline]
    fn wrap_checkpoint(record: CheckpointRecord<UploadSession, PartEtag>) -> Checkpoint {
        Checkpoint::V2(record)
    }

    #[inline]
    fn unwrap_checkpoint(checkpoint: Checkpoint) -> Option<CheckpointRecord<UploadSession, PartEtag>> {
        match checkpoint {
            Checkpoint::V2(record) => Some(record),
            _ => None,
        }
    }
}

/// 对象名称为空时使用 `~` 代替，由服务器生成对象名称
fn uploads_path(target: &UploadTarget<'_>) -> String {
    let encoded_object_name = target
        .params
        .object_name()
        .map_or_else(|| "~".to_owned(), |object_name| base64::urlsafe(object_name.as_bytes()));
    format!(
        "/buckets/{}/objects/{encoded_object_name}/uploads",
        target.token.bucket()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        super::super::{data_source::ChunkReader, test_utils::FakeUploadServer, ObjectParams, UploadToken},
        *,
    };
    use qiniu_http_client::{Region, ResponseErrorKind};

    #[test]
    fn test_upload_parts_in_any_order() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let server = FakeUploadServer::new().build();
        let client = server.client();
        let region = Region::builder("z0").add_up_preferred_endpoint("up.fake.com").build();
        let token = UploadToken::parse(server.upload_token())?;
        let params = ObjectParams::builder()
            .object_name("parts")
            .file_name("parts.bin")
            .insert_custom_var("k", "v")
            .build();
        let target = UploadTarget {
            client: &client,
            region: &region,
            token: &token,
            params: &params,
        };
        let data = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();
        let mut reader = ChunkReader::new(data.as_slice());
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk(300)? {
            chunks.push(chunk);
        }
        assert_eq!(chunks.len(), 4);

        let uploader = MultiPartsV2Uploader;
        let session = uploader.initialize_parts(&target)?;
        assert_eq!(uploader.session_expired_at(&session), Some(session.expired_at));
        let mut progresses = chunks
            .iter()
            .rev()
            .map(|chunk| uploader.upload_part(&target, &session, chunk))
            .collect::<ApiResult<Vec<_>>>()?;
        progresses.sort_by_key(|progress| progress.part_number);
        let response = uploader.complete_parts(&target, &session, &progresses)?;
        assert_eq!(response["key"], "parts");
        assert_eq!(server.object("parts"), Some(data));
        assert!(server.paths()[0].starts_with(&format!(
            "/buckets/{}/objects/{}/uploads",
            token.bucket(),
            base64::urlsafe(b"parts")
        )));
        Ok(())
    }

    #[test]
    fn test_expired_upload_id() -> anyhow::Result<()> {
        let server = FakeUploadServer::new()
            .hook(|method, path| {
                (*method == Method::POST && path.contains("/uploads/"))
                    .then_some((612, r#"{"error":"no such uploadId"}"#))
            })
            .build();
        let client = server.client();
        let region = Region::builder("z0").add_up_preferred_endpoint("up.fake.com").build();
        let token = UploadToken::parse(server.upload_token())?;
        let params = ObjectParams::default();
        let target = UploadTarget {
            client: &client,
            region: &region,
            token: &token,
            params: &params,
        };

        let uploader = MultiPartsV2Uploader;
        let session = uploader.initialize_parts(&target)?;
        let err = uploader.complete_parts(&target, &session, &[]).unwrap_err();
        assert!(matches!(err.kind(), ResponseErrorKind::StatusCodeError(code) if code.as_u16() == 612));
        assert!(uploader.is_expired_error(&err));
        assert_eq!(server.paths().len(), 2);
        assert!(server.paths()[0].contains("/objects/~/uploads"));
        Ok(())
    }
}
