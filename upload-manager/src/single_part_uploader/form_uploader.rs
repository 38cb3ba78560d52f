use super::{
    super::{
        multi_parts_uploader::{sorted_pairs, UploadTarget},
        resumable_policy::V1_BLOCK_SIZE,
        DataSource,
    },
    SinglePartUploader,
};
use mime::APPLICATION_OCTET_STREAM;
use qiniu_http_client::{http::Method, ApiResult, Multipart, Part};
use serde_json::Value;

/// 表单上传
///
/// 将数据源完整读入内存，通过一次 Multipart 请求上传，适合较小的数据
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FormUploader;

impl SinglePartUploader for FormUploader {
    fn upload(&self, target: &UploadTarget<'_>, source: &dyn DataSource) -> ApiResult<Value> {
        let mut data = Vec::new();
        while let Some(chunk) = source.slice(V1_BLOCK_SIZE)? {
            data.extend(chunk.into_data());
        }
        target
            .request(Method::POST, "/")
            .multipart(make_multipart(target, data))
            .call()?
            .parse_json()
    }
}

fn make_multipart(target: &UploadTarget<'_>, data: Vec<u8>) -> Multipart {
    let params = target.params;
    let crc32 = crc32fast::hash(&data);
    let mut multipart = Multipart::new().add_part("token", Part::text(target.token.as_str()));
    if let Some(object_name) = params.object_name() {
        multipart = multipart.add_part("key", Part::text(object_name));
    }
    for (name, value) in sorted_pairs(params.custom_vars()) {
        multipart = multipart.add_part(name, Part::text(value));
    }
    for (name, value) in sorted_pairs(params.metadata()) {
        multipart = multipart.add_part(name, Part::text(value));
    }
    let file_name = params.file_name().or_else(|| params.object_name()).unwrap_or("untitled");
    let mime = params
        .content_type()
        .cloned()
        .unwrap_or(APPLICATION_OCTET_STREAM);
    multipart
        .add_part("crc32", Part::text(crc32.to_string()))
        .add_part("file", Part::bytes(data).file_name(file_name).mime(mime))
}

#[cfg(test)]
mod tests {
    use super::{
        super::super::{test_utils::FakeUploadServer, ObjectParams, SeekableDataSource, UploadToken},
        *,
    };
    use qiniu_http_client::Region;
    use std::io::Cursor;

    #[test]
    fn test_form_upload() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let server = FakeUploadServer::new().build();
        let client = server.client();
        let region = Region::builder("z0").add_up_preferred_endpoint("up.fake.com").build();
        let token = UploadToken::parse(server.upload_token())?;
        let params = ObjectParams::builder()
            .object_name("form.txt")
            .insert_custom_var("k", "v")
            .build();
        let target = UploadTarget {
            client: &client,
            region: &region,
            token: &token,
            params: &params,
        };
        let data = b"hello form upload".to_vec();
        let source = SeekableDataSource::new(Cursor::new(data.to_owned()))?;

        let response = FormUploader.upload(&target, &source)?;
        assert_eq!(response["key"], "form.txt");
        assert_eq!(server.object("form.txt"), Some(data));
        assert_eq!(server.paths(), vec!["/".to_owned()]);
        assert_eq!(server.form_field("x:k").as_deref(), Some("v"));
        Ok(())
    }
}
