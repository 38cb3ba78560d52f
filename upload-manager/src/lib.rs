#![deny(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! # qiniu-upload-manager
//!
//! ## 七牛上传管理
//!
//! 基于 [`qiniu_http_client`] 实现对象上传：
//!
//! - 大小已知且小于阈值的数据使用表单上传；
//! - 其他数据使用 V1 或 V2 分片上传，多个线程并发上传分片，每个分片上传成功后写入断点恢复记录；
//! - 再次上传同一个本地文件时，从断点恢复记录中恢复，跳过已经上传的分片；
//! - 上传失败时，如果可以通过切换区域解决，将在区域组的下一个区域重新上传。
//!
//! ### 上传本地文件
//!
//! ```no_run
//! use qiniu_upload_manager::{
//!     credential::Credential, http_client::Client, ObjectParams, UploadManager, UploadToken,
//! };
//! use std::time::Duration;
//!
//! # fn example() -> anyhow::Result<()> {
//! let credential = Credential::new("abcdefghklmnopq", "1234567890");
//! let token = UploadToken::sign(&credential, "test-bucket", Some("test-key"), Duration::from_secs(3600));
//! let upload_manager = UploadManager::builder(Client::default()).build();
//! let response = upload_manager.upload_path(
//!     "/path/to/file",
//!     &token,
//!     ObjectParams::builder().object_name("test-key").build(),
//! )?;
//! println!("{}", response["hash"]);
//! # Ok(())
//! # }
//! ```

mod data_source;
mod multi_parts_uploader;
mod object_params;
mod resumable_policy;
mod resumable_recorder;
mod scheduler;
mod single_part_uploader;
mod upload_manager;
mod upload_token;

#[cfg(test)]
mod test_utils;

pub use qiniu_credential as credential;
pub use qiniu_http_client as http_client;

pub use data_source::{
    DataChunk, DataSource, FileDataSource, FileIdentity, SeekableDataSource, SourceKey, UnseekableDataSource,
};
pub use object_params::{ObjectParams, ObjectParamsBuilder};
pub use resumable_policy::{MultiPartsVersion, ResumablePolicy, ResumablePolicyBuilder, V1_BLOCK_SIZE};
pub use resumable_recorder::{DummyResumableRecorder, FileSystemResumableRecorder, ResumableRecorder};
pub use upload_manager::{UploadManager, UploadManagerBuilder};
pub use upload_token::{ParseError, ParseResult, UploadToken};
