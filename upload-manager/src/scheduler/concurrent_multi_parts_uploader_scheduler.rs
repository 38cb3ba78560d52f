use super::{
    super::{
        multi_parts_uploader::{Checkpoint, CheckpointRecord, MultiPartsUploader, PartProgress, UploadTarget},
        DataSource, FileIdentity, ResumablePolicy, ResumableRecorder, SourceKey,
    },
    SchedulerOutcome,
};
use log::{debug, info, warn};
use qiniu_http_client::{http::ResponseErrorKind as HttpResponseErrorKind, ApiResult, ResponseError, ResponseErrorKind};
use rayon::ThreadPoolBuilder;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// 并行分片上传调度器
///
/// 为每次上传创建固定线程数的线程池，每个线程循环地从数据源读取分片并上传，
/// 每个分片上传成功后都会完整地写入一次断点恢复记录。
/// 任何一个分片上传失败都将停止其他线程，取消上传上下文也是如此
#[derive(Debug)]
pub(crate) struct ConcurrentMultiPartsUploaderScheduler<'a, U> {
    uploader: U,
    target: UploadTarget<'a>,
    recorder: &'a dyn ResumableRecorder,
    slice_size: u64,
    concurrency: usize,
}

struct CheckpointKey<'k> {
    source_key: &'k SourceKey,
    identity: &'k FileIdentity,
}

impl<'a, U: MultiPartsUploader> ConcurrentMultiPartsUploaderScheduler<'a, U> {
    pub(crate) fn new(
        uploader: U,
        target: UploadTarget<'a>,
        recorder: &'a dyn ResumableRecorder,
        policy: &ResumablePolicy,
    ) -> Self {
        Self {
            uploader,
            target,
            recorder,
            slice_size: policy.slice_size(U::VERSION),
            concurrency: policy.concurrency().max(1),
        }
    }

    /// 上传数据源
    ///
    /// 只有本地文件才会尝试从断点恢复记录中恢复上传
    pub(crate) fn upload(&self, source: &dyn DataSource) -> SchedulerOutcome {
        let mut recovered_parts = 0;
        let result = self.upload_with_checkpoint(source, &mut recovered_parts);
        SchedulerOutcome {
            result,
            recovered_parts,
        }
    }

    fn upload_with_checkpoint(&self, source: &dyn DataSource, recovered_parts: &mut usize) -> ApiResult<Value> {
        let identity = source.file_identity()?;
        let source_key = identity.as_ref().map(|identity| self.source_key(identity));
        let checkpoint_key = source_key
            .as_ref()
            .zip(identity.as_ref())
            .map(|(source_key, identity)| CheckpointKey { source_key, identity });
        let (session, progresses) = match checkpoint_key.as_ref().and_then(|key| self.recover(key)) {
            Some(record) => {
                *recovered_parts = record.progresses.len();
                (record.session, record.progresses)
            }
            None => (self.uploader.initialize_parts(&self.target)?, Vec::new()),
        };

        let result = self
            .upload_parts(source, &session, progresses, checkpoint_key.as_ref())
            .and_then(|progresses| self.uploader.complete_parts(&self.target, &session, &progresses));
        if let Some(source_key) = source_key.as_ref() {
            match &result {
                Ok(_) => self.delete_checkpoint(source_key),
                Err(err) if self.uploader.is_expired_error(err) => {
                    info!("Upload session of {source_key} is expired, the checkpoint is deleted: {err}");
                    self.delete_checkpoint(source_key);
                }
                Err(_) => {}
            }
        }
        result
    }

    fn upload_parts(
        &self,
        source: &dyn DataSource,
        session: &U::Session,
        progresses: Vec<U::Progress>,
        checkpoint_key: Option<&CheckpointKey<'_>>,
    ) -> ApiResult<Vec<U::Progress>> {
        let recovered = progresses
            .iter()
            .map(|progress| (progress.part_number(), (progress.offset(), progress.size())))
            .collect::<HashMap<_, _>>();
        let progresses = Mutex::new(progresses);
        let any_error = AtomicBool::new(false);
        let first_error = Mutex::new(None);
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| {
                format!(
                    "qiniu.rust-sdk.upload-manager.scheduler.concurrent_multi_parts_uploader_scheduler.{}",
                    i
                )
            })
            .build()
            .map_err(|err| ResponseError::new(ResponseErrorKind::SystemCallError, err))?;
        thread_pool.scope_fifo(|s| {
            for _ in 0..self.concurrency {
                s.spawn_fifo(|_| {
                    let worker = Worker {
                        scheduler: self,
                        source,
                        session,
                        recovered: &recovered,
                        progresses: &progresses,
                        any_error: &any_error,
                        checkpoint_key,
                    };
                    if let Err(err) = worker.run() {
                        any_error.store(true, Ordering::SeqCst);
                        first_error
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .get_or_insert(err);
                    }
                });
            }
        });
        if let Some(err) = first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(err);
        }
        let mut progresses = progresses.into_inner().unwrap_or_else(PoisonError::into_inner);
        progresses.sort_by_key(|progress| progress.part_number());
        Ok(progresses)
    }

    fn recover(&self, key: &CheckpointKey<'_>) -> Option<CheckpointRecord<U::Session, U::Progress>> {
        let record = match self.recorder.get(key.source_key) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                warn!("Failed to read the checkpoint of {}: {err}", key.source_key);
                return None;
            }
        };
        let record = Checkpoint::from_slice(&record).ok().and_then(U::unwrap_checkpoint);
        match record {
            Some(record)
                if record.is_reusable(
                    self.target.region,
                    key.identity.size(),
                    key.identity.modified(),
                    self.uploader.session_expired_at(&record.session),
                    unix_now(),
                ) =>
            {
                info!(
                    "Recovered {} parts of {} from the checkpoint {}",
                    record.progresses.len(),
                    key.identity.path().display(),
                    key.source_key
                );
                Some(record)
            }
            _ => {
                info!(
                    "The checkpoint {} of {} is not reusable, upload from scratch",
                    key.source_key,
                    key.identity.path().display()
                );
                self.delete_checkpoint(key.source_key);
                None
            }
        }
    }

    fn save_checkpoint(&self, key: &CheckpointKey<'_>, session: &U::Session, progresses: &[U::Progress]) {
        let checkpoint = U::wrap_checkpoint(CheckpointRecord {
            region: self.target.region.to_owned(),
            file_size: key.identity.size(),
            file_modified: key.identity.modified(),
            session: session.to_owned(),
            progresses: progresses.to_vec(),
        });
        let result = checkpoint
            .to_vec()
            .map_err(|err| err.to_string())
            .and_then(|record| {
                self.recorder
                    .set(key.source_key, &record)
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            warn!("Failed to save the checkpoint {}: {err}", key.source_key);
        }
    }

    fn delete_checkpoint(&self, source_key: &SourceKey) {
        if let Err(err) = self.recorder.delete(source_key) {
            warn!("Failed to delete the checkpoint {source_key}: {err}");
        }
    }

    /// 由上传凭证，对象名称，协议版本，分片大小和本地文件信息共同决定
    fn source_key(&self, identity: &FileIdentity) -> SourceKey {
        let token = self.target.token;
        let fields = [
            token.access_key().to_owned(),
            token.bucket().to_owned(),
            self.target.params.object_name().unwrap_or("~").to_owned(),
            U::VERSION.to_string(),
            self.slice_size.to_string(),
            identity.path().to_string_lossy().into_owned(),
            identity.size().to_string(),
            identity.modified().to_string(),
        ];
        SourceKey::digest(fields.iter().map(|field| field.as_bytes()))
    }
}

struct Worker<'w, 'a, U: MultiPartsUploader> {
    scheduler: &'w ConcurrentMultiPartsUploaderScheduler<'a, U>,
    source: &'w dyn DataSource,
    session: &'w U::Session,
    recovered: &'w HashMap<u64, (u64, u64)>,
    progresses: &'w Mutex<Vec<U::Progress>>,
    any_error: &'w AtomicBool,
    checkpoint_key: Option<&'w CheckpointKey<'w>>,
}

impl<U: MultiPartsUploader> Worker<'_, '_, U> {
    fn run(&self) -> ApiResult<()> {
        let scheduler = self.scheduler;
        let context = scheduler.target.params.context();
        loop {
            if self.any_error.load(Ordering::SeqCst) {
                return Ok(());
            }
            if context.is_cancelled() {
                return Err(ResponseError::new_with_msg(
                    HttpResponseErrorKind::UserCanceled.into(),
                    "upload is cancelled",
                ));
            }
            let chunk = match self.source.slice(scheduler.slice_size)? {
                Some(chunk) => chunk,
                None => return Ok(()),
            };
            if self.recovered.get(&chunk.part_number()) == Some(&(chunk.offset(), chunk.size())) {
                debug!("Part {} is recovered, skip uploading", chunk.part_number());
                continue;
            }
            let progress = scheduler
                .uploader
                .upload_part(&scheduler.target, self.session, &chunk)?;
            let mut progresses = self.progresses.lock().unwrap_or_else(PoisonError::into_inner);
            progresses.retain(|uploaded| uploaded.part_number() != progress.part_number());
            progresses.push(progress);
            if let Some(key) = self.checkpoint_key {
                scheduler.save_checkpoint(key, self.session, &progresses);
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
