use crate::{
    cli::globals::GlobalArgs,
    s3::{S3, UploadError},
    upload::{
        chunker,
        file::FileHandle,
        retry::Retry,
        session::{Outcome, Session},
    },
};
use bytesize::ByteSize;
use futures::future::join_all;
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Runs one session per file, sessions of different files run concurrently
/// up to `max_uploads` at a time and never share state
#[derive(Debug)]
pub struct Coordinator {
    s3: S3,
    part_size: u64,
    retry: Retry,
    limit: Arc<Semaphore>,
    cancel: CancellationToken,
}

/// A submitted file
#[derive(Debug)]
pub struct Upload {
    key: String,
    cancel: CancellationToken,
    handle: JoinHandle<Outcome>,
}

impl Upload {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stop scheduling parts for this file, the outcome becomes `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn outcome(self) -> Outcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed {
                key: self.key,
                error: UploadError::from(e),
            },
        }
    }
}

impl Coordinator {
    /// `part_size` is the default part size, larger files get larger parts
    #[must_use]
    pub fn new(s3: S3, part_size: u64, globals: &GlobalArgs) -> Self {
        Self {
            s3,
            part_size,
            retry: globals.retry(),
            limit: Arc::new(Semaphore::new(globals.max_uploads.max(1))),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub const fn s3(&self) -> &S3 {
        &self.s3
    }

    /// Cancel every submitted and future upload
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels every upload when triggered
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start a session per file without waiting for any of them, must be
    /// called within a tokio runtime
    #[must_use]
    pub fn submit(&self, files: Vec<FileHandle>) -> Vec<Upload> {
        files.into_iter().map(|file| self.spawn(file)).collect()
    }

    /// Submit the files and wait for all of them, outcomes keep the order of `files`
    pub async fn run(&self, files: Vec<FileHandle>) -> Vec<Outcome> {
        join_all(self.submit(files).into_iter().map(Upload::outcome)).await
    }

    fn spawn(&self, file: FileHandle) -> Upload {
        let key = self.s3.key(file.name());
        // a zero default is rejected by the chunker, never recomputed
        let part_size = if self.part_size == 0 {
            0
        } else {
            chunker::part_size(file.size(), self.part_size)
        };

        log::info!(
            "queued: {} ({}), part size: {}",
            file.path().display(),
            ByteSize::b(file.size()),
            ByteSize::b(part_size)
        );

        let cancel = self.cancel.child_token();
        let task = {
            let s3 = self.s3.clone();
            let retry = self.retry;
            let limit = Arc::clone(&self.limit);
            let cancel = cancel.clone();
            let key = key.clone();

            async move {
                let _permit = tokio::select! {
                    biased;

                    () = cancel.cancelled() => {
                        return Outcome::Failed { key, error: UploadError::Cancelled };
                    }

                    permit = limit.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return Outcome::Failed { key, error: UploadError::Cancelled },
                    },
                };

                match Session::new(s3, file, part_size, retry) {
                    Ok(session) => session.run(cancel).await,
                    Err(error) => Outcome::Failed { key, error },
                }
            }
        };

        Upload {
            key,
            cancel,
            handle: tokio::spawn(task),
        }
    }
}
