// https://docs.aws.amazon.com/AmazonS3/latest/dev/UsingRESTAPImpUpload.html
// * Initiate Multipart Upload
// * Upload Part
// * Complete Multipart Upload

use crate::{
    s3::{
        S3, UploadError,
        actions::{AbortMultipartUpload, CompleteMultipartUpload, CreateMultipartUpload, UploadPart},
        responses::CompletedPart,
    },
    upload::{
        chunker::{Chunker, Part},
        file::FileHandle,
        retry::Retry,
    },
};
use bytesize::ByteSize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    NotStarted,
    Initiating,
    // part number being uploaded
    Uploading(u16),
    Completing,
    Done,
    Failed,
}

/// Result of one file, there is no partial success
#[derive(Debug)]
pub enum Outcome {
    Completed { key: String, etag: String },
    Failed { key: String, error: UploadError },
}

impl Outcome {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Completed { key, .. } | Self::Failed { key, .. } => key,
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Multipart upload of one file, parts are uploaded one at a time in order
#[derive(Debug)]
pub struct Session {
    s3: S3,
    file: FileHandle,
    key: String,
    chunker: Chunker,
    retry: Retry,
    state: State,
    upload_id: Option<String>,
    // (part number, ETag) of the uploaded parts
    etags: Vec<(u16, String)>,
    // stops retries of the current step
    cancel: CancellationToken,
}

impl Session {
    /// # Errors
    ///
    /// Will return `Err` if the file can not be split with `part_size`
    pub fn new(s3: S3, file: FileHandle, part_size: u64, retry: Retry) -> Result<Self, UploadError> {
        let key = s3.key(file.name());
        let chunker = Chunker::new(file.size(), part_size)?;

        Ok(Self {
            s3,
            file,
            key,
            chunker,
            retry,
            state: State::NotStarted,
            upload_id: None,
            etags: Vec::new(),
            cancel: CancellationToken::new(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    #[must_use]
    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Request an upload ID, it stays fixed for the rest of the session
    ///
    /// # Errors
    ///
    /// Will return `Err` if the upload could not be initiated
    pub async fn initiate(&mut self) -> Result<String, UploadError> {
        if let Some(upload_id) = &self.upload_id {
            return Ok(upload_id.clone());
        }

        self.state = State::Initiating;

        log::info!(
            "initiating upload: {} ({}, {} parts of {})",
            self.key,
            ByteSize::b(self.file.size()),
            self.chunker.part_count(),
            ByteSize::b(self.chunker.part_size())
        );

        let rs = {
            let s3 = &self.s3;
            let action = &CreateMultipartUpload::new(&self.key, self.file.content_type(), s3.acl());
            self.retry
                .run("initiate multipart upload", &self.cancel, move || action.request(s3))
                .await
        };

        match rs {
            Ok(rs) => {
                log::debug!("upload_id: {}", rs.upload_id);
                self.upload_id = Some(rs.upload_id.clone());
                Ok(rs.upload_id)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    /// Upload the next part, returns false when there are no parts left
    ///
    /// # Errors
    ///
    /// Will return `Err` if the upload was not initiated or the part upload failed
    pub async fn upload_next(&mut self) -> Result<bool, UploadError> {
        let Some(upload_id) = self.upload_id.clone() else {
            self.state = State::Failed;
            return Err(UploadError::Protocol("upload not initiated".to_string()));
        };

        if !self.chunker.advance() {
            return Ok(false);
        }

        let Some(part) = self.chunker.current() else {
            return Ok(false);
        };

        self.state = State::Uploading(part.number);

        match self.upload_part(&upload_id, part).await {
            Ok(etag) => {
                self.etags.push((part.number, etag));
                Ok(true)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    async fn upload_part(&self, upload_id: &str, part: Part) -> Result<String, UploadError> {
        let body = self.file.read(&part).await?;

        log::debug!(
            "uploading part: {}/{}, {}",
            part.number,
            self.chunker.part_count(),
            ByteSize::b(part.len())
        );

        let s3 = &self.s3;
        let action = &UploadPart::new(
            &self.key,
            self.file.content_type(),
            part.number,
            upload_id,
            body,
        );

        let etag = self
            .retry
            .run(&format!("upload part {}", part.number), &self.cancel, move || {
                action.request(s3)
            })
            .await?;

        log::info!("uploaded part: {}, etag: {}", part.number, etag);

        Ok(etag)
    }

    /// Send the part manifest, returns the object `ETag`
    ///
    /// # Errors
    ///
    /// Will return `Err` if the upload was not initiated or could not be completed
    pub async fn complete(&mut self) -> Result<String, UploadError> {
        let Some(upload_id) = self.upload_id.clone() else {
            self.state = State::Failed;
            return Err(UploadError::Protocol("upload not initiated".to_string()));
        };

        self.state = State::Completing;

        let rs = {
            let parts = self
                .etags
                .iter()
                .map(|(number, etag)| CompletedPart {
                    number: *number,
                    etag: etag.as_str(),
                })
                .collect();

            match CompleteMultipartUpload::new(&self.key, &upload_id, parts) {
                Ok(action) => {
                    let s3 = &self.s3;
                    let action = &action;
                    self.retry
                        .run("complete multipart upload", &self.cancel, move || action.request(s3))
                        .await
                }
                Err(e) => Err(e),
            }
        };

        match rs {
            Ok(rs) => {
                self.state = State::Done;
                log::info!("upload finished: {}, ETag: {}", self.key, rs.e_tag);
                Ok(rs.e_tag)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    /// Best effort, errors are only logged; runs even after cancellation
    pub async fn abort(&mut self) {
        let Some(upload_id) = self.upload_id.take() else {
            return;
        };

        let s3 = &self.s3;
        let action = &AbortMultipartUpload::new(&self.key, &upload_id);

        match self
            .retry
            .run("abort multipart upload", &CancellationToken::new(), move || action.request(s3))
            .await
        {
            Ok(()) => log::info!("aborted upload: {}, upload_id: {upload_id}", self.key),
            Err(e) => log::error!(
                "could not abort upload: {}, upload_id: {upload_id}: {e}",
                self.key
            ),
        }
    }

    /// Drive the session to its end, cancellation is checked before every step
    pub async fn run(mut self, cancel: CancellationToken) -> Outcome {
        self.cancel = cancel.clone();

        match self.drive(&cancel).await {
            Ok(etag) => Outcome::Completed {
                key: self.key,
                etag,
            },
            Err(error) => {
                self.state = State::Failed;

                log::error!("upload failed: {}: {error}", self.key);

                self.abort().await;

                Outcome::Failed {
                    key: self.key,
                    error,
                }
            }
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<String, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        self.initiate().await?;

        loop {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            if !self.upload_next().await? {
                break;
            }
        }

        self.complete().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::actions::mock_s3;
    use mockito::Matcher;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INITIATE: &str = "<InitiateMultipartUploadResult><Bucket>bucket</Bucket><Key>uploads/file.txt</Key><UploadId>uid</UploadId></InitiateMultipartUploadResult>";
    const COMPLETE: &str = "<CompleteMultipartUploadResult><Location>l</Location><Bucket>bucket</Bucket><Key>uploads/file.txt</Key><ETag>\"etag-2\"</ETag></CompleteMultipartUploadResult>";

    async fn file(content: &[u8]) -> (NamedTempFile, FileHandle) {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content).unwrap();
        let handle = FileHandle::open(tmp.path())
            .await
            .unwrap()
            .with_name("file.txt")
            .with_content_type("text/plain");
        (tmp, handle)
    }

    #[tokio::test]
    async fn test_session_states() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let (_tmp, handle) = file(b"hello world").await;

        let initiate = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::Regex("^uploads$".into()))
            .with_body(INITIATE)
            .create_async()
            .await;
        let part1 = server
            .mock("PUT", "/bucket/uploads/file.txt")
            .match_query(Matcher::UrlEncoded("partNumber".into(), "1".into()))
            .match_body("hello ")
            .with_header("ETag", "\"p1\"")
            .create_async()
            .await;
        let part2 = server
            .mock("PUT", "/bucket/uploads/file.txt")
            .match_query(Matcher::UrlEncoded("partNumber".into(), "2".into()))
            .match_body("world")
            .with_header("ETag", "\"p2\"")
            .create_async()
            .await;
        let complete = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::UrlEncoded("uploadId".into(), "uid".into()))
            .match_body(Matcher::Regex(
                "<PartNumber>1</PartNumber>.*<PartNumber>2</PartNumber>".into(),
            ))
            .with_body(COMPLETE)
            .create_async()
            .await;

        let mut session = Session::new(s3, handle, 6, Retry::new(1)).unwrap();
        assert_eq!(session.state(), State::NotStarted);
        assert_eq!(session.key(), "uploads/file.txt");
        assert_eq!(session.chunker().part_count(), 2);

        assert_eq!(session.initiate().await.unwrap(), "uid");
        assert_eq!(session.upload_id(), Some("uid"));

        assert!(session.upload_next().await.unwrap());
        assert_eq!(session.state(), State::Uploading(1));
        assert!(session.upload_next().await.unwrap());
        assert_eq!(session.state(), State::Uploading(2));
        assert!(!session.upload_next().await.unwrap());

        assert_eq!(session.complete().await.unwrap(), "\"etag-2\"");
        assert_eq!(session.state(), State::Done);

        initiate.assert_async().await;
        part1.assert_async().await;
        part2.assert_async().await;
        complete.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_before_initiate() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let (_tmp, handle) = file(b"hello").await;

        let mut session = Session::new(s3, handle, 5, Retry::new(1)).unwrap();

        assert!(matches!(
            session.upload_next().await,
            Err(UploadError::Protocol(_))
        ));
        assert_eq!(session.state(), State::Failed);
    }

    #[tokio::test]
    async fn test_initiate_failure() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let (_tmp, handle) = file(b"hello").await;

        let _initiate = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let mut session = Session::new(s3, handle, 5, Retry::new(1)).unwrap();

        assert!(matches!(
            session.initiate().await,
            Err(UploadError::Transport(_))
        ));
        assert_eq!(session.state(), State::Failed);
        assert_eq!(session.upload_id(), None);
    }

    #[tokio::test]
    async fn test_run_part_failure_aborts() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let (_tmp, handle) = file(b"hello world").await;

        let _initiate = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::Regex("^uploads$".into()))
            .with_body(INITIATE)
            .create_async()
            .await;
        let part = server
            .mock("PUT", "/bucket/uploads/file.txt")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let complete = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::UrlEncoded("uploadId".into(), "uid".into()))
            .expect(0)
            .create_async()
            .await;
        let abort = server
            .mock("DELETE", "/bucket/uploads/file.txt")
            .match_query(Matcher::UrlEncoded("uploadId".into(), "uid".into()))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let session = Session::new(s3, handle, 6, Retry::new(1)).unwrap();
        let outcome = session.run(CancellationToken::new()).await;

        assert!(matches!(
            outcome,
            Outcome::Failed {
                error: UploadError::Transport(_),
                ..
            }
        ));
        assert_eq!(outcome.key(), "uploads/file.txt");
        part.assert_async().await;
        complete.assert_async().await;
        abort.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let (_tmp, handle) = file(b"hello").await;

        let initiate = server
            .mock("POST", "/bucket/uploads/file.txt")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let session = Session::new(s3, handle, 5, Retry::new(1)).unwrap();
        let outcome = session.run(cancel).await;

        assert!(matches!(
            outcome,
            Outcome::Failed {
                error: UploadError::Cancelled,
                ..
            }
        ));
        assert!(!outcome.is_completed());
        initiate.assert_async().await;
    }
}
