#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use mockito::{Mock, Request, Server, ServerGuard};
use s3up::{
    cli::globals::GlobalArgs,
    s3::{
        S3,
        signer::{Authority, SigningForm},
    },
    upload::FileHandle,
};
use secrecy::SecretString;
use std::{io::Write, time::Duration};
use tempfile::NamedTempFile;

pub const BUCKET: &str = "bucket";
pub const PREFIX: &str = "uploads/";
pub const ACCESS_ID: &str = "test-access";

pub fn authority() -> Authority {
    Authority::new(ACCESS_ID, SecretString::from("test-secret".to_string()))
}

fn header<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .header(name)
        .first()
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Matches store requests whose `Authorization` is the test key's signature
/// of the request as sent: method, `Content-MD5`, `Content-Type`, the
/// `x-amz-*` headers including `x-amz-date`, and the path-style resource
pub fn signed_request(request: &Request) -> bool {
    let mut amz: Vec<String> = request
        .headers()
        .iter()
        .filter(|(k, _)| k.as_str().starts_with("x-amz-") && k.as_str() != "x-amz-date")
        .map(|(k, v)| format!("{}:{}", k.as_str(), v.to_str().unwrap_or_default().trim()))
        .collect();
    amz.sort();
    amz.push(format!("x-amz-date:{}", header(request, "x-amz-date")));

    let form = SigningForm {
        verb: request.method().to_string(),
        md5: header(request, "content-md5").to_string(),
        content_type: header(request, "content-type").to_string(),
        headers: amz.join("\n"),
        resource: request.path_and_query().to_string(),
    };

    let expected = authority().sign(&form).auth;
    header(request, "authorization") == expected
}

/// Signing authority and store, each on its own server
pub struct Stack {
    pub authority: ServerGuard,
    pub store: ServerGuard,
}

impl Stack {
    pub async fn new() -> Self {
        Self {
            authority: Server::new_async().await,
            store: Server::new_async().await,
        }
    }

    fn authority_mock(&mut self) -> Mock {
        let authority = authority();

        self.authority
            .mock("POST", "/sign")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |request| {
                let form = SigningForm::from_urlencoded(request.body().unwrap());
                serde_json::to_vec(&authority.sign(&form)).unwrap()
            })
    }

    /// Signs every form it receives with a test key, `hits` times
    pub async fn sign(&mut self, hits: usize) -> Mock {
        self.authority_mock().expect(hits).create_async().await
    }

    pub async fn sign_at_least(&mut self, hits: usize) -> Mock {
        self.authority_mock()
            .expect_at_least(hits)
            .create_async()
            .await
    }

    pub fn s3(&self) -> S3 {
        S3::new(
            BUCKET,
            PREFIX,
            &self.store.url(),
            &format!("{}/sign", self.authority.url()),
            true,
        )
        .unwrap()
    }
}

pub fn globals(max_uploads: usize) -> GlobalArgs {
    GlobalArgs {
        retries: 1,
        max_uploads,
        backoff: Duration::from_millis(1),
    }
}

pub fn temp_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

pub async fn handle(file: &NamedTempFile, name: &str) -> FileHandle {
    FileHandle::open(file.path()).await.unwrap().with_name(name)
}

pub fn initiate_result(key: &str, upload_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Bucket>{BUCKET}</Bucket>
  <Key>{key}</Key>
  <UploadId>{upload_id}</UploadId>
</InitiateMultipartUploadResult>"#
    )
}

pub fn complete_result(key: &str, etag: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Location>http://{BUCKET}.s3.amazonaws.com/{key}</Location>
  <Bucket>{BUCKET}</Bucket>
  <Key>{key}</Key>
  <ETag>{etag}</ETag>
</CompleteMultipartUploadResult>"#
    )
}
