//! Actions
//! <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>

use crate::s3::{S3, UploadError, responses::ErrorResponse, signer::SigningRequest, tools};
use chrono::Utc;
use quick_xml::de::from_str;
use reqwest::{Method, Response};
use std::collections::BTreeMap;
use url::Url;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateMultipartUpload.html>
mod createmultipartupload;
pub use self::createmultipartupload::CreateMultipartUpload;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html>
mod uploadpart;
pub use self::uploadpart::UploadPart;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
mod completemultipartupload;
pub use self::completemultipartupload::CompleteMultipartUpload;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_AbortMultipartUpload.html>
mod abortmultipartupload;
pub use self::abortmultipartupload::AbortMultipartUpload;

pub trait Action {
    // method to use POST/PUT/DELETE
    fn http_method(&self) -> Method;

    // object key, not encoded
    fn key(&self) -> &str;

    // sub-resource, the URL query
    fn query(&self) -> String;

    // Content-Type header, part of the signature
    fn content_type(&self) -> &str {
        ""
    }

    // Content-MD5 header, part of the signature
    fn content_md5(&self) -> Option<&str> {
        None
    }

    // x-amz-* headers to send and sign
    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    /// `/<key>?<query>`, what gets signed after the bucket
    fn resource(&self) -> String {
        format!("/{}?{}", tools::encode_key(self.key()), self.query())
    }
}

/// Get a fresh signature from the authority and build the request URL and
/// headers, every call gets its own timestamp
///
/// # Errors
///
/// Will return `Err` if the signature can not be obtained
pub async fn sign<A: Action + Sync>(
    action: &A,
    s3: &S3,
) -> Result<(Url, BTreeMap<String, String>), UploadError> {
    let date = tools::amz_date(Utc::now());
    let resource = action.resource();
    let method = action.http_method();
    let extra = action.headers().unwrap_or_default();

    let request = SigningRequest::new(method.as_str(), action.content_type(), &date, &resource)
        .with_md5(action.content_md5())
        .with_headers(extra.clone());

    let signature = s3.signer().sign(&request).await?;

    let mut headers: BTreeMap<String, String> = extra
        .iter()
        .map(|(k, v)| (k.to_lowercase(), (*v).to_string()))
        .collect();

    headers.insert("authorization".to_string(), signature.auth);
    headers.insert("x-amz-date".to_string(), date.clone());

    if !action.content_type().is_empty() {
        headers.insert("content-type".to_string(), action.content_type().to_string());
    }

    if let Some(md5) = action.content_md5() {
        headers.insert("content-md5".to_string(), md5.to_string());
    }

    Ok((s3.url(&resource)?, headers))
}

/// Turn a non-success response into a `Transport` error
pub async fn response_error(response: Response) -> UploadError {
    let mut error: BTreeMap<&str, String> = BTreeMap::new();
    error.insert("HTTP Status Code", response.status().to_string());

    if let Some(x_amz_id_2) = response.headers().get("x-amz-id-2") {
        if let Ok(id) = x_amz_id_2.to_str() {
            error.insert("x-amz-id-2", id.to_string());
        }
    }

    if let Some(rid) = response.headers().get("x-amz-request-id") {
        if let Ok(id) = rid.to_str() {
            error.insert("Request ID", id.to_string());
        }
    }

    let body = response.text().await.unwrap_or_default();

    if let Ok(e) = from_str::<ErrorResponse>(&body) {
        error.insert("Code", e.code);
        error.insert("Message", e.message);
    } else if !body.is_empty() {
        error.insert("Response", body);
    }

    UploadError::Transport(
        error
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<String>>()
            .join(", "),
    )
}

/// Store and signing authority on one mock server, the authority accepts
/// everything
#[cfg(test)]
pub(crate) async fn mock_s3(server: &mut mockito::ServerGuard) -> (S3, mockito::Mock) {
    let signer = server
        .mock("POST", "/sign")
        .with_status(200)
        .with_body(r#"{"auth":"AWS id:signature","query":""}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let s3 = S3::new(
        "bucket",
        "uploads/",
        &server.url(),
        &format!("{}/sign", server.url()),
        true,
    )
    .unwrap();

    (s3, signer)
}
