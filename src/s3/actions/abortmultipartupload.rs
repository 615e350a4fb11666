use crate::s3::{
    S3, UploadError,
    actions::{Action, response_error, sign},
    request, tools,
};
use reqwest::Method;

#[derive(Debug, Default)]
pub struct AbortMultipartUpload<'a> {
    key: &'a str,
    upload_id: &'a str,
}

impl<'a> AbortMultipartUpload<'a> {
    #[must_use]
    pub const fn new(key: &'a str, upload_id: &'a str) -> Self {
        Self { key, upload_id }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<(), UploadError> {
        let (url, headers) = sign(self, s3).await?;

        let response =
            request::request(s3.client(), url, self.http_method(), &headers, None).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(response_error(response).await)
        }
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_AbortMultipartUpload.html
impl Action for AbortMultipartUpload<'_> {
    fn http_method(&self) -> Method {
        Method::DELETE
    }

    fn key(&self) -> &str {
        self.key
    }

    // uploadId - Upload ID that identifies the multipart upload.
    fn query(&self) -> String {
        format!("uploadId={}", tools::encode_query_value(self.upload_id))
    }
}
