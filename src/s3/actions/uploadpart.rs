use crate::s3::{
    S3, UploadError,
    actions::{Action, response_error, sign},
    request, tools,
};
use bytes::Bytes;
use reqwest::Method;

#[derive(Debug, Clone)]
pub struct UploadPart<'a> {
    key: &'a str,
    content_type: &'a str,
    part_number: u16,
    upload_id: &'a str,
    body: Bytes,
    content_md5: String,
}

impl<'a> UploadPart<'a> {
    #[must_use]
    pub fn new(
        key: &'a str,
        content_type: &'a str,
        part_number: u16,
        upload_id: &'a str,
        body: Bytes,
    ) -> Self {
        let content_md5 = tools::base64_md5(&body);
        Self {
            key,
            content_type,
            part_number,
            upload_id,
            body,
            content_md5,
        }
    }

    /// Upload the part and return its `ETag`
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the response has no `ETag`
    pub async fn request(&self, s3: &S3) -> Result<String, UploadError> {
        let (url, headers) = sign(self, s3).await?;

        let response = request::request(
            s3.client(),
            url,
            self.http_method(),
            &headers,
            Some(self.body.clone()),
        )
        .await?;

        if response.status().is_success() {
            match response.headers().get("ETag") {
                Some(etag) => Ok(etag
                    .to_str()
                    .map_err(|e| UploadError::Protocol(format!("invalid ETag: {e}")))?
                    .to_string()),
                None => Err(UploadError::Protocol(format!(
                    "missing ETag for part {}",
                    self.part_number
                ))),
            }
        } else {
            Err(response_error(response).await)
        }
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html
impl Action for UploadPart<'_> {
    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn key(&self) -> &str {
        self.key
    }

    fn query(&self) -> String {
        format!(
            "partNumber={}&uploadId={}",
            self.part_number,
            tools::encode_query_value(self.upload_id)
        )
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    fn content_md5(&self) -> Option<&str> {
        Some(&self.content_md5)
    }
}
