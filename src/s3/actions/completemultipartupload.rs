//! Amazon S3 multipart upload limits
//! Maximum object size 5 TB
//! Maximum number of parts per upload  10,000
//! <https://docs.aws.amazon.com/AmazonS3/latest/dev/qfacts.html>

use crate::s3::{
    S3, UploadError,
    actions::{Action, response_error, sign},
    request,
    responses::{
        CompleteMultipartUpload as Manifest, CompleteMultipartUploadResult, CompletedPart,
        ErrorResponse,
    },
    tools,
};
use bytes::Bytes;
use quick_xml::{de::from_str, se::to_string};
use reqwest::Method;

#[derive(Debug, Default, Clone)]
pub struct CompleteMultipartUpload<'a> {
    key: &'a str,
    upload_id: &'a str,
    body: String,
    content_md5: String,
}

impl<'a> CompleteMultipartUpload<'a> {
    /// # Errors
    ///
    /// Will return `Err` if the part manifest can not be serialized
    pub fn new(
        key: &'a str,
        upload_id: &'a str,
        parts: Vec<CompletedPart<'_>>,
    ) -> Result<Self, UploadError> {
        let body = to_string(&Manifest { parts })
            .map_err(|e| UploadError::Protocol(format!("could not build part manifest: {e}")))?;

        let content_md5 = tools::base64_md5(&body);

        Ok(Self {
            key,
            upload_id,
            body,
            content_md5,
        })
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the store reports an
    /// error in the response body
    pub async fn request(&self, s3: &S3) -> Result<CompleteMultipartUploadResult, UploadError> {
        let (url, headers) = sign(self, s3).await?;

        let response = request::request(
            s3.client(),
            url,
            self.http_method(),
            &headers,
            Some(Bytes::from(self.body.clone())),
        )
        .await?;

        if response.status().is_success() {
            let body = response.text().await?;

            // a 200 OK can still carry an error
            // <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
            match from_str::<CompleteMultipartUploadResult>(&body) {
                Ok(rs) => Ok(rs),
                Err(e) => match from_str::<ErrorResponse>(&body) {
                    Ok(error) => Err(UploadError::Protocol(format!(
                        "{}: {}",
                        error.code, error.message
                    ))),
                    Err(_) => Err(UploadError::Protocol(format!(
                        "invalid complete response: {e}"
                    ))),
                },
            }
        } else {
            Err(response_error(response).await)
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
impl Action for CompleteMultipartUpload<'_> {
    fn http_method(&self) -> Method {
        Method::POST
    }

    fn key(&self) -> &str {
        self.key
    }

    fn query(&self) -> String {
        format!("uploadId={}", tools::encode_query_value(self.upload_id))
    }

    fn content_type(&self) -> &str {
        "application/xml"
    }

    fn content_md5(&self) -> Option<&str> {
        Some(&self.content_md5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::actions::mock_s3;
    use mockito::Matcher;

    fn parts() -> Vec<CompletedPart<'static>> {
        vec![
            CompletedPart {
                number: 1,
                etag: "etag1",
            },
            CompletedPart {
                number: 2,
                etag: "etag2",
            },
        ]
    }

    #[test]
    fn test_method() {
        let action = CompleteMultipartUpload::new("key", "uid", parts()).unwrap();
        assert_eq!(Method::POST, action.http_method());
    }

    #[test]
    fn test_resource() {
        let action = CompleteMultipartUpload::new("uploads/key", "uid", parts()).unwrap();
        assert_eq!("/uploads/key?uploadId=uid", action.resource());
        assert_eq!("application/xml", action.content_type());
    }

    #[test]
    fn test_body() {
        let action = CompleteMultipartUpload::new("key", "uid", parts()).unwrap();
        assert!(action.body().starts_with("<CompleteMultipartUpload>"));
        assert!(action.body().contains("<Part><PartNumber>1</PartNumber><ETag>etag1</ETag></Part>"));
        assert!(action.body().contains("<Part><PartNumber>2</PartNumber><ETag>etag2</ETag></Part>"));
        assert_eq!(action.content_md5(), Some(tools::base64_md5(action.body()).as_str()));
    }

    #[tokio::test]
    async fn test_request() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let mock = server
            .mock("POST", "/bucket/key")
            .match_query(Matcher::UrlEncoded("uploadId".into(), "uid".into()))
            .match_header("content-type", "application/xml")
            .match_body(Matcher::Regex("<PartNumber>2</PartNumber>".into()))
            .with_status(200)
            .with_body("<CompleteMultipartUploadResult><Location>http://bucket/key</Location><Bucket>bucket</Bucket><Key>key</Key><ETag>\"abc-2\"</ETag></CompleteMultipartUploadResult>")
            .create_async()
            .await;

        let action = CompleteMultipartUpload::new("key", "uid", parts()).unwrap();
        let rs = action.request(&s3).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rs.e_tag, "\"abc-2\"");
    }

    #[tokio::test]
    async fn test_request_error_in_body() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let _mock = server
            .mock("POST", "/bucket/key")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<Error><Code>InvalidPart</Code><Message>One or more of the specified parts could not be found.</Message></Error>")
            .create_async()
            .await;

        let action = CompleteMultipartUpload::new("key", "uid", parts()).unwrap();
        let rs = action.request(&s3).await;

        assert!(matches!(rs, Err(UploadError::Protocol(ref m)) if m.starts_with("InvalidPart")));
    }
}
