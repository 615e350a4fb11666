//! Amazon S3 multipart upload limits
//! Maximum object size 5 TB
//! Maximum number of parts per upload  10,000
//! <https://docs.aws.amazon.com/AmazonS3/latest/dev/qfacts.html>

use crate::s3::{
    S3, UploadError,
    actions::{Action, response_error, sign},
    request,
    responses::InitiateMultipartUploadResult,
};
use quick_xml::de::from_str;
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct CreateMultipartUpload<'a> {
    key: &'a str,
    content_type: &'a str,
    acl: Option<&'a str>,
}

impl<'a> CreateMultipartUpload<'a> {
    #[must_use]
    pub const fn new(key: &'a str, content_type: &'a str, acl: Option<&'a str>) -> Self {
        Self {
            key,
            content_type,
            acl,
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the response has no `UploadId`
    pub async fn request(&self, s3: &S3) -> Result<InitiateMultipartUploadResult, UploadError> {
        let (url, headers) = sign(self, s3).await?;

        let response =
            request::request(s3.client(), url, self.http_method(), &headers, None).await?;

        if response.status().is_success() {
            let body = response.text().await?;

            let rs: InitiateMultipartUploadResult = from_str(&body)
                .map_err(|e| UploadError::Protocol(format!("missing UploadId: {e}")))?;

            if rs.upload_id.is_empty() {
                return Err(UploadError::Protocol("empty UploadId".to_string()));
            }

            Ok(rs)
        } else {
            Err(response_error(response).await)
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateMultipartUpload.html>
impl Action for CreateMultipartUpload<'_> {
    fn http_method(&self) -> Method {
        Method::POST
    }

    fn key(&self) -> &str {
        self.key
    }

    fn query(&self) -> String {
        "uploads".to_string()
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        if let Some(acl) = self.acl {
            map.insert("x-amz-acl", acl);
        }

        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::actions::mock_s3;
    use mockito::Matcher;

    #[test]
    fn test_method() {
        let action = CreateMultipartUpload::new("key", "text/plain", None);
        assert_eq!(Method::POST, action.http_method());
    }

    #[test]
    fn test_headers() {
        let action = CreateMultipartUpload::new("key", "text/plain", None);
        let headers = action.headers().unwrap();
        assert_eq!(None, headers.get("x-amz-acl"));
    }

    #[test]
    fn test_headers_acl() {
        let test = vec![
            "private",
            "public-read",
            "public-read-write",
            "authenticated-read",
            "bucket-owner-read",
            "bucket-owner-full-control",
        ];
        for acl in test {
            let action = CreateMultipartUpload::new("key", "text/plain", Some(acl));
            let headers = action.headers().unwrap();
            assert_eq!(Some(acl), headers.get("x-amz-acl").copied());
        }
    }

    #[test]
    fn test_resource() {
        let action = CreateMultipartUpload::new("uploads/photo.jpg", "image/jpeg", None);
        assert_eq!("/uploads/photo.jpg?uploads", action.resource());
        assert_eq!("image/jpeg", action.content_type());
    }

    #[tokio::test]
    async fn test_request() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let mock = server
            .mock("POST", "/bucket/uploads/photo.jpg")
            .match_query(Matcher::Regex("^uploads$".into()))
            .match_header("authorization", "AWS id:signature")
            .match_header("content-type", "image/jpeg")
            .with_status(200)
            .with_body(
                r#"<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Bucket>bucket</Bucket><Key>uploads/photo.jpg</Key><UploadId>abc</UploadId></InitiateMultipartUploadResult>"#,
            )
            .create_async()
            .await;

        let action = CreateMultipartUpload::new("uploads/photo.jpg", "image/jpeg", None);
        let rs = action.request(&s3).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rs.upload_id, "abc");
    }

    #[tokio::test]
    async fn test_request_missing_upload_id() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let _mock = server
            .mock("POST", "/bucket/uploads/photo.jpg")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<InitiateMultipartUploadResult><Bucket>bucket</Bucket></InitiateMultipartUploadResult>")
            .create_async()
            .await;

        let action = CreateMultipartUpload::new("uploads/photo.jpg", "image/jpeg", None);

        assert!(matches!(
            action.request(&s3).await,
            Err(UploadError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_request_error_status() {
        let mut server = mockito::Server::new_async().await;
        let (s3, _signer) = mock_s3(&mut server).await;
        let _mock = server
            .mock("POST", "/bucket/uploads/photo.jpg")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let action = CreateMultipartUpload::new("uploads/photo.jpg", "image/jpeg", None);

        assert!(matches!(
            action.request(&s3).await,
            Err(UploadError::Transport(_))
        ));
    }
}
