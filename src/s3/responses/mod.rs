use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Resource")]
    pub resource: Option<String>,
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct InitiateMultipartUploadResult {
    #[serde(rename = "Bucket")]
    pub bucket: Option<String>,
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

#[derive(Deserialize, Debug)]
pub struct CompleteMultipartUploadResult {
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Bucket")]
    pub bucket: Option<String>,
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "ETag")]
    pub e_tag: String,
}

/// Body of the complete request, the part manifest
#[derive(Serialize, Debug, Default)]
#[serde(rename = "CompleteMultipartUpload")]
pub struct CompleteMultipartUpload<'a> {
    #[serde(rename = "Part")]
    pub parts: Vec<CompletedPart<'a>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart<'a> {
    #[serde(rename = "PartNumber")]
    pub number: u16,
    #[serde(rename = "ETag")]
    pub etag: &'a str,
}
