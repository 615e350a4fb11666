pub mod actions;
pub mod error;
pub mod limits;
pub mod request;
pub mod responses;
pub mod signer;
pub mod tools;
pub use self::{error::UploadError, signer::Signer};

use reqwest::Client;
use url::Url;

#[derive(Debug, Clone)]
pub struct S3 {
    // bucket name
    bucket: String,
    // prepended to every file name to build the object key
    prefix: String,
    // scheme and host of the store, i.e. https://s3.amazonaws.com
    endpoint: Url,
    // <endpoint>/<bucket>/<key> instead of <bucket>.<host>/<key>
    path_style: bool,
    // optional canned ACL sent when initiating an upload
    acl: Option<String>,
    // signing authority client
    signer: Signer,
    client: Client,
}

// Amazon S3 API Reference
// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>
impl S3 {
    /// # Errors
    ///
    /// Will return `Err` if the endpoint or the signer are not valid URLs
    pub fn new(
        bucket: &str,
        prefix: &str,
        endpoint: &str,
        signer: &str,
        path_style: bool,
    ) -> Result<Self, UploadError> {
        if bucket.is_empty() {
            return Err(UploadError::Config("bucket name is empty".to_string()));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| UploadError::Config(format!("invalid endpoint {endpoint}: {e}")))?;

        if endpoint.host_str().is_none() {
            return Err(UploadError::Config(format!("endpoint has no host: {endpoint}")));
        }

        let client = Client::new();
        let signer = Signer::new(client.clone(), signer, bucket)?;

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            endpoint,
            path_style,
            acl: None,
            signer,
            client,
        })
    }

    #[must_use]
    pub fn with_acl(mut self, acl: Option<String>) -> Self {
        self.acl = acl;
        self
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn acl(&self) -> Option<&str> {
        self.acl.as_deref()
    }

    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Object key for a file: `<prefix><file_name>`
    #[must_use]
    pub fn key(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.prefix)
    }

    /// Request URL for a resource (`/<key>?<sub-resource>`), the same resource
    /// that is signed with the `/<bucket>` prefix
    ///
    /// # Errors
    ///
    /// Will return `Err` if the resulting URL can not be parsed
    pub fn url(&self, resource: &str) -> Result<Url, UploadError> {
        let scheme = self.endpoint.scheme();
        let host = self.endpoint.host_str().unwrap_or_default();
        let port = self
            .endpoint
            .port()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();

        let url = if self.path_style {
            format!("{scheme}://{host}{port}/{}{resource}", self.bucket)
        } else {
            format!("{scheme}://{}.{host}{port}{resource}", self.bucket)
        };

        Url::parse(&url).map_err(|e| UploadError::Protocol(format!("invalid url {url}: {e}")))
    }
}
