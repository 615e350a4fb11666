//! Signing authority client
//!
//! The secret key never leaves the signing authority, every request sent to
//! the store is signed remotely. The authority signs the canonical string:
//!
//! ```text
//! Verb + "\n" +
//! Content-MD5 + "\n" +
//! Content-Type + "\n" +
//! "\n" +
//! CanonicalizedAmzHeaders + "\n" +
//! "/" + Bucket + Resource
//! ```
//!
//! The date field stays empty, the timestamp travels as the `x-amz-date`
//! header which is always the last canonical header.

mod authority;
pub use self::authority::Authority;

use crate::s3::UploadError;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::{Url, form_urlencoded};

/// The pieces of one HTTP call that are signed, built fresh for every call
#[derive(Debug, Clone)]
pub struct SigningRequest<'a> {
    pub verb: &'a str,
    pub content_md5: Option<&'a str>,
    pub content_type: &'a str,
    pub timestamp: &'a str,
    // caller supplied x-amz-* headers, x-amz-date is appended to them
    pub headers: BTreeMap<&'a str, &'a str>,
    // /<key>?<sub-resource>, without the bucket
    pub resource: &'a str,
}

impl<'a> SigningRequest<'a> {
    #[must_use]
    pub fn new(verb: &'a str, content_type: &'a str, timestamp: &'a str, resource: &'a str) -> Self {
        Self {
            verb,
            content_md5: None,
            content_type,
            timestamp,
            headers: BTreeMap::new(),
            resource,
        }
    }

    #[must_use]
    pub const fn with_md5(mut self, content_md5: Option<&'a str>) -> Self {
        self.content_md5 = content_md5;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<&'a str, &'a str>) -> Self {
        self.headers = headers;
        self
    }

    /// `name:value` lines, the caller headers followed by `x-amz-date`
    #[must_use]
    pub fn canonical_headers(&self) -> String {
        let mut lines: Vec<String> = self
            .headers
            .iter()
            .map(|(k, v)| format!("{}:{}", k.to_lowercase(), v.trim()))
            .collect();

        lines.push(format!("x-amz-date:{}", self.timestamp));

        lines.join("\n")
    }

    /// The form posted to the signing authority
    #[must_use]
    pub fn form(&self, bucket: &str) -> SigningForm {
        SigningForm {
            verb: self.verb.to_string(),
            md5: self.content_md5.unwrap_or_default().to_string(),
            content_type: self.content_type.to_string(),
            headers: self.canonical_headers(),
            resource: format!("/{bucket}{}", self.resource),
        }
    }

    #[must_use]
    pub fn canonical_string(&self, bucket: &str) -> String {
        self.form(bucket).canonical_string()
    }
}

/// Form fields understood by the signing authority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningForm {
    pub verb: String,
    pub md5: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub headers: String,
    pub resource: String,
}

impl SigningForm {
    #[must_use]
    pub fn canonical_string(&self) -> String {
        [
            self.verb.as_str(),
            self.md5.as_str(),
            self.content_type.as_str(),
            "",
            self.headers.as_str(),
            self.resource.as_str(),
        ]
        .join("\n")
    }

    #[must_use]
    pub fn to_urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("verb", &self.verb)
            .append_pair("md5", &self.md5)
            .append_pair("type", &self.content_type)
            .append_pair("headers", &self.headers)
            .append_pair("resource", &self.resource)
            .finish()
    }

    /// Unknown fields are ignored, missing ones stay empty
    #[must_use]
    pub fn from_urlencoded(input: &[u8]) -> Self {
        let mut form = Self::default();
        for (k, v) in form_urlencoded::parse(input) {
            match k.as_ref() {
                "verb" => form.verb = v.into_owned(),
                "md5" => form.md5 = v.into_owned(),
                "type" => form.content_type = v.into_owned(),
                "headers" => form.headers = v.into_owned(),
                "resource" => form.resource = v.into_owned(),
                _ => (),
            }
        }
        form
    }
}

/// The authority's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    // value of the Authorization header
    pub auth: String,
    // the string that was signed
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct Signer {
    client: Client,
    url: Url,
    bucket: String,
}

impl Signer {
    /// # Errors
    ///
    /// Will return `Err` if the authority URL is not valid
    pub fn new(client: Client, url: &str, bucket: &str) -> Result<Self, UploadError> {
        let url = Url::parse(url)
            .map_err(|e| UploadError::Config(format!("invalid signer url {url}: {e}")))?;

        Ok(Self {
            client,
            url,
            bucket: bucket.to_string(),
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Ask the authority to sign a request, no retries are done here
    ///
    /// # Errors
    ///
    /// Will return `Err` if the authority can not be reached, answers with a
    /// non-success status or with something that is not a signature
    pub async fn sign(&self, request: &SigningRequest<'_>) -> Result<Signature, UploadError> {
        let form = request.form(&self.bucket);
        let canonical = form.canonical_string();

        log::debug!("string to sign: {canonical:?}");

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.to_urlencoded())
            .send()
            .await
            .map_err(|e| UploadError::Signing(format!("signing authority unreachable: {e}")))?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Signing(format!("could not read signature: {e}")))?;

        if !status.is_success() {
            return Err(UploadError::Signing(format!(
                "signing authority returned {status}: {body}"
            )));
        }

        let signature: Signature = serde_json::from_str(&body)
            .map_err(|e| UploadError::Signing(format!("invalid signature response: {e}")))?;

        if signature.query != canonical {
            log::warn!(
                "signing authority signed {:?}, expected {canonical:?}",
                signature.query
            );
        }

        Ok(signature)
    }
}
