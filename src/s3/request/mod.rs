use crate::s3::UploadError;
use bytes::Bytes;
use reqwest::{
    Client, Method, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::collections::BTreeMap;
use url::Url;

/// # Errors
///
/// Will return `Err` if a header is not valid or the request can not be sent
pub async fn request(
    client: &Client,
    url: Url,
    method: Method,
    headers: &BTreeMap<String, String>,
    body: Option<Bytes>,
) -> Result<Response, UploadError> {
    let headers = headers
        .iter()
        .map(|(k, v)| {
            Ok((
                k.parse::<HeaderName>()
                    .map_err(|e| UploadError::Protocol(format!("invalid header {k}: {e}")))?,
                v.parse::<HeaderValue>()
                    .map_err(|e| UploadError::Protocol(format!("invalid value for {k}: {e}")))?,
            ))
        })
        .collect::<Result<HeaderMap, UploadError>>()?;

    log::debug!("{method} {url}");

    let request = if let Some(body) = body {
        client.request(method, url).headers(headers).body(body)
    } else {
        client.request(method, url).headers(headers)
    };

    Ok(request.send().await?)
}
