use crate::s3::{
    signer::{Signature, SigningForm},
    tools,
};
use secrecy::{ExposeSecret, SecretString};

/// The signing side: holds the access identifier and the secret key
///
/// `Authorization: AWS <access id>:Base64(HMAC-SHA1(secret, canonical string))`
#[derive(Debug)]
pub struct Authority {
    access_id: String,
    secret_key: SecretString,
}

impl Authority {
    #[must_use]
    pub fn new(access_id: &str, secret_key: SecretString) -> Self {
        Self {
            access_id: access_id.to_string(),
            secret_key,
        }
    }

    #[must_use]
    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    #[must_use]
    pub fn sign(&self, form: &SigningForm) -> Signature {
        let query = form.canonical_string();
        let signature = tools::sha1_hmac_base64(
            self.secret_key.expose_secret().as_bytes(),
            query.as_bytes(),
        );

        Signature {
            auth: format!("AWS {}:{signature}", self.access_id),
            query,
        }
    }
}
