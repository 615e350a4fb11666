use crate::s3::S3;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, path::PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";

#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct Config {
    pub hosts: BTreeMap<String, Host>,
}

#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct Host {
    pub endpoint: Option<String>,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    // signing authority URL
    pub signer: String,
    #[serde(default)]
    pub path_style: bool,
    pub acl: Option<String>,
    pub part_size: Option<u64>,
}

impl Config {
    /// # Errors
    ///
    /// Will return `Err` if the file can not be opened or parsed
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let file = File::open(&config_path)
            .with_context(|| format!("unable to open: {}", config_path.display()))?;

        let config: Self =
            serde_yaml_ng::from_reader(file).context("unable to parse config file")?;

        Ok(config)
    }

    /// Get the host from the config.yml
    ///
    /// # Errors
    ///
    /// Will return `Err` if the host is not defined
    pub fn get_host(&self, name: &str) -> Result<&Host> {
        self.hosts
            .get(name)
            .with_context(|| format!("could not find host {name}"))
    }
}

impl Host {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Build the upload target, `prefix` overrides the configured one
    ///
    /// # Errors
    ///
    /// Will return `Err` if the endpoint or the signer URL are not valid
    pub fn s3(&self, prefix: Option<&str>) -> Result<S3> {
        let prefix = prefix.unwrap_or(&self.prefix);

        let s3 = S3::new(
            &self.bucket,
            prefix,
            self.endpoint(),
            &self.signer,
            self.path_style,
        )
        .context("invalid host configuration")?;

        Ok(s3.with_acl(self.acl.clone()))
    }
}
