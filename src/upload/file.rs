use crate::{s3::UploadError, upload::chunker::Part};
use bytes::Bytes;
use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A local file to upload, its size is read once when opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    name: String,
    size: u64,
    content_type: String,
}

impl FileHandle {
    /// # Errors
    ///
    /// Will return `Err` if the path is not a readable file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;

        if !metadata.is_file() {
            return Err(UploadError::Config(format!(
                "not a file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::Config(format!("invalid file name: {}", path.display())))?
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Read the byte range of a part
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file can not be read or is shorter than expected
    pub async fn read(&self, part: &Part) -> Result<Bytes, UploadError> {
        let len = usize::try_from(part.len())
            .map_err(|e| UploadError::Config(format!("part too large: {e}")))?;

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(part.start)).await?;

        let mut buf = vec![0; len];
        file.read_exact(&mut buf).await?;

        Ok(Bytes::from(buf))
    }
}
