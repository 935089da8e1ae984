use std::future::Future;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::ImageFormat;
use tracing::debug;

use crate::common::payload::{ImagePayload, OCTET_STREAM};
use crate::error::FileError;

/// A file handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub declared_mime: Option<String>,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declared_mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Declared MIME type, falling back to a guess from the extension.
    pub fn mime(&self) -> String {
        self.declared_mime
            .clone()
            .unwrap_or_else(|| guess_mime(&self.path).to_string())
    }
}

fn guess_mime(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// Reads user-selected files into image payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAdapter;

impl FileAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Returns a future that reads the whole file once polled. Nothing touches
    /// the filesystem before that.
    pub fn read(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<ImagePayload, FileError>> + Send + 'static {
        let file = file.clone();
        async move {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| FileError::Read {
                    path: file.path.clone(),
                    source,
                })?;
            let mime = file.mime();
            debug!("Read {} bytes ({}) from {:?}", bytes.len(), mime, file.path);
            Ok(ImagePayload::from_file(file.path, mime, Bytes::from(bytes)))
        }
    }
}
