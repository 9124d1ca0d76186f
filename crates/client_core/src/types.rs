use std::path::Path;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_raw()
            .map(str::to_string);
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> ServiceResult<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ServiceError::InvalidUpload(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ServiceError::InvalidUpload(format!("failed to read '{}': {e}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(ServiceError::InvalidUpload(format!(
                "'{}' is empty",
                path.display()
            )));
        }
        Ok(Self::new(filename, bytes))
    }
}

/// Result of a multi-step workflow whose secondary file cleanup may fail
/// after the primary write already succeeded.
#[derive(Debug)]
pub struct WorkflowOutcome<T> {
    pub value: T,
    pub cleanup_error: Option<ServiceError>,
}
