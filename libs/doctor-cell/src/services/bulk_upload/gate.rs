use std::path::Path;

use super::error::BulkUploadError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx"];

/// An uploaded spreadsheet held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Extension and size checks, run before any parsing.
pub fn check_upload(file_name: &str, size: usize, max_bytes: usize) -> Result<(), BulkUploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(BulkUploadError::InputRejected("File type not allowed for upload".to_string()));
    }

    if size > max_bytes {
        return Err(BulkUploadError::InputRejected("File size is too large".to_string()));
    }

    Ok(())
}
