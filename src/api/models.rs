//! API data models

use serde::{Deserialize, Serialize};

/// JSON error body returned for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Available sport categories for the upload form
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

/// Parsed upload request fields
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub file_bytes: Vec<u8>,
    pub sport_type: Option<String>,
    pub selected_moment: Option<String>,
}

impl UploadRequest {
    /// Category defaults to Football when the form omits it, matching the
    /// upload form's preselected sport.
    pub fn category(&self) -> &str {
        self.sport_type.as_deref().unwrap_or("Football")
    }

    pub fn has_file(&self) -> bool {
        !self.file_bytes.is_empty()
    }
}

/// Content-Disposition value for the downloadable clip
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_defaults() {
        let request = UploadRequest::default();
        assert_eq!(request.category(), "Football");
        assert!(!request.has_file());
    }

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("Football_highlights.mp4"),
            "attachment; filename=\"Football_highlights.mp4\""
        );
    }
}
