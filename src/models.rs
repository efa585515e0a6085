use serde::{Serialize, Deserialize};

/// Body returned when an upload has been stored.
///
/// `path` is the absolute location the file was written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub path: String,
}

/// Body returned for every failed request, whatever the status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
