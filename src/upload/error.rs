use axum::http::StatusCode;

/// UploadError
///
/// The complete rejection taxonomy of the Upload Guard. Every stage (receiver, validator,
/// scanner, persister) reports failure through this one type, so the calling handler
/// only has a single translation step to the HTTP response.
///
/// The `Display` text of each variant is the client-facing message. Only
/// `StorageWriteError` carries internal detail, and that detail is kept out of
/// `client_message()`.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{field} is required")]
    MissingFile { field: String },

    #[error("Multiple files not allowed for {field} (max {max})")]
    TooManyFiles { field: String, max: usize },

    #[error("{field} exceeds the maximum size of {max} bytes")]
    PayloadTooLarge { field: String, max: usize },

    #[error("Unexpected file field: {field}")]
    UnexpectedField { field: String },

    #[error("Malformed multipart request: {0}")]
    MalformedRequest(String),

    #[error("Double extensions are not allowed")]
    DoubleExtension,

    #[error("Invalid file extension (allowed: {allowed})")]
    InvalidExtension { allowed: String },

    #[error("Invalid MIME type (allowed: {allowed})")]
    InvalidMimeType { allowed: String },

    #[error("File content does not match its declared type")]
    InvalidSignature,

    #[error("Invalid or corrupted PDF structure")]
    InvalidStructure,

    #[error("Potentially unsafe content detected")]
    SuspiciousContent,

    #[error("Failed to store file at {path}: {source}")]
    StorageWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Maps the rejection onto the HTTP status the client receives.
    /// Everything is a client error except a failed disk write.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::StorageWriteError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The message safe to show a client. Storage paths and OS errors never leave the server.
    pub fn client_message(&self) -> String {
        match self {
            UploadError::StorageWriteError { .. } => "Failed to store uploaded file".to_string(),
            other => other.to_string(),
        }
    }

    /// Stable machine-readable name of the rejection, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingFile { .. } => "MissingFile",
            UploadError::TooManyFiles { .. } => "TooManyFiles",
            UploadError::PayloadTooLarge { .. } => "PayloadTooLarge",
            UploadError::UnexpectedField { .. } => "UnexpectedField",
            UploadError::MalformedRequest(_) => "MalformedRequest",
            UploadError::DoubleExtension => "DoubleExtension",
            UploadError::InvalidExtension { .. } => "InvalidExtension",
            UploadError::InvalidMimeType { .. } => "InvalidMimeType",
            UploadError::InvalidSignature => "InvalidSignature",
            UploadError::InvalidStructure => "InvalidStructure",
            UploadError::SuspiciousContent => "SuspiciousContent",
            UploadError::StorageWriteError { .. } => "StorageWriteError",
        }
    }
}
