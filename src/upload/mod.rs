//! Upload Guard
//!
//! Receives multipart file uploads, checks them against the declared content class and
//! only then hands them to storage. The pipeline per file is:
//!
//! `Received -> Buffered -> ExtensionChecked -> MimeChecked -> SignatureChecked
//!  -> [StructureChecked -> ContentScanned] -> Accepted | Rejected(reason)`
//!
//! The type system carries the terminal states: a [`RawUpload`] can only become an
//! [`AcceptedUpload`] through [`RawUpload::accept`], and the storage layer only accepts
//! `AcceptedUpload`. An unvalidated buffer therefore cannot reach the disk.

use bytes::Bytes;

use crate::config::UploadLimits;

pub mod error;
pub mod receiver;
pub mod scanner;
pub mod storage;
pub mod validator;

pub use error::UploadError;
pub use receiver::{ReceivedForm, ValidatedForm, receive};
pub use storage::{DiskStorage, MockStorageService, NamingPolicy, StorageService, StorageState, StoredAsset};

/// ContentClass
///
/// The category of file a field accepts. Each class owns its allow-lists and the
/// directory its files are stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// JPEG or PNG, stored under `images/`.
    Image,
    /// PDF, stored under `pdfs/`. Always passes through the content scanner.
    Document,
}

impl ContentClass {
    /// Lowercase extensions (without the dot) this class accepts.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            ContentClass::Image => &["jpg", "jpeg", "png"],
            ContentClass::Document => &["pdf"],
        }
    }

    pub fn allowed_mime_types(self) -> &'static [&'static str] {
        match self {
            ContentClass::Image => &["image/jpeg", "image/png"],
            ContentClass::Document => &["application/pdf"],
        }
    }

    /// Storage directory name, also the first segment of the public URL.
    pub fn directory(self) -> &'static str {
        match self {
            ContentClass::Image => "images",
            ContentClass::Document => "pdfs",
        }
    }
}

/// UploadField
///
/// Static declaration of one named file slot on an endpoint, e.g. `cover_image`.
/// Handlers declare these as constants and pass them to [`receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadField {
    pub name: &'static str,
    pub class: ContentClass,
    pub max_count: usize,
    /// Per-file byte ceiling. `None` falls back to the configured limit for the class.
    pub max_bytes: Option<usize>,
    pub required: bool,
}

impl UploadField {
    pub const fn image(name: &'static str) -> Self {
        Self {
            name,
            class: ContentClass::Image,
            max_count: 1,
            max_bytes: None,
            required: true,
        }
    }

    pub const fn document(name: &'static str) -> Self {
        Self {
            name,
            class: ContentClass::Document,
            max_count: 1,
            max_bytes: None,
            required: true,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// The effective per-file ceiling for this field under the given limits.
    pub fn byte_ceiling(&self, limits: &UploadLimits) -> usize {
        self.max_bytes.unwrap_or_else(|| limits.for_class(self.class))
    }
}

/// RawUpload
///
/// One file part as received, held entirely in memory. It lives only as long as the
/// request that carried it and is dropped (buffer freed) whichever way validation goes.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub class: ContentClass,
    pub data: Bytes,
}

/// Outcome of validating a single upload: either the accepted file or the first
/// rejection reason encountered.
pub type ValidationVerdict = Result<AcceptedUpload, UploadError>;

impl RawUpload {
    /// Runs every check for the upload's class without consuming it.
    /// Pure: the same upload always yields the same result.
    pub fn check(&self) -> Result<(), UploadError> {
        validator::check(self).map(|_| ())
    }

    /// Consumes the upload and returns its verdict.
    pub fn accept(self) -> ValidationVerdict {
        let extension = validator::check(&self)?;
        Ok(AcceptedUpload {
            field: self.field,
            original_filename: self.filename,
            extension,
            class: self.class,
            data: self.data,
        })
    }
}

/// AcceptedUpload
///
/// An upload that passed every check for its class. Only this module can build one.
#[derive(Debug, Clone)]
pub struct AcceptedUpload {
    field: String,
    original_filename: String,
    extension: String,
    class: ContentClass,
    data: Bytes,
}

impl AcceptedUpload {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Lowercase extension including the leading dot, e.g. `.jpg`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn class(&self) -> ContentClass {
        self.class
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
