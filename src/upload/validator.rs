//! Format Validator
//!
//! Checks run in a fixed order and stop at the first failure, so the reported reason is
//! always deterministic:
//!
//! 1. double extension (`a.pdf.exe`)
//! 2. extension allow-list
//! 3. declared MIME allow-list, exact match
//! 4. binary signature agrees with extension and MIME
//! 5. documents only: `%%EOF` trailer, then the content scanner
//!
//! No filesystem or network access happens here.

use super::{ContentClass, RawUpload, UploadError, scanner};

/// Bytes inspected for an image signature.
const SIGNATURE_WINDOW: usize = 8;
/// Bytes at the end of a PDF searched for the `%%EOF` marker.
const PDF_TRAILER_WINDOW: usize = 10;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const PDF_HEADER: &[u8] = b"%PDF-";
const PDF_TRAILER: &[u8] = b"%%EOF";

/// Image formats recognised from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
        }
    }

    fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Identifies the image format from the first bytes of the buffer, if it is one we accept.
pub fn sniff_image(data: &[u8]) -> Option<ImageFormat> {
    let head = &data[..data.len().min(SIGNATURE_WINDOW)];
    if head.starts_with(JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else if head.starts_with(PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// Strips any directory part a client may have sent along with the filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// True when the submitted name carries more than one dot anywhere, directory part
/// included, so `v1.0/photo.jpg` counts as well as `resume.pdf.exe`.
pub fn has_double_extension(filename: &str) -> bool {
    filename.matches('.').count() > 1
}

/// Lowercase extension without the dot. A leading-dot name such as `.png` has none.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = base_name(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 => Some(name[idx + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

fn describe_extensions(class: ContentClass) -> String {
    class
        .allowed_extensions()
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates one upload against the rules of its class.
///
/// Returns the normalised extension (with the leading dot) on success.
pub(crate) fn check(upload: &RawUpload) -> Result<String, UploadError> {
    let class = upload.class;

    if has_double_extension(&upload.filename) {
        return Err(UploadError::DoubleExtension);
    }

    let extension = extension_of(&upload.filename)
        .filter(|ext| class.allowed_extensions().contains(&ext.as_str()))
        .ok_or_else(|| UploadError::InvalidExtension {
            allowed: describe_extensions(class),
        })?;

    // Declared MIME type is compared verbatim, parameters and case included.
    let mime = upload.content_type.as_str();
    if !class.allowed_mime_types().contains(&mime) {
        return Err(UploadError::InvalidMimeType {
            allowed: class.allowed_mime_types().join(", "),
        });
    }

    match class {
        ContentClass::Image => check_image_signature(&upload.data, &extension, mime)?,
        ContentClass::Document => check_document(&upload.data)?,
    }

    Ok(format!(".{extension}"))
}

fn check_image_signature(data: &[u8], extension: &str, mime: &str) -> Result<(), UploadError> {
    match sniff_image(data) {
        Some(format) if format.extensions().contains(&extension) && format.mime_type() == mime => {
            Ok(())
        }
        _ => Err(UploadError::InvalidSignature),
    }
}

fn check_document(data: &[u8]) -> Result<(), UploadError> {
    if !data.starts_with(PDF_HEADER) {
        return Err(UploadError::InvalidSignature);
    }

    let trailer = &data[data.len().saturating_sub(PDF_TRAILER_WINDOW)..];
    if !trailer.windows(PDF_TRAILER.len()).any(|w| w == PDF_TRAILER) {
        return Err(UploadError::InvalidStructure);
    }

    if let Some(signature) = scanner::scan(data) {
        tracing::warn!(signature, "Detected active content in uploaded PDF");
        return Err(UploadError::SuspiciousContent);
    }

    Ok(())
}
