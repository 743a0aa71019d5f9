//! Multipart Receiver
//!
//! Buffers the file parts of a multipart request in memory, enforcing per-field
//! cardinality and byte ceilings while the bytes stream in. Nothing is written to disk.

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};

use super::{AcceptedUpload, RawUpload, UploadError, UploadField};
use crate::config::UploadLimits;
use crate::forms::FormFields;

/// Ceiling for a single ordinary (non-file) form field.
pub const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;

/// ReceivedForm
///
/// Everything read from one multipart request: buffered (not yet validated) file parts
/// in arrival order, plus the ordinary text fields.
#[derive(Debug, Default)]
pub struct ReceivedForm {
    pub files: Vec<RawUpload>,
    pub fields: FormFields,
}

impl ReceivedForm {
    /// Buffered uploads for one field, in arrival order.
    pub fn uploads<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a RawUpload> + 'a {
        self.files.iter().filter(move |upload| upload.field == field)
    }

    /// Validates every buffered file in arrival order. The first rejection wins and the
    /// whole form is discarded with it.
    pub fn validate(self) -> Result<ValidatedForm, UploadError> {
        let mut accepted = Vec::with_capacity(self.files.len());
        for upload in self.files {
            let field = upload.field.clone();
            let filename = upload.filename.clone();
            match upload.accept() {
                Ok(file) => accepted.push(file),
                Err(e) => {
                    tracing::warn!(
                        field = %field,
                        filename = %filename,
                        reason = e.kind(),
                        "Rejected uploaded file"
                    );
                    return Err(e);
                }
            }
        }

        Ok(ValidatedForm {
            files: accepted,
            fields: self.fields,
        })
    }
}

/// ValidatedForm
///
/// A form whose every file part was accepted.
#[derive(Debug, Default)]
pub struct ValidatedForm {
    files: Vec<AcceptedUpload>,
    pub fields: FormFields,
}

impl ValidatedForm {
    /// Removes and returns the first accepted file for `field`.
    pub fn take(&mut self, field: &str) -> Option<AcceptedUpload> {
        let idx = self.files.iter().position(|f| f.field() == field)?;
        Some(self.files.remove(idx))
    }

    /// Removes and returns every accepted file for `field`.
    pub fn take_all(&mut self, field: &str) -> Vec<AcceptedUpload> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field() == field);
        self.files = rest;
        taken
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn multipart_error(err: MultipartError, limits: &UploadLimits) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge {
            field: "request body".to_string(),
            max: limits.max_request_bytes,
        }
    } else {
        UploadError::MalformedRequest(err.body_text())
    }
}

/// Reads a part chunk by chunk, failing as soon as the running total passes the ceiling.
async fn read_bounded(
    part: &mut Field<'_>,
    ceiling: usize,
    field: &str,
    limits: &UploadLimits,
) -> Result<Bytes, UploadError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = part.chunk().await.map_err(|e| multipart_error(e, limits))? {
        if buf.len() + chunk.len() > ceiling {
            return Err(UploadError::PayloadTooLarge {
                field: field.to_string(),
                max: ceiling,
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// receive
///
/// Drains the multipart stream against the endpoint's declared upload fields.
///
/// - File parts must belong to a declared field (`UnexpectedField` otherwise).
/// - A part with an empty filename and no bytes is a blank file input and is skipped.
/// - More parts than a field's `max_count` fails with `TooManyFiles`.
/// - A part over its ceiling fails with `PayloadTooLarge` before the rest is buffered.
/// - A required field missing at the end fails with `MissingFile`.
pub async fn receive(
    mut multipart: Multipart,
    fields: &[UploadField],
    limits: &UploadLimits,
) -> Result<ReceivedForm, UploadError> {
    let mut form = ReceivedForm::default();

    while let Some(mut part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limits))?
    {
        let name = part.name().unwrap_or_default().to_string();

        let Some(filename) = part.file_name().map(str::to_string) else {
            let raw = read_bounded(&mut part, MAX_TEXT_FIELD_BYTES, &name, limits).await?;
            let value = String::from_utf8(raw.to_vec()).map_err(|_| {
                UploadError::MalformedRequest(format!("Field {name} is not valid UTF-8"))
            })?;
            form.fields.insert(name, value);
            continue;
        };

        let Some(declared) = fields.iter().find(|f| f.name == name) else {
            tracing::warn!(field = %name, "Rejected file for undeclared field");
            return Err(UploadError::UnexpectedField { field: name });
        };

        if !filename.is_empty() && form.uploads(&name).count() >= declared.max_count {
            return Err(UploadError::TooManyFiles {
                field: name,
                max: declared.max_count,
            });
        }

        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = read_bounded(&mut part, declared.byte_ceiling(limits), &name, limits).await?;

        if filename.is_empty() && data.is_empty() {
            continue;
        }

        if form.uploads(&name).count() >= declared.max_count {
            return Err(UploadError::TooManyFiles {
                field: name,
                max: declared.max_count,
            });
        }

        tracing::debug!(field = %name, filename = %filename, bytes = data.len(), "Buffered upload");

        form.files.push(RawUpload {
            field: name,
            filename,
            content_type,
            class: declared.class,
            data,
        });
    }

    for declared in fields.iter().filter(|f| f.required) {
        if form.uploads(declared.name).next().is_none() {
            return Err(UploadError::MissingFile {
                field: declared.name.to_string(),
            });
        }
    }

    Ok(form)
}
