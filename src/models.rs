use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Content Records (Mapped to Database) ---

/// Publication
///
/// A row of `publications`: a cover image plus the publication PDF.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Publication {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    // Relative URLs returned by the persister, e.g. "/images/cover_...jpg".
    pub cover_image_url: String,
    pub pdf_file_url: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// GalleryPhoto
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GalleryPhoto {
    pub id: i64,
    pub title: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub image_url: String,
}

/// GalleryVideo
///
/// An embedded video (by provider id) with an optional uploaded thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GalleryVideo {
    pub id: i64,
    pub title: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
}

/// Circular
///
/// An official circular: serial number, reference number, subject and the PDF.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Circular {
    pub id: i64,
    pub s_no: i32,
    pub number: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub subject: String,
    pub file_url: String,
}

/// Archive
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Archive {
    pub id: i64,
    pub title: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    // "type" is a reserved keyword in Rust.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub archive_type: String,
    pub file_url: String,
}

/// HomepageOfficial
///
/// A portrait on the homepage hero banner. The public listing shows the first three by
/// `display_order`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HomepageOfficial {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub display_order: i32,
}

/// CarouselImage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CarouselImage {
    pub id: i64,
    pub alt_text: String,
    pub image_url: String,
    pub display_order: i32,
}

// --- Write Payloads (built by handlers from validated forms) ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPublication {
    pub title: String,
    pub description: Option<String>,
    pub cover_image_url: String,
    pub pdf_file_url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewGalleryPhoto {
    pub title: String,
    pub date: NaiveDate,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewGalleryVideo {
    pub title: String,
    pub date: NaiveDate,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCircular {
    pub s_no: i32,
    pub number: String,
    pub date: NaiveDate,
    pub subject: String,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewArchive {
    pub title: String,
    pub date: NaiveDate,
    pub archive_type: String,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewHomepageOfficial {
    pub name: String,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCarouselImage {
    pub alt_text: String,
    pub image_url: String,
    pub display_order: i32,
}

// --- Query & Response Schemas ---

/// DeleteCarouselRequest
///
/// Carousel images are addressed by the URL the persister returned for them.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DeleteCarouselRequest {
    pub image_url: String,
}

/// DateRangeFilter
///
/// Query parameters for the circular and archive listings. `start_date` and `end_date`
/// only apply when both are present.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeFilter {
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// UploadResponse
///
/// Success body for admin writes. `files` maps each stored field to its relative URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, String>,
}

impl UploadResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, url: impl Into<String>) -> Self {
        self.files.insert(field.into(), url.into());
        self
    }
}
