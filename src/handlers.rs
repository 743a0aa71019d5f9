use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ErrorResponse},
    models::{
        Archive, CarouselImage, Circular, DateRangeFilter, DeleteCarouselRequest, GalleryPhoto,
        GalleryVideo, HomepageOfficial, NewArchive, NewCarouselImage, NewCircular,
        NewGalleryPhoto, NewGalleryVideo, NewHomepageOfficial, NewPublication, Publication,
        UploadResponse,
    },
    upload::{
        self, AcceptedUpload, NamingPolicy, StorageState, StoredAsset, UploadField, ValidatedForm,
    },
};
use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State, multipart::MultipartRejection, rejection::JsonRejection,
    },
    http::StatusCode,
};

// --- Upload Declarations ---

const PUBLICATION_FIELDS: &[UploadField] = &[
    UploadField::image("cover_image"),
    UploadField::document("pdf_file"),
];
const PUBLICATION_UPDATE_FIELDS: &[UploadField] = &[
    UploadField::image("cover_image").optional(),
    UploadField::document("pdf_file").optional(),
];
const GALLERY_PHOTO_FIELDS: &[UploadField] = &[UploadField::image("image")];
// The video itself is embedded by provider id; only the thumbnail is uploaded.
const GALLERY_VIDEO_FIELDS: &[UploadField] = &[UploadField::image("image").optional()];
const HOMEPAGE_IMAGE_FIELDS: &[UploadField] = &[UploadField::image("image")];
const PDF_FIELDS: &[UploadField] = &[UploadField::document("pdf")];
const PDF_UPDATE_FIELDS: &[UploadField] = &[UploadField::document("pdf").optional()];

const COVER_NAMING: NamingPolicy = NamingPolicy::new("cover_");
const PUBLICATION_NAMING: NamingPolicy = NamingPolicy::new("publication_");
const GALLERY_NAMING: NamingPolicy = NamingPolicy::new("Gallery_");
const VIDEO_NAMING: NamingPolicy = NamingPolicy::new("Video_");
const CIRCULAR_NAMING: NamingPolicy = NamingPolicy::new("Circular_");
const ARCHIVE_NAMING: NamingPolicy = NamingPolicy::new("Archive_");
const CAROUSEL_NAMING: NamingPolicy = NamingPolicy::new("carousel_");
// Officials are named after the person; this covers names with no usable characters.
const OFFICIAL_FALLBACK_PREFIX: &str = "official_";
const DEFAULT_DISPLAY_ORDER: i32 = 1;

type Created = (StatusCode, Json<UploadResponse>);

// --- Upload Plumbing ---

/// Receives and validates every file of the request. Nothing touches the disk here.
async fn receive_form(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    fields: &[UploadField],
) -> Result<ValidatedForm, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = upload::receive(multipart, fields, &state.config.upload_limits).await?;
    Ok(form.validate()?)
}

/// StagedAssets
///
/// Files persisted during the current request. If a later step fails they are removed
/// again, so no file outlives a failed database write.
struct StagedAssets<'a> {
    storage: &'a StorageState,
    assets: Vec<StoredAsset>,
}

impl<'a> StagedAssets<'a> {
    fn new(storage: &'a StorageState) -> Self {
        Self {
            storage,
            assets: Vec::new(),
        }
    }

    /// Persists one accepted upload and returns its relative URL.
    async fn persist(
        &mut self,
        upload: AcceptedUpload,
        policy: NamingPolicy,
    ) -> Result<String, ApiError> {
        match self.storage.persist(upload, policy).await {
            Ok(asset) => {
                let url = asset.url.clone();
                self.assets.push(asset);
                Ok(url)
            }
            Err(e) => {
                self.storage.discard(&self.assets).await;
                Err(e.into())
            }
        }
    }

    async fn persist_optional(
        &mut self,
        upload: Option<AcceptedUpload>,
        policy: NamingPolicy,
    ) -> Result<Option<String>, ApiError> {
        match upload {
            Some(upload) => self.persist(upload, policy).await.map(Some),
            None => Ok(None),
        }
    }

    /// Resolves the database write that references the staged files. On a database error,
    /// or when the target row no longer exists, the staged files are discarded.
    async fn settle<T>(
        self,
        result: Result<Option<T>, sqlx::Error>,
        not_found: &str,
    ) -> Result<T, ApiError> {
        match result {
            Ok(Some(row)) => Ok(row),
            Ok(None) => {
                self.storage.discard(&self.assets).await;
                Err(ApiError::NotFound(not_found.to_string()))
            }
            Err(e) => {
                if !self.assets.is_empty() {
                    tracing::warn!(
                        files = self.assets.len(),
                        "Database write failed, removing files stored for this request"
                    );
                }
                self.storage.discard(&self.assets).await;
                Err(e.into())
            }
        }
    }
}

/// Removes files that a successful update replaced. Missing files are logged, not fatal.
async fn remove_replaced(storage: &StorageState, old: &str, new: &str) {
    if old != new {
        storage.remove(old).await;
    }
}

// --- Public Handlers ---

/// list_publications
///
/// [Public Route] All publications, newest first.
#[utoipa::path(
    get,
    path = "/content/publications",
    responses((status = 200, description = "Publications", body = [Publication]))
)]
pub async fn list_publications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Publication>>, ApiError> {
    Ok(Json(state.repo.list_publications().await?))
}

#[utoipa::path(
    get,
    path = "/content/gallery/photos",
    responses((status = 200, description = "Gallery photos", body = [GalleryPhoto]))
)]
pub async fn list_gallery_photos(
    State(state): State<AppState>,
) -> Result<Json<Vec<GalleryPhoto>>, ApiError> {
    Ok(Json(state.repo.list_gallery_photos().await?))
}

#[utoipa::path(
    get,
    path = "/content/gallery/videos",
    responses((status = 200, description = "Gallery videos", body = [GalleryVideo]))
)]
pub async fn list_gallery_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<GalleryVideo>>, ApiError> {
    Ok(Json(state.repo.list_gallery_videos().await?))
}

/// list_circulars
///
/// [Public Route] Circulars, optionally filtered by year or by an inclusive date range.
#[utoipa::path(
    get,
    path = "/content/circulars",
    params(DateRangeFilter),
    responses((status = 200, description = "Circulars", body = [Circular]))
)]
pub async fn list_circulars(
    State(state): State<AppState>,
    Query(filter): Query<DateRangeFilter>,
) -> Result<Json<Vec<Circular>>, ApiError> {
    Ok(Json(state.repo.list_circulars(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/content/archives",
    params(DateRangeFilter),
    responses((status = 200, description = "Archives", body = [Archive]))
)]
pub async fn list_archives(
    State(state): State<AppState>,
    Query(filter): Query<DateRangeFilter>,
) -> Result<Json<Vec<Archive>>, ApiError> {
    Ok(Json(state.repo.list_archives(&filter).await?))
}

/// list_homepage_officials
///
/// [Public Route] The homepage hero banner: up to three officials by display order.
#[utoipa::path(
    get,
    path = "/content/homepage/officials",
    responses((status = 200, description = "Homepage officials", body = [HomepageOfficial]))
)]
pub async fn list_homepage_officials(
    State(state): State<AppState>,
) -> Result<Json<Vec<HomepageOfficial>>, ApiError> {
    Ok(Json(state.repo.list_homepage_officials().await?))
}

#[utoipa::path(
    get,
    path = "/content/homepage/carousel",
    responses((status = 200, description = "Carousel images", body = [CarouselImage]))
)]
pub async fn list_carousel_images(
    State(state): State<AppState>,
) -> Result<Json<Vec<CarouselImage>>, ApiError> {
    Ok(Json(state.repo.list_carousel_images().await?))
}

// --- Admin Handlers: Publications ---

/// create_publication
///
/// [Admin Route] Multipart form: `cover_image` (JPEG/PNG), `pdf_file` (PDF), `title`,
/// `description`. Both files are required.
#[utoipa::path(
    post,
    path = "/publications",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn create_publication(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, PUBLICATION_FIELDS).await?;
    let title = form.fields.required_text("title")?;
    let description = form.fields.optional_text("description")?;

    let (Some(cover), Some(pdf)) = (form.take("cover_image"), form.take("pdf_file")) else {
        return Err(ApiError::BadRequest(
            "Both cover_image and pdf_file are required".to_string(),
        ));
    };

    let mut staged = StagedAssets::new(&state.storage);
    let cover_image_url = staged.persist(cover, COVER_NAMING).await?;
    let pdf_file_url = staged.persist(pdf, PUBLICATION_NAMING).await?;

    let new = NewPublication {
        title,
        description,
        cover_image_url,
        pdf_file_url,
    };
    let created = staged
        .settle(state.repo.create_publication(&new).await.map(Some), "Publication not found")
        .await?;

    tracing::info!(id = created.id, admin = %username, "Publication created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Publication created successfully")
                .with_id(created.id)
                .with_file("cover_image", created.cover_image_url)
                .with_file("pdf_file", created.pdf_file_url),
        ),
    ))
}

/// update_publication
///
/// [Admin Route] Replaces title/description and, optionally, either file. New files are
/// stored before the row is updated; replaced files are deleted afterwards.
#[utoipa::path(
    put,
    path = "/publications/{id}",
    params(("id" = i64, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Updated", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_publication(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = receive_form(&state, multipart, PUBLICATION_UPDATE_FIELDS).await?;
    let title = form.fields.required_text("title")?;
    let description = form.fields.optional_text("description")?;

    let existing = state
        .repo
        .get_publication(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Publication not found".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let new_cover = staged
        .persist_optional(form.take("cover_image"), COVER_NAMING)
        .await?;
    let new_pdf = staged
        .persist_optional(form.take("pdf_file"), PUBLICATION_NAMING)
        .await?;

    let update = NewPublication {
        title,
        description,
        cover_image_url: new_cover.unwrap_or_else(|| existing.cover_image_url.clone()),
        pdf_file_url: new_pdf.unwrap_or_else(|| existing.pdf_file_url.clone()),
    };
    let updated = staged
        .settle(state.repo.update_publication(id, &update).await, "Publication not found")
        .await?;

    remove_replaced(&state.storage, &existing.cover_image_url, &updated.cover_image_url).await;
    remove_replaced(&state.storage, &existing.pdf_file_url, &updated.pdf_file_url).await;

    tracing::info!(id, admin = %username, "Publication updated");

    Ok(Json(
        UploadResponse::new("Publication updated successfully")
            .with_id(id)
            .with_file("cover_image", updated.cover_image_url)
            .with_file("pdf_file", updated.pdf_file_url),
    ))
}

#[utoipa::path(
    delete,
    path = "/publications/{id}",
    params(("id" = i64, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_publication(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_publication(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Publication not found".to_string()))?;

    state.storage.remove(&deleted.cover_image_url).await;
    state.storage.remove(&deleted.pdf_file_url).await;

    tracing::info!(id, admin = %username, "Publication deleted");
    Ok(Json(UploadResponse::new("Publication deleted successfully").with_id(id)))
}

// --- Admin Handlers: Gallery ---

/// create_gallery_photo
///
/// [Admin Route] Multipart form: `image`, `title`, `date` (DD-MM-YYYY or YYYY-MM-DD).
#[utoipa::path(
    post,
    path = "/gallery/photos",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_gallery_photo(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, GALLERY_PHOTO_FIELDS).await?;
    let title = form.fields.required_text("title")?;
    let date = form.fields.required_date("date")?;
    let image = form
        .take("image")
        .ok_or_else(|| ApiError::BadRequest("image is required".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let image_url = staged.persist(image, GALLERY_NAMING).await?;

    let new = NewGalleryPhoto {
        title,
        date,
        image_url,
    };
    let created = staged
        .settle(state.repo.create_gallery_photo(&new).await.map(Some), "Photo not found")
        .await?;

    tracing::info!(id = created.id, admin = %username, "Gallery photo created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Photo uploaded successfully")
                .with_id(created.id)
                .with_file("image", created.image_url),
        ),
    ))
}

#[utoipa::path(
    delete,
    path = "/gallery/photos/{id}",
    params(("id" = i64, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_gallery_photo(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_gallery_photo(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photo not found with this ID.".to_string()))?;

    state.storage.remove(&deleted.image_url).await;

    tracing::info!(id, admin = %username, "Gallery photo deleted");
    Ok(Json(UploadResponse::new("Photo deleted successfully.").with_id(id)))
}

/// create_gallery_video
///
/// [Admin Route] Multipart form: `title`, `date`, `video_id`, optional `image` thumbnail.
#[utoipa::path(
    post,
    path = "/gallery/videos",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_gallery_video(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, GALLERY_VIDEO_FIELDS).await?;
    let title = form.fields.required_text("title")?;
    let date = form.fields.required_date("date")?;
    let video_id = form.fields.required_text("video_id")?;

    let mut staged = StagedAssets::new(&state.storage);
    let thumbnail_url = staged
        .persist_optional(form.take("image"), VIDEO_NAMING)
        .await?;

    let new = NewGalleryVideo {
        title,
        date,
        video_id,
        thumbnail_url,
    };
    let created = staged
        .settle(state.repo.create_gallery_video(&new).await.map(Some), "Video not found")
        .await?;

    tracing::info!(id = created.id, admin = %username, "Gallery video created");

    let mut response = UploadResponse::new("Video uploaded successfully").with_id(created.id);
    if let Some(url) = created.thumbnail_url {
        response = response.with_file("image", url);
    }
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/gallery/videos/{id}",
    params(("id" = i64, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_gallery_video(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_gallery_video(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found with this ID.".to_string()))?;

    if let Some(url) = &deleted.thumbnail_url {
        state.storage.remove(url).await;
    }

    tracing::info!(id, admin = %username, "Gallery video deleted");
    Ok(Json(UploadResponse::new("Video deleted successfully.").with_id(id)))
}

// --- Admin Handlers: Circulars ---

fn circular_from_form(form: &ValidatedForm, file_url: String) -> Result<NewCircular, ApiError> {
    Ok(NewCircular {
        s_no: form.fields.required_int("s_no")?,
        number: form.fields.required_text("number")?,
        date: form.fields.required_date("date")?,
        subject: form.fields.required_text("subject")?,
        file_url,
    })
}

/// create_circular
///
/// [Admin Route] Multipart form: `pdf`, `s_no`, `number`, `date`, `subject`.
#[utoipa::path(
    post,
    path = "/manage/circulars",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_circular(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, PDF_FIELDS).await?;
    // Text fields are checked before anything is written.
    circular_from_form(&form, String::new())?;
    let pdf = form
        .take("pdf")
        .ok_or_else(|| ApiError::BadRequest("A valid PDF is required".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let file_url = staged.persist(pdf, CIRCULAR_NAMING).await?;
    let new = circular_from_form(&form, file_url)?;

    let created = staged
        .settle(state.repo.create_circular(&new).await.map(Some), "Circular not found")
        .await?;

    tracing::info!(id = created.id, admin = %username, "Circular created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Circular uploaded successfully")
                .with_id(created.id)
                .with_file("pdf", created.file_url),
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/manage/circulars/{id}",
    params(("id" = i64, Path, description = "Circular ID")),
    responses(
        (status = 200, description = "Updated", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_circular(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = receive_form(&state, multipart, PDF_UPDATE_FIELDS).await?;
    circular_from_form(&form, String::new())?;

    let existing = state
        .repo
        .get_circular(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Circular not found".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let new_pdf = staged
        .persist_optional(form.take("pdf"), CIRCULAR_NAMING)
        .await?;
    let update = circular_from_form(
        &form,
        new_pdf.unwrap_or_else(|| existing.file_url.clone()),
    )?;

    let updated = staged
        .settle(state.repo.update_circular(id, &update).await, "Circular not found")
        .await?;

    remove_replaced(&state.storage, &existing.file_url, &updated.file_url).await;

    tracing::info!(id, admin = %username, "Circular updated");

    Ok(Json(
        UploadResponse::new("Circular updated successfully")
            .with_id(id)
            .with_file("pdf", updated.file_url),
    ))
}

#[utoipa::path(
    delete,
    path = "/manage/circulars/{id}",
    params(("id" = i64, Path, description = "Circular ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_circular(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_circular(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Circular not found".to_string()))?;

    state.storage.remove(&deleted.file_url).await;

    tracing::info!(id, admin = %username, "Circular deleted");
    Ok(Json(UploadResponse::new("Circular deleted successfully").with_id(id)))
}

// --- Admin Handlers: Archives ---

fn archive_from_form(form: &ValidatedForm, file_url: String) -> Result<NewArchive, ApiError> {
    Ok(NewArchive {
        title: form.fields.required_text("title")?,
        date: form.fields.required_date("date")?,
        archive_type: form.fields.required_text("type")?,
        file_url,
    })
}

/// create_archive
///
/// [Admin Route] Multipart form: `pdf`, `title`, `date`, `type`.
#[utoipa::path(
    post,
    path = "/manage/archives",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_archive(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, PDF_FIELDS).await?;
    archive_from_form(&form, String::new())?;
    let pdf = form
        .take("pdf")
        .ok_or_else(|| ApiError::BadRequest("A valid PDF file is required".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let file_url = staged.persist(pdf, ARCHIVE_NAMING).await?;
    let new = archive_from_form(&form, file_url)?;

    let created = staged
        .settle(state.repo.create_archive(&new).await.map(Some), "Archive not found")
        .await?;

    tracing::info!(id = created.id, admin = %username, "Archive created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Archive uploaded successfully")
                .with_id(created.id)
                .with_file("pdf", created.file_url),
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/manage/archives/{id}",
    params(("id" = i64, Path, description = "Archive ID")),
    responses(
        (status = 200, description = "Updated", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_archive(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = receive_form(&state, multipart, PDF_UPDATE_FIELDS).await?;
    archive_from_form(&form, String::new())?;

    let existing = state
        .repo
        .get_archive(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Archive not found".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let new_pdf = staged
        .persist_optional(form.take("pdf"), ARCHIVE_NAMING)
        .await?;
    let update = archive_from_form(&form, new_pdf.unwrap_or_else(|| existing.file_url.clone()))?;

    let updated = staged
        .settle(state.repo.update_archive(id, &update).await, "Archive not found")
        .await?;

    remove_replaced(&state.storage, &existing.file_url, &updated.file_url).await;

    tracing::info!(id, admin = %username, "Archive updated");

    Ok(Json(
        UploadResponse::new("Archive updated successfully")
            .with_id(id)
            .with_file("pdf", updated.file_url),
    ))
}

#[utoipa::path(
    delete,
    path = "/manage/archives/{id}",
    params(("id" = i64, Path, description = "Archive ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_archive(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_archive(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Archive not found".to_string()))?;

    state.storage.remove(&deleted.file_url).await;

    tracing::info!(id, admin = %username, "Archive deleted");
    Ok(Json(UploadResponse::new("Archive deleted successfully").with_id(id)))
}

// --- Admin Handlers: Homepage ---

/// create_homepage_official
///
/// [Admin Route] Multipart form: `image`, `name`, `title`, optional `link_url` and
/// `display_order` (defaults to 1). The stored filename is prefixed with the
/// normalised name, e.g. `jane_doe_...jpg`.
#[utoipa::path(
    post,
    path = "/homepage/officials",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_homepage_official(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, HOMEPAGE_IMAGE_FIELDS).await?;
    let name = form.fields.required_text("name")?;
    let title = form.fields.required_text("title")?;
    let link_url = form.fields.optional_text("link_url")?;
    let display_order = form.fields.int_or("display_order", DEFAULT_DISPLAY_ORDER);
    let image = form
        .take("image")
        .ok_or_else(|| ApiError::BadRequest("image is required".to_string()))?;

    let naming = NamingPolicy::from_label(&name, OFFICIAL_FALLBACK_PREFIX);
    let mut staged = StagedAssets::new(&state.storage);
    let image_url = staged.persist(image, naming).await?;

    let new = NewHomepageOfficial {
        name,
        title,
        image_url,
        link_url,
        display_order,
    };
    let created = staged
        .settle(
            state.repo.create_homepage_official(&new).await.map(Some),
            "Official not found",
        )
        .await?;

    tracing::info!(id = created.id, admin = %username, "Homepage official created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Official added successfully")
                .with_id(created.id)
                .with_file("image", created.image_url),
        ),
    ))
}

#[utoipa::path(
    delete,
    path = "/homepage/officials/{id}",
    params(("id" = i64, Path, description = "Official ID")),
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_homepage_official(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UploadResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_homepage_official(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Official not found".to_string()))?;

    state.storage.remove(&deleted.image_url).await;

    tracing::info!(id, admin = %username, "Homepage official deleted");
    Ok(Json(UploadResponse::new("Official deleted successfully").with_id(id)))
}

/// create_carousel_image
///
/// [Admin Route] Multipart form: `image`, `alt_text`, optional `display_order`.
#[utoipa::path(
    post,
    path = "/homepage/carousel",
    responses(
        (status = 201, description = "Created", body = UploadResponse),
        (status = 400, description = "Rejected upload or form", body = ErrorResponse)
    )
)]
pub async fn create_carousel_image(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created, ApiError> {
    let mut form = receive_form(&state, multipart, HOMEPAGE_IMAGE_FIELDS).await?;
    let alt_text = form.fields.required_text("alt_text")?;
    let display_order = form.fields.int_or("display_order", DEFAULT_DISPLAY_ORDER);
    let image = form
        .take("image")
        .ok_or_else(|| ApiError::BadRequest("image is required".to_string()))?;

    let mut staged = StagedAssets::new(&state.storage);
    let image_url = staged.persist(image, CAROUSEL_NAMING).await?;

    let new = NewCarouselImage {
        alt_text,
        image_url,
        display_order,
    };
    let created = staged
        .settle(
            state.repo.create_carousel_image(&new).await.map(Some),
            "Carousel image not found",
        )
        .await?;

    tracing::info!(id = created.id, admin = %username, "Carousel image created");

    Ok((
        StatusCode::CREATED,
        Json(
            UploadResponse::new("Carousel image uploaded successfully")
                .with_id(created.id)
                .with_file("image", created.image_url),
        ),
    ))
}

/// delete_carousel_image
///
/// [Admin Route] JSON body `{ "image_url": "/images/carousel_...jpg" }`. Removes the
/// matching rows, then the file.
#[utoipa::path(
    delete,
    path = "/homepage/carousel",
    request_body = DeleteCarouselRequest,
    responses(
        (status = 200, description = "Deleted", body = UploadResponse),
        (status = 400, description = "Missing image_url", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_carousel_image(
    AuthUser { username }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<DeleteCarouselRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let image_url = payload.image_url.trim();
    if image_url.is_empty() {
        return Err(ApiError::BadRequest("Image URL is required".to_string()));
    }

    let deleted = state.repo.delete_carousel_images_by_url(image_url).await?;
    if deleted.is_empty() {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }

    state.storage.remove(image_url).await;

    tracing::info!(url = image_url, rows = deleted.len(), admin = %username, "Carousel image deleted");
    Ok(Json(UploadResponse::new(
        "Carousel image and record deleted successfully",
    )))
}
