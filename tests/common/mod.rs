#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{Request, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use site_cms::{
    AppState,
    auth::Claims,
    config::AppConfig,
    models::{
        Archive, CarouselImage, Circular, DateRangeFilter, GalleryPhoto, GalleryVideo,
        HomepageOfficial, NewArchive, NewCarouselImage, NewCircular, NewGalleryPhoto,
        NewGalleryVideo, NewHomepageOfficial, NewPublication, Publication,
    },
    repository::Repository,
    upload::StorageState,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// --- File Fixtures ---

pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    data.extend_from_slice(&[0u8; 64]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&[0u8; 64]);
    data
}

/// A minimal well-formed PDF with no active content.
pub fn clean_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
      2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
      trailer\n<< /Root 1 0 R >>\n%%EOF\n"
        .to_vec()
}

/// A structurally valid PDF that runs an action on open.
pub fn open_action_pdf() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /OpenAction 3 0 R >>\nendobj\n%%EOF".to_vec()
}

// --- Multipart Bodies ---

pub const BOUNDARY: &str = "X-SITE-CMS-TEST-BOUNDARY";

/// Builds a `multipart/form-data` body by hand, part by part, in the order given.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }

    /// The body as sent by a client that stopped mid-part: no closing boundary.
    pub fn truncated(mut self) -> Vec<u8> {
        let cut = self.body.len().saturating_sub(2);
        self.body.truncate(cut);
        self.body
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    /// Wraps the body into an axum `Multipart` extractor, as a handler would receive it.
    pub async fn into_multipart(self) -> Multipart {
        multipart_from(self.finish()).await
    }

    pub async fn into_truncated_multipart(self) -> Multipart {
        multipart_from(self.truncated()).await
    }
}

async fn multipart_from(body: Vec<u8>) -> Multipart {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, MultipartBody::content_type())
        .body(Body::from(body))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}

// --- Auth ---

pub fn mint_token(secret: &str, sub: &str, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        exp: (now + ttl_seconds) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn admin_token() -> String {
    mint_token(&AppConfig::default().jwt_secret, "admin", 3600)
}

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    next_id: i64,
    publications: Vec<Publication>,
    photos: Vec<GalleryPhoto>,
    videos: Vec<GalleryVideo>,
    circulars: Vec<Circular>,
    archives: Vec<Archive>,
    officials: Vec<HomepageOfficial>,
    carousel: Vec<CarouselImage>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// InMemoryRepository
///
/// Stand-in for Postgres. `fail_writes` makes every insert/update fail with a database
/// error, which is how the rollback paths are exercised.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    revoked: Mutex<HashSet<String>>,
    pub fail_writes: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn revoke(&self, token: &str) {
        self.revoked.lock().unwrap().insert(token.to_string());
    }

    pub fn seed_publication(&self, cover_image_url: &str, pdf_file_url: &str) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.publications.push(Publication {
            id,
            title: "Seeded".to_string(),
            description: None,
            cover_image_url: cover_image_url.to_string(),
            pdf_file_url: pdf_file_url.to_string(),
            created_at: Utc::now(),
        });
        id
    }

    pub fn seed_circular(&self, file_url: &str) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.circulars.push(Circular {
            id,
            s_no: 1,
            number: "C/1".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            subject: "Seeded".to_string(),
            file_url: file_url.to_string(),
        });
        id
    }

    pub fn seed_archive(&self, file_url: &str) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.archives.push(Archive {
            id,
            title: "Seeded".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            archive_type: "report".to_string(),
            file_url: file_url.to_string(),
        });
        id
    }

    pub fn seed_carousel(&self, image_url: &str, display_order: i32) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.carousel.push(CarouselImage {
            id,
            alt_text: "Seeded".to_string(),
            image_url: image_url.to_string(),
            display_order,
        });
        id
    }

    pub fn seed_official(&self, name: &str, display_order: i32) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.officials.push(HomepageOfficial {
            id,
            name: name.to_string(),
            title: "Officer".to_string(),
            image_url: format!("/images/{id}.jpg"),
            link_url: None,
            display_order,
        });
        id
    }

    pub fn officials(&self) -> Vec<HomepageOfficial> {
        self.tables.lock().unwrap().officials.clone()
    }

    pub fn carousel(&self) -> Vec<CarouselImage> {
        self.tables.lock().unwrap().carousel.clone()
    }

    pub fn publications(&self) -> Vec<Publication> {
        self.tables.lock().unwrap().publications.clone()
    }

    pub fn photos(&self) -> Vec<GalleryPhoto> {
        self.tables.lock().unwrap().photos.clone()
    }

    pub fn videos(&self) -> Vec<GalleryVideo> {
        self.tables.lock().unwrap().videos.clone()
    }

    pub fn circulars(&self) -> Vec<Circular> {
        self.tables.lock().unwrap().circulars.clone()
    }

    pub fn archives(&self) -> Vec<Archive> {
        self.tables.lock().unwrap().archives.clone()
    }

    fn check_write(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

fn in_range(date: chrono::NaiveDate, filter: &DateRangeFilter) -> bool {
    use chrono::Datelike;
    let year_ok = filter.year.is_none_or(|y| date.year() == y);
    let range_ok = match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) => start <= date && date <= end,
        _ => true,
    };
    year_ok && range_ok
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_publications(&self) -> Result<Vec<Publication>, sqlx::Error> {
        let mut rows = self.publications();
        rows.reverse();
        Ok(rows)
    }

    async fn get_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error> {
        Ok(self.publications().into_iter().find(|p| p.id == id))
    }

    async fn create_publication(&self, new: &NewPublication) -> Result<Publication, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = Publication {
            id: t.next_id(),
            title: new.title.clone(),
            description: new.description.clone(),
            cover_image_url: new.cover_image_url.clone(),
            pdf_file_url: new.pdf_file_url.clone(),
            created_at: Utc::now(),
        };
        t.publications.push(row.clone());
        Ok(row)
    }

    async fn update_publication(
        &self,
        id: i64,
        update: &NewPublication,
    ) -> Result<Option<Publication>, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        Ok(t.publications.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = update.title.clone();
            p.description = update.description.clone();
            p.cover_image_url = update.cover_image_url.clone();
            p.pdf_file_url = update.pdf_file_url.clone();
            p.clone()
        }))
    }

    async fn delete_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.publications.iter().position(|p| p.id == id);
        Ok(idx.map(|i| t.publications.remove(i)))
    }

    async fn list_gallery_photos(&self) -> Result<Vec<GalleryPhoto>, sqlx::Error> {
        Ok(self.photos())
    }

    async fn create_gallery_photo(&self, new: &NewGalleryPhoto) -> Result<GalleryPhoto, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = GalleryPhoto {
            id: t.next_id(),
            title: new.title.clone(),
            date: new.date,
            image_url: new.image_url.clone(),
        };
        t.photos.push(row.clone());
        Ok(row)
    }

    async fn delete_gallery_photo(&self, id: i64) -> Result<Option<GalleryPhoto>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.photos.iter().position(|p| p.id == id);
        Ok(idx.map(|i| t.photos.remove(i)))
    }

    async fn list_gallery_videos(&self) -> Result<Vec<GalleryVideo>, sqlx::Error> {
        Ok(self.videos())
    }

    async fn create_gallery_video(&self, new: &NewGalleryVideo) -> Result<GalleryVideo, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = GalleryVideo {
            id: t.next_id(),
            title: new.title.clone(),
            date: new.date,
            video_id: new.video_id.clone(),
            thumbnail_url: new.thumbnail_url.clone(),
        };
        t.videos.push(row.clone());
        Ok(row)
    }

    async fn delete_gallery_video(&self, id: i64) -> Result<Option<GalleryVideo>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.videos.iter().position(|v| v.id == id);
        Ok(idx.map(|i| t.videos.remove(i)))
    }

    async fn list_circulars(&self, filter: &DateRangeFilter) -> Result<Vec<Circular>, sqlx::Error> {
        Ok(self
            .circulars()
            .into_iter()
            .filter(|c| in_range(c.date, filter))
            .collect())
    }

    async fn get_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error> {
        Ok(self.circulars().into_iter().find(|c| c.id == id))
    }

    async fn create_circular(&self, new: &NewCircular) -> Result<Circular, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = Circular {
            id: t.next_id(),
            s_no: new.s_no,
            number: new.number.clone(),
            date: new.date,
            subject: new.subject.clone(),
            file_url: new.file_url.clone(),
        };
        t.circulars.push(row.clone());
        Ok(row)
    }

    async fn update_circular(
        &self,
        id: i64,
        update: &NewCircular,
    ) -> Result<Option<Circular>, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        Ok(t.circulars.iter_mut().find(|c| c.id == id).map(|c| {
            c.s_no = update.s_no;
            c.number = update.number.clone();
            c.date = update.date;
            c.subject = update.subject.clone();
            c.file_url = update.file_url.clone();
            c.clone()
        }))
    }

    async fn delete_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.circulars.iter().position(|c| c.id == id);
        Ok(idx.map(|i| t.circulars.remove(i)))
    }

    async fn list_archives(&self, filter: &DateRangeFilter) -> Result<Vec<Archive>, sqlx::Error> {
        Ok(self
            .archives()
            .into_iter()
            .filter(|a| in_range(a.date, filter))
            .collect())
    }

    async fn get_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error> {
        Ok(self.archives().into_iter().find(|a| a.id == id))
    }

    async fn create_archive(&self, new: &NewArchive) -> Result<Archive, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = Archive {
            id: t.next_id(),
            title: new.title.clone(),
            date: new.date,
            archive_type: new.archive_type.clone(),
            file_url: new.file_url.clone(),
        };
        t.archives.push(row.clone());
        Ok(row)
    }

    async fn update_archive(
        &self,
        id: i64,
        update: &NewArchive,
    ) -> Result<Option<Archive>, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        Ok(t.archives.iter_mut().find(|a| a.id == id).map(|a| {
            a.title = update.title.clone();
            a.date = update.date;
            a.archive_type = update.archive_type.clone();
            a.file_url = update.file_url.clone();
            a.clone()
        }))
    }

    async fn delete_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.archives.iter().position(|a| a.id == id);
        Ok(idx.map(|i| t.archives.remove(i)))
    }

    async fn list_homepage_officials(&self) -> Result<Vec<HomepageOfficial>, sqlx::Error> {
        let mut rows = self.officials();
        rows.sort_by_key(|o| (o.display_order, o.id));
        rows.truncate(3);
        Ok(rows)
    }

    async fn create_homepage_official(
        &self,
        new: &NewHomepageOfficial,
    ) -> Result<HomepageOfficial, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = HomepageOfficial {
            id: t.next_id(),
            name: new.name.clone(),
            title: new.title.clone(),
            image_url: new.image_url.clone(),
            link_url: new.link_url.clone(),
            display_order: new.display_order,
        };
        t.officials.push(row.clone());
        Ok(row)
    }

    async fn delete_homepage_official(
        &self,
        id: i64,
    ) -> Result<Option<HomepageOfficial>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let idx = t.officials.iter().position(|o| o.id == id);
        Ok(idx.map(|i| t.officials.remove(i)))
    }

    async fn list_carousel_images(&self) -> Result<Vec<CarouselImage>, sqlx::Error> {
        let mut rows = self.carousel();
        rows.sort_by_key(|c| (c.display_order, c.id));
        Ok(rows)
    }

    async fn create_carousel_image(
        &self,
        new: &NewCarouselImage,
    ) -> Result<CarouselImage, sqlx::Error> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let row = CarouselImage {
            id: t.next_id(),
            alt_text: new.alt_text.clone(),
            image_url: new.image_url.clone(),
            display_order: new.display_order,
        };
        t.carousel.push(row.clone());
        Ok(row)
    }

    async fn delete_carousel_images_by_url(
        &self,
        image_url: &str,
    ) -> Result<Vec<CarouselImage>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let (deleted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut t.carousel)
            .into_iter()
            .partition(|c| c.image_url == image_url);
        t.carousel = kept;
        Ok(deleted)
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool, sqlx::Error> {
        Ok(self.revoked.lock().unwrap().contains(token))
    }
}

// --- App State ---

pub fn test_state(repo: Arc<InMemoryRepository>, storage: StorageState) -> AppState {
    AppState {
        repo,
        storage,
        config: AppConfig::default(),
    }
}
