use crate::models::{
    Archive, CarouselImage, Circular, DateRangeFilter, GalleryPhoto, GalleryVideo,
    HomepageOfficial, NewArchive, NewCarouselImage, NewCircular, NewGalleryPhoto,
    NewGalleryVideo, NewHomepageOfficial, NewPublication, Publication,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// Abstract contract for every persistence operation the content endpoints need.
/// Handlers only see this trait, so tests substitute an in-memory implementation.
///
/// Deletes return the removed row so the caller can clean up the files it referenced.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Publications ---
    async fn list_publications(&self) -> Result<Vec<Publication>, sqlx::Error>;
    async fn get_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error>;
    async fn create_publication(&self, new: &NewPublication) -> Result<Publication, sqlx::Error>;
    async fn update_publication(
        &self,
        id: i64,
        update: &NewPublication,
    ) -> Result<Option<Publication>, sqlx::Error>;
    async fn delete_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error>;

    // --- Gallery ---
    async fn list_gallery_photos(&self) -> Result<Vec<GalleryPhoto>, sqlx::Error>;
    async fn create_gallery_photo(&self, new: &NewGalleryPhoto) -> Result<GalleryPhoto, sqlx::Error>;
    async fn delete_gallery_photo(&self, id: i64) -> Result<Option<GalleryPhoto>, sqlx::Error>;
    async fn list_gallery_videos(&self) -> Result<Vec<GalleryVideo>, sqlx::Error>;
    async fn create_gallery_video(&self, new: &NewGalleryVideo) -> Result<GalleryVideo, sqlx::Error>;
    async fn delete_gallery_video(&self, id: i64) -> Result<Option<GalleryVideo>, sqlx::Error>;

    // --- Circulars ---
    async fn list_circulars(&self, filter: &DateRangeFilter) -> Result<Vec<Circular>, sqlx::Error>;
    async fn get_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error>;
    async fn create_circular(&self, new: &NewCircular) -> Result<Circular, sqlx::Error>;
    async fn update_circular(
        &self,
        id: i64,
        update: &NewCircular,
    ) -> Result<Option<Circular>, sqlx::Error>;
    async fn delete_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error>;

    // --- Archives ---
    async fn list_archives(&self, filter: &DateRangeFilter) -> Result<Vec<Archive>, sqlx::Error>;
    async fn get_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error>;
    async fn create_archive(&self, new: &NewArchive) -> Result<Archive, sqlx::Error>;
    async fn update_archive(&self, id: i64, update: &NewArchive)
    -> Result<Option<Archive>, sqlx::Error>;
    async fn delete_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error>;

    // --- Homepage ---
    /// The hero banner shows at most three officials.
    async fn list_homepage_officials(&self) -> Result<Vec<HomepageOfficial>, sqlx::Error>;
    async fn create_homepage_official(
        &self,
        new: &NewHomepageOfficial,
    ) -> Result<HomepageOfficial, sqlx::Error>;
    async fn delete_homepage_official(
        &self,
        id: i64,
    ) -> Result<Option<HomepageOfficial>, sqlx::Error>;
    async fn list_carousel_images(&self) -> Result<Vec<CarouselImage>, sqlx::Error>;
    async fn create_carousel_image(
        &self,
        new: &NewCarouselImage,
    ) -> Result<CarouselImage, sqlx::Error>;
    /// Deletes every carousel row pointing at `image_url`.
    async fn delete_carousel_images_by_url(
        &self,
        image_url: &str,
    ) -> Result<Vec<CarouselImage>, sqlx::Error>;

    // --- Auth ---
    /// True when the token was revoked (logged out) and has not yet expired from the list.
    async fn is_token_revoked(&self, token: &str) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Every statement is parameterized.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the shared `year` / date-range conditions to a listing query.
/// The base query must already contain a `WHERE` clause.
fn push_date_filter(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &DateRangeFilter) {
    if let Some(year) = filter.year {
        builder.push(" AND EXTRACT(YEAR FROM date)::INT = ");
        builder.push_bind(year);
    }
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        builder.push(" AND date BETWEEN ");
        builder.push_bind(start);
        builder.push(" AND ");
        builder.push_bind(end);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_publications(&self) -> Result<Vec<Publication>, sqlx::Error> {
        sqlx::query_as::<_, Publication>(
            "SELECT id, title, description, cover_image_url, pdf_file_url, created_at \
             FROM publications ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error> {
        sqlx::query_as::<_, Publication>(
            "SELECT id, title, description, cover_image_url, pdf_file_url, created_at \
             FROM publications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_publication(&self, new: &NewPublication) -> Result<Publication, sqlx::Error> {
        sqlx::query_as::<_, Publication>(
            r#"
            INSERT INTO publications (title, description, cover_image_url, pdf_file_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, cover_image_url, pdf_file_url, created_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.cover_image_url)
        .bind(&new.pdf_file_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_publication(
        &self,
        id: i64,
        update: &NewPublication,
    ) -> Result<Option<Publication>, sqlx::Error> {
        sqlx::query_as::<_, Publication>(
            r#"
            UPDATE publications
            SET title = $1, description = $2, cover_image_url = $3, pdf_file_url = $4
            WHERE id = $5
            RETURNING id, title, description, cover_image_url, pdf_file_url, created_at
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.cover_image_url)
        .bind(&update.pdf_file_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_publication(&self, id: i64) -> Result<Option<Publication>, sqlx::Error> {
        sqlx::query_as::<_, Publication>(
            "DELETE FROM publications WHERE id = $1 \
             RETURNING id, title, description, cover_image_url, pdf_file_url, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_gallery_photos(&self) -> Result<Vec<GalleryPhoto>, sqlx::Error> {
        sqlx::query_as::<_, GalleryPhoto>(
            "SELECT id, title, date, image_url FROM gallery_photos ORDER BY date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_gallery_photo(&self, new: &NewGalleryPhoto) -> Result<GalleryPhoto, sqlx::Error> {
        sqlx::query_as::<_, GalleryPhoto>(
            "INSERT INTO gallery_photos (title, date, image_url) VALUES ($1, $2, $3) \
             RETURNING id, title, date, image_url",
        )
        .bind(&new.title)
        .bind(new.date)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_gallery_photo(&self, id: i64) -> Result<Option<GalleryPhoto>, sqlx::Error> {
        sqlx::query_as::<_, GalleryPhoto>(
            "DELETE FROM gallery_photos WHERE id = $1 RETURNING id, title, date, image_url",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_gallery_videos(&self) -> Result<Vec<GalleryVideo>, sqlx::Error> {
        sqlx::query_as::<_, GalleryVideo>(
            "SELECT id, title, date, video_id, thumbnail_url FROM gallery_videos \
             ORDER BY date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_gallery_video(&self, new: &NewGalleryVideo) -> Result<GalleryVideo, sqlx::Error> {
        sqlx::query_as::<_, GalleryVideo>(
            "INSERT INTO gallery_videos (title, date, video_id, thumbnail_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, date, video_id, thumbnail_url",
        )
        .bind(&new.title)
        .bind(new.date)
        .bind(&new.video_id)
        .bind(&new.thumbnail_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_gallery_video(&self, id: i64) -> Result<Option<GalleryVideo>, sqlx::Error> {
        sqlx::query_as::<_, GalleryVideo>(
            "DELETE FROM gallery_videos WHERE id = $1 \
             RETURNING id, title, date, video_id, thumbnail_url",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// list_circulars
    ///
    /// Uses QueryBuilder so the optional filters stay parameterized.
    async fn list_circulars(&self, filter: &DateRangeFilter) -> Result<Vec<Circular>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, s_no, number, date, subject, file_url FROM circulars WHERE 1=1",
        );
        push_date_filter(&mut builder, filter);
        builder.push(" ORDER BY date DESC, id DESC");

        builder
            .build_query_as::<Circular>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error> {
        sqlx::query_as::<_, Circular>(
            "SELECT id, s_no, number, date, subject, file_url FROM circulars WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_circular(&self, new: &NewCircular) -> Result<Circular, sqlx::Error> {
        sqlx::query_as::<_, Circular>(
            "INSERT INTO circulars (s_no, number, date, subject, file_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, s_no, number, date, subject, file_url",
        )
        .bind(new.s_no)
        .bind(&new.number)
        .bind(new.date)
        .bind(&new.subject)
        .bind(&new.file_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_circular(
        &self,
        id: i64,
        update: &NewCircular,
    ) -> Result<Option<Circular>, sqlx::Error> {
        sqlx::query_as::<_, Circular>(
            r#"
            UPDATE circulars
            SET s_no = $1, number = $2, date = $3, subject = $4, file_url = $5
            WHERE id = $6
            RETURNING id, s_no, number, date, subject, file_url
            "#,
        )
        .bind(update.s_no)
        .bind(&update.number)
        .bind(update.date)
        .bind(&update.subject)
        .bind(&update.file_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_circular(&self, id: i64) -> Result<Option<Circular>, sqlx::Error> {
        sqlx::query_as::<_, Circular>(
            "DELETE FROM circulars WHERE id = $1 \
             RETURNING id, s_no, number, date, subject, file_url",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_archives(&self, filter: &DateRangeFilter) -> Result<Vec<Archive>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            r#"SELECT id, title, date, "type", file_url FROM archives WHERE 1=1"#,
        );
        push_date_filter(&mut builder, filter);
        builder.push(" ORDER BY date DESC, id DESC");

        builder
            .build_query_as::<Archive>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error> {
        sqlx::query_as::<_, Archive>(
            r#"SELECT id, title, date, "type", file_url FROM archives WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_archive(&self, new: &NewArchive) -> Result<Archive, sqlx::Error> {
        sqlx::query_as::<_, Archive>(
            r#"
            INSERT INTO archives (title, date, "type", file_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, date, "type", file_url
            "#,
        )
        .bind(&new.title)
        .bind(new.date)
        .bind(&new.archive_type)
        .bind(&new.file_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_archive(
        &self,
        id: i64,
        update: &NewArchive,
    ) -> Result<Option<Archive>, sqlx::Error> {
        sqlx::query_as::<_, Archive>(
            r#"
            UPDATE archives
            SET title = $1, date = $2, "type" = $3, file_url = $4
            WHERE id = $5
            RETURNING id, title, date, "type", file_url
            "#,
        )
        .bind(&update.title)
        .bind(update.date)
        .bind(&update.archive_type)
        .bind(&update.file_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_archive(&self, id: i64) -> Result<Option<Archive>, sqlx::Error> {
        sqlx::query_as::<_, Archive>(
            r#"DELETE FROM archives WHERE id = $1 RETURNING id, title, date, "type", file_url"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_homepage_officials(&self) -> Result<Vec<HomepageOfficial>, sqlx::Error> {
        sqlx::query_as::<_, HomepageOfficial>(
            "SELECT id, name, title, image_url, link_url, display_order \
             FROM homepage_officials ORDER BY display_order ASC, id ASC LIMIT 3",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_homepage_official(
        &self,
        new: &NewHomepageOfficial,
    ) -> Result<HomepageOfficial, sqlx::Error> {
        sqlx::query_as::<_, HomepageOfficial>(
            r#"
            INSERT INTO homepage_officials (name, title, image_url, link_url, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, title, image_url, link_url, display_order
            "#,
        )
        .bind(&new.name)
        .bind(&new.title)
        .bind(&new.image_url)
        .bind(&new.link_url)
        .bind(new.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_homepage_official(
        &self,
        id: i64,
    ) -> Result<Option<HomepageOfficial>, sqlx::Error> {
        sqlx::query_as::<_, HomepageOfficial>(
            "DELETE FROM homepage_officials WHERE id = $1 \
             RETURNING id, name, title, image_url, link_url, display_order",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_carousel_images(&self) -> Result<Vec<CarouselImage>, sqlx::Error> {
        sqlx::query_as::<_, CarouselImage>(
            "SELECT id, alt_text, image_url, display_order FROM homepage_carousel \
             ORDER BY display_order ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_carousel_image(
        &self,
        new: &NewCarouselImage,
    ) -> Result<CarouselImage, sqlx::Error> {
        sqlx::query_as::<_, CarouselImage>(
            "INSERT INTO homepage_carousel (alt_text, image_url, display_order) \
             VALUES ($1, $2, $3) RETURNING id, alt_text, image_url, display_order",
        )
        .bind(&new.alt_text)
        .bind(&new.image_url)
        .bind(new.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_carousel_images_by_url(
        &self,
        image_url: &str,
    ) -> Result<Vec<CarouselImage>, sqlx::Error> {
        sqlx::query_as::<_, CarouselImage>(
            "DELETE FROM homepage_carousel WHERE image_url = $1 \
             RETURNING id, alt_text, image_url, display_order",
        )
        .bind(image_url)
        .fetch_all(&self.pool)
        .await
    }

    /// is_token_revoked
    ///
    /// Purges expired blocklist rows first, so the list only holds tokens that could
    /// still pass signature and expiry checks.
    async fn is_token_revoked(&self, token: &str) -> Result<bool, sqlx::Error> {
        if let Err(e) = sqlx::query("DELETE FROM jwt_blocklist WHERE expiry <= NOW()")
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = ?e, "Failed to purge expired blocklist entries");
        }

        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM jwt_blocklist WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
    }
}
