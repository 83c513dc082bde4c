use std::path::Path;

use serde::Serialize;
use sqlx::SqlitePool;
use time::Date;

use crate::auth::Principal;
use crate::error::{CrescendoError, CrescendoResult};
use crate::file::ImageFile;
use crate::models::booking::Booking;
use crate::models::event::Event;
use crate::models::user::Role;
use crate::util::date_format;

/// A picture a musician uploaded for an event they played
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct EventImage {
    pub id: i64,
    pub event: i64,
    pub musician: i64,
    /// Relative to the static root, e.g. `uploads/<name>.png`
    pub image_path: String,
}

impl EventImage {
    /// Stores an uploaded image and links it to the event and the uploading musician.
    ///
    /// Only the musician booked for the event may add pictures to it.
    pub async fn upload(
        principal: &Principal,
        event_id: i64,
        image: ImageFile,
        upload_dir: &Path,
        pool: &SqlitePool,
    ) -> CrescendoResult<Self> {
        image.extension()?;
        principal.ensure_role(Role::Musician)?;
        Event::with_id(event_id, pool).await?;
        if Booking::confirmed_for_musician_at_event(principal.user_id, event_id, pool)
            .await?
            .is_none()
        {
            return Err(CrescendoError::Forbidden(
                "Only the musician booked for an event can upload pictures of it".to_owned(),
            ));
        }

        let stored_name = image.save(upload_dir).await?;
        let image_path = ImageFile::relative_path(&stored_name);

        let inserted = sqlx::query("INSERT INTO event_images (event, musician, image_path) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(principal.user_id)
            .bind(&image_path)
            .execute(pool)
            .await;
        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(error) => {
                if let Some(path) = ImageFile::on_disk(&image_path, upload_dir) {
                    if let Err(cleanup_error) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(?cleanup_error, path = %path.display(), "failed to remove orphaned upload");
                    }
                }
                return Err(error.into());
            }
        };

        tracing::info!(image = id, event = event_id, musician = principal.user_id, %image_path, "stored upload");

        Ok(Self {
            id,
            event: event_id,
            musician: principal.user_id,
            image_path,
        })
    }

    pub async fn for_event(event_id: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, event, musician, image_path FROM event_images WHERE event = ? ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

/// One picture in the public gallery
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GalleryEntry {
    pub image_path: String,
    #[serde(serialize_with = "date_format::serialize")]
    pub date: Date,
    pub venue: String,
    /// The username of the musician that uploaded the picture
    pub uploader: String,
}

impl GalleryEntry {
    pub async fn all(pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT event_images.image_path, events.date, events.venue, users.username AS uploader
             FROM event_images
             JOIN events ON events.id = event_images.event
             JOIN users ON users.id = event_images.musician
             ORDER BY event_images.id",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
