//! Gallery uploads and listing. Stored files are served by the static file service.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::{multipart, path};
use crate::auth::Principal;
use crate::error::{CrescendoError, CrescendoResult};
use crate::file::{ImageFile, ALLOWED_EXTENSIONS};
use crate::models::event::Event;
use crate::models::image::{EventImage, GalleryEntry};
use crate::AppState;

/// The multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// The event an upload is for, with the pictures it already has.
pub async fn upload_form(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
    _principal: Principal,
) -> CrescendoResult<Json<Value>> {
    let event_id = path(event_id)?;
    let event = Event::with_id(event_id, &state.pool).await?;
    let images = EventImage::for_event(event_id, &state.pool).await?;

    Ok(Json(json!({
        "event": event,
        "images": images,
        "allowedExtensions": ALLOWED_EXTENSIONS,
    })))
}

/// Upload a picture of an event.
///
/// ## Required Permissions:
///
/// The user must be the musician booked for the event.
///
/// ## Input Format:
///
/// A `multipart/form-data` body with the image in the `file` part.
///
/// ## Return Format:
///
/// Returns the stored [EventImage](crate::models::image::EventImage).
pub async fn upload(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
    principal: Principal,
    body: Result<Multipart, MultipartRejection>,
) -> CrescendoResult<(StatusCode, Json<EventImage>)> {
    let event_id = path(event_id)?;
    let mut body = multipart(body)?;
    let mut image = None;
    while let Some(field) = body.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content = field.bytes().await.map_err(multipart_error)?;
        image = Some(ImageFile {
            file_name,
            content: content.to_vec(),
        });
        break;
    }
    let image = image.ok_or_else(|| CrescendoError::Validation("No file part".to_owned()))?;

    let stored = EventImage::upload(&principal, event_id, image, &state.config.upload_dir, &state.pool).await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

fn multipart_error(error: axum::extract::multipart::MultipartError) -> CrescendoError {
    CrescendoError::Validation(error.body_text())
}

pub async fn gallery(State(state): State<AppState>) -> CrescendoResult<Json<Vec<GalleryEntry>>> {
    Ok(Json(GalleryEntry::all(&state.pool).await?))
}
