//! The HTTP surface of the marketplace.
//!
//! Every handler answers with JSON. Failures are rendered by
//! [CrescendoError](crate::error::CrescendoError)'s `IntoResponse`.

pub mod account;
pub mod events;
pub mod media;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path};
use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::TOKEN_HEADER;
use crate::error::{CrescendoError, CrescendoResult};
use crate::file::UPLOADS_PREFIX;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([HeaderName::from_static(TOKEN_HEADER), axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(banner))
        .route("/register", get(account::register_form).post(account::register))
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", get(account::logout))
        .route("/profile/:user_id", get(account::view_profile))
        .route(
            "/update_profile",
            get(account::own_profile).post(account::update_profile),
        )
        .route("/home", get(events::home))
        .route("/organization", get(events::organization))
        .route(
            "/apply_for_event/:event_id",
            get(events::show_event).post(events::apply_for_event),
        )
        .route("/request_event", post(events::request_event))
        .route("/delete_event/:event_id", post(events::delete_event))
        .route("/upload/:event_id", get(media::upload_form).post(media::upload))
        .route("/gallery", get(media::gallery))
        .nest_service(&format!("/{UPLOADS_PREFIX}"), uploads)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn banner() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The body of every successful call with nothing else to report.
pub fn basic_success() -> Value {
    json!({ "message": "success" })
}

/// Unwraps a submitted form, turning a malformed one into a validation error.
pub fn form<T>(submitted: Result<Form<T>, FormRejection>) -> CrescendoResult<T> {
    submitted
        .map(|Form(inner)| inner)
        .map_err(|rejection| CrescendoError::Validation(rejection.body_text()))
}

/// Unwraps path parameters, turning an unparseable one into a validation error.
pub fn path<T>(extracted: Result<Path<T>, PathRejection>) -> CrescendoResult<T> {
    extracted
        .map(|Path(inner)| inner)
        .map_err(|rejection| CrescendoError::Validation(rejection.body_text()))
}

pub fn multipart(extracted: Result<Multipart, MultipartRejection>) -> CrescendoResult<Multipart> {
    extracted.map_err(|rejection| CrescendoError::Validation(rejection.body_text()))
}
