//! Dashboards and the event lifecycle: posting, applying and deleting.

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde_json::{json, Value};

use super::{form, path};
use crate::auth::Principal;
use crate::error::CrescendoResult;
use crate::models::booking::{Booking, OrganizationEvent};
use crate::models::dashboard::Dashboard;
use crate::models::event::{Event, NewEvent};
use crate::models::user::Role;
use crate::AppState;

/// The logged-in user's dashboard, by role.
///
/// Pending notices are included once and then discarded.
pub async fn home(State(state): State<AppState>, principal: Principal) -> CrescendoResult<Json<Dashboard>> {
    Ok(Json(Dashboard::for_principal(&principal, &state.pool).await?))
}

/// The organization's events that have a confirmed musician.
///
/// ## Required Permissions:
///
/// The user must be logged in as an organization.
///
/// ## Return Format:
///
/// ```json
/// {
///     "confirmed_events": [OrganizationEvent]
/// }
/// ```
pub async fn organization(
    State(state): State<AppState>,
    principal: Principal,
) -> CrescendoResult<Json<Value>> {
    principal.ensure_role(Role::Organization)?;
    let confirmed_events = OrganizationEvent::confirmed_for_organizer(principal.user_id, &state.pool).await?;

    Ok(Json(json!({ "confirmed_events": confirmed_events })))
}

/// Show the event a musician is about to apply for.
///
/// ## Required Permissions:
///
/// The user must be logged in as a musician.
pub async fn show_event(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
    principal: Principal,
) -> CrescendoResult<Json<Event>> {
    principal.ensure_role(Role::Musician)?;

    Ok(Json(Event::with_id(path(event_id)?, &state.pool).await?))
}

/// Apply for a pending event, which books it for the applicant.
///
/// ## Required Permissions:
///
/// The user must be logged in as a musician.
///
/// ## Return Format:
///
/// Returns the new [Booking](crate::models::booking::Booking). An event that
/// is already booked answers with a 409.
pub async fn apply_for_event(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
    principal: Principal,
) -> CrescendoResult<(StatusCode, Json<Booking>)> {
    let booking = Event::apply(&principal, path(event_id)?, &state.pool).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Post a new event.
///
/// ## Required Permissions:
///
/// The user must be logged in as an organization.
///
/// ## Input Format:
///
/// Expects a [NewEvent](crate::models::event::NewEvent) as a url-encoded form.
///
/// ## Return Format:
///
/// ```json
/// {
///     "id": integer
/// }
/// ```
pub async fn request_event(
    State(state): State<AppState>,
    principal: Principal,
    new_event: Result<Form<NewEvent>, FormRejection>,
) -> CrescendoResult<(StatusCode, Json<Value>)> {
    let id = Event::create(&principal, form(new_event)?, &state.pool).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Delete an event along with its bookings.
///
/// ## Required Permissions:
///
/// The user must be the organization that posted the event.
///
/// ## Return Format:
///
/// ```json
/// {
///     "message": "success",
///     "notifiedMusicians": [integer]
/// }
/// ```
pub async fn delete_event(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
    principal: Principal,
) -> CrescendoResult<Json<Value>> {
    let musicians = Event::delete(&principal, path(event_id)?, &state.pool).await?;

    Ok(Json(json!({
        "message": "success",
        "notifiedMusicians": musicians,
    })))
}
