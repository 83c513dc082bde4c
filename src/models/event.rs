use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::{Date, Time};

use crate::auth::Principal;
use crate::error::{CrescendoError, CrescendoResult};
use crate::models::booking::{Booking, BookingStatus};
use crate::models::notice::Notice;
use crate::models::user::Role;
use crate::util::{date_format, format_date, format_time, parse_date, parse_time, time_format, today};

/// Where an event is in its lifecycle. Events only ever move from pending to confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventStatus {
    /// Posted and waiting for a musician
    Pending,
    /// A musician applied and holds the booking
    Confirmed,
}

/// A performance opportunity posted by an organization
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Event {
    /// The ID of the event
    pub id: i64,
    /// The ID of the organization that posted the event
    pub organizer: i64,
    /// What day the performance is on
    #[serde(serialize_with = "date_format::serialize")]
    pub date: Date,
    /// When the performance starts
    #[serde(serialize_with = "time_format::serialize")]
    pub time: Time,
    /// Where the performance is held
    pub venue: String,
    /// Anything else a musician should know
    pub description: String,
    pub status: EventStatus,
}

impl Event {
    pub async fn with_id(id: i64, pool: &SqlitePool) -> CrescendoResult<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| CrescendoError::NotFound(format!("No event with id {id}")))
    }

    pub async fn with_id_opt(id: i64, pool: &SqlitePool) -> CrescendoResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, organizer, date, time, venue, description, status FROM events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// The one-shot notice shown to the booked musician when the event is deleted.
    pub fn cancellation_notice(&self) -> String {
        format!(
            "Event on {} at {} ({}) has been cancelled.",
            format_date(self.date),
            format_time(self.time),
            self.venue
        )
    }

    /// Posts a new pending event on behalf of an organization.
    pub async fn create(principal: &Principal, new_event: NewEvent, pool: &SqlitePool) -> CrescendoResult<i64> {
        principal.ensure_role(Role::Organization)?;

        let date = parse_date(&new_event.date)?;
        let time = parse_time(&new_event.time)?;
        let venue = new_event.venue.trim();
        if venue.is_empty() {
            return Err(CrescendoError::Validation("A venue is required".to_owned()));
        }

        let id = sqlx::query(
            "INSERT INTO events (organizer, date, time, venue, description, status)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(principal.user_id)
        .bind(date)
        .bind(time)
        .bind(venue)
        .bind(new_event.description.trim())
        .bind(EventStatus::Pending)
        .execute(pool)
        .await?
        .last_insert_rowid();

        tracing::info!(event = id, organizer = principal.user_id, "created event");

        Ok(id)
    }

    /// Books the event for the applying musician.
    ///
    /// The status flip and the booking insert commit together or not at all.
    /// Only one applicant can win: the update is conditioned on the event
    /// still being pending, and anyone who finds it already confirmed gets a
    /// [Conflict](CrescendoError::Conflict).
    pub async fn apply(principal: &Principal, event_id: i64, pool: &SqlitePool) -> CrescendoResult<Booking> {
        principal.ensure_role(Role::Musician)?;

        let mut transaction = pool.begin().await?;

        // must stay the first statement so competing writers wait on the lock instead of failing
        let claimed = sqlx::query("UPDATE events SET status = ? WHERE id = ? AND status = ?")
            .bind(EventStatus::Confirmed)
            .bind(event_id)
            .bind(EventStatus::Pending)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        if claimed == 0 {
            let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM events WHERE id = ?")
                .bind(event_id)
                .fetch_optional(&mut *transaction)
                .await?
                .is_some();

            return if exists {
                tracing::warn!(event = event_id, musician = principal.user_id, "event already booked");
                Err(CrescendoError::Conflict(format!("Event {event_id} is already booked")))
            } else {
                Err(CrescendoError::NotFound(format!("No event with id {event_id}")))
            };
        }

        let request_date = today();
        let booking_id = sqlx::query(
            "INSERT INTO bookings (event, musician, status, request_date) VALUES (?, ?, ?, ?)",
        )
        .bind(event_id)
        .bind(principal.user_id)
        .bind(BookingStatus::Confirmed)
        .bind(request_date)
        .execute(&mut *transaction)
        .await
        .map_err(|err| {
            CrescendoError::conflict_on_unique(err, format!("Event {event_id} is already booked"))
        })?
        .last_insert_rowid();

        transaction.commit().await?;

        tracing::info!(event = event_id, musician = principal.user_id, booking = booking_id, "confirmed booking");

        Ok(Booking {
            id: booking_id,
            event: event_id,
            musician: principal.user_id,
            status: BookingStatus::Confirmed,
            request_date,
        })
    }

    /// Deletes an event and its bookings, returning the musicians that were booked.
    ///
    /// Each of those musicians sees the cancellation notice on their next dashboard.
    pub async fn delete(principal: &Principal, event_id: i64, pool: &SqlitePool) -> CrescendoResult<Vec<i64>> {
        principal.ensure_role(Role::Organization)?;

        let event = Self::with_id(event_id, pool).await?;
        if event.organizer != principal.user_id {
            tracing::warn!(event = event_id, organization = principal.user_id, "refused to delete foreign event");
            return Err(CrescendoError::Forbidden(
                "Only the organization that posted an event can delete it".to_owned(),
            ));
        }
        let notice = event.cancellation_notice();

        let mut transaction = pool.begin().await?;

        let mut musicians = sqlx::query_scalar::<_, i64>("DELETE FROM bookings WHERE event = ? RETURNING musician")
            .bind(event_id)
            .fetch_all(&mut *transaction)
            .await?;
        musicians.sort_unstable();
        musicians.dedup();

        let deleted = sqlx::query("DELETE FROM events WHERE id = ? AND organizer = ?")
            .bind(event_id)
            .bind(principal.user_id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(CrescendoError::NotFound(format!("No event with id {event_id}")));
        }

        for musician in &musicians {
            Notice::send(*musician, &notice, &mut *transaction).await?;
        }

        transaction.commit().await?;

        tracing::info!(event = event_id, cancelled_bookings = musicians.len(), "deleted event");

        Ok(musicians)
    }
}

#[derive(Deserialize)]
pub struct NewEvent {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub venue: String,
    #[serde(default)]
    pub description: String,
}
