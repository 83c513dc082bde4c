//! The booking ledger: read-only views joining events, bookings and users.
//!
//! Bookings are only ever written by [Event::apply](crate::models::event::Event::apply)
//! and removed by [Event::delete](crate::models::event::Event::delete).

use serde::Serialize;
use sqlx::SqlitePool;
use time::{Date, Time};

use crate::error::CrescendoResult;
use crate::models::event::EventStatus;
use crate::util::{date_format, time_format};

/// The status of a booking. Only confirmed bookings exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

/// The record linking a musician to the event they were confirmed for
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub event: i64,
    pub musician: i64,
    pub status: BookingStatus,
    /// When the musician applied
    #[serde(serialize_with = "date_format::serialize")]
    pub request_date: Date,
}

impl Booking {
    pub async fn for_event(event_id: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, event, musician, status, request_date FROM bookings WHERE event = ? ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn confirmed_for_musician_at_event(
        musician: i64,
        event_id: i64,
        pool: &SqlitePool,
    ) -> CrescendoResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, event, musician, status, request_date FROM bookings
             WHERE musician = ? AND event = ? AND status = ?",
        )
        .bind(musician)
        .bind(event_id)
        .bind(BookingStatus::Confirmed)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

/// A pending event as offered to musicians
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AvailableEvent {
    pub id: i64,
    #[serde(serialize_with = "date_format::serialize")]
    pub date: Date,
    #[serde(serialize_with = "time_format::serialize")]
    pub time: Time,
    pub venue: String,
    pub description: String,
    pub status: EventStatus,
    /// The username of the organization that posted the event
    pub organizer_name: String,
}

impl AvailableEvent {
    /// Pending events the musician has not applied to yet
    pub async fn for_musician(musician: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT events.id, events.date, events.time, events.venue, events.description,
                 events.status, users.username AS organizer_name
             FROM events
             JOIN users ON users.id = events.organizer
             WHERE events.status = ?
               AND NOT EXISTS
                 (SELECT 1 FROM bookings WHERE bookings.event = events.id AND bookings.musician = ?)
             ORDER BY events.date, events.time, events.id",
        )
        .bind(EventStatus::Pending)
        .bind(musician)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

/// An event a musician is confirmed to play
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ConfirmedBooking {
    pub event_id: i64,
    #[serde(serialize_with = "date_format::serialize")]
    pub date: Date,
    #[serde(serialize_with = "time_format::serialize")]
    pub time: Time,
    pub venue: String,
    pub description: String,
    pub organizer_name: String,
    #[serde(serialize_with = "date_format::serialize")]
    pub request_date: Date,
}

impl ConfirmedBooking {
    pub async fn for_musician(musician: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT events.id AS event_id, events.date, events.time, events.venue,
                 events.description, users.username AS organizer_name, bookings.request_date
             FROM bookings
             JOIN events ON events.id = bookings.event
             JOIN users ON users.id = events.organizer
             WHERE bookings.musician = ? AND bookings.status = ?
             ORDER BY events.date, events.time, events.id",
        )
        .bind(musician)
        .bind(BookingStatus::Confirmed)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

/// An event as seen by the organization that owns it
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrganizationEvent {
    pub id: i64,
    #[serde(serialize_with = "date_format::serialize")]
    pub date: Date,
    #[serde(serialize_with = "time_format::serialize")]
    pub time: Time,
    pub venue: String,
    pub description: String,
    pub status: EventStatus,
    /// The confirmed musician, once someone has applied
    pub musician_id: Option<i64>,
    pub musician_name: Option<String>,
}

impl OrganizationEvent {
    pub async fn for_organizer(organizer: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT events.id, events.date, events.time, events.venue, events.description,
                 events.status, users.id AS musician_id, users.username AS musician_name
             FROM events
             LEFT JOIN bookings ON bookings.event = events.id AND bookings.status = ?
             LEFT JOIN users ON users.id = bookings.musician
             WHERE events.organizer = ?
             ORDER BY events.date, events.time, events.id",
        )
        .bind(BookingStatus::Confirmed)
        .bind(organizer)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn confirmed_for_organizer(organizer: i64, pool: &SqlitePool) -> CrescendoResult<Vec<Self>> {
        Ok(Self::for_organizer(organizer, pool)
            .await?
            .into_iter()
            .filter(|event| event.musician_id.is_some())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::Event;
    use crate::models::user::Role;
    use crate::tests::{create_event, login_as, test_pool};

    #[tokio::test]
    async fn ledger_views_follow_the_booking() {
        let (_dir, pool) = test_pool().await;
        let hall = login_as("hall", Role::Organization, &pool).await;
        let cellist = login_as("cellist", Role::Musician, &pool).await;
        let booked = create_event(&hall, &pool).await;
        let open = create_event(&hall, &pool).await;

        Event::apply(&cellist, booked, &pool).await.unwrap();

        let available = AvailableEvent::for_musician(cellist.user_id, &pool).await.unwrap();
        assert_eq!(available.iter().map(|e| e.id).collect::<Vec<_>>(), vec![open]);
        assert_eq!(available[0].organizer_name, "hall");

        let confirmed = ConfirmedBooking::for_musician(cellist.user_id, &pool).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].event_id, booked);
        assert_eq!(confirmed[0].organizer_name, "hall");

        let owned = OrganizationEvent::for_organizer(hall.user_id, &pool).await.unwrap();
        assert_eq!(owned.len(), 2);
        let booked_view = owned.iter().find(|e| e.id == booked).unwrap();
        assert_eq!(booked_view.status, EventStatus::Confirmed);
        assert_eq!(booked_view.musician_id, Some(cellist.user_id));
        assert_eq!(booked_view.musician_name.as_deref(), Some("cellist"));
        let open_view = owned.iter().find(|e| e.id == open).unwrap();
        assert_eq!(open_view.status, EventStatus::Pending);
        assert_eq!(open_view.musician_id, None);

        let only_confirmed = OrganizationEvent::confirmed_for_organizer(hall.user_id, &pool)
            .await
            .unwrap();
        assert_eq!(only_confirmed.len(), 1);
    }

    #[tokio::test]
    async fn organizations_only_see_their_own_events() {
        let (_dir, pool) = test_pool().await;
        let hall = login_as("hall", Role::Organization, &pool).await;
        let club = login_as("club", Role::Organization, &pool).await;
        create_event(&hall, &pool).await;

        assert!(OrganizationEvent::for_organizer(club.user_id, &pool)
            .await
            .unwrap()
            .is_empty());
    }
}
