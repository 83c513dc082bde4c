use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::Principal;
use crate::error::CrescendoResult;
use crate::models::booking::{AvailableEvent, ConfirmedBooking, OrganizationEvent};
use crate::models::notice::Notice;
use crate::models::user::Role;

/// The landing page after login, shaped by the principal's role.
///
/// Loading a dashboard consumes the user's pending notices.
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Musician {
        available_events: Vec<AvailableEvent>,
        confirmed_events: Vec<ConfirmedBooking>,
        notifications: Vec<String>,
    },
    Organization {
        events: Vec<OrganizationEvent>,
        notifications: Vec<String>,
    },
}

impl Dashboard {
    pub async fn for_principal(principal: &Principal, pool: &SqlitePool) -> CrescendoResult<Self> {
        match principal.role {
            Role::Musician => Self::for_musician(principal, pool).await,
            Role::Organization => Self::for_organization(principal, pool).await,
        }
    }

    pub async fn for_musician(principal: &Principal, pool: &SqlitePool) -> CrescendoResult<Self> {
        principal.ensure_role(Role::Musician)?;

        Ok(Dashboard::Musician {
            available_events: AvailableEvent::for_musician(principal.user_id, pool).await?,
            confirmed_events: ConfirmedBooking::for_musician(principal.user_id, pool).await?,
            notifications: Notice::take_for_user(principal.user_id, pool).await?,
        })
    }

    pub async fn for_organization(principal: &Principal, pool: &SqlitePool) -> CrescendoResult<Self> {
        principal.ensure_role(Role::Organization)?;

        Ok(Dashboard::Organization {
            events: OrganizationEvent::for_organizer(principal.user_id, pool).await?,
            notifications: Notice::take_for_user(principal.user_id, pool).await?,
        })
    }
}
