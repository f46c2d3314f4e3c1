use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Role {
    pub role_id: i64,
    pub company_id: i64,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub cover_letter: Option<String>,
    pub application_location: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub applied_date: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub closed_date: Option<String>,
    pub posted_range_min: Option<i64>,
    pub posted_range_max: Option<i64>,
    pub equity: Option<bool>,
    pub work_city: Option<String>,
    pub work_state: Option<String>,
    pub location: Option<String>, // "REMOTE", "HYBRID", "ONSITE"
    pub status: Option<String>,   // "INTERVIEWING", "OFFER", "REJECTED", "GHOSTED", ...
    pub discovery: Option<String>,
    pub referral: Option<bool>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewRole {
    pub company_id: i64,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub cover_letter: Option<String>,
    pub application_location: Option<String>,
    pub applied_date: Option<String>,
    pub closed_date: Option<String>,
    pub posted_range_min: Option<i64>,
    pub posted_range_max: Option<i64>,
    pub equity: Option<bool>,
    pub work_city: Option<String>,
    pub work_state: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub discovery: Option<String>,
    pub referral: Option<bool>,
    pub notes: Option<String>,
}

impl From<&Role> for NewRole {
    fn from(role: &Role) -> Self {
        NewRole {
            company_id: role.company_id,
            name: role.name.clone(),
            url: role.url.clone(),
            description: role.description.clone(),
            cover_letter: role.cover_letter.clone(),
            application_location: role.application_location.clone(),
            applied_date: role.applied_date.clone(),
            closed_date: role.closed_date.clone(),
            posted_range_min: role.posted_range_min,
            posted_range_max: role.posted_range_max,
            equity: role.equity,
            work_city: role.work_city.clone(),
            work_state: role.work_state.clone(),
            location: role.location.clone(),
            status: role.status.clone(),
            discovery: role.discovery.clone(),
            referral: role.referral,
            notes: role.notes.clone(),
        }
    }
}

/// Role joined with its company name for list views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub role: Role,
    pub company_name: String,
}
