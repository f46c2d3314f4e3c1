use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    Recruiter,
    Loop,
    TechScreen,
    Manager,
    Misc,
}

impl InterviewType {
    pub const ALL: [InterviewType; 5] = [
        InterviewType::Recruiter,
        InterviewType::Loop,
        InterviewType::TechScreen,
        InterviewType::Manager,
        InterviewType::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Recruiter => "RECRUITER",
            InterviewType::Loop => "LOOP",
            InterviewType::TechScreen => "TECH_SCREEN",
            InterviewType::Manager => "MANAGER",
            InterviewType::Misc => "MISC",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        InterviewType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown interview type '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Interview {
    pub interview_id: i64,
    pub role_id: i64,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// 24-hour `HH:MM`.
    pub start: String,
    /// 24-hour `HH:MM`.
    pub end: String,
    pub notes: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: InterviewType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInterview {
    pub role_id: i64,
    pub date: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "type")]
    pub kind: InterviewType,
    /// Replaces the interview's contact links wholesale on update.
    #[serde(default)]
    pub contact_ids: Vec<i64>,
}

/// Row of the `interviews_contacts` join table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct InterviewContactLink {
    pub interviews_contact_id: i64,
    pub interview_id: i64,
    pub contact_id: i64,
}

/// Interview joined with its role and company for list views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub interview: Interview,
    pub role_name: String,
    pub company_id: i64,
    pub company_name: String,
}
