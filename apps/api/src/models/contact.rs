use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Contact {
    pub contact_id: i64,
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Job title at the company. Unrelated to the `roles` table.
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewContact {
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<&Contact> for NewContact {
    fn from(contact: &Contact) -> Self {
        NewContact {
            company_id: contact.company_id,
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            role: contact.role.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            linkedin: contact.linkedin.clone(),
            notes: contact.notes.clone(),
        }
    }
}

/// Contact joined with its company name for list views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContactListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub contact: Contact,
    pub company_name: String,
}
