use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Company {
    pub company_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub linkedin: Option<String>,
    pub hq_city: Option<String>,
    pub hq_state: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Writable company fields, shared by the JSON API and the CSV importer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub hq_city: Option<String>,
    #[serde(default)]
    pub hq_state: Option<String>,
}

impl From<&Company> for NewCompany {
    fn from(company: &Company) -> Self {
        NewCompany {
            name: company.name.clone(),
            description: company.description.clone(),
            url: company.url.clone(),
            linkedin: company.linkedin.clone(),
            hq_city: company.hq_city.clone(),
            hq_state: company.hq_state.clone(),
        }
    }
}
