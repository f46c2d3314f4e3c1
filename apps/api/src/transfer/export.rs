use std::io::Write;
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::info;

use crate::models::{Company, Contact, Interview, InterviewContactLink, Role};
use crate::records::{companies, contacts, interviews, roles};
use crate::transfer::codec::{write_table, Entity};
use crate::transfer::TransferError;

/// Every table, each in primary-key order. Loading everything up front keeps
/// the encoding side synchronous, so a half-written archive never sits
/// across an await point.
#[derive(Debug, Default)]
pub struct ExportSnapshot {
    pub companies: Vec<Company>,
    pub roles: Vec<Role>,
    pub contacts: Vec<Contact>,
    pub interviews: Vec<Interview>,
    pub links: Vec<InterviewContactLink>,
}

impl ExportSnapshot {
    pub async fn load(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(ExportSnapshot {
            companies: companies::list_companies_by_id(pool).await?,
            roles: roles::list_roles_by_id(pool).await?,
            contacts: contacts::list_contacts_by_id(pool).await?,
            interviews: interviews::list_interviews_by_id(pool).await?,
            links: interviews::list_links_by_id(pool).await?,
        })
    }

    /// Writes one table as CSV and returns the number of data rows.
    pub fn write_entity<W: Write>(&self, entity: Entity, out: W) -> Result<usize, csv::Error> {
        match entity {
            Entity::Companies => write_table(out, &self.companies),
            Entity::Roles => write_table(out, &self.roles),
            Entity::Contacts => write_table(out, &self.contacts),
            Entity::Interviews => write_table(out, &self.interviews),
            Entity::InterviewContacts => write_table(out, &self.links),
        }
    }
}

/// Streams a single table into `out`.
pub async fn export_entity<W: Write>(
    pool: &SqlitePool,
    entity: Entity,
    out: W,
) -> Result<usize, TransferError> {
    let mut snapshot = ExportSnapshot::default();
    match entity {
        Entity::Companies => snapshot.companies = companies::list_companies_by_id(pool).await?,
        Entity::Roles => snapshot.roles = roles::list_roles_by_id(pool).await?,
        Entity::Contacts => snapshot.contacts = contacts::list_contacts_by_id(pool).await?,
        Entity::Interviews => {
            snapshot.interviews = interviews::list_interviews_by_id(pool).await?
        }
        Entity::InterviewContacts => snapshot.links = interviews::list_links_by_id(pool).await?,
    }
    Ok(snapshot.write_entity(entity, out)?)
}

/// Writes all five tables into `dir` (created if needed) and returns the
/// paths written.
pub async fn export_to_dir(pool: &SqlitePool, dir: &Path) -> Result<Vec<PathBuf>, TransferError> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(Entity::ORDER.len());
    for entity in Entity::ORDER {
        let path = dir.join(entity.file_name());
        let file = std::fs::File::create(&path).map_err(|source| TransferError::Io {
            path: path.clone(),
            source,
        })?;
        let rows = export_entity(pool, entity, std::io::BufWriter::new(file)).await?;
        info!("Exported {rows} {entity} to {}", path.display());
        written.push(path);
    }
    Ok(written)
}
