use std::io::Cursor;

use bytes::Bytes;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::transfer::codec::Entity;
use crate::transfer::export::ExportSnapshot;
use crate::transfer::TransferError;

pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// `reverse-ats-export-2025-10-16.zip`
pub fn archive_filename(date: NaiveDate) -> String {
    format!("reverse-ats-export-{}.zip", date.format("%Y-%m-%d"))
}

/// Packs every table into one ZIP held in memory. Nothing is returned unless
/// the archive was finished, so callers never see a truncated file.
pub fn pack_snapshot(snapshot: &ExportSnapshot) -> Result<Vec<u8>, TransferError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entity in Entity::ORDER {
        writer.start_file(entity.file_name(), options)?;
        snapshot.write_entity(entity, &mut writer)?;
    }

    Ok(writer.finish()?.into_inner())
}

pub async fn build_archive(pool: &SqlitePool) -> Result<Bytes, TransferError> {
    let snapshot = ExportSnapshot::load(pool).await?;
    let bytes = pack_snapshot(&snapshot)?;
    info!(
        companies = snapshot.companies.len(),
        roles = snapshot.roles.len(),
        contacts = snapshot.contacts.len(),
        interviews = snapshot.interviews.len(),
        links = snapshot.links.len(),
        "Built export archive ({} bytes)",
        bytes.len()
    );
    Ok(Bytes::from(bytes))
}
