//! Bulk movement of the tracker's data in and out as CSV: loose files in a
//! directory, staged uploads, or a single ZIP archive.

pub mod archive;
pub mod codec;
pub mod coerce;
pub mod export;
pub mod handlers;
pub mod import;

use std::path::PathBuf;

use thiserror::Error;

use crate::transfer::codec::Entity;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no source file for {entity} (expected {expected})")]
    MissingSource { entity: Entity, expected: String },

    #[error("{} has no header row", .path.display())]
    MissingHeader { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid {field} '{value}': {reason}")]
    Field {
        line: u64,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("line {line}: {field} '{legacy_id}' does not match any imported {target}")]
    Unresolved {
        line: u64,
        field: &'static str,
        legacy_id: String,
        target: Entity,
    },

    #[error("line {line}: insert rejected: {source}")]
    Insert {
        line: u64,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("write failed: {0}")]
    Output(#[from] std::io::Error),
}
