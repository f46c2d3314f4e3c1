//! Ordered CSV import.
//!
//! Steps run in [`Entity::ORDER`] so every foreign key points at a table that
//! was already loaded. Each run owns an [`ImportContext`] mapping the
//! identifiers found in the files to the rows created for them; nothing
//! outlives the run.
//!
//! Short and blank rows are skipped. Any other row error aborts its step,
//! leaving rows inserted before it committed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::records::{companies, contacts, interviews, roles};
use crate::transfer::codec::{
    decode_company, decode_contact, decode_interview, decode_link, decode_role, Entity,
    RowOutcome,
};
use crate::transfer::coerce::SalaryPolicy;
use crate::transfer::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Skip missing files and run every step, collecting failures.
    Lenient,
    /// Require every file and stop at the first failing step.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Fresh identifiers; references are translated through the run's context.
    Remap,
    /// Keep the file's identifiers. Dangling references are left for the
    /// database's foreign key constraints to reject.
    Preserve,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub mode: ImportMode,
    pub keys: KeyStrategy,
    pub salary: SalaryPolicy,
}

impl ImportOptions {
    /// Settings for browser uploads, which may carry any subset of files.
    pub fn upload(salary: SalaryPolicy) -> Self {
        ImportOptions {
            mode: ImportMode::Lenient,
            keys: KeyStrategy::Remap,
            salary,
        }
    }
}

/// Source file per entity.
#[derive(Debug, Default, Clone)]
pub struct ImportSources {
    files: BTreeMap<Entity, PathBuf>,
}

impl ImportSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks for `reverse-ats - <Entity>.csv` in `dir`, falling back to the
    /// same name with the spaces removed. Entities with neither are left out.
    pub fn from_dir(dir: &Path) -> Self {
        let mut sources = ImportSources::new();
        for entity in Entity::ORDER {
            let name = entity.file_name();
            let candidates = [dir.join(&name), dir.join(name.replace(' ', ""))];
            if let Some(path) = candidates.into_iter().find(|p| p.is_file()) {
                sources.insert(entity, path);
            }
        }
        sources
    }

    pub fn insert(&mut self, entity: Entity, path: PathBuf) {
        self.files.insert(entity, path);
    }

    pub fn get(&self, entity: Entity) -> Option<&Path> {
        self.files.get(&entity).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Identifier translation table for one run.
#[derive(Debug, Default)]
pub struct ImportContext {
    ids: HashMap<(Entity, String), i64>,
}

impl ImportContext {
    pub fn record(&mut self, entity: Entity, legacy_id: String, new_id: i64) {
        self.ids.insert((entity, legacy_id), new_id);
    }

    pub fn resolve(&self, entity: Entity, legacy_id: &str) -> Option<i64> {
        self.ids.get(&(entity, legacy_id.to_string())).copied()
    }

    fn reference(
        &self,
        keys: KeyStrategy,
        target: Entity,
        field: &'static str,
        legacy_id: &str,
        line: u64,
    ) -> Result<i64, TransferError> {
        match keys {
            KeyStrategy::Remap => {
                self.resolve(target, legacy_id)
                    .ok_or_else(|| TransferError::Unresolved {
                        line,
                        field,
                        legacy_id: legacy_id.to_string(),
                        target,
                    })
            }
            KeyStrategy::Preserve => parse_id(field, legacy_id, line),
        }
    }
}

fn parse_id(field: &'static str, raw: &str, line: u64) -> Result<i64, TransferError> {
    raw.parse::<i64>().map_err(|e| TransferError::Field {
        line,
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn primary_key(
    keys: KeyStrategy,
    field: &'static str,
    raw: &str,
    line: u64,
) -> Result<Option<i64>, TransferError> {
    match keys {
        KeyStrategy::Remap => Ok(None),
        KeyStrategy::Preserve => parse_id(field, raw, line).map(Some),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub entity: Entity,
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct StepFailure {
    pub entity: Entity,
    pub error: TransferError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to import {}: {}", self.entity, self.error)
    }
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub steps: Vec<StepReport>,
    pub failures: Vec<StepFailure>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn imported(&self) -> usize {
        self.steps.iter().map(|s| s.imported).sum()
    }

    /// One human-readable line per failed step.
    pub fn failure_lines(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}

pub async fn run_import(
    pool: &SqlitePool,
    sources: &ImportSources,
    options: ImportOptions,
) -> ImportReport {
    let mut report = ImportReport::default();

    if options.mode == ImportMode::Strict {
        for entity in Entity::ORDER {
            if sources.get(entity).is_none() {
                report.failures.push(StepFailure {
                    entity,
                    error: TransferError::MissingSource {
                        entity,
                        expected: entity.file_name(),
                    },
                });
            }
        }
        if !report.is_success() {
            error!("Import aborted: {} source file(s) missing", report.failures.len());
            return report;
        }
    }

    let mut ctx = ImportContext::default();
    for entity in Entity::ORDER {
        let Some(path) = sources.get(entity) else {
            info!("No {entity} file supplied, skipping");
            continue;
        };

        info!("Importing {entity} from {}", path.display());
        match import_step(pool, entity, path, options, &mut ctx).await {
            Ok(step) => {
                info!(
                    imported = step.imported,
                    skipped = step.skipped,
                    "Imported {entity}"
                );
                report.steps.push(step);
            }
            Err(e) => {
                error!("Import of {entity} failed: {e}");
                report.failures.push(StepFailure { entity, error: e });
                if options.mode == ImportMode::Strict {
                    break;
                }
            }
        }
    }
    report
}

async fn import_step(
    pool: &SqlitePool,
    entity: Entity,
    path: &Path,
    options: ImportOptions,
    ctx: &mut ImportContext,
) -> Result<StepReport, TransferError> {
    let file = File::open(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TransferError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    if !header_matches(&headers, entity.columns()) {
        warn!(
            "Unexpected header in {}; reading columns by position",
            path.display()
        );
    }

    let mut step = StepReport {
        entity,
        imported: 0,
        skipped: 0,
    };
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if import_row(pool, entity, &record, line, options, ctx).await? {
            step.imported += 1;
        } else {
            warn!(line, "Skipping short or blank {entity} row");
            step.skipped += 1;
        }
    }
    Ok(step)
}

fn header_matches(headers: &StringRecord, expected: &[&str]) -> bool {
    headers.len() >= expected.len()
        && headers
            .iter()
            .zip(expected)
            .all(|(found, want)| found.trim_start_matches('\u{feff}').trim() == *want)
}

/// Returns `false` for a skipped row.
async fn import_row(
    pool: &SqlitePool,
    entity: Entity,
    record: &StringRecord,
    line: u64,
    options: ImportOptions,
    ctx: &mut ImportContext,
) -> Result<bool, TransferError> {
    let keys = options.keys;
    let insert_err = |source| TransferError::Insert { line, source };

    match entity {
        Entity::Companies => {
            let RowOutcome::Row(row) = decode_company(record, line)? else {
                return Ok(false);
            };
            let id = primary_key(keys, "companyID", &row.legacy_id, line)?;
            let new_id = companies::insert_company(pool, id, &row.company)
                .await
                .map_err(insert_err)?;
            ctx.record(entity, row.legacy_id, new_id);
        }
        Entity::Roles => {
            let RowOutcome::Row(mut row) = decode_role(record, line, options.salary)? else {
                return Ok(false);
            };
            row.role.company_id =
                ctx.reference(keys, Entity::Companies, "companyID", &row.company_ref, line)?;
            let id = primary_key(keys, "roleID", &row.legacy_id, line)?;
            let new_id = roles::insert_role(pool, id, &row.role)
                .await
                .map_err(insert_err)?;
            ctx.record(entity, row.legacy_id, new_id);
        }
        Entity::Contacts => {
            let RowOutcome::Row(mut row) = decode_contact(record, line)? else {
                return Ok(false);
            };
            row.contact.company_id =
                ctx.reference(keys, Entity::Companies, "companyID", &row.company_ref, line)?;
            let id = primary_key(keys, "contactID", &row.legacy_id, line)?;
            let new_id = contacts::insert_contact(pool, id, &row.contact)
                .await
                .map_err(insert_err)?;
            ctx.record(entity, row.legacy_id, new_id);
        }
        Entity::Interviews => {
            let RowOutcome::Row(mut row) = decode_interview(record, line)? else {
                return Ok(false);
            };
            row.interview.role_id =
                ctx.reference(keys, Entity::Roles, "roleID", &row.role_ref, line)?;
            let id = primary_key(keys, "interviewID", &row.legacy_id, line)?;
            let new_id = interviews::insert_interview(pool, id, &row.interview)
                .await
                .map_err(insert_err)?;
            ctx.record(entity, row.legacy_id, new_id);
        }
        Entity::InterviewContacts => {
            let RowOutcome::Row(row) = decode_link(record) else {
                return Ok(false);
            };
            let interview_id =
                ctx.reference(keys, Entity::Interviews, "interviewId", &row.interview_ref, line)?;
            let contact_id =
                ctx.reference(keys, Entity::Contacts, "contactId", &row.contact_ref, line)?;
            let id = primary_key(keys, "interviewsContactId", &row.legacy_id, line)?;
            let new_id = interviews::insert_link(pool, id, interview_id, contact_id)
                .await
                .map_err(insert_err)?;
            ctx.record(entity, row.legacy_id, new_id);
        }
    }
    Ok(true)
}
