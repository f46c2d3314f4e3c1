//! Fixed CSV layouts for each entity and the mapping to and from model types.
//!
//! Column orders are part of the file format and must not be reordered:
//! exports made by older versions of the tracker have to import cleanly.

use std::fmt;
use std::io::Write;

use csv::StringRecord;

use crate::models::{
    Company, Contact, Interview, InterviewContactLink, InterviewType, NewCompany, NewContact,
    NewInterview, NewRole, Role,
};
use crate::transfer::coerce::{
    decode_opt_bool, decode_opt_int, decode_opt_string, encode_opt_bool, encode_opt_int,
    encode_opt_string, SalaryPolicy,
};
use crate::transfer::TransferError;

pub const COMPANY_COLUMNS: [&str; 7] = [
    "companyID",
    "name",
    "description",
    "url",
    "linkedin",
    "hqCity",
    "hqState",
];

pub const ROLE_COLUMNS: [&str; 19] = [
    "roleID",
    "companyID",
    "name",
    "url",
    "description",
    "coverLetter",
    "applicationLocation",
    "appliedDate",
    "closedDate",
    "postedRangeMin",
    "postedRangeMax",
    "equity",
    "workCity",
    "workState",
    "location",
    "status",
    "discovery",
    "referral",
    "notes",
];

pub const CONTACT_COLUMNS: [&str; 9] = [
    "contactID",
    "companyID",
    "firstName",
    "lastName",
    "role",
    "email",
    "phone",
    "linkedin",
    "notes",
];

pub const INTERVIEW_COLUMNS: [&str; 7] = [
    "interviewID",
    "roleID",
    "date",
    "start",
    "end",
    "notes",
    "type",
];

pub const LINK_COLUMNS: [&str; 3] = ["interviewsContactId", "interviewId", "contactId"];

/// One CSV table. The declaration order is the import dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Companies,
    Roles,
    Contacts,
    Interviews,
    InterviewContacts,
}

impl Entity {
    /// Companies first, links last: each table only references tables before it.
    pub const ORDER: [Entity; 5] = [
        Entity::Companies,
        Entity::Roles,
        Entity::Contacts,
        Entity::Interviews,
        Entity::InterviewContacts,
    ];

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Entity::Companies => &COMPANY_COLUMNS,
            Entity::Roles => &ROLE_COLUMNS,
            Entity::Contacts => &CONTACT_COLUMNS,
            Entity::Interviews => &INTERVIEW_COLUMNS,
            Entity::InterviewContacts => &LINK_COLUMNS,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Entity::Companies => "Companies",
            Entity::Roles => "Roles",
            Entity::Contacts => "Contacts",
            Entity::Interviews => "Interviews",
            Entity::InterviewContacts => "InterviewsContacts",
        }
    }

    /// Name of the CSV file, both on disk and inside the export archive.
    pub fn file_name(self) -> String {
        format!("reverse-ats - {}.csv", self.title())
    }

    /// Multipart form field carrying this table on upload.
    pub fn form_field(self) -> &'static str {
        match self {
            Entity::Companies => "companies",
            Entity::Roles => "roles",
            Entity::Contacts => "contacts",
            Entity::Interviews => "interviews",
            Entity::InterviewContacts => "interviews_contacts",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Entity> {
        Entity::ORDER.into_iter().find(|e| e.form_field() == name)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Companies => "companies",
            Entity::Roles => "roles",
            Entity::Contacts => "contacts",
            Entity::Interviews => "interviews",
            Entity::InterviewContacts => "interview-contact links",
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────────────────

/// A model that serializes to one row of its entity's table.
pub trait CsvEncode {
    const ENTITY: Entity;

    fn to_record(&self) -> Vec<String>;
}

/// Writes the header and one record per row. Rows must already be in
/// primary-key order.
pub fn write_table<W: Write, T: CsvEncode>(out: W, rows: &[T]) -> Result<usize, csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(T::ENTITY.columns())?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(rows.len())
}

impl CsvEncode for Company {
    const ENTITY: Entity = Entity::Companies;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.company_id.to_string(),
            self.name.clone(),
            encode_opt_string(&self.description),
            encode_opt_string(&self.url),
            encode_opt_string(&self.linkedin),
            encode_opt_string(&self.hq_city),
            encode_opt_string(&self.hq_state),
        ]
    }
}

impl CsvEncode for Role {
    const ENTITY: Entity = Entity::Roles;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.role_id.to_string(),
            self.company_id.to_string(),
            self.name.clone(),
            encode_opt_string(&self.url),
            encode_opt_string(&self.description),
            encode_opt_string(&self.cover_letter),
            encode_opt_string(&self.application_location),
            encode_opt_string(&self.applied_date),
            encode_opt_string(&self.closed_date),
            encode_opt_int(self.posted_range_min),
            encode_opt_int(self.posted_range_max),
            encode_opt_bool(self.equity),
            encode_opt_string(&self.work_city),
            encode_opt_string(&self.work_state),
            encode_opt_string(&self.location),
            encode_opt_string(&self.status),
            encode_opt_string(&self.discovery),
            encode_opt_bool(self.referral),
            encode_opt_string(&self.notes),
        ]
    }
}

impl CsvEncode for Contact {
    const ENTITY: Entity = Entity::Contacts;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.contact_id.to_string(),
            self.company_id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            encode_opt_string(&self.role),
            encode_opt_string(&self.email),
            encode_opt_string(&self.phone),
            encode_opt_string(&self.linkedin),
            encode_opt_string(&self.notes),
        ]
    }
}

impl CsvEncode for Interview {
    const ENTITY: Entity = Entity::Interviews;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.interview_id.to_string(),
            self.role_id.to_string(),
            self.date.clone(),
            self.start.clone(),
            self.end.clone(),
            encode_opt_string(&self.notes),
            self.kind.to_string(),
        ]
    }
}

impl CsvEncode for InterviewContactLink {
    const ENTITY: Entity = Entity::InterviewContacts;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.interviews_contact_id.to_string(),
            self.interview_id.to_string(),
            self.contact_id.to_string(),
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Decoding
// ────────────────────────────────────────────────────────────────────────────

/// Short and blank rows are tolerated and counted, never reported as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Row(T),
    Skipped,
}

/// Decoded rows keep the identifiers exactly as they appeared in the file.
/// Foreign keys inside the payload (`company_id`, `role_id`) are zero until
/// the importer resolves the matching `*_ref`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRow {
    pub legacy_id: String,
    pub company: NewCompany,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRow {
    pub legacy_id: String,
    pub company_ref: String,
    pub role: NewRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactRow {
    pub legacy_id: String,
    pub company_ref: String,
    pub contact: NewContact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewRow {
    pub legacy_id: String,
    pub role_ref: String,
    pub interview: NewInterview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub legacy_id: String,
    pub interview_ref: String,
    pub contact_ref: String,
}

fn is_skippable(record: &StringRecord, entity: Entity) -> bool {
    record.len() < entity.columns().len() || record.iter().all(|f| f.trim().is_empty())
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn required_text(
    record: &StringRecord,
    idx: usize,
    name: &'static str,
    line: u64,
) -> Result<String, TransferError> {
    decode_opt_string(field(record, idx))
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TransferError::Field {
            line,
            field: name,
            value: field(record, idx).to_string(),
            reason: "value is required".to_string(),
        })
}

fn reference(record: &StringRecord, idx: usize) -> String {
    field(record, idx).trim().to_string()
}

pub fn decode_company(
    record: &StringRecord,
    line: u64,
) -> Result<RowOutcome<CompanyRow>, TransferError> {
    if is_skippable(record, Entity::Companies) {
        return Ok(RowOutcome::Skipped);
    }
    Ok(RowOutcome::Row(CompanyRow {
        legacy_id: reference(record, 0),
        company: NewCompany {
            name: required_text(record, 1, "name", line)?,
            description: decode_opt_string(field(record, 2)),
            url: decode_opt_string(field(record, 3)),
            linkedin: decode_opt_string(field(record, 4)),
            hq_city: decode_opt_string(field(record, 5)),
            hq_state: decode_opt_string(field(record, 6)),
        },
    }))
}

pub fn decode_role(
    record: &StringRecord,
    line: u64,
    salary: SalaryPolicy,
) -> Result<RowOutcome<RoleRow>, TransferError> {
    if is_skippable(record, Entity::Roles) {
        return Ok(RowOutcome::Skipped);
    }
    Ok(RowOutcome::Row(RoleRow {
        legacy_id: reference(record, 0),
        company_ref: reference(record, 1),
        role: NewRole {
            company_id: 0,
            name: required_text(record, 2, "name", line)?,
            url: decode_opt_string(field(record, 3)),
            description: decode_opt_string(field(record, 4)),
            cover_letter: decode_opt_string(field(record, 5)),
            application_location: decode_opt_string(field(record, 6)),
            applied_date: decode_opt_string(field(record, 7)),
            closed_date: decode_opt_string(field(record, 8)),
            posted_range_min: decode_opt_int(field(record, 9), salary),
            posted_range_max: decode_opt_int(field(record, 10), salary),
            equity: decode_opt_bool(field(record, 11)),
            work_city: decode_opt_string(field(record, 12)),
            work_state: decode_opt_string(field(record, 13)),
            location: decode_opt_string(field(record, 14)),
            status: decode_opt_string(field(record, 15)),
            discovery: decode_opt_string(field(record, 16)),
            referral: decode_opt_bool(field(record, 17)),
            notes: decode_opt_string(field(record, 18)),
        },
    }))
}

pub fn decode_contact(
    record: &StringRecord,
    line: u64,
) -> Result<RowOutcome<ContactRow>, TransferError> {
    if is_skippable(record, Entity::Contacts) {
        return Ok(RowOutcome::Skipped);
    }
    Ok(RowOutcome::Row(ContactRow {
        legacy_id: reference(record, 0),
        company_ref: reference(record, 1),
        contact: NewContact {
            company_id: 0,
            first_name: required_text(record, 2, "firstName", line)?,
            last_name: required_text(record, 3, "lastName", line)?,
            role: decode_opt_string(field(record, 4)),
            email: decode_opt_string(field(record, 5)),
            phone: decode_opt_string(field(record, 6)),
            linkedin: decode_opt_string(field(record, 7)),
            notes: decode_opt_string(field(record, 8)),
        },
    }))
}

pub fn decode_interview(
    record: &StringRecord,
    line: u64,
) -> Result<RowOutcome<InterviewRow>, TransferError> {
    if is_skippable(record, Entity::Interviews) {
        return Ok(RowOutcome::Skipped);
    }
    let raw_type = field(record, 6);
    let kind = raw_type
        .parse::<InterviewType>()
        .map_err(|reason| TransferError::Field {
            line,
            field: "type",
            value: raw_type.to_string(),
            reason,
        })?;
    Ok(RowOutcome::Row(InterviewRow {
        legacy_id: reference(record, 0),
        role_ref: reference(record, 1),
        interview: NewInterview {
            role_id: 0,
            date: required_text(record, 2, "date", line)?,
            start: required_text(record, 3, "start", line)?,
            end: required_text(record, 4, "end", line)?,
            notes: decode_opt_string(field(record, 5)),
            kind,
            contact_ids: Vec::new(),
        },
    }))
}

pub fn decode_link(record: &StringRecord) -> RowOutcome<LinkRow> {
    if is_skippable(record, Entity::InterviewContacts) {
        return RowOutcome::Skipped;
    }
    RowOutcome::Row(LinkRow {
        legacy_id: reference(record, 0),
        interview_ref: reference(record, 1),
        contact_ref: reference(record, 2),
    })
}
