use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    Company, Contact, ContactListing, Interview, InterviewListing, NewCompany, NewContact,
    NewInterview, NewRole, Role, RoleListing,
};
use crate::records::interviews::LinkedContact;
use crate::records::{companies, contacts, interviews, roles, ListQuery};
use crate::state::AppState;
use crate::transfer::coerce::{format_date_long, format_time_12h};

fn not_found(kind: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{kind} {id} not found"))
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

async fn require_company(state: &AppState, company_id: i64) -> Result<(), AppError> {
    match companies::get_company(&state.db, company_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "company_id {company_id} does not exist"
        ))),
    }
}

// ── Companies ───────────────────────────────────────────────────────────────

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Company>>, AppError> {
    let rows =
        companies::list_companies(&state.db, params.sort.as_deref(), params.order.as_deref())
            .await?;
    Ok(Json(rows))
}

/// GET /api/v1/companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Company>, AppError> {
    let company = companies::get_company(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Company", id))?;
    Ok(Json(company))
}

/// POST /api/v1/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    Json(req): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    require_text("name", &req.name)?;
    let id = companies::insert_company(&state.db, None, &req).await?;
    let company = companies::get_company(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Company", id))?;
    tracing::info!(company_id = id, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// PUT /api/v1/companies/:id
pub async fn handle_update_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewCompany>,
) -> Result<Json<Company>, AppError> {
    require_text("name", &req.name)?;
    if !companies::update_company(&state.db, id, &req).await? {
        return Err(not_found("Company", id));
    }
    let company = companies::get_company(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Company", id))?;
    Ok(Json(company))
}

/// DELETE /api/v1/companies/:id
pub async fn handle_delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !companies::delete_company(&state.db, id).await? {
        return Err(not_found("Company", id));
    }
    tracing::info!(company_id = id, "Company deleted with dependents");
    Ok(StatusCode::NO_CONTENT)
}

// ── Roles ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CompanyFilter {
    pub company_id: i64,
}

async fn validate_role(state: &AppState, mut req: NewRole) -> Result<NewRole, AppError> {
    require_text("name", &req.name)?;
    require_company(state, req.company_id).await?;
    let policy = state.config.salary_policy;
    req.posted_range_min = policy.apply(req.posted_range_min);
    req.posted_range_max = policy.apply(req.posted_range_max);
    Ok(req)
}

/// GET /api/v1/roles
pub async fn handle_list_roles(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<RoleListing>>, AppError> {
    let rows =
        roles::list_roles(&state.db, params.sort.as_deref(), params.order.as_deref()).await?;
    Ok(Json(rows))
}

/// GET /api/v1/roles/by-company?company_id=
pub async fn handle_roles_by_company(
    State(state): State<AppState>,
    Query(filter): Query<CompanyFilter>,
) -> Result<Json<Vec<Role>>, AppError> {
    let rows = roles::list_roles_for_company(&state.db, filter.company_id).await?;
    Ok(Json(rows))
}

/// GET /api/v1/roles/:id
pub async fn handle_get_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    let role = roles::get_role(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Role", id))?;
    Ok(Json(role))
}

/// POST /api/v1/roles
pub async fn handle_create_role(
    State(state): State<AppState>,
    Json(req): Json<NewRole>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let req = validate_role(&state, req).await?;
    let id = roles::insert_role(&state.db, None, &req).await?;
    let role = roles::get_role(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Role", id))?;
    tracing::info!(role_id = id, company_id = role.company_id, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// PUT /api/v1/roles/:id
pub async fn handle_update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewRole>,
) -> Result<Json<Role>, AppError> {
    let req = validate_role(&state, req).await?;
    if !roles::update_role(&state.db, id, &req).await? {
        return Err(not_found("Role", id));
    }
    let role = roles::get_role(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Role", id))?;
    Ok(Json(role))
}

/// DELETE /api/v1/roles/:id
pub async fn handle_delete_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !roles::delete_role(&state.db, id).await? {
        return Err(not_found("Role", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Contacts ────────────────────────────────────────────────────────────────

async fn validate_contact(state: &AppState, req: &NewContact) -> Result<(), AppError> {
    require_text("first_name", &req.first_name)?;
    require_text("last_name", &req.last_name)?;
    require_company(state, req.company_id).await
}

/// GET /api/v1/contacts
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ContactListing>>, AppError> {
    let rows =
        contacts::list_contacts(&state.db, params.sort.as_deref(), params.order.as_deref())
            .await?;
    Ok(Json(rows))
}

/// GET /api/v1/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Contact>, AppError> {
    let contact = contacts::get_contact(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Contact", id))?;
    Ok(Json(contact))
}

/// POST /api/v1/contacts
pub async fn handle_create_contact(
    State(state): State<AppState>,
    Json(req): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    validate_contact(&state, &req).await?;
    let id = contacts::insert_contact(&state.db, None, &req).await?;
    let contact = contacts::get_contact(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Contact", id))?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/v1/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewContact>,
) -> Result<Json<Contact>, AppError> {
    validate_contact(&state, &req).await?;
    if !contacts::update_contact(&state.db, id, &req).await? {
        return Err(not_found("Contact", id));
    }
    let contact = contacts::get_contact(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Contact", id))?;
    Ok(Json(contact))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !contacts::delete_contact(&state.db, id).await? {
        return Err(not_found("Contact", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Interviews ──────────────────────────────────────────────────────────────

/// Interview as list views render it: stored values plus human-readable
/// date and times, and the linked contacts.
#[derive(Debug, Serialize)]
pub struct InterviewView {
    #[serde(flatten)]
    pub listing: InterviewListing,
    pub date_display: String,
    pub start_display: String,
    pub end_display: String,
    pub contacts: Vec<LinkedContact>,
}

impl InterviewView {
    fn new(listing: InterviewListing, contacts: Vec<LinkedContact>) -> Self {
        let interview = &listing.interview;
        InterviewView {
            date_display: format_date_long(&interview.date),
            start_display: format_time_12h(&interview.start),
            end_display: format_time_12h(&interview.end),
            contacts,
            listing,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InterviewDetail {
    #[serde(flatten)]
    pub interview: Interview,
    pub contact_ids: Vec<i64>,
}

async fn validate_interview(state: &AppState, req: &NewInterview) -> Result<(), AppError> {
    require_text("date", &req.date)?;
    require_text("start", &req.start)?;
    require_text("end", &req.end)?;
    if roles::get_role(&state.db, req.role_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "role_id {} does not exist",
            req.role_id
        )));
    }
    for &contact_id in &req.contact_ids {
        if contacts::get_contact(&state.db, contact_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "contact_id {contact_id} does not exist"
            )));
        }
    }
    Ok(())
}

async fn interview_detail(state: &AppState, id: i64) -> Result<InterviewDetail, AppError> {
    let interview = interviews::get_interview(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Interview", id))?;
    let contact_ids = interviews::contact_ids_for(&state.db, id).await?;
    Ok(InterviewDetail {
        interview,
        contact_ids,
    })
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<InterviewView>>, AppError> {
    let rows =
        interviews::list_interviews(&state.db, params.sort.as_deref(), params.order.as_deref())
            .await?;
    let mut linked = interviews::linked_contacts(&state.db).await?;
    let views = rows
        .into_iter()
        .map(|listing| {
            let contacts = linked
                .remove(&listing.interview.interview_id)
                .unwrap_or_default();
            InterviewView::new(listing, contacts)
        })
        .collect();
    Ok(Json(views))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InterviewDetail>, AppError> {
    Ok(Json(interview_detail(&state, id).await?))
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(req): Json<NewInterview>,
) -> Result<(StatusCode, Json<InterviewDetail>), AppError> {
    validate_interview(&state, &req).await?;
    let id = interviews::insert_interview(&state.db, None, &req).await?;
    tracing::info!(
        interview_id = id,
        contacts = req.contact_ids.len(),
        "Interview created"
    );
    Ok((StatusCode::CREATED, Json(interview_detail(&state, id).await?)))
}

/// PUT /api/v1/interviews/:id
pub async fn handle_update_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewInterview>,
) -> Result<Json<InterviewDetail>, AppError> {
    validate_interview(&state, &req).await?;
    if !interviews::update_interview(&state.db, id, &req).await? {
        return Err(not_found("Interview", id));
    }
    Ok(Json(interview_detail(&state, id).await?))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !interviews::delete_interview(&state.db, id).await? {
        return Err(not_found("Interview", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
