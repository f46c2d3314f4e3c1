use std::io::Write;
use std::path::Path;

use anyhow::Context;
use axum::{
    extract::{multipart::Field, Multipart, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::transfer::archive::{archive_filename, build_archive, ARCHIVE_CONTENT_TYPE};
use crate::transfer::codec::Entity;
use crate::transfer::import::{run_import, ImportOptions, ImportSources};

/// Uploads may carry up to one file per entity.
pub const MAX_UPLOAD_FILES: usize = 5;

/// GET /export
pub async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = build_archive(&state.db)
        .await
        .map_err(|e| AppError::Export(e.to_string()))?;
    let filename = archive_filename(Local::now().date_naive());
    info!("Serving {filename}");

    let headers = [
        (header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={filename}"),
        ),
        (header::CONTENT_LENGTH, bytes.len().to_string()),
    ];
    Ok((headers, bytes).into_response())
}

/// POST /import
///
/// Each file part is staged in its own temp file, removed when the handler
/// returns on any path.
pub async fn handle_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let limit = state.config.max_upload_bytes;
    let mut staged: Vec<(Entity, NamedTempFile)> = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let entity = Entity::from_form_field(&name)
            .ok_or_else(|| AppError::Validation(format!("Unexpected form field '{name}'")))?;
        let file_name = field.file_name().unwrap_or_default().to_string();
        // Browsers send an empty part for file inputs left blank.
        if file_name.is_empty() {
            continue;
        }
        check_extension(entity, &file_name)?;
        if staged.iter().any(|(seen, _)| *seen == entity) {
            return Err(AppError::Validation(format!(
                "More than one {entity} file uploaded"
            )));
        }
        let file = stage_upload(&mut field, entity, limit).await?;
        staged.push((entity, file));
    }

    if staged.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let mut sources = ImportSources::new();
    for (entity, file) in &staged {
        sources.insert(*entity, file.path().to_path_buf());
    }
    info!("Importing {} uploaded file(s)", staged.len());

    let report = run_import(
        &state.db,
        &sources,
        ImportOptions::upload(state.config.salary_policy),
    )
    .await;
    if !report.is_success() {
        return Err(AppError::Import(report.failure_lines()));
    }

    info!("Upload import finished: {} row(s)", report.imported());
    Ok(Redirect::to("/"))
}

fn form_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Failed to parse form: {e}"))
}

fn check_extension(entity: Entity, file_name: &str) -> Result<(), AppError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Invalid {entity} file '{file_name}': only .csv files are allowed"
        ))),
    }
}

async fn stage_upload(
    field: &mut Field<'_>,
    entity: Entity,
    limit: usize,
) -> Result<NamedTempFile, AppError> {
    let mut file = tempfile::Builder::new()
        .prefix("import-")
        .suffix(".csv")
        .tempfile()
        .context("Failed to create temp file")?;

    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(form_error)? {
        written += chunk.len();
        if written > limit {
            return Err(AppError::Validation(format!(
                "{entity} file exceeds maximum size of {limit} bytes"
            )));
        }
        file.write_all(&chunk)
            .context("Failed to write uploaded file")?;
    }
    if written == 0 {
        return Err(AppError::Validation(format!("{entity} file is empty")));
    }
    file.flush().context("Failed to write uploaded file")?;
    Ok(file)
}
