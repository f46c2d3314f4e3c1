use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;

use crate::errors::AppError;
use crate::state::AppState;
use crate::stats::{compute_stats, resolve_window, Stats, StatsQuery};

/// GET /api/v1/stats?range=7|30|90|180|365|all|custom&start_date=&end_date=
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<Stats>, AppError> {
    let window = resolve_window(&params, Local::now().date_naive())?;
    let stats = compute_stats(&state.db, window, state.config.salary_policy).await?;
    Ok(Json(stats))
}
