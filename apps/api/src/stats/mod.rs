//! Application statistics over a date window.
//!
//! Roles are windowed by `applied_date`, interviews by `date`. Both columns
//! hold ISO dates, so the window is a plain `BETWEEN` on bound parameters.

pub mod handlers;

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::InterviewType;
use crate::transfer::coerce::{format_date_long, SalaryPolicy};

pub const DEFAULT_RANGE_DAYS: i64 = 30;
const PRESET_DAYS: [i64; 5] = [7, 30, 90, 180, 365];

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Inclusive date bounds. `None` on both sides means no filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsWindow {
    pub range: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl StatsWindow {
    fn days_back(days: i64, today: NaiveDate) -> Self {
        StatsWindow {
            range: days.to_string(),
            start: Some(today - Duration::days(days)),
            end: Some(today),
        }
    }

    fn bounds(&self) -> (Option<String>, Option<String>) {
        let fmt = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
        (self.start.map(fmt), self.end.map(fmt))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required for a custom range")))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{name} must be YYYY-MM-DD, got '{raw}'")))
}

/// Unknown presets fall back to the last 30 days.
pub fn resolve_window(query: &StatsQuery, today: NaiveDate) -> Result<StatsWindow, AppError> {
    match query.range.as_deref().map(str::trim) {
        Some("all") => Ok(StatsWindow {
            range: "all".to_string(),
            start: None,
            end: None,
        }),
        Some("custom") => {
            let start = parse_bound("start_date", query.start_date.as_deref())?;
            let end = parse_bound("end_date", query.end_date.as_deref())?;
            if start > end {
                return Err(AppError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
            Ok(StatsWindow {
                range: "custom".to_string(),
                start: Some(start),
                end: Some(end),
            })
        }
        Some(preset) => {
            let days = preset
                .parse::<i64>()
                .ok()
                .filter(|d| PRESET_DAYS.contains(d))
                .unwrap_or(DEFAULT_RANGE_DAYS);
            Ok(StatsWindow::days_back(days, today))
        }
        None => Ok(StatsWindow::days_back(DEFAULT_RANGE_DAYS, today)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalaryStats {
    pub avg_posted_min: Option<f64>,
    pub avg_posted_max: Option<f64>,
    pub abs_posted_min: Option<i64>,
    pub abs_posted_max: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub window: StatsWindow,
    /// Long form, e.g. `April 8, 2025`.
    pub first_application_date: Option<String>,
    pub last_application_date: Option<String>,
    pub roles_applied: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_location: BTreeMap<String, i64>,
    pub salary: SalaryStats,
    pub total_interviews: i64,
    /// Every interview type is present, zero when unused.
    pub by_interview_type: BTreeMap<InterviewType, i64>,
}

#[derive(Debug, FromRow)]
struct RoleAggregate {
    roles_applied: i64,
    first_applied: Option<String>,
    last_applied: Option<String>,
    avg_posted_min: Option<f64>,
    avg_posted_max: Option<f64>,
    abs_posted_min: Option<i64>,
    abs_posted_max: Option<i64>,
}

const ROLE_WINDOW: &str = "(?1 IS NULL OR applied_date BETWEEN ?1 AND ?2)";

async fn grouped_role_counts(
    pool: &SqlitePool,
    column: &str,
    start: &Option<String>,
    end: &Option<String>,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM roles \
         WHERE {ROLE_WINDOW} AND {column} IS NOT NULL AND {column} != '' \
         GROUP BY {column}"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn compute_stats(
    pool: &SqlitePool,
    window: StatsWindow,
    salary: SalaryPolicy,
) -> Result<Stats, sqlx::Error> {
    let (start, end) = window.bounds();

    let by_status = grouped_role_counts(pool, "status", &start, &end).await?;
    let by_location = grouped_role_counts(pool, "location", &start, &end).await?;

    let aggregate_sql = format!(
        r#"
        SELECT
            COUNT(NULLIF(applied_date, '')) AS roles_applied,
            MIN(NULLIF(applied_date, '')) AS first_applied,
            MAX(NULLIF(applied_date, '')) AS last_applied,
            AVG(CASE WHEN ?3 = 0 OR posted_range_min != 0 THEN CAST(posted_range_min AS REAL) END) AS avg_posted_min,
            AVG(CASE WHEN ?3 = 0 OR posted_range_max != 0 THEN CAST(posted_range_max AS REAL) END) AS avg_posted_max,
            MIN(CASE WHEN ?3 = 0 OR posted_range_min != 0 THEN posted_range_min END) AS abs_posted_min,
            MAX(CASE WHEN ?3 = 0 OR posted_range_max != 0 THEN posted_range_max END) AS abs_posted_max
        FROM roles
        WHERE {ROLE_WINDOW}
        "#
    );
    let aggregate: RoleAggregate = sqlx::query_as(&aggregate_sql)
        .bind(&start)
        .bind(&end)
        .bind(salary.excludes_zero())
        .fetch_one(pool)
        .await?;

    let type_rows: Vec<(InterviewType, i64)> = sqlx::query_as(
        r#"
        SELECT "type", COUNT(*) FROM interviews
        WHERE (?1 IS NULL OR "date" BETWEEN ?1 AND ?2)
        GROUP BY "type"
        "#,
    )
    .bind(&start)
    .bind(&end)
    .fetch_all(pool)
    .await?;

    let mut by_interview_type: BTreeMap<InterviewType, i64> =
        InterviewType::ALL.into_iter().map(|t| (t, 0)).collect();
    by_interview_type.extend(type_rows);
    let total_interviews = by_interview_type.values().sum();

    Ok(Stats {
        window,
        first_application_date: aggregate.first_applied.as_deref().map(format_date_long),
        last_application_date: aggregate.last_applied.as_deref().map(format_date_long),
        roles_applied: aggregate.roles_applied,
        by_status,
        by_location,
        salary: SalaryStats {
            avg_posted_min: aggregate.avg_posted_min,
            avg_posted_max: aggregate.avg_posted_max,
            abs_posted_min: aggregate.abs_posted_min,
            abs_posted_max: aggregate.abs_posted_max,
        },
        total_interviews,
        by_interview_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::{NewCompany, NewInterview, NewRole};
    use crate::records::{companies, interviews, roles};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn query(range: Option<&str>, start: Option<&str>, end: Option<&str>) -> StatsQuery {
        StatsQuery {
            range: range.map(String::from),
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn test_window_defaults_to_thirty_days() {
        let window = resolve_window(&StatsQuery::default(), today()).unwrap();
        assert_eq!(window.range, "30");
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 5, 31));
        assert_eq!(window.end, Some(today()));

        let window = resolve_window(&query(Some("45"), None, None), today()).unwrap();
        assert_eq!(window.range, "30");
    }

    #[test]
    fn test_window_presets_and_all() {
        let window = resolve_window(&query(Some("7"), None, None), today()).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 6, 23));
        let window = resolve_window(&query(Some("all"), None, None), today()).unwrap();
        assert_eq!((window.start, window.end), (None, None));
    }

    #[test]
    fn test_window_custom_requires_valid_ordered_dates() {
        let window =
            resolve_window(&query(Some("custom"), Some("2025-01-01"), Some("2025-03-31")), today())
                .unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert!(resolve_window(&query(Some("custom"), Some("2025-01-01"), None), today()).is_err());
        assert!(
            resolve_window(&query(Some("custom"), Some("Jan 1"), Some("2025-03-31")), today())
                .is_err()
        );
        assert!(resolve_window(
            &query(Some("custom"), Some("2025-04-01"), Some("2025-03-31")),
            today()
        )
        .is_err());
    }

    async fn seed(pool: &SqlitePool) {
        let company = NewCompany {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let company_id = companies::insert_company(pool, None, &company).await.unwrap();
        let rows = [
            ("2025-06-01", "OFFER", "REMOTE", Some(0), Some(150000)),
            ("2025-06-15", "REJECTED", "REMOTE", Some(100000), Some(140000)),
            ("2025-06-20", "REJECTED", "ONSITE", Some(120000), None),
            ("2024-01-05", "GHOSTED", "HYBRID", Some(90000), Some(95000)),
        ];
        let mut first_role = 0;
        for (applied, status, location, min, max) in rows {
            let role = NewRole {
                company_id,
                name: "Engineer".to_string(),
                applied_date: Some(applied.to_string()),
                status: Some(status.to_string()),
                location: Some(location.to_string()),
                posted_range_min: min,
                posted_range_max: max,
                ..Default::default()
            };
            let id = roles::insert_role(pool, None, &role).await.unwrap();
            if first_role == 0 {
                first_role = id;
            }
        }
        for (date, kind) in [
            ("2025-06-10", InterviewType::Recruiter),
            ("2025-06-12", InterviewType::TechScreen),
            ("2024-02-01", InterviewType::Loop),
        ] {
            let interview = NewInterview {
                role_id: first_role,
                date: date.to_string(),
                start: "09:00".to_string(),
                end: "10:00".to_string(),
                notes: None,
                kind,
                contact_ids: Vec::new(),
            };
            interviews::insert_interview(pool, None, &interview).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_stats_for_window() {
        let pool = test_pool().await;
        seed(&pool).await;
        let window = resolve_window(&StatsQuery::default(), today()).unwrap();
        let stats = compute_stats(&pool, window, SalaryPolicy::ZeroIsValue).await.unwrap();

        assert_eq!(stats.roles_applied, 3);
        assert_eq!(stats.first_application_date.as_deref(), Some("June 1, 2025"));
        assert_eq!(stats.last_application_date.as_deref(), Some("June 20, 2025"));
        assert_eq!(stats.by_status.get("REJECTED"), Some(&2));
        assert_eq!(stats.by_status.get("GHOSTED"), None);
        assert_eq!(stats.by_location.get("REMOTE"), Some(&2));
        assert_eq!(stats.salary.abs_posted_min, Some(0));
        assert_eq!(stats.salary.abs_posted_max, Some(150000));
        assert_eq!(stats.total_interviews, 2);
        assert_eq!(stats.by_interview_type[&InterviewType::Loop], 0);
        assert_eq!(stats.by_interview_type[&InterviewType::TechScreen], 1);
    }

    #[tokio::test]
    async fn test_zero_salary_excluded_when_absent_policy() {
        let pool = test_pool().await;
        seed(&pool).await;
        let window = resolve_window(&StatsQuery::default(), today()).unwrap();
        let stats = compute_stats(&pool, window, SalaryPolicy::ZeroIsAbsent).await.unwrap();
        assert_eq!(stats.salary.abs_posted_min, Some(100000));
        assert_eq!(stats.salary.avg_posted_min, Some(110000.0));
    }

    #[tokio::test]
    async fn test_all_time_includes_everything() {
        let pool = test_pool().await;
        seed(&pool).await;
        let window = resolve_window(&query(Some("all"), None, None), today()).unwrap();
        let stats = compute_stats(&pool, window, SalaryPolicy::ZeroIsValue).await.unwrap();
        assert_eq!(stats.roles_applied, 4);
        assert_eq!(stats.first_application_date.as_deref(), Some("January 5, 2024"));
        assert_eq!(stats.total_interviews, 3);
        assert_eq!(stats.by_status.get("GHOSTED"), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_database() {
        let pool = test_pool().await;
        let window = resolve_window(&StatsQuery::default(), today()).unwrap();
        let stats = compute_stats(&pool, window, SalaryPolicy::ZeroIsValue).await.unwrap();
        assert_eq!(stats.roles_applied, 0);
        assert_eq!(stats.first_application_date, None);
        assert_eq!(stats.salary, SalaryStats::default());
        assert_eq!(stats.total_interviews, 0);
        assert_eq!(stats.by_interview_type.len(), 5);
    }
}
