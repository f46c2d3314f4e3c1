use sqlx::SqlitePool;

use crate::models::{NewRole, Role, RoleListing};
use crate::records::{SortOrder, SortSpec};
use crate::transfer::coerce::{normalize_date, storage_text};

pub const SORTS: SortSpec = SortSpec {
    columns: &[
        ("company_name", "c.name"),
        ("applied_date", "r.applied_date"),
        ("closed_date", "r.closed_date"),
        ("posted_range_min", "r.posted_range_min"),
        ("posted_range_max", "r.posted_range_max"),
        ("equity", "r.equity"),
        ("work_city", "r.work_city"),
        ("work_state", "r.work_state"),
        ("location", "r.location"),
        ("status", "r.status"),
        ("referral", "r.referral"),
    ],
    default_key: "applied_date",
    default_order: SortOrder::Desc,
};

fn storage_date(value: &Option<String>) -> Option<String> {
    storage_text(value).map(|date| normalize_date(&date))
}

pub async fn insert_role(
    pool: &SqlitePool,
    role_id: Option<i64>,
    role: &NewRole,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO roles
            (role_id, company_id, name, url, description, cover_letter, application_location,
             applied_date, closed_date, posted_range_min, posted_range_max, equity,
             work_city, work_state, location, status, discovery, referral, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
        "#,
    )
    .bind(role_id)
    .bind(role.company_id)
    .bind(&role.name)
    .bind(storage_text(&role.url))
    .bind(storage_text(&role.description))
    .bind(storage_text(&role.cover_letter))
    .bind(storage_text(&role.application_location))
    .bind(storage_date(&role.applied_date))
    .bind(storage_date(&role.closed_date))
    .bind(role.posted_range_min)
    .bind(role.posted_range_max)
    .bind(role.equity)
    .bind(storage_text(&role.work_city))
    .bind(storage_text(&role.work_state))
    .bind(storage_text(&role.location))
    .bind(storage_text(&role.status))
    .bind(storage_text(&role.discovery))
    .bind(role.referral)
    .bind(storage_text(&role.notes))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_role(pool: &SqlitePool, role_id: i64) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE role_id = ?1")
        .bind(role_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_roles(
    pool: &SqlitePool,
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Vec<RoleListing>, sqlx::Error> {
    let (column, order) = SORTS.resolve(sort, order);
    let sql = format!(
        r#"
        SELECT r.*, c.name AS company_name
        FROM roles r
        INNER JOIN companies c ON r.company_id = c.company_id
        ORDER BY {column} {}, r.role_id ASC
        "#,
        order.as_sql()
    );
    sqlx::query_as::<_, RoleListing>(&sql).fetch_all(pool).await
}

/// Roles of one company by name, for cascading pickers.
pub async fn list_roles_for_company(
    pool: &SqlitePool,
    company_id: i64,
) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE company_id = ?1 ORDER BY name COLLATE NOCASE")
        .bind(company_id)
        .fetch_all(pool)
        .await
}

pub async fn list_roles_by_id(pool: &SqlitePool) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY role_id ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_role(pool: &SqlitePool, role_id: i64, role: &NewRole) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE roles
        SET company_id = ?1, name = ?2, url = ?3, description = ?4, cover_letter = ?5,
            application_location = ?6, applied_date = ?7, closed_date = ?8,
            posted_range_min = ?9, posted_range_max = ?10, equity = ?11, work_city = ?12,
            work_state = ?13, location = ?14, status = ?15, discovery = ?16, referral = ?17,
            notes = ?18, updated_at = CURRENT_TIMESTAMP
        WHERE role_id = ?19
        "#,
    )
    .bind(role.company_id)
    .bind(&role.name)
    .bind(storage_text(&role.url))
    .bind(storage_text(&role.description))
    .bind(storage_text(&role.cover_letter))
    .bind(storage_text(&role.application_location))
    .bind(storage_date(&role.applied_date))
    .bind(storage_date(&role.closed_date))
    .bind(role.posted_range_min)
    .bind(role.posted_range_max)
    .bind(role.equity)
    .bind(storage_text(&role.work_city))
    .bind(storage_text(&role.work_state))
    .bind(storage_text(&role.location))
    .bind(storage_text(&role.status))
    .bind(storage_text(&role.discovery))
    .bind(role.referral)
    .bind(storage_text(&role.notes))
    .bind(role_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_role(pool: &SqlitePool, role_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roles WHERE role_id = ?1")
        .bind(role_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
