use sqlx::SqlitePool;

use crate::models::{Company, NewCompany};
use crate::records::{SortOrder, SortSpec};
use crate::transfer::coerce::storage_text;

pub const SORTS: SortSpec = SortSpec {
    columns: &[
        ("name", "name"),
        ("hq_city", "hq_city"),
        ("hq_state", "hq_state"),
        ("created_at", "created_at"),
    ],
    default_key: "name",
    default_order: SortOrder::Asc,
};

/// Inserts a company. `company_id` is normally `None`; the importer passes the
/// identifier from the CSV file when it preserves keys.
pub async fn insert_company(
    pool: &SqlitePool,
    company_id: Option<i64>,
    company: &NewCompany,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO companies (company_id, name, description, url, linkedin, hq_city, hq_state)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(company_id)
    .bind(&company.name)
    .bind(storage_text(&company.description))
    .bind(storage_text(&company.url))
    .bind(storage_text(&company.linkedin))
    .bind(storage_text(&company.hq_city))
    .bind(storage_text(&company.hq_state))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_company(pool: &SqlitePool, company_id: i64) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE company_id = ?1")
        .bind(company_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_companies(
    pool: &SqlitePool,
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Vec<Company>, sqlx::Error> {
    let (column, order) = SORTS.resolve(sort, order);
    let sql = format!(
        "SELECT * FROM companies ORDER BY {column} COLLATE NOCASE {}, company_id ASC",
        order.as_sql()
    );
    sqlx::query_as::<_, Company>(&sql).fetch_all(pool).await
}

/// Full table in primary-key order, as written to CSV.
pub async fn list_companies_by_id(pool: &SqlitePool) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY company_id ASC")
        .fetch_all(pool)
        .await
}

/// Returns `false` when no company has that id.
pub async fn update_company(
    pool: &SqlitePool,
    company_id: i64,
    company: &NewCompany,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE companies
        SET name = ?1, description = ?2, url = ?3, linkedin = ?4, hq_city = ?5, hq_state = ?6,
            updated_at = CURRENT_TIMESTAMP
        WHERE company_id = ?7
        "#,
    )
    .bind(&company.name)
    .bind(storage_text(&company.description))
    .bind(storage_text(&company.url))
    .bind(storage_text(&company.linkedin))
    .bind(storage_text(&company.hq_city))
    .bind(storage_text(&company.hq_state))
    .bind(company_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Roles, contacts and their interviews go with it (ON DELETE CASCADE).
pub async fn delete_company(pool: &SqlitePool, company_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM companies WHERE company_id = ?1")
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
