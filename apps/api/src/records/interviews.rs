use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::models::{Interview, InterviewContactLink, InterviewListing, NewInterview};
use crate::records::{SortOrder, SortSpec};
use crate::transfer::coerce::{normalize_date, normalize_time, storage_text};

pub const SORTS: SortSpec = SortSpec {
    columns: &[
        ("date", "i.\"date\""),
        ("company_name", "c.name"),
        ("role_name", "r.name"),
        ("type", "i.\"type\""),
    ],
    default_key: "date",
    default_order: SortOrder::Desc,
};

/// Contact attached to an interview, trimmed to what list views show.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct LinkedContact {
    pub interview_id: i64,
    pub contact_id: i64,
    pub first_name: String,
    pub last_name: String,
}

async fn replace_links(
    conn: &mut SqliteConnection,
    interview_id: i64,
    contact_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM interviews_contacts WHERE interview_id = ?1")
        .bind(interview_id)
        .execute(&mut *conn)
        .await?;

    let mut ids = contact_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    for contact_id in ids {
        sqlx::query("INSERT INTO interviews_contacts (interview_id, contact_id) VALUES (?1, ?2)")
            .bind(interview_id)
            .bind(contact_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Inserts the interview and its contact links in one transaction.
/// Date and times are stored as `YYYY-MM-DD` and 24-hour `HH:MM`.
pub async fn insert_interview(
    pool: &SqlitePool,
    interview_id: Option<i64>,
    interview: &NewInterview,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO interviews (interview_id, role_id, "date", "start", "end", notes, "type")
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(interview_id)
    .bind(interview.role_id)
    .bind(normalize_date(&interview.date))
    .bind(normalize_time(&interview.start))
    .bind(normalize_time(&interview.end))
    .bind(storage_text(&interview.notes))
    .bind(interview.kind)
    .execute(&mut *tx)
    .await?;
    let id = result.last_insert_rowid();

    if !interview.contact_ids.is_empty() {
        replace_links(&mut tx, id, &interview.contact_ids).await?;
    }
    tx.commit().await?;
    Ok(id)
}

pub async fn get_interview(
    pool: &SqlitePool,
    interview_id: i64,
) -> Result<Option<Interview>, sqlx::Error> {
    sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE interview_id = ?1")
        .bind(interview_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_interviews(
    pool: &SqlitePool,
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Vec<InterviewListing>, sqlx::Error> {
    let (column, order) = SORTS.resolve(sort, order);
    let sql = format!(
        r#"
        SELECT i.*, r.name AS role_name, c.company_id AS company_id, c.name AS company_name
        FROM interviews i
        INNER JOIN roles r ON i.role_id = r.role_id
        INNER JOIN companies c ON r.company_id = c.company_id
        ORDER BY {column} {order}, i."start" {order}, i.interview_id ASC
        "#,
        order = order.as_sql()
    );
    sqlx::query_as::<_, InterviewListing>(&sql).fetch_all(pool).await
}

pub async fn list_interviews_by_id(pool: &SqlitePool) -> Result<Vec<Interview>, sqlx::Error> {
    sqlx::query_as::<_, Interview>("SELECT * FROM interviews ORDER BY interview_id ASC")
        .fetch_all(pool)
        .await
}

/// Rewrites the interview row and replaces its contact links.
pub async fn update_interview(
    pool: &SqlitePool,
    interview_id: i64,
    interview: &NewInterview,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE interviews
        SET role_id = ?1, "date" = ?2, "start" = ?3, "end" = ?4, notes = ?5, "type" = ?6,
            updated_at = CURRENT_TIMESTAMP
        WHERE interview_id = ?7
        "#,
    )
    .bind(interview.role_id)
    .bind(normalize_date(&interview.date))
    .bind(normalize_time(&interview.start))
    .bind(normalize_time(&interview.end))
    .bind(storage_text(&interview.notes))
    .bind(interview.kind)
    .bind(interview_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }
    replace_links(&mut tx, interview_id, &interview.contact_ids).await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn delete_interview(pool: &SqlitePool, interview_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM interviews WHERE interview_id = ?1")
        .bind(interview_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Contact links ───────────────────────────────────────────────────────────

pub async fn insert_link(
    pool: &SqlitePool,
    link_id: Option<i64>,
    interview_id: i64,
    contact_id: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO interviews_contacts (interviews_contact_id, interview_id, contact_id)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(link_id)
    .bind(interview_id)
    .bind(contact_id)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_links_by_id(pool: &SqlitePool) -> Result<Vec<InterviewContactLink>, sqlx::Error> {
    sqlx::query_as::<_, InterviewContactLink>(
        "SELECT * FROM interviews_contacts ORDER BY interviews_contact_id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn contact_ids_for(pool: &SqlitePool, interview_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT contact_id FROM interviews_contacts WHERE interview_id = ?1 ORDER BY contact_id",
    )
    .bind(interview_id)
    .fetch_all(pool)
    .await
}

/// Linked contacts for every interview, keyed by interview id.
pub async fn linked_contacts(
    pool: &SqlitePool,
) -> Result<HashMap<i64, Vec<LinkedContact>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LinkedContact>(
        r#"
        SELECT ic.interview_id, ct.contact_id, ct.first_name, ct.last_name
        FROM interviews_contacts ic
        INNER JOIN contacts ct ON ic.contact_id = ct.contact_id
        ORDER BY ct.last_name COLLATE NOCASE, ct.first_name COLLATE NOCASE
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_interview: HashMap<i64, Vec<LinkedContact>> = HashMap::new();
    for row in rows {
        by_interview.entry(row.interview_id).or_default().push(row);
    }
    Ok(by_interview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::{InterviewType, NewCompany, NewContact, NewRole};
    use crate::records::{companies::insert_company, contacts::insert_contact, roles::insert_role};

    struct Seed {
        role_id: i64,
        contacts: Vec<i64>,
    }

    async fn seed(pool: &SqlitePool) -> Seed {
        let company = NewCompany {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let company_id = insert_company(pool, None, &company).await.unwrap();
        let role = NewRole {
            company_id,
            name: "Engineer".to_string(),
            ..Default::default()
        };
        let role_id = insert_role(pool, None, &role).await.unwrap();
        let mut contacts = Vec::new();
        for last in ["Doe", "Roe"] {
            let contact = NewContact {
                company_id,
                first_name: "Jo".to_string(),
                last_name: last.to_string(),
                ..Default::default()
            };
            contacts.push(insert_contact(pool, None, &contact).await.unwrap());
        }
        Seed { role_id, contacts }
    }

    fn interview(role_id: i64, date: &str, start: &str, contact_ids: Vec<i64>) -> NewInterview {
        NewInterview {
            role_id,
            date: date.to_string(),
            start: start.to_string(),
            end: "5:00 PM".to_string(),
            notes: None,
            kind: InterviewType::Recruiter,
            contact_ids,
        }
    }

    #[tokio::test]
    async fn test_insert_normalizes_and_links() {
        let pool = test_pool().await;
        let seed = seed(&pool).await;
        let id = insert_interview(
            &pool,
            None,
            &interview(seed.role_id, "October 1, 2025", "3:04 PM", seed.contacts.clone()),
        )
        .await
        .unwrap();

        let stored = get_interview(&pool, id).await.unwrap().unwrap();
        assert_eq!(stored.date, "2025-10-01");
        assert_eq!(stored.start, "15:04");
        assert_eq!(stored.end, "17:00");
        assert_eq!(stored.kind, InterviewType::Recruiter);
        assert_eq!(contact_ids_for(&pool, id).await.unwrap(), seed.contacts);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let pool = test_pool().await;
        let seed = seed(&pool).await;
        let id = insert_interview(
            &pool,
            None,
            &interview(seed.role_id, "2025-10-01", "09:00", seed.contacts.clone()),
        )
        .await
        .unwrap();

        let keep = vec![seed.contacts[1], seed.contacts[1]];
        assert!(update_interview(&pool, id, &interview(seed.role_id, "2025-10-02", "10:00", keep))
            .await
            .unwrap());
        assert_eq!(contact_ids_for(&pool, id).await.unwrap(), vec![seed.contacts[1]]);
        assert!(!update_interview(&pool, 999, &interview(seed.role_id, "2025-10-02", "10:00", vec![]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_start() {
        let pool = test_pool().await;
        let seed = seed(&pool).await;
        for (date, start) in [("2025-10-01", "09:00"), ("2025-10-02", "08:00"), ("2025-10-02", "13:00")] {
            insert_interview(&pool, None, &interview(seed.role_id, date, start, vec![]))
                .await
                .unwrap();
        }
        let listed = list_interviews(&pool, None, None).await.unwrap();
        let slots: Vec<_> = listed
            .iter()
            .map(|l| (l.interview.date.as_str(), l.interview.start.as_str()))
            .collect();
        assert_eq!(
            slots,
            vec![("2025-10-02", "13:00"), ("2025-10-02", "08:00"), ("2025-10-01", "09:00")]
        );
        assert_eq!(listed[0].company_name, "Acme");
        assert_eq!(listed[0].role_name, "Engineer");
    }

    #[tokio::test]
    async fn test_deleting_contact_drops_links() {
        let pool = test_pool().await;
        let seed = seed(&pool).await;
        let id = insert_interview(
            &pool,
            None,
            &interview(seed.role_id, "2025-10-01", "09:00", seed.contacts.clone()),
        )
        .await
        .unwrap();

        crate::records::contacts::delete_contact(&pool, seed.contacts[0])
            .await
            .unwrap();
        let linked = linked_contacts(&pool).await.unwrap();
        assert_eq!(linked[&id].len(), 1);
        assert_eq!(linked[&id][0].last_name, "Roe");
    }

    #[tokio::test]
    async fn test_insert_link_rejects_missing_contact() {
        let pool = test_pool().await;
        let seed = seed(&pool).await;
        let id = insert_interview(&pool, None, &interview(seed.role_id, "2025-10-01", "09:00", vec![]))
            .await
            .unwrap();
        assert!(insert_link(&pool, None, id, 4242).await.is_err());
        insert_link(&pool, Some(7), id, seed.contacts[0]).await.unwrap();
        let links = list_links_by_id(&pool).await.unwrap();
        assert_eq!(links[0].interviews_contact_id, 7);
    }
}
