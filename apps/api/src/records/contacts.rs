use sqlx::SqlitePool;

use crate::models::{Contact, ContactListing, NewContact};
use crate::records::{SortOrder, SortSpec};
use crate::transfer::coerce::storage_text;

pub const SORTS: SortSpec = SortSpec {
    columns: &[
        ("last_name", "ct.last_name"),
        ("first_name", "ct.first_name"),
        ("company_name", "c.name"),
        ("role", "ct.role"),
        ("email", "ct.email"),
    ],
    default_key: "last_name",
    default_order: SortOrder::Asc,
};

pub async fn insert_contact(
    pool: &SqlitePool,
    contact_id: Option<i64>,
    contact: &NewContact,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO contacts
            (contact_id, company_id, first_name, last_name, role, email, phone, linkedin, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(contact_id)
    .bind(contact.company_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(storage_text(&contact.role))
    .bind(storage_text(&contact.email))
    .bind(storage_text(&contact.phone))
    .bind(storage_text(&contact.linkedin))
    .bind(storage_text(&contact.notes))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_contact(pool: &SqlitePool, contact_id: i64) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE contact_id = ?1")
        .bind(contact_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_contacts(
    pool: &SqlitePool,
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Vec<ContactListing>, sqlx::Error> {
    let (column, order) = SORTS.resolve(sort, order);
    let sql = format!(
        r#"
        SELECT ct.*, c.name AS company_name
        FROM contacts ct
        INNER JOIN companies c ON ct.company_id = c.company_id
        ORDER BY {column} COLLATE NOCASE {}, ct.contact_id ASC
        "#,
        order.as_sql()
    );
    sqlx::query_as::<_, ContactListing>(&sql).fetch_all(pool).await
}

pub async fn list_contacts_by_id(pool: &SqlitePool) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts ORDER BY contact_id ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_contact(
    pool: &SqlitePool,
    contact_id: i64,
    contact: &NewContact,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET company_id = ?1, first_name = ?2, last_name = ?3, role = ?4, email = ?5,
            phone = ?6, linkedin = ?7, notes = ?8, updated_at = CURRENT_TIMESTAMP
        WHERE contact_id = ?9
        "#,
    )
    .bind(contact.company_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(storage_text(&contact.role))
    .bind(storage_text(&contact.email))
    .bind(storage_text(&contact.phone))
    .bind(storage_text(&contact.linkedin))
    .bind(storage_text(&contact.notes))
    .bind(contact_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_contact(pool: &SqlitePool, contact_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contacts WHERE contact_id = ?1")
        .bind(contact_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::NewCompany;
    use crate::records::companies::insert_company;

    fn contact(company_id: i64, first: &str, last: &str) -> NewContact {
        NewContact {
            company_id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_defaults_to_last_name() {
        let pool = test_pool().await;
        let company = NewCompany {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let company_id = insert_company(&pool, None, &company).await.unwrap();
        insert_contact(&pool, None, &contact(company_id, "Jane", "zimmer")).await.unwrap();
        insert_contact(&pool, None, &contact(company_id, "Alan", "Baker")).await.unwrap();

        let listed = list_contacts(&pool, None, None).await.unwrap();
        let last_names: Vec<_> = listed.iter().map(|l| l.contact.last_name.as_str()).collect();
        assert_eq!(last_names, vec!["Baker", "zimmer"]);
        assert!(listed.iter().all(|l| l.company_name == "Acme"));
    }

    #[tokio::test]
    async fn test_update_changes_fields() {
        let pool = test_pool().await;
        let company = NewCompany {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let company_id = insert_company(&pool, None, &company).await.unwrap();
        let id = insert_contact(&pool, None, &contact(company_id, "Jane", "Doe")).await.unwrap();

        let edited = NewContact {
            email: Some("jane@acme.test".to_string()),
            ..contact(company_id, "Jane", "Doe")
        };
        assert!(update_contact(&pool, id, &edited).await.unwrap());
        let stored = get_contact(&pool, id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("jane@acme.test"));
    }
}
