pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::records::handlers as records;
use crate::state::AppState;
use crate::stats::handlers::handle_stats;
use crate::transfer::handlers::{handle_export, handle_import, MAX_UPLOAD_FILES};

pub fn build_router(state: AppState) -> Router {
    let import_body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_UPLOAD_FILES);

    Router::new()
        .route("/", get(|| async { Redirect::to("/api/v1/companies") }))
        .route("/health", get(health::health_handler))
        // Bulk transfer
        .route("/export", get(handle_export))
        .route(
            "/import",
            post(handle_import).layer(DefaultBodyLimit::max(import_body_limit)),
        )
        // Companies
        .route(
            "/api/v1/companies",
            get(records::handle_list_companies).post(records::handle_create_company),
        )
        .route(
            "/api/v1/companies/:id",
            get(records::handle_get_company)
                .put(records::handle_update_company)
                .delete(records::handle_delete_company),
        )
        // Roles
        .route(
            "/api/v1/roles",
            get(records::handle_list_roles).post(records::handle_create_role),
        )
        .route(
            "/api/v1/roles/by-company",
            get(records::handle_roles_by_company),
        )
        .route(
            "/api/v1/roles/:id",
            get(records::handle_get_role)
                .put(records::handle_update_role)
                .delete(records::handle_delete_role),
        )
        // Contacts
        .route(
            "/api/v1/contacts",
            get(records::handle_list_contacts).post(records::handle_create_contact),
        )
        .route(
            "/api/v1/contacts/:id",
            get(records::handle_get_contact)
                .put(records::handle_update_contact)
                .delete(records::handle_delete_contact),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            get(records::handle_list_interviews).post(records::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/:id",
            get(records::handle_get_interview)
                .put(records::handle_update_interview)
                .delete(records::handle_delete_interview),
        )
        .route("/api/v1/stats", get(handle_stats))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::records::{companies, roles};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "reverse-ats-test-boundary";
    const COMPANIES: &str =
        "companyID,name,description,url,linkedin,hqCity,hqState\n1,Acme,,,,SF,CA\n";
    const ROLES: &str = "roleID,companyID,name,url,description,coverLetter,applicationLocation,\
                         appliedDate,closedDate,postedRangeMin,postedRangeMax,equity,workCity,\
                         workState,location,status,discovery,referral,notes\n\
                         1,1,Engineer,,,,,2025-04-08,,,,,,,REMOTE,APPLIED,,,\n";

    async fn app_with(config: Config) -> (Router, AppState) {
        let state = AppState {
            db: test_pool().await,
            config,
        };
        (build_router(state.clone()), state)
    }

    async fn app() -> (Router, AppState) {
        app_with(Config::default()).await
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    /// `(form field, file name, contents)` per part.
    fn upload(parts: &[(&str, &str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (field, file_name, contents) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: text/csv\r\n\r\n\
                 {contents}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::post("/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_service() {
        let (app, _) = app().await;
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "reverse-ats");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_root_redirects_to_companies() {
        let (app, _) = app().await;
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/companies");
    }

    #[tokio::test]
    async fn test_export_sets_archive_headers() {
        let (app, _) = app().await;
        let response = app.oneshot(get("/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=reverse-ats-export-"));
        assert!(disposition.ends_with(".zip"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            headers[header::CONTENT_LENGTH].to_str().unwrap(),
            bytes.len().to_string()
        );
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_import_success_redirects_home() {
        let (app, state) = app().await;
        let request = upload(&[
            ("companies", "reverse-ats - Companies.csv", COMPANIES),
            ("roles", "reverse-ats - Roles.csv", ROLES),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let stored = companies::list_companies_by_id(&state.db).await.unwrap();
        assert_eq!(stored.len(), 1);
        let stored_roles = roles::list_roles_by_id(&state.db).await.unwrap();
        assert_eq!(stored_roles[0].company_id, stored[0].company_id);
    }

    #[tokio::test]
    async fn test_import_failure_lists_failed_steps() {
        let (app, _) = app().await;
        let response = app
            .oneshot(upload(&[("roles", "roles.csv", ROLES)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let text = body_text(response).await;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Import completed with errors:");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("failed to import roles:"));
    }

    #[tokio::test]
    async fn test_import_rejects_bad_uploads() {
        let cases: [&[(&str, &str, &str)]; 5] = [
            &[],
            &[("resumes", "resumes.csv", COMPANIES)],
            &[("companies", "companies.txt", COMPANIES)],
            &[("companies", "companies.csv", "")],
            &[
                ("companies", "companies.csv", COMPANIES),
                ("companies", "more-companies.csv", COMPANIES),
            ],
        ];
        for parts in cases {
            let (app, state) = app().await;
            let response = app.oneshot(upload(parts)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{parts:?}");
            assert!(companies::list_companies_by_id(&state.db)
                .await
                .unwrap()
                .is_empty());
        }
    }

    #[tokio::test]
    async fn test_import_enforces_file_size_limit() {
        let config = Config {
            max_upload_bytes: 16,
            ..Config::default()
        };
        let (app, _) = app_with(config).await;
        let response = app
            .oneshot(upload(&[("companies", "companies.csv", COMPANIES)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_form_fields_are_stored_absent() {
        let (app, state) = app().await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/companies",
                json!({"name": "Acme", "description": "", "url": "NULL", "hq_city": "SF"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["description"], Value::Null);
        assert_eq!(created["url"], Value::Null);

        let stored = companies::list_companies_by_id(&state.db).await.unwrap();
        assert_eq!(stored[0].description, None);
        assert_eq!(stored[0].hq_city.as_deref(), Some("SF"));
    }

    #[tokio::test]
    async fn test_company_crud_round() {
        let (app, _) = app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/companies",
                json!({"name": "Acme", "hq_city": "SF"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["company_id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/companies", json!({"name": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/roles",
                json!({"company_id": 999, "name": "Engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/companies/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get(&format!("/api/v1/companies/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_interview_view_formats_for_display() {
        let (app, _) = app().await;
        let company = body_json(
            app.clone()
                .oneshot(json_request("POST", "/api/v1/companies", json!({"name": "Acme"})))
                .await
                .unwrap(),
        )
        .await;
        let role = body_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/v1/roles",
                    json!({"company_id": company["company_id"], "name": "Engineer"}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let contact = body_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/v1/contacts",
                    json!({
                        "company_id": company["company_id"],
                        "first_name": "Jane",
                        "last_name": "Doe"
                    }),
                ))
                .await
                .unwrap(),
        )
        .await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/interviews",
                json!({
                    "role_id": role["role_id"],
                    "date": "October 1, 2025",
                    "start": "2:30 PM",
                    "end": "15:15",
                    "type": "TECH_SCREEN",
                    "contact_ids": [contact["contact_id"]]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["date"], "2025-10-01");
        assert_eq!(created["start"], "14:30");
        assert_eq!(created["contact_ids"], json!([contact["contact_id"]]));

        let listed = body_json(app.oneshot(get("/api/v1/interviews")).await.unwrap()).await;
        let view = &listed[0];
        assert_eq!(view["date_display"], "October 1, 2025");
        assert_eq!(view["start_display"], "2:30 PM");
        assert_eq!(view["end_display"], "3:15 PM");
        assert_eq!(view["company_name"], "Acme");
        assert_eq!(view["type"], "TECH_SCREEN");
        assert_eq!(view["contacts"][0]["last_name"], "Doe");
    }

    #[tokio::test]
    async fn test_stats_rejects_bad_custom_range() {
        let (app, _) = app().await;
        let response = app
            .clone()
            .oneshot(get("/api/v1/stats?range=all"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["window"]["range"], "all");

        let response = app
            .oneshot(get("/api/v1/stats?range=custom&start_date=yesterday"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
