use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use books_app::modules::catalog::store::MemoryStore;
use books_kernel::settings::Settings;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let registry = books_app::build_registry(Arc::new(MemoryStore::new()));
    books_http::build_router(&registry, &Settings::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn orwell() -> Value {
    json!({
        "firstName": "George",
        "lastName": "Orwell",
        "dateOfBirth": "1903-06-25T00:00:00Z",
        "placeOfBirth": {"city": "Motihari", "country": "India"}
    })
}

#[tokio::test]
async fn author_create_resolves_birthplace() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/author", Some(orwell())).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_body(&body);
    assert!(created["id"].as_i64().unwrap() > 0);
    assert!(created["placeOfBirth"]["id"].as_i64().unwrap() > 0);

    let uri = format!("/api/author/{}", created["id"]);
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched = json_body(&body);
    assert_eq!(fetched["placeOfBirth"]["city"], "Motihari");
    assert_eq!(fetched["dateOfBirth"], "1903-06-25T00:00:00Z");
}

#[tokio::test]
async fn repeated_author_create_conflicts_on_natural_key() {
    let app = app();
    send(&app, "POST", "/api/author", Some(orwell())).await;

    let (status, body) = send(&app, "POST", "/api/author", Some(orwell())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = String::from_utf8(body).unwrap();
    assert!(message.contains("author_first_name_last_name_date_of_birth_key"));
    assert!(!message.contains("already exists"));
}

#[tokio::test]
async fn work_title_patch_changes_only_the_title() {
    let app = app();
    let (_, body) = send(
        &app,
        "POST",
        "/api/work",
        Some(json!({
            "title": "Nineteen Eighty-Four",
            "originalLanguage": "English",
            "author": orwell()
        })),
    )
    .await;
    let id = json_body(&body)["id"].clone();
    let uri = format!("/api/work/{id}");

    let (_, before) = send(&app, "GET", &uri, None).await;
    let (status, after) = send(&app, "PATCH", &uri, Some(json!({"title": "New Title"}))).await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = json_body(&before);
    expected["title"] = json!("New Title");
    assert_eq!(json_body(&after), expected);
}

#[tokio::test]
async fn empty_patch_reports_nothing_to_update() {
    let app = app();
    let (_, body) = send(&app, "POST", "/api/author", Some(orwell())).await;
    let uri = format!("/api/author/{}", json_body(&body)["id"]);

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"gender": ""}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"No fields in author to update");
}

#[tokio::test]
async fn empty_dates_are_treated_as_not_supplied() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/author",
        Some(json!({"firstName": "A", "lastName": "B", "dateOfBirth": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_body(&body);
    assert_eq!(created["dateOfBirth"], "1970-01-01T00:00:00Z");

    let uri = format!("/api/author/{}", created["id"]);
    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"dateOfBirth": ""}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"No fields in author to update");

    let (status, body) = send(
        &app,
        "POST",
        "/api/work",
        Some(json!({
            "title": "Untitled",
            "initialPubDate": "",
            "author": {"id": created["id"]}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json_body(&body)["initialPubDate"].is_null());
}

#[tokio::test]
async fn publication_create_cascades_to_every_table() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/publication",
        Some(json!({
            "isbn": "0451524934",
            "numPages": 328,
            "work": {"title": "1984", "author": orwell()}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_body(&body);

    let (_, body) = send(&app, "GET", "/api/publication", None).await;
    let listed = json_body(&body);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
    assert_eq!(listed[0]["work"]["author"]["placeOfBirth"]["country"], "India");

    let (_, body) = send(&app, "GET", "/api/author", None).await;
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn batch_delete_returns_missing_ids() {
    let app = app();
    let (_, body) = send(&app, "POST", "/api/author", Some(orwell())).await;
    let id = json_body(&body)["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "DELETE",
        "/api/author",
        Some(json!({"ids": [id, 404, 405]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"ids": [404, 405]}));

    let (status, body) = send(&app, "DELETE", "/api/author", Some(json!({"ids": []}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn single_delete_of_missing_row_is_ok() {
    let app = app();
    let (status, body) = send(&app, "DELETE", "/api/work/9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Work with id = 9 does not exist");
}

#[tokio::test]
async fn locations_are_not_routed() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/location", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_lists_catalog_paths() {
    let app = app();
    let (status, body) = send(&app, "GET", "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    let document = json_body(&body);
    for path in ["/api/author", "/api/work/{id}", "/api/publication", "/healthz"] {
        assert!(document["paths"].get(path).is_some(), "missing {path}");
    }
    assert!(document["components"]["schemas"].get("Location").is_some());
}
