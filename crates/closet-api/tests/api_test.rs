//! Integration tests for the Closet API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use closet_api::{create_router, AppState};
use async_trait::async_trait;
use chrono::Utc;
use closet_backend::{
    Closet, ClothingVision, CloudStore, FileStorage, LocalStorage, MemoryCloudStore,
    MemoryStorage, NoVision, TagSuggestion,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

/// Helper to create a test app; the closet is resolved as a guest unless `loading`
async fn create_test_app(cloud: Option<Arc<dyn CloudStore>>, loading: bool) -> Router {
    create_app_with_storage(Arc::new(MemoryStorage::new()), cloud, loading).await
}

async fn create_app_with_storage(
    storage: Arc<dyn LocalStorage>,
    cloud: Option<Arc<dyn CloudStore>>,
    loading: bool,
) -> Router {
    create_app_with(storage, cloud, Arc::new(NoVision), loading).await
}

async fn create_app_with(
    storage: Arc<dyn LocalStorage>,
    cloud: Option<Arc<dyn CloudStore>>,
    vision: Arc<dyn ClothingVision>,
    loading: bool,
) -> Router {
    let closet = Arc::new(Closet::new(storage, cloud));
    let state = AppState::new(closet, vision);
    if !loading {
        state.resolve_auth(None).await.unwrap();
    }
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn add_item(app: &Router, category: &str, season: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/items",
        Some(json!({
            "imageData": "data:image/png;base64,AAAA",
            "categoryL1": category,
            "season": season,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(None, false).await;

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "closet-api");
    assert_eq!(body["mode"], "guest");
    assert_eq!(body["cloud"], false);
}

#[tokio::test]
async fn test_loading_closet_is_unavailable() {
    let app = create_test_app(None, true).await;

    let (status, body) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("loading"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/items",
        Some(json!({ "imageData": "AAAA" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_add_item_with_custom_subtype() {
    let app = create_test_app(None, false).await;

    let (status, item) = send(
        &app,
        "POST",
        "/api/items",
        Some(json!({
            "imageData": "data:image/png;base64,AAAA",
            "categoryL1": "Top",
            "customCategoryL2": "Polo",
            "color": "Blue",
            "season": "Warm (Summer/Spring)"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["categoryL2"], "Polo");
    assert_eq!(item["isDeleted"], false);

    let (_, categories) = send(&app, "GET", "/api/categories", None).await;
    let tops: Vec<&str> = categories["Top"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(tops.contains(&"Polo"));

    let (_, items) = send(&app, "GET", "/api/items?categoryL1=Top&search=po", None).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    let (_, items) = send(&app, "GET", "/api/items?categoryL1=Shoes", None).await;
    assert!(items.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_image_is_rejected() {
    let app = create_test_app(None, false).await;

    let (status, body) = send(&app, "POST", "/api/items", Some(json!({ "imageData": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_trash_flow() {
    let app = create_test_app(None, false).await;
    let id = add_item(&app, "Shoes", "All Year").await;

    let (status, _) = send(&app, "DELETE", &format!("/api/items/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, trash) = send(&app, "GET", "/api/trash", None).await;
    assert_eq!(trash[0]["id"], id.as_str());
    assert!(trash[0]["trashDate"].is_number());
    let (_, items) = send(&app, "GET", "/api/items", None).await;
    assert!(items.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "POST", &format!("/api/items/{}/restore", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, items) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/trash/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, trash) = send(&app, "GET", "/api/trash", None).await;
    assert!(trash.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "DELETE", "/api/trash/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_item() {
    let app = create_test_app(None, false).await;
    let id = add_item(&app, "Top", "All Year").await;

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/items/{}", id),
        Some(json!({ "color": "Red", "categoryL2": "Shirt" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, items) = send(&app, "GET", "/api/items?color=Red", None).await;
    assert_eq!(items[0]["categoryL2"], "Shirt");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/items/{}", id),
        Some(json!({ "color": "Blue", "trash": { "action": "restore" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("trash"));
    let (_, items) = send(&app, "GET", "/api/items?color=Red", None).await;
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/items/missing",
        Some(json!({ "color": "Red" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shuffle_lock_and_confirm() {
    let app = create_test_app(None, false).await;
    let top = add_item(&app, "Top", "Warm (Summer/Spring)").await;
    add_item(&app, "Bottom", "All Year").await;

    let (status, shuffle) = send(&app, "POST", "/api/shuffle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shuffle["mode"], "Standard");
    assert_eq!(shuffle["candidate"]["slots"]["Top"]["item"]["id"], top.as_str());
    assert!(shuffle["candidate"]["slots"]["Shoes"]["item"].is_null());

    let (status, toggle) = send(&app, "POST", "/api/shuffle/locks/top", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggle["state"], "locked");
    assert_eq!(toggle["item_id"], top.as_str());

    let (status, _) = send(&app, "POST", "/api/shuffle/locks/hat", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, outfit) = send(
        &app,
        "POST",
        "/api/shuffle/confirm",
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outfit["items"].as_array().unwrap().len(), 2);
    assert_eq!(outfit["rating"], 4);

    let (_, outfits) = send(&app, "GET", "/api/outfits", None).await;
    assert_eq!(outfits.as_array().unwrap().len(), 1);
    let today = Utc::now().date_naive().to_string();
    let (_, outfits) = send(&app, "GET", &format!("/api/outfits?date={}", today), None).await;
    assert_eq!(outfits[0]["date"], today.as_str());
    let (_, outfits) = send(&app, "GET", "/api/outfits?date=2000-01-01", None).await;
    assert!(outfits.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_needs_two_items() {
    let app = create_test_app(None, false).await;
    add_item(&app, "Top", "All Year").await;
    send(&app, "POST", "/api/shuffle", None).await;

    let (status, _) = send(&app, "POST", "/api/shuffle/confirm", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, outfits) = send(&app, "GET", "/api/outfits", None).await;
    assert!(outfits.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_one_piece_mode() {
    let app = create_test_app(None, false).await;
    let dress = add_item(&app, "Dress", "All Year").await;
    add_item(&app, "Top", "All Year").await;

    let (status, shuffle) = send(
        &app,
        "PUT",
        "/api/shuffle/mode",
        Some(json!({ "mode": "OnePiece" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shuffle["candidate"]["slots"]["Dress"]["item"]["id"], dress.as_str());
    assert!(shuffle["candidate"]["slots"].get("Top").is_none());
}

#[tokio::test]
async fn test_sync_requires_sign_in() {
    let cloud: Arc<dyn CloudStore> = Arc::new(MemoryCloudStore::new());
    let app = create_test_app(Some(cloud), false).await;

    let (status, _) = send(&app, "POST", "/api/sync", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = send(
        &app,
        "POST",
        "/api/auth/sign-in",
        Some(json!({ "uid": "u1", "email": "u1@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["mode"], "cloud");
    assert_eq!(session["principal"]["uid"], "u1");

    let (status, _) = send(&app, "POST", "/api/sync", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sync_uploads_guest_items() {
    let cloud = Arc::new(MemoryCloudStore::new());
    let app = create_test_app(Some(cloud.clone()), false).await;
    let a = add_item(&app, "Top", "All Year").await;
    let b = add_item(&app, "Bottom", "All Year").await;

    send(&app, "POST", "/api/auth/sign-in", Some(json!({ "uid": "u1" }))).await;
    let (status, report) = send(&app, "POST", "/api/sync", None).await;
    assert_eq!(status, StatusCode::OK);

    let mut uploaded: Vec<&str> = report["uploaded"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    uploaded.sort();
    let mut expected = vec![a.as_str(), b.as_str()];
    expected.sort();
    assert_eq!(uploaded, expected);
    assert!(report["failed"].as_array().unwrap().is_empty());
    assert_eq!(cloud.items("u1").await.len(), 2);

    let (status, session) = send(&app, "POST", "/api/auth/sign-out", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["mode"], "guest");
    let (_, items) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_vision_without_service() {
    let app = create_test_app(None, false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/vision/tag",
        Some(json!({ "image": "data:image/png;base64,AAAA" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["suggestion"].is_null());
    assert_eq!(body["draft"]["imageData"], "data:image/png;base64,AAAA");
    assert_eq!(body["draft"]["categoryL1"], "Top");

    let (_, body) = send(
        &app,
        "POST",
        "/api/vision/remove-background",
        Some(json!({ "image": "AAAA" })),
    )
    .await;
    assert!(body["image"].is_null());
}

#[tokio::test]
async fn test_guest_closet_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let app = create_app_with_storage(
        Arc::new(FileStorage::open(dir.path()).unwrap()),
        None,
        false,
    )
    .await;
    let id = add_item(&app, "Hat", "Cold (Winter/Fall)").await;
    drop(app);

    let app = create_app_with_storage(
        Arc::new(FileStorage::open(dir.path()).unwrap()),
        None,
        false,
    )
    .await;
    let (status, items) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["id"], id.as_str());
}

struct FixedVision(TagSuggestion);

#[async_trait]
impl ClothingVision for FixedVision {
    async fn tag(&self, _image: &str) -> Option<TagSuggestion> {
        Some(self.0.clone())
    }

    async fn remove_background(&self, _image: &str) -> Option<String> {
        None
    }
}

#[tokio::test]
async fn test_tag_prefills_draft() {
    let vision = FixedVision(TagSuggestion {
        category_l1: "Bottom".to_string(),
        category_l2: "Jeans".to_string(),
        color: "Purple-ish".to_string(),
        season: "Cold".to_string(),
    });
    let app = create_app_with(Arc::new(MemoryStorage::new()), None, Arc::new(vision), false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/vision/tag",
        Some(json!({ "image": "AAAA" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"]["categoryL2"], "Jeans");

    let draft = &body["draft"];
    assert_eq!(draft["categoryL1"], "Bottom");
    assert_eq!(draft["categoryL2"], "Jeans");
    assert_eq!(draft["season"], "Cold (Winter/Fall)");
    // Unrecognised colors keep the form default
    assert_eq!(draft["color"], "Black");

    let (status, item) = send(&app, "POST", "/api/items", Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["categoryL2"], "Jeans");
}
