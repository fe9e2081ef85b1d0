//! API request handlers for closet operations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use closet_backend::{PersistenceMode, Principal, SyncReport, TagSuggestion};
use closet_common::{
    CategoryL1, CategoryStructure, ClosetFilter, ClothingItem, Error, ItemDraft, ItemId,
    ItemPatch, Outfit, Slot,
};
use outfit_shuffle::{Candidate, GenerationMode, LockState, LockToggle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;

/// API error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Loading => StatusCode::SERVICE_UNAVAILABLE,
            Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::ItemNotFound(_) => StatusCode::NOT_FOUND,
            Error::NothingToSync => StatusCode::CONFLICT,
            e if e.is_policy() => StatusCode::BAD_REQUEST,
            e => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Current shuffle screen
#[derive(Debug, Serialize)]
pub struct ShuffleResponse {
    pub mode: GenerationMode,
    pub locks: LockState,
    pub candidate: Candidate,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: GenerationMode,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCategoryRequest {
    pub category_l1: CategoryL1,
    pub subtype: String,
}

#[derive(Debug, Deserialize)]
pub struct OutfitQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub mode: PersistenceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image: String,
}

/// Tagging result, plus a form draft prefilled with whatever was recognised
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub suggestion: Option<TagSuggestion>,
    pub draft: ItemDraft,
}

#[derive(Debug, Serialize)]
pub struct BackgroundResponse {
    pub image: Option<String>,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "closet-api",
        "mode": state.closet.mode().await,
        "cloud": state.closet.cloud_available(),
    }))
}

// Items

/// List active items matching the query filter
pub async fn list_items_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ClosetFilter>,
) -> Result<Json<Vec<ClothingItem>>, ApiError> {
    Ok(Json(state.closet.closet(&filter).await?))
}

pub async fn add_item_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ItemDraft>,
) -> Result<(StatusCode, Json<ClothingItem>), ApiError> {
    info!("Adding {} item", draft.category_l1);
    let item = state.closet.add_draft(draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Partial update; trash changes go through the dedicated routes
pub async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> Result<StatusCode, ApiError> {
    if patch.trash.is_some() {
        return Err(Error::Validation(
            "trash state is changed through the trash and restore routes".to_string(),
        )
        .into());
    }

    info!("Updating item {}", id);
    state.closet.update_item(&ItemId::new(id), patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite an item from an edited draft
pub async fn edit_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<ItemDraft>,
) -> Result<StatusCode, ApiError> {
    state.closet.edit_item(&ItemId::new(id), draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn trash_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.closet.soft_delete(&ItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.closet.restore(&ItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trash_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClothingItem>>, ApiError> {
    Ok(Json(state.closet.trash().await?))
}

pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.closet.hard_delete(&ItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Categories

pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Json<CategoryStructure> {
    Json(state.closet.categories().await)
}

pub async fn append_category_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AppendCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryStructure>), ApiError> {
    let added = state
        .closet
        .append_category(payload.category_l1, &payload.subtype)
        .await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(state.closet.categories().await)))
}

// Shuffle

/// Generate a fresh candidate outfit
pub async fn shuffle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShuffleResponse>, ApiError> {
    let items = state.closet.items().await?;
    let mut session = state.shuffle.lock().await;
    {
        let mut rng = rand::thread_rng();
        session.shuffle(&items, &mut rng);
    }

    Ok(Json(ShuffleResponse {
        mode: session.mode(),
        locks: session.locks().clone(),
        candidate: session.current().clone(),
    }))
}

pub async fn set_mode_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ModeRequest>,
) -> Result<Json<ShuffleResponse>, ApiError> {
    let items = state.closet.items().await?;
    let mut session = state.shuffle.lock().await;
    {
        let mut rng = rand::thread_rng();
        session.set_mode(payload.mode, &items, &mut rng);
    }

    Ok(Json(ShuffleResponse {
        mode: session.mode(),
        locks: session.locks().clone(),
        candidate: session.current().clone(),
    }))
}

pub async fn toggle_lock_handler(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
) -> Result<Json<LockToggle>, ApiError> {
    let slot: Slot = slot.parse()?;
    let toggle = state.shuffle.lock().await.toggle_lock(slot);
    info!("Lock {} -> {:?}", slot, toggle);
    Ok(Json(toggle))
}

/// Archive the displayed outfit under today's date
pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<ConfirmRequest>>,
) -> Result<(StatusCode, Json<Outfit>), ApiError> {
    let rating = payload.and_then(|Json(p)| p.rating);
    let outfit = state
        .shuffle
        .lock()
        .await
        .confirm(Utc::now().date_naive(), rating)?;

    state.closet.record_outfit(outfit.clone()).await?;
    Ok((StatusCode::CREATED, Json(outfit)))
}

/// Outfits worn on a date, or the whole archive when no date is given
pub async fn outfits_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OutfitQuery>,
) -> Json<Vec<Outfit>> {
    match query.date {
        Some(date) => Json(state.closet.outfits_on(date).await),
        None => Json(state.closet.outfits().await),
    }
}

// Session

pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if payload.uid.trim().is_empty() {
        return Err(Error::Validation("uid must not be empty".to_string()).into());
    }

    let principal = Principal {
        uid: payload.uid,
        email: payload.email,
    };
    let mode = state.resolve_auth(Some(principal)).await?;

    Ok(Json(SessionResponse {
        mode,
        principal: state.closet.principal().await,
    }))
}

pub async fn sign_out_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mode = state.resolve_auth(None).await?;
    Ok(Json(SessionResponse {
        mode,
        principal: None,
    }))
}

/// Upload guest items into the signed-in user's collection
pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncReport>, ApiError> {
    let report = state.closet.sync_guest_items().await?;
    Ok(Json(report))
}

// Vision

pub async fn tag_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Json<TagResponse> {
    let suggestion = state.vision.tag(&payload.image).await;

    let mut draft = ItemDraft::new(payload.image);
    if let Some(suggestion) = &suggestion {
        suggestion.apply_to(&mut draft);
    }

    Json(TagResponse { suggestion, draft })
}

pub async fn remove_background_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Json<BackgroundResponse> {
    Json(BackgroundResponse {
        image: state.vision.remove_background(&payload.image).await,
    })
}
