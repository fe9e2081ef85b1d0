//! Closet REST API
//!
//! HTTP front for the wardrobe: closet browsing, item editing, trash, outfit
//! shuffling, the outfit calendar, session switching and guest-to-cloud sync.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check and persistence mode
//! - `GET|POST /api/items` - List (filtered) / add from a draft
//! - `PATCH|PUT|DELETE /api/items/{id}` - Patch / edit from a draft / move to trash
//! - `POST /api/items/{id}/restore` - Take out of the trash
//! - `GET /api/trash`, `DELETE /api/trash/{id}` - Trash listing / permanent delete
//! - `GET|POST /api/categories` - Subtype lists / append a subtype
//! - `POST /api/shuffle`, `PUT /api/shuffle/mode`, `POST /api/shuffle/locks/{slot}`
//! - `POST /api/shuffle/confirm` - Archive the displayed outfit
//! - `GET /api/outfits?date=YYYY-MM-DD` - Outfits worn on a date (all without `date`)
//! - `POST /api/auth/sign-in`, `POST /api/auth/sign-out`
//! - `POST /api/sync` - Upload guest items to the signed-in account
//! - `POST /api/vision/tag` - Suggested tags and a prefilled draft
//! - `POST /api/vision/remove-background`

pub mod config;
pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use closet_backend::{
    Closet, ClothingVision, CloudStore, MemoryCloudStore, PersistenceMode, Principal,
    RedisCloudStore, SessionAuth,
};
use config::{CloudBackend, Config};
use outfit_shuffle::ShuffleSession;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub closet: Arc<Closet>,

    pub auth: SessionAuth,

    /// Shuffle screen state: mode, locks and the displayed candidate
    pub shuffle: Mutex<ShuffleSession>,

    pub vision: Arc<dyn ClothingVision>,

    /// Serializes auth transitions so the closet always ends on the latest one
    transitions: Mutex<()>,
}

impl AppState {
    /// Create new application state
    pub fn new(closet: Arc<Closet>, vision: Arc<dyn ClothingVision>) -> Self {
        Self {
            closet,
            auth: SessionAuth::new(),
            shuffle: Mutex::new(ShuffleSession::new()),
            vision,
            transitions: Mutex::new(()),
        }
    }

    /// Resolve the session principal and switch the closet before returning
    pub async fn resolve_auth(
        &self,
        principal: Option<Principal>,
    ) -> closet_common::Result<PersistenceMode> {
        let _transition = self.transitions.lock().await;
        self.auth.resolve(principal);
        self.closet.apply_auth(&self.auth.current()).await
    }
}

/// Build the cloud store selected by configuration.
///
/// Every failure is logged and yields `None`; the service then runs guest-only.
pub async fn connect_cloud(config: &Config) -> Option<Arc<dyn CloudStore>> {
    match config.cloud_backend {
        CloudBackend::None => {
            info!("No cloud backend configured, guest mode only");
            None
        }
        CloudBackend::Memory => Some(Arc::new(MemoryCloudStore::new())),
        CloudBackend::Redis => {
            let settings = config.cloud_settings()?;
            match RedisCloudStore::connect(&settings).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Cloud store unavailable, guest mode only: {}", e);
                    None
                }
            }
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        // Items
        .route(
            "/api/items",
            get(handlers::list_items_handler).post(handlers::add_item_handler),
        )
        .route(
            "/api/items/{id}",
            put(handlers::edit_item_handler)
                .patch(handlers::update_item_handler)
                .delete(handlers::trash_item_handler),
        )
        .route(
            "/api/items/{id}/restore",
            post(handlers::restore_item_handler),
        )
        // Trash
        .route("/api/trash", get(handlers::list_trash_handler))
        .route("/api/trash/{id}", delete(handlers::delete_item_handler))
        // Categories
        .route(
            "/api/categories",
            get(handlers::list_categories_handler).post(handlers::append_category_handler),
        )
        // Shuffle
        .route("/api/shuffle", post(handlers::shuffle_handler))
        .route("/api/shuffle/mode", put(handlers::set_mode_handler))
        .route(
            "/api/shuffle/locks/{slot}",
            post(handlers::toggle_lock_handler),
        )
        .route("/api/shuffle/confirm", post(handlers::confirm_handler))
        // Calendar
        .route("/api/outfits", get(handlers::outfits_handler))
        // Session and sync
        .route("/api/auth/sign-in", post(handlers::sign_in_handler))
        .route("/api/auth/sign-out", post(handlers::sign_out_handler))
        .route("/api/sync", post(handlers::sync_handler))
        // Vision
        .route("/api/vision/tag", post(handlers::tag_handler))
        .route(
            "/api/vision/remove-background",
            post(handlers::remove_background_handler),
        )
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
