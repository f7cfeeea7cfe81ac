use crate::ServerConfig;
use anyhow::Context as _;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use webtab_backend::{DefaultReconciler, RecordState, new_entity_id, random_shortcut_color};
use webtab_domain::{
    CollectionAction, Shortcut, apply_collection_action, categories_from_value,
    settings_from_value,
};

pub fn router(config: ServerConfig) -> anyhow::Result<Router> {
    let storage = config
        .storage
        .open()
        .context("failed to open storage")?;
    tracing::info!(
        root = %config.storage.root.display(),
        sync = storage.sync_available(),
        "storage ready"
    );

    let state = AppState {
        storage: Arc::new(storage),
        edits: Arc::new(Mutex::new(())),
    };

    let api = Router::new()
        .route("/health", get(health))
        .route("/categories", get(get_categories).put(put_categories))
        .route("/categories/cached", get(get_categories_cached))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/settings/cached", get(get_settings_cached))
        .route("/actions", post(post_action))
        .route("/backup", get(export_backup).post(import_backup))
        .route("/cache/invalidate", post(invalidate_cache))
        .with_state(state);

    let web_index = config.web_dist.join("index.html");
    let web = ServeDir::new(&config.web_dist).not_found_service(ServeFile::new(web_index));

    Ok(Router::new()
        .nest("/api", api)
        .fallback_service(web)
        .layer(TraceLayer::new_for_http()))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    storage: Arc<DefaultReconciler>,
    /// Held across every read-modify-write of the category collection.
    edits: Arc<Mutex<()>>,
}

async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.load_categories().await)
}

async fn get_categories_cached(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.load_categories_cached().await)
}

async fn put_categories(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let categories = match categories_from_value(body) {
        Ok(categories) => categories,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let _edit = state.edits.lock().await;
    state.storage.save_categories(categories).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.load_settings().await)
}

async fn get_settings_cached(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.load_settings_cached().await)
}

async fn put_settings(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let settings = match settings_from_value(body) {
        Ok(settings) => settings,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    state.storage.save_settings(settings).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn post_action(
    State(state): State<AppState>,
    Json(action): Json<ClientAction>,
) -> impl IntoResponse {
    let action = match action.into_collection_action() {
        Ok(action) => action,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let _edit = state.edits.lock().await;
    let mut categories = if state.storage.categories_state() == RecordState::Reconciled {
        state.storage.load_categories_cached().await
    } else {
        state.storage.load_categories().await
    };
    if let Err(err) = apply_collection_action(&mut categories, action) {
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }
    state.storage.save_categories(categories.clone()).await;
    Json(categories).into_response()
}

async fn export_backup(State(state): State<AppState>) -> impl IntoResponse {
    match state.storage.export_backup().await {
        Ok(backup) => (
            [
                (header::CONTENT_TYPE, "application/json".to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", backup.file_name),
                ),
            ],
            backup.contents,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "backup export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn import_backup(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let _edit = state.edits.lock().await;
    match state.storage.import_backup(&body).await {
        Ok(imported) => Json(imported).into_response(),
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

async fn invalidate_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.storage.invalidate();
    StatusCode::NO_CONTENT
}

/// Collection edit as sent by the dashboard. Ids and tile colors of new
/// entities are assigned here.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    AddCategory {
        title: String,
    },
    RemoveCategory {
        category_id: String,
    },
    AddShortcut {
        category_id: String,
        title: String,
        url: String,
        #[serde(default)]
        icon_url: Option<String>,
    },
    RemoveShortcut {
        category_id: String,
        shortcut_id: String,
    },
    ReorderShortcut {
        category_id: String,
        from_index: usize,
        to_index: usize,
    },
    MoveShortcut {
        shortcut_id: String,
        from_category_id: String,
        to_category_id: String,
    },
}

impl ClientAction {
    fn into_collection_action(self) -> Result<CollectionAction, &'static str> {
        Ok(match self {
            ClientAction::AddCategory { title } => {
                let title = title.trim();
                if title.is_empty() {
                    return Err("category title is required");
                }
                CollectionAction::AddCategory {
                    id: new_entity_id(),
                    title: title.to_owned(),
                }
            }
            ClientAction::RemoveCategory { category_id } => {
                CollectionAction::RemoveCategory { category_id }
            }
            ClientAction::AddShortcut {
                category_id,
                title,
                url,
                icon_url,
            } => {
                let title = title.trim();
                let url = url.trim();
                if title.is_empty() || url.is_empty() {
                    return Err("shortcut title and url are required");
                }
                CollectionAction::AddShortcut {
                    category_id,
                    shortcut: Shortcut {
                        id: new_entity_id(),
                        title: title.to_owned(),
                        url: with_scheme(url),
                        icon_url: icon_url
                            .map(|icon| icon.trim().to_owned())
                            .filter(|icon| !icon.is_empty()),
                        color: Some(random_shortcut_color().to_owned()),
                    },
                }
            }
            ClientAction::RemoveShortcut {
                category_id,
                shortcut_id,
            } => CollectionAction::RemoveShortcut {
                category_id,
                shortcut_id,
            },
            ClientAction::ReorderShortcut {
                category_id,
                from_index,
                to_index,
            } => CollectionAction::ReorderShortcut {
                category_id,
                from_index,
                to_index,
            },
            ClientAction::MoveShortcut {
                shortcut_id,
                from_category_id,
                to_category_id,
            } => CollectionAction::MoveShortcut {
                shortcut_id,
                from_category_id,
                to_category_id,
            },
        })
    }
}

fn with_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}
