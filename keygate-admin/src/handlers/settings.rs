use crate::error::ApiError;
use crate::sanitize::{absint, sanitize_text_field};
use crate::server::AdminState;
use axum::{Json, extract::State};
use keygate_core::{KeygateError, UserId};
use keygate_plugins::binder::IdentityBinder;
use keygate_plugins::keygen::{API_KEY_OPTION, stored_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Above this many accounts the user list is not returned, only the total.
const USER_LIST_LIMIT: usize = 100;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SettingsView {
    pub api_key: Option<String>,
    pub user: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Loosely typed: numbers and numeric strings are both accepted.
    #[serde(default)]
    pub user: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UserChoice {
    pub id: UserId,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct UserChoices {
    pub total: usize,
    pub users: Option<Vec<UserChoice>>,
}

fn view(state: &AdminState) -> SettingsView {
    SettingsView {
        api_key: stored_key(state.store.as_ref()),
        user: binder(state).bound_id(),
    }
}

fn binder(state: &AdminState) -> IdentityBinder {
    IdentityBinder::new(Arc::clone(&state.store), Arc::clone(&state.directory))
}

/// GET /keygate/v1/settings
pub async fn get_settings(State(state): State<Arc<AdminState>>) -> Json<SettingsView> {
    Json(view(&state))
}

/// PUT /keygate/v1/settings
///
/// Both fields are optional; only the ones present are written. The key and
/// the user are validated before anything is stored.
pub async fn update_settings(
    State(state): State<Arc<AdminState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, ApiError> {
    let api_key = match update.api_key {
        Some(raw) => {
            let key = sanitize_text_field(&raw);
            if key.is_empty() {
                return Err(KeygateError::InvalidSetting("api_key must not be empty".into()).into());
            }
            Some(key)
        }
        None => None,
    };

    let user = match update.user {
        Some(raw) => {
            let id = absint(&raw);
            if id == 0 {
                return Err(KeygateError::InvalidSetting("user must be a positive account id".into()).into());
            }
            Some(id)
        }
        None => None,
    };

    if let Some(key) = api_key {
        state.store.set(API_KEY_OPTION, Value::String(key))?;
        tracing::info!("API key updated");
    }

    if let Some(id) = user {
        if state.directory.get(id).is_none() {
            tracing::warn!(user_id = id, "Binding API key to an account that does not exist");
        }
        binder(&state).bind(id)?;
        tracing::info!(user_id = id, "API key user updated");
    }

    Ok(Json(view(&state)))
}

/// GET /keygate/v1/users
pub async fn list_users(State(state): State<Arc<AdminState>>) -> Json<UserChoices> {
    let total = state.directory.count();
    let users = (total <= USER_LIST_LIMIT).then(|| {
        state
            .directory
            .list()
            .into_iter()
            .map(|a| UserChoice {
                id: a.id,
                display_name: if a.display_name.is_empty() { a.login } else { a.display_name },
            })
            .collect()
    });
    Json(UserChoices { total, users })
}
