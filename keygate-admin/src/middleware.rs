use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use keygate_core::{Account, KeygateError};

/// Only administrators may read or change settings.
///
/// The acting identity is the `Account` the gate put into request extensions.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let refusal = match request.extensions().get::<Account>() {
        None => Some(KeygateError::NotLoggedIn),
        Some(account) if !account.is_administrator() => {
            tracing::debug!(user_id = account.id, "Settings access refused for non-administrator");
            Some(KeygateError::Forbidden)
        }
        Some(_) => None,
    };

    if let Some(e) = refusal {
        return Err(e.into());
    }
    Ok(next.run(request).await)
}
