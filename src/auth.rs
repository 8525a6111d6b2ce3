use std::fmt;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use model::entities::driver;
use sea_orm::EntityTrait;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::redirect_found;
use crate::schemas::AppState;
use crate::session::session_id_from_headers;

/// Path of the login page.
pub const LOGIN_URL: &str = "/accounts/login/";

/// The authenticated driver, attached to the request by [`require_login`].
#[derive(Clone)]
pub struct CurrentDriver {
    pub session_id: String,
    pub driver: driver::Model,
}

// Keep the password hash and session id out of handler spans.
impl fmt::Debug for CurrentDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentDriver")
            .field("id", &self.driver.id)
            .field("username", &self.driver.username)
            .finish()
    }
}

/// Hash a password with Argon2id, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Login page URL that returns to `next` after a successful login.
pub fn login_url_with_next(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{LOGIN_URL}?{query}")
}

/// Only local absolute paths are followed after login.
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// Middleware gating every route it wraps behind a valid session.
///
/// Anonymous requests are redirected to the login page with a `next`
/// parameter pointing back to the requested path and query.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    trace!("Checking session for {}", request.uri());

    if let Some(session_id) = session_id_from_headers(request.headers()) {
        if let Some(session) = state.sessions.get(&session_id).await {
            match driver::Entity::find_by_id(session.driver_id).one(&state.db).await {
                Ok(Some(driver)) if driver.is_active => {
                    debug!("Request authenticated as driver {}", driver.id);
                    request
                        .extensions_mut()
                        .insert(CurrentDriver { session_id, driver });
                    return next.run(request).await;
                }
                Ok(_) => {
                    warn!(
                        "Session refers to missing or inactive driver {}, dropping it",
                        session.driver_id
                    );
                    state.sessions.remove(&session_id).await;
                }
                Err(db_error) => return AppError::Database(db_error).into_response(),
            }
        }
    }

    let next_url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    debug!("Anonymous request to {}, redirecting to login", next_url);
    redirect_found(&login_url_with_next(next_url))
}
