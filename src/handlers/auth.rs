use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension, Form,
};
use chrono::Utc;
use model::entities::driver;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{is_safe_redirect, verify_password, CurrentDriver, LOGIN_URL};
use crate::error::AppError;
use crate::forms::{add_error, FormErrors, LoginForm, NON_FIELD_ERRORS};
use crate::handlers::redirect_found;
use crate::schemas::{ApiResponse, AppState};
use crate::session::{expired_session_cookie, session_cookie, session_id_from_headers};

pub const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Path to return to after logging in
    pub next: Option<String>,
}

/// Login page context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    pub username: String,
    pub next: Option<String>,
    pub errors: FormErrors,
}

/// Render the login form
#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "auth",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form", body = ApiResponse<LoginPage>)
    )
)]
#[instrument]
pub async fn login_form(Query(query): Query<LoginQuery>) -> Json<ApiResponse<LoginPage>> {
    trace!("Rendering login form");
    Json(ApiResponse::ok(
        LoginPage {
            username: String::new(),
            next: query.next,
            errors: FormErrors::new(),
        },
        "Login form",
    ))
}

/// Log a driver in and start a session
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in, redirecting to `next` or the dashboard"),
        (status = 401, description = "Wrong credentials", body = ApiResponse<LoginPage>)
    )
)]
#[instrument(skip(state, headers, form))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();
    debug!("Login attempt for username: {}", username);

    let candidate = driver::Entity::find()
        .filter(driver::Column::Username.eq(username.as_str()))
        .one(&state.db)
        .await?;

    let driver = match candidate {
        Some(driver) if driver.is_active && verify_password(&form.password, &driver.password) => {
            driver
        }
        _ => {
            warn!("Failed login attempt for username: {}", username);
            let mut errors = FormErrors::new();
            add_error(&mut errors, NON_FIELD_ERRORS, INVALID_LOGIN_MESSAGE);
            let page = LoginPage {
                username,
                next: form.next,
                errors,
            };
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::invalid(page, "Invalid credentials")),
            )
                .into_response());
        }
    };

    let driver_id = driver.id;
    let mut active: driver::ActiveModel = driver.into();
    active.last_login = Set(Some(Utc::now().naive_utc()));
    active.update(&state.db).await?;

    // A fresh session id on every login
    if let Some(previous) = session_id_from_headers(&headers) {
        state.sessions.remove(&previous).await;
    }
    let session_id = state.sessions.create(driver_id).await;

    let target = form
        .next
        .as_deref()
        .filter(|next| is_safe_redirect(next))
        .unwrap_or("/");
    info!("Driver {} logged in, redirecting to {}", driver_id, target);

    let mut response = redirect_found(target);
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie(&session_id));
    Ok(response)
}

/// End the current session
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "auth",
    responses(
        (status = 302, description = "Logged out, redirecting to the login page")
    )
)]
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDriver>,
) -> Response {
    state.sessions.remove(&current.session_id).await;
    info!("Driver {} logged out", current.driver.id);

    let mut response = redirect_found(LOGIN_URL);
    response
        .headers_mut()
        .insert(header::SET_COOKIE, expired_session_cookie());
    response
}
