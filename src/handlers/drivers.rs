use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::entities::{car, driver, manufacturer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::cars::CarResponse;
use crate::auth::hash_password;
use crate::error::AppError;
use crate::forms::{add_error, collect_errors, DriverCreationForm, DriverLicenseUpdateForm, FormErrors};
use crate::handlers::{icontains, redirect_found, search_term};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

pub const LIST_URL: &str = "/drivers/";
pub const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";
pub const LICENSE_TAKEN_MESSAGE: &str = "Driver with this License number already exists.";

/// Query parameters for the driver list
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct DriverSearchQuery {
    /// Case-insensitive substring of the username
    #[validate(length(max = 255))]
    pub username: Option<String>,
}

/// Search control state echoed back to the page
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DriverSearchForm {
    pub username: String,
}

/// Driver as shown in lists and choice widgets
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverSummary {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl From<driver::Model> for DriverSummary {
    fn from(model: driver::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            license_number: model.license_number,
        }
    }
}

/// Driver response model. The password hash is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl From<driver::Model> for DriverResponse {
    fn from(model: driver::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            license_number: model.license_number,
            is_active: model.is_active,
            is_staff: model.is_staff,
            date_joined: model.date_joined,
            last_login: model.last_login,
        }
    }
}

/// Driver list context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverListPage {
    pub driver_list: Vec<DriverSummary>,
    pub driver_search_form: DriverSearchForm,
}

/// Driver detail context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverDetailPage {
    pub driver: DriverResponse,
    /// Cars the driver is assigned to, with their manufacturers
    pub cars: Vec<CarResponse>,
}

/// Driver creation form context. Passwords are never echoed back.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverCreationPage {
    pub form: DriverCreationForm,
    pub errors: FormErrors,
}

/// License update form context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseUpdatePage {
    pub driver: DriverSummary,
    pub form: DriverLicenseUpdateForm,
    pub errors: FormErrors,
}

fn unprocessable<T: Serialize>(page: T) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::invalid(page, "Please correct the errors below")),
    )
        .into_response()
}

async fn find_driver(db: &DatabaseConnection, id: i32) -> Result<driver::Model, AppError> {
    driver::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Driver", id))
}

/// Whether another driver already has `value` in the unique `column`.
async fn value_taken(
    db: &DatabaseConnection,
    column: driver::Column,
    value: &str,
    exclude: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query = driver::Entity::find().filter(column.eq(value));
    if let Some(id) = exclude {
        query = query.filter(driver::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// List drivers ordered by username
#[utoipa::path(
    get,
    path = "/drivers/",
    tag = "drivers",
    params(DriverSearchQuery),
    responses(
        (status = 200, description = "Drivers retrieved successfully", body = ApiResponse<DriverListPage>),
        (status = 400, description = "Invalid search query")
    )
)]
#[instrument(skip(state))]
pub async fn list_drivers(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<DriverSearchQuery>>,
) -> Result<Json<ApiResponse<DriverListPage>>, AppError> {
    trace!("Entering list_drivers function");

    let mut select = driver::Entity::find();
    let term = search_term(&query.username);
    if let Some(term) = &term {
        debug!("Filtering drivers by username containing: {}", term);
        select = select.filter(icontains(driver::Entity, driver::Column::Username, term));
    }

    let drivers = select
        .order_by_asc(driver::Column::Username)
        .all(&state.db)
        .await?;
    info!("Successfully retrieved {} drivers", drivers.len());

    let page = DriverListPage {
        driver_list: drivers.into_iter().map(DriverSummary::from).collect(),
        driver_search_form: DriverSearchForm {
            username: term.unwrap_or_default(),
        },
    };
    Ok(Json(ApiResponse::ok(page, "Drivers retrieved successfully")))
}

/// Driver detail with assigned cars
#[utoipa::path(
    get,
    path = "/drivers/{id}/",
    tag = "drivers",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver retrieved successfully", body = ApiResponse<DriverDetailPage>),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_driver(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DriverDetailPage>>, AppError> {
    let existing = find_driver(&state.db, id).await?;
    let cars = existing
        .find_related(car::Entity)
        .find_also_related(manufacturer::Entity)
        .order_by_asc(car::Column::Model)
        .all(&state.db)
        .await?;
    debug!("Driver {} is assigned to {} cars", id, cars.len());

    let page = DriverDetailPage {
        driver: DriverResponse::from(existing),
        cars: cars
            .into_iter()
            .map(|(car, maker)| CarResponse::new(car, maker))
            .collect(),
    };
    Ok(Json(ApiResponse::ok(page, "Driver retrieved successfully")))
}

/// Blank driver creation form
#[utoipa::path(
    get,
    path = "/drivers/create/",
    tag = "drivers",
    responses(
        (status = 200, description = "Empty form", body = ApiResponse<DriverCreationPage>)
    )
)]
#[instrument]
pub async fn driver_create_form() -> Json<ApiResponse<DriverCreationPage>> {
    Json(ApiResponse::ok(
        DriverCreationPage {
            form: DriverCreationForm::default(),
            errors: FormErrors::new(),
        },
        "Driver form",
    ))
}

/// Register a new driver
#[utoipa::path(
    post,
    path = "/drivers/create/",
    tag = "drivers",
    request_body(content = DriverCreationForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirecting to the new driver's page"),
        (status = 422, description = "Validation failed", body = ApiResponse<DriverCreationPage>)
    )
)]
#[instrument(skip(state, form))]
pub async fn create_driver(
    State(state): State<AppState>,
    Form(form): Form<DriverCreationForm>,
) -> Result<Response, AppError> {
    let form = form.normalized();
    debug!("Creating driver with username: {}", form.username);

    let mut errors = form.clean();
    if !errors.contains_key("username")
        && value_taken(&state.db, driver::Column::Username, &form.username, None).await?
    {
        add_error(&mut errors, "username", USERNAME_TAKEN_MESSAGE);
    }
    if !errors.contains_key("license_number")
        && value_taken(&state.db, driver::Column::LicenseNumber, &form.license_number, None).await?
    {
        add_error(&mut errors, "license_number", LICENSE_TAKEN_MESSAGE);
    }
    if !errors.is_empty() {
        debug!("Driver form rejected: {:?}", errors.keys().collect::<Vec<_>>());
        return Ok(unprocessable(DriverCreationPage {
            form: form.without_passwords(),
            errors,
        }));
    }

    let password = hash_password(&form.password1)?;
    let created = driver::ActiveModel {
        username: Set(form.username),
        password: Set(password),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        email: Set(String::new()),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        date_joined: Set(Utc::now().naive_utc()),
        last_login: Set(None),
        license_number: Set(form.license_number),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Driver created successfully with ID: {}, username: {}", created.id, created.username);
    Ok(redirect_found(&created.absolute_url()))
}

/// License form pre-filled with the current number
#[utoipa::path(
    get,
    path = "/drivers/{id}/update/",
    tag = "drivers",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Pre-filled form", body = ApiResponse<LicenseUpdatePage>),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn license_update_form(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LicenseUpdatePage>>, AppError> {
    let existing = find_driver(&state.db, id).await?;
    let form = DriverLicenseUpdateForm {
        license_number: existing.license_number.clone(),
    };

    Ok(Json(ApiResponse::ok(
        LicenseUpdatePage {
            driver: DriverSummary::from(existing),
            form,
            errors: FormErrors::new(),
        },
        "License form",
    )))
}

/// Change a driver's license number
#[utoipa::path(
    post,
    path = "/drivers/{id}/update/",
    tag = "drivers",
    params(("id" = i32, Path, description = "Driver ID")),
    request_body(content = DriverLicenseUpdateForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirecting to the driver list"),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ApiResponse<LicenseUpdatePage>)
    )
)]
#[instrument(skip(state))]
pub async fn update_license(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Form(form): Form<DriverLicenseUpdateForm>,
) -> Result<Response, AppError> {
    let existing = find_driver(&state.db, id).await?;
    let form = DriverLicenseUpdateForm {
        license_number: form.license_number.trim().to_string(),
    };

    let mut errors = collect_errors(&form);
    if !errors.contains_key("license_number")
        && value_taken(&state.db, driver::Column::LicenseNumber, &form.license_number, Some(id)).await?
    {
        add_error(&mut errors, "license_number", LICENSE_TAKEN_MESSAGE);
    }
    if !errors.is_empty() {
        debug!("License form rejected: {:?}", errors);
        return Ok(unprocessable(LicenseUpdatePage {
            driver: DriverSummary::from(existing),
            form,
            errors,
        }));
    }

    let mut active: driver::ActiveModel = existing.into();
    active.license_number = Set(form.license_number);
    let updated = active.update(&state.db).await?;

    info!("Driver {} license number changed to {}", id, updated.license_number);
    Ok(redirect_found(LIST_URL))
}

/// Deletion confirmation context
#[utoipa::path(
    get,
    path = "/drivers/{id}/delete/",
    tag = "drivers",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver to be deleted", body = ApiResponse<DriverResponse>),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn driver_delete_confirm(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let existing = find_driver(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(
        DriverResponse::from(existing),
        "Confirm driver deletion",
    )))
}

/// Delete a driver and their car assignments
#[utoipa::path(
    post,
    path = "/drivers/{id}/delete/",
    tag = "drivers",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 302, description = "Deleted, redirecting to the driver list"),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_driver(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let delete_result = driver::Entity::delete_by_id(id).exec(&state.db).await?;
    debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);

    if delete_result.rows_affected == 0 {
        warn!("Driver with ID {} not found for deletion", id);
        return Err(AppError::not_found("Driver", id));
    }

    info!("Driver with ID {} deleted successfully", id);
    Ok(redirect_found(LIST_URL))
}
