use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use axum_valid::Valid;
use model::entities::manufacturer;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;
use crate::forms::{add_error, collect_errors, FormErrors, ManufacturerForm};
use crate::handlers::{icontains, redirect_found, search_term};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

pub const LIST_URL: &str = "/manufacturers/";

/// Query parameters for the manufacturer list
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ManufacturerSearchQuery {
    /// Case-insensitive substring of the manufacturer name
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

/// Search control state echoed back to the page
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerSearchForm {
    pub name: String,
}

/// Manufacturer response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerResponse {
    pub id: i32,
    pub name: String,
    pub country: String,
}

impl From<manufacturer::Model> for ManufacturerResponse {
    fn from(model: manufacturer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            country: model.country,
        }
    }
}

/// Manufacturer list context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerListPage {
    pub manufacturer_list: Vec<ManufacturerResponse>,
    pub manufacturer_search_form: ManufacturerSearchForm,
}

/// Manufacturer create/update form context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerFormPage {
    /// Set when editing an existing manufacturer
    pub manufacturer_id: Option<i32>,
    pub form: ManufacturerForm,
    pub errors: FormErrors,
}

impl ManufacturerFormPage {
    fn invalid(manufacturer_id: Option<i32>, form: ManufacturerForm, errors: FormErrors) -> Response {
        let page = Self {
            manufacturer_id,
            form,
            errors,
        };
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::invalid(page, "Please correct the errors below")),
        )
            .into_response()
    }
}

async fn find_manufacturer(db: &DatabaseConnection, id: i32) -> Result<manufacturer::Model, AppError> {
    manufacturer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Manufacturer", id))
}

/// Whether another manufacturer already uses `name`.
async fn name_taken(db: &DatabaseConnection, name: &str, exclude: Option<i32>) -> Result<bool, DbErr> {
    let mut query = manufacturer::Entity::find().filter(manufacturer::Column::Name.eq(name));
    if let Some(id) = exclude {
        query = query.filter(manufacturer::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Validate a submitted manufacturer form, including the unique name rule.
async fn clean_form(
    db: &DatabaseConnection,
    form: &ManufacturerForm,
    exclude: Option<i32>,
) -> Result<FormErrors, DbErr> {
    let mut errors = collect_errors(form);
    if !errors.contains_key("name") && name_taken(db, &form.name, exclude).await? {
        add_error(&mut errors, "name", "Manufacturer with this Name already exists.");
    }
    Ok(errors)
}

/// List manufacturers ordered by name
#[utoipa::path(
    get,
    path = "/manufacturers/",
    tag = "manufacturers",
    params(ManufacturerSearchQuery),
    responses(
        (status = 200, description = "Manufacturers retrieved successfully", body = ApiResponse<ManufacturerListPage>),
        (status = 400, description = "Invalid search query")
    )
)]
#[instrument(skip(state))]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<ManufacturerSearchQuery>>,
) -> Result<Json<ApiResponse<ManufacturerListPage>>, AppError> {
    trace!("Entering list_manufacturers function");

    let mut select = manufacturer::Entity::find();
    let term = search_term(&query.name);
    if let Some(term) = &term {
        debug!("Filtering manufacturers by name containing: {}", term);
        select = select.filter(icontains(manufacturer::Entity, manufacturer::Column::Name, term));
    }

    let manufacturers = select
        .order_by_asc(manufacturer::Column::Name)
        .all(&state.db)
        .await?;
    info!("Successfully retrieved {} manufacturers", manufacturers.len());

    let page = ManufacturerListPage {
        manufacturer_list: manufacturers.into_iter().map(ManufacturerResponse::from).collect(),
        manufacturer_search_form: ManufacturerSearchForm {
            name: term.unwrap_or_default(),
        },
    };
    Ok(Json(ApiResponse::ok(page, "Manufacturers retrieved successfully")))
}

/// Blank manufacturer form
#[utoipa::path(
    get,
    path = "/manufacturers/create/",
    tag = "manufacturers",
    responses(
        (status = 200, description = "Empty form", body = ApiResponse<ManufacturerFormPage>)
    )
)]
#[instrument]
pub async fn manufacturer_create_form() -> Json<ApiResponse<ManufacturerFormPage>> {
    Json(ApiResponse::ok(
        ManufacturerFormPage {
            manufacturer_id: None,
            form: ManufacturerForm::default(),
            errors: FormErrors::new(),
        },
        "Manufacturer form",
    ))
}

/// Create a manufacturer
#[utoipa::path(
    post,
    path = "/manufacturers/create/",
    tag = "manufacturers",
    request_body(content = ManufacturerForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirecting to the manufacturer list"),
        (status = 422, description = "Validation failed", body = ApiResponse<ManufacturerFormPage>)
    )
)]
#[instrument(skip(state))]
pub async fn create_manufacturer(
    State(state): State<AppState>,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response, AppError> {
    let form = form.normalized();
    debug!("Creating manufacturer with name: {}", form.name);

    let errors = clean_form(&state.db, &form, None).await?;
    if !errors.is_empty() {
        debug!("Manufacturer form rejected: {:?}", errors);
        return Ok(ManufacturerFormPage::invalid(None, form, errors));
    }

    let created = manufacturer::ActiveModel {
        name: Set(form.name),
        country: Set(form.country),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Manufacturer created successfully with ID: {}, name: {}", created.id, created.name);
    Ok(redirect_found(LIST_URL))
}

/// Manufacturer form pre-filled for editing
#[utoipa::path(
    get,
    path = "/manufacturers/{id}/update/",
    tag = "manufacturers",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    responses(
        (status = 200, description = "Pre-filled form", body = ApiResponse<ManufacturerFormPage>),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn manufacturer_update_form(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ManufacturerFormPage>>, AppError> {
    let existing = find_manufacturer(&state.db, id).await?;

    Ok(Json(ApiResponse::ok(
        ManufacturerFormPage {
            manufacturer_id: Some(existing.id),
            form: ManufacturerForm {
                name: existing.name,
                country: existing.country,
            },
            errors: FormErrors::new(),
        },
        "Manufacturer form",
    )))
}

/// Update a manufacturer
#[utoipa::path(
    post,
    path = "/manufacturers/{id}/update/",
    tag = "manufacturers",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    request_body(content = ManufacturerForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirecting to the manufacturer list"),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ApiResponse<ManufacturerFormPage>)
    )
)]
#[instrument(skip(state))]
pub async fn update_manufacturer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response, AppError> {
    let existing = find_manufacturer(&state.db, id).await?;
    let form = form.normalized();

    let errors = clean_form(&state.db, &form, Some(id)).await?;
    if !errors.is_empty() {
        debug!("Manufacturer form rejected: {:?}", errors);
        return Ok(ManufacturerFormPage::invalid(Some(id), form, errors));
    }

    let mut active: manufacturer::ActiveModel = existing.into();
    active.name = Set(form.name);
    active.country = Set(form.country);
    let updated = active.update(&state.db).await?;

    info!("Manufacturer with ID {} updated successfully to: {}", id, updated);
    Ok(redirect_found(LIST_URL))
}

/// Deletion confirmation context
#[utoipa::path(
    get,
    path = "/manufacturers/{id}/delete/",
    tag = "manufacturers",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    responses(
        (status = 200, description = "Manufacturer to be deleted", body = ApiResponse<ManufacturerResponse>),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn manufacturer_delete_confirm(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ManufacturerResponse>>, AppError> {
    let existing = find_manufacturer(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(
        ManufacturerResponse::from(existing),
        "Confirm manufacturer deletion",
    )))
}

/// Delete a manufacturer together with its cars
#[utoipa::path(
    post,
    path = "/manufacturers/{id}/delete/",
    tag = "manufacturers",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    responses(
        (status = 302, description = "Deleted, redirecting to the manufacturer list"),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_manufacturer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let delete_result = manufacturer::Entity::delete_by_id(id).exec(&state.db).await?;
    debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);

    if delete_result.rows_affected == 0 {
        warn!("Manufacturer with ID {} not found for deletion", id);
        return Err(AppError::not_found("Manufacturer", id));
    }

    info!("Manufacturer with ID {} deleted successfully", id);
    Ok(redirect_found(LIST_URL))
}
