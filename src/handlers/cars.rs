use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension, Form,
};
use axum_valid::Valid;
use model::entities::{car, driver, manufacturer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::drivers::DriverSummary;
use super::manufacturers::ManufacturerResponse;
use crate::auth::CurrentDriver;
use crate::error::AppError;
use crate::forms::{add_error, collect_errors, CarForm, FormErrors, INVALID_CHOICE_MESSAGE};
use crate::handlers::{icontains, redirect_found, search_term};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

pub const LIST_URL: &str = "/cars/";

/// Query parameters for the car list
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CarSearchQuery {
    /// Case-insensitive substring of the car model
    #[validate(length(max = 255))]
    pub model: Option<String>,
    /// Only cars built by this manufacturer
    pub manufacturer: Option<i32>,
}

/// Search control state echoed back to the page
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CarSearchForm {
    pub model: String,
    pub manufacturer: Option<i32>,
}

/// Car response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CarResponse {
    pub id: i32,
    pub model: String,
    pub manufacturer_id: i32,
    pub manufacturer: Option<ManufacturerResponse>,
}

impl CarResponse {
    pub fn new(car: car::Model, manufacturer: Option<manufacturer::Model>) -> Self {
        Self {
            id: car.id,
            model: car.model,
            manufacturer_id: car.manufacturer_id,
            manufacturer: manufacturer.map(ManufacturerResponse::from),
        }
    }
}

/// Car list context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarListPage {
    pub car_list: Vec<CarResponse>,
    pub car_search_form: CarSearchForm,
}

/// Car detail context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarDetailPage {
    pub car: CarResponse,
    pub drivers: Vec<DriverSummary>,
    /// Whether the logged-in driver is assigned to this car
    pub is_assigned: bool,
}

/// Car create/update form context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarFormPage {
    /// Set when editing an existing car
    pub car_id: Option<i32>,
    pub form: CarForm,
    pub errors: FormErrors,
    /// Manufacturer choices
    pub manufacturers: Vec<ManufacturerResponse>,
    /// Driver choices
    pub drivers: Vec<DriverSummary>,
}

impl CarFormPage {
    async fn build(
        db: &DatabaseConnection,
        car_id: Option<i32>,
        form: CarForm,
        errors: FormErrors,
    ) -> Result<Self, DbErr> {
        let manufacturers = manufacturer::Entity::find()
            .order_by_asc(manufacturer::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(ManufacturerResponse::from)
            .collect();
        let drivers = driver::Entity::find()
            .order_by_asc(driver::Column::Username)
            .all(db)
            .await?
            .into_iter()
            .map(DriverSummary::from)
            .collect();

        Ok(Self {
            car_id,
            form,
            errors,
            manufacturers,
            drivers,
        })
    }

    async fn invalid(
        db: &DatabaseConnection,
        car_id: Option<i32>,
        form: CarForm,
        errors: FormErrors,
    ) -> Result<Response, AppError> {
        debug!("Car form rejected: {:?}", errors);
        let page = Self::build(db, car_id, form, errors).await?;
        Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::invalid(page, "Please correct the errors below")),
        )
            .into_response())
    }
}

async fn find_car(db: &DatabaseConnection, id: i32) -> Result<car::Model, AppError> {
    car::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))
}

/// Validate a submitted car form, checking that every referenced
/// manufacturer and driver exists. `errors` holds problems found while
/// parsing the raw form.
async fn clean_form(
    db: &DatabaseConnection,
    form: &CarForm,
    mut errors: FormErrors,
) -> Result<FormErrors, DbErr> {
    for (field, messages) in collect_errors(form) {
        errors.entry(field).or_insert(messages);
    }

    if let Some(manufacturer_id) = form.manufacturer {
        let exists = manufacturer::Entity::find_by_id(manufacturer_id)
            .one(db)
            .await?
            .is_some();
        if !exists {
            add_error(&mut errors, "manufacturer", INVALID_CHOICE_MESSAGE);
        }
    }

    let mut driver_ids = form.drivers.clone();
    driver_ids.sort_unstable();
    driver_ids.dedup();
    if !driver_ids.is_empty() {
        let found = driver::Entity::find()
            .filter(driver::Column::Id.is_in(driver_ids.clone()))
            .count(db)
            .await?;
        if found != driver_ids.len() as u64 {
            add_error(&mut errors, "drivers", INVALID_CHOICE_MESSAGE);
        }
    }

    Ok(errors)
}

/// List cars ordered by model
#[utoipa::path(
    get,
    path = "/cars/",
    tag = "cars",
    params(CarSearchQuery),
    responses(
        (status = 200, description = "Cars retrieved successfully", body = ApiResponse<CarListPage>),
        (status = 400, description = "Invalid search query")
    )
)]
#[instrument(skip(state))]
pub async fn list_cars(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<CarSearchQuery>>,
) -> Result<Json<ApiResponse<CarListPage>>, AppError> {
    trace!("Entering list_cars function");

    let mut select = car::Entity::find().find_also_related(manufacturer::Entity);
    let term = search_term(&query.model);
    if let Some(term) = &term {
        debug!("Filtering cars by model containing: {}", term);
        select = select.filter(icontains(car::Entity, car::Column::Model, term));
    }
    if let Some(manufacturer_id) = query.manufacturer {
        debug!("Filtering cars by manufacturer ID: {}", manufacturer_id);
        select = select.filter(car::Column::ManufacturerId.eq(manufacturer_id));
    }

    let cars = select
        .order_by_asc(car::Column::Model)
        .order_by_asc(car::Column::Id)
        .all(&state.db)
        .await?;
    info!("Successfully retrieved {} cars", cars.len());

    let page = CarListPage {
        car_list: cars
            .into_iter()
            .map(|(car, maker)| CarResponse::new(car, maker))
            .collect(),
        car_search_form: CarSearchForm {
            model: term.unwrap_or_default(),
            manufacturer: query.manufacturer,
        },
    };
    Ok(Json(ApiResponse::ok(page, "Cars retrieved successfully")))
}

/// Car detail with its drivers
#[utoipa::path(
    get,
    path = "/cars/{id}/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car retrieved successfully", body = ApiResponse<CarDetailPage>),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_car(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDriver>,
) -> Result<Json<ApiResponse<CarDetailPage>>, AppError> {
    let car = find_car(&state.db, id).await?;
    let maker = car.find_related(manufacturer::Entity).one(&state.db).await?;
    let drivers = car
        .find_related(driver::Entity)
        .order_by_asc(driver::Column::Username)
        .all(&state.db)
        .await?;

    let is_assigned = drivers.iter().any(|d| d.id == current.driver.id);
    debug!("Car {} has {} drivers, assigned to current driver: {}", id, drivers.len(), is_assigned);

    let page = CarDetailPage {
        car: CarResponse::new(car, maker),
        drivers: drivers.into_iter().map(DriverSummary::from).collect(),
        is_assigned,
    };
    Ok(Json(ApiResponse::ok(page, "Car retrieved successfully")))
}

/// Blank car form with manufacturer and driver choices
#[utoipa::path(
    get,
    path = "/cars/create/",
    tag = "cars",
    responses(
        (status = 200, description = "Empty form", body = ApiResponse<CarFormPage>)
    )
)]
#[instrument(skip(state))]
pub async fn car_create_form(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CarFormPage>>, AppError> {
    let page = CarFormPage::build(&state.db, None, CarForm::default(), FormErrors::new()).await?;
    Ok(Json(ApiResponse::ok(page, "Car form")))
}

/// Create a car
#[utoipa::path(
    post,
    path = "/cars/create/",
    tag = "cars",
    request_body(content = CarForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirecting to the car list"),
        (status = 422, description = "Validation failed", body = ApiResponse<CarFormPage>)
    )
)]
#[instrument(skip(state))]
pub async fn create_car(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let (form, parse_errors) = CarForm::from_pairs(pairs);
    debug!("Creating car with model: {}", form.model);

    let errors = clean_form(&state.db, &form, parse_errors).await?;
    let manufacturer_id = match form.manufacturer {
        Some(manufacturer_id) if errors.is_empty() => manufacturer_id,
        _ => return CarFormPage::invalid(&state.db, None, form, errors).await,
    };

    let txn = state.db.begin().await?;
    let created = car::ActiveModel {
        model: Set(form.model.clone()),
        manufacturer_id: Set(manufacturer_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    created.set_drivers(&txn, &form.drivers).await?;
    txn.commit().await?;

    info!("Car created successfully with ID: {}, model: {}", created.id, created.model);
    Ok(redirect_found(LIST_URL))
}

/// Car form pre-filled for editing
#[utoipa::path(
    get,
    path = "/cars/{id}/update/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Pre-filled form", body = ApiResponse<CarFormPage>),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn car_update_form(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CarFormPage>>, AppError> {
    let existing = find_car(&state.db, id).await?;
    let drivers = existing.driver_ids(&state.db).await?;

    let form = CarForm {
        model: existing.model,
        manufacturer: Some(existing.manufacturer_id),
        drivers,
    };
    let page = CarFormPage::build(&state.db, Some(id), form, FormErrors::new()).await?;
    Ok(Json(ApiResponse::ok(page, "Car form")))
}

/// Update a car and replace its driver set
#[utoipa::path(
    post,
    path = "/cars/{id}/update/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    request_body(content = CarForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirecting to the car list"),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ApiResponse<CarFormPage>)
    )
)]
#[instrument(skip(state))]
pub async fn update_car(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let existing = find_car(&state.db, id).await?;
    let (form, parse_errors) = CarForm::from_pairs(pairs);

    let errors = clean_form(&state.db, &form, parse_errors).await?;
    let manufacturer_id = match form.manufacturer {
        Some(manufacturer_id) if errors.is_empty() => manufacturer_id,
        _ => return CarFormPage::invalid(&state.db, Some(id), form, errors).await,
    };

    let txn = state.db.begin().await?;
    let mut active: car::ActiveModel = existing.into();
    active.model = Set(form.model.clone());
    active.manufacturer_id = Set(manufacturer_id);
    let updated = active.update(&txn).await?;
    updated.set_drivers(&txn, &form.drivers).await?;
    txn.commit().await?;

    info!("Car with ID {} updated successfully to: {}", id, updated);
    Ok(redirect_found(LIST_URL))
}

/// Deletion confirmation context
#[utoipa::path(
    get,
    path = "/cars/{id}/delete/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car to be deleted", body = ApiResponse<CarResponse>),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn car_delete_confirm(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CarResponse>>, AppError> {
    let existing = find_car(&state.db, id).await?;
    let maker = existing.find_related(manufacturer::Entity).one(&state.db).await?;
    Ok(Json(ApiResponse::ok(
        CarResponse::new(existing, maker),
        "Confirm car deletion",
    )))
}

/// Delete a car
#[utoipa::path(
    post,
    path = "/cars/{id}/delete/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 302, description = "Deleted, redirecting to the car list"),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_car(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let delete_result = car::Entity::delete_by_id(id).exec(&state.db).await?;
    debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);

    if delete_result.rows_affected == 0 {
        warn!("Car with ID {} not found for deletion", id);
        return Err(AppError::not_found("Car", id));
    }

    info!("Car with ID {} deleted successfully", id);
    Ok(redirect_found(LIST_URL))
}

/// Assign the logged-in driver to the car, or unassign them if already assigned
#[utoipa::path(
    get,
    path = "/cars/{id}/toggle-assign/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 302, description = "Assignment flipped, redirecting to the car detail page"),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_assign(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDriver>,
) -> Result<Response, AppError> {
    let car = find_car(&state.db, id).await?;
    let assigned = car.toggle_driver(&state.db, current.driver.id).await?;

    info!(
        "Driver {} {} car {}",
        current.driver.id,
        if assigned { "assigned to" } else { "removed from" },
        car.id
    );
    Ok(redirect_found(&car.absolute_url()))
}
