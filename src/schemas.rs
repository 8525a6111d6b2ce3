use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::forms::{
    CarForm, DriverCreationForm, DriverLicenseUpdateForm, LoginForm, ManufacturerForm,
};
use crate::handlers::{
    auth::LoginPage,
    cars::{CarDetailPage, CarFormPage, CarListPage, CarResponse, CarSearchForm},
    drivers::{
        DriverCreationPage, DriverDetailPage, DriverListPage, DriverResponse, DriverSearchForm,
        DriverSummary, LicenseUpdatePage,
    },
    index::IndexPage,
    manufacturers::{
        ManufacturerFormPage, ManufacturerListPage, ManufacturerResponse, ManufacturerSearchForm,
    },
};
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Server-side session storage
    pub sessions: SessionStore,
}

/// API response wrapper
///
/// Page handlers put their rendering context into `data`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
            success: true,
        }
    }

    /// A re-rendered form that failed validation.
    pub fn invalid(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
            success: false,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login_form,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::index::index,
        crate::handlers::manufacturers::list_manufacturers,
        crate::handlers::manufacturers::manufacturer_create_form,
        crate::handlers::manufacturers::create_manufacturer,
        crate::handlers::manufacturers::manufacturer_update_form,
        crate::handlers::manufacturers::update_manufacturer,
        crate::handlers::manufacturers::manufacturer_delete_confirm,
        crate::handlers::manufacturers::delete_manufacturer,
        crate::handlers::cars::list_cars,
        crate::handlers::cars::get_car,
        crate::handlers::cars::car_create_form,
        crate::handlers::cars::create_car,
        crate::handlers::cars::car_update_form,
        crate::handlers::cars::update_car,
        crate::handlers::cars::car_delete_confirm,
        crate::handlers::cars::delete_car,
        crate::handlers::cars::toggle_assign,
        crate::handlers::drivers::list_drivers,
        crate::handlers::drivers::get_driver,
        crate::handlers::drivers::driver_create_form,
        crate::handlers::drivers::create_driver,
        crate::handlers::drivers::license_update_form,
        crate::handlers::drivers::update_license,
        crate::handlers::drivers::driver_delete_confirm,
        crate::handlers::drivers::delete_driver,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            LoginForm,
            LoginPage,
            IndexPage,
            ManufacturerForm,
            ManufacturerResponse,
            ManufacturerSearchForm,
            ManufacturerListPage,
            ManufacturerFormPage,
            CarForm,
            CarResponse,
            CarSearchForm,
            CarListPage,
            CarDetailPage,
            CarFormPage,
            DriverCreationForm,
            DriverLicenseUpdateForm,
            DriverSummary,
            DriverResponse,
            DriverSearchForm,
            DriverListPage,
            DriverDetailPage,
            DriverCreationPage,
            LicenseUpdatePage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and logout"),
        (name = "index", description = "Fleet dashboard"),
        (name = "manufacturers", description = "Manufacturer screens"),
        (name = "cars", description = "Car screens and driver assignment"),
        (name = "drivers", description = "Driver screens"),
    ),
    info(
        title = "Taxi Service",
        description = "Taxi fleet management - manufacturers, cars and their drivers",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
