use crate::auth::require_login;
use crate::handlers::{
    auth::{login, login_form, logout},
    cars::{
        car_create_form, car_delete_confirm, car_update_form, create_car, delete_car, get_car,
        list_cars, toggle_assign, update_car,
    },
    drivers::{
        create_driver, delete_driver, driver_create_form, driver_delete_confirm, get_driver,
        license_update_form, list_drivers, update_license,
    },
    health::health_check,
    index::index,
    manufacturers::{
        create_manufacturer, delete_manufacturer, list_manufacturers, manufacturer_create_form,
        manufacturer_delete_confirm, manufacturer_update_form, update_manufacturer,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Everything in here requires a logged-in driver
    let protected = Router::new()
        .route("/", get(index))
        .route("/accounts/logout/", post(logout))
        // Manufacturer routes
        .route("/manufacturers/", get(list_manufacturers))
        .route(
            "/manufacturers/create/",
            get(manufacturer_create_form).post(create_manufacturer),
        )
        .route(
            "/manufacturers/:id/update/",
            get(manufacturer_update_form).post(update_manufacturer),
        )
        .route(
            "/manufacturers/:id/delete/",
            get(manufacturer_delete_confirm).post(delete_manufacturer),
        )
        // Car routes
        .route("/cars/", get(list_cars))
        .route("/cars/create/", get(car_create_form).post(create_car))
        .route("/cars/:id/", get(get_car))
        .route("/cars/:id/update/", get(car_update_form).post(update_car))
        .route("/cars/:id/delete/", get(car_delete_confirm).post(delete_car))
        .route("/cars/:id/toggle-assign/", get(toggle_assign))
        // Driver routes
        .route("/drivers/", get(list_drivers))
        .route("/drivers/create/", get(driver_create_form).post(create_driver))
        .route("/drivers/:id/", get(get_driver))
        .route("/drivers/:id/update/", get(license_update_form).post(update_license))
        .route("/drivers/:id/delete/", get(driver_delete_confirm).post(delete_driver))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/accounts/login/", get(login_form).post(login))
        .merge(protected)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .with_state(state)
}
