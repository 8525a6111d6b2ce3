use axum::{extract::State, response::Json, Extension};
use model::entities::prelude::{Car, Driver, Manufacturer};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use crate::auth::CurrentDriver;
use crate::error::AppError;
use crate::schemas::{ApiResponse, AppState};

/// Dashboard context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexPage {
    pub num_drivers: u64,
    pub num_cars: u64,
    pub num_manufacturers: u64,
    /// Dashboard visits made in the current session, including this one
    pub num_visits: u32,
}

/// Fleet dashboard
#[utoipa::path(
    get,
    path = "/",
    tag = "index",
    responses(
        (status = 200, description = "Fleet totals and session visit count", body = ApiResponse<IndexPage>),
        (status = 302, description = "Not logged in, redirecting to the login page")
    )
)]
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDriver>,
) -> Result<Json<ApiResponse<IndexPage>>, AppError> {
    let num_drivers = Driver::find().count(&state.db).await?;
    let num_cars = Car::find().count(&state.db).await?;
    let num_manufacturers = Manufacturer::find().count(&state.db).await?;

    let num_visits = match state.sessions.record_visit(&current.session_id).await {
        Some(visits) => visits,
        None => {
            warn!("Session expired while rendering the dashboard");
            1
        }
    };

    debug!(
        "Dashboard: {} drivers, {} cars, {} manufacturers, visit #{}",
        num_drivers, num_cars, num_manufacturers, num_visits
    );

    Ok(Json(ApiResponse::ok(
        IndexPage {
            num_drivers,
            num_cars,
            num_manufacturers,
            num_visits,
        },
        "Dashboard retrieved successfully",
    )))
}
