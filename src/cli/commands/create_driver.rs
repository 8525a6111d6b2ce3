use anyhow::{bail, Result};
use chrono::Utc;
use model::entities::driver;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{debug, error, info, trace};

use crate::auth::hash_password;
use crate::forms::DriverCreationForm;

/// Account details given on the command line.
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub license_number: String,
    pub first_name: String,
    pub last_name: String,
    pub superuser: bool,
}

pub async fn create_driver(database_url: &str, new_driver: NewDriver) -> Result<()> {
    trace!("Entering create_driver function");

    // Same rules as the registration page
    let form = DriverCreationForm {
        username: new_driver.username,
        password1: new_driver.password.clone(),
        password2: new_driver.password,
        first_name: new_driver.first_name,
        last_name: new_driver.last_name,
        license_number: new_driver.license_number,
    }
    .normalized();

    let errors = form.clean();
    if !errors.is_empty() {
        for (field, messages) in &errors {
            for message in messages {
                error!("{}: {}", field, message);
            }
        }
        bail!("Driver details are invalid");
    }

    let db = Database::connect(database_url).await?;
    debug!("Connected to database: {}", database_url);

    let taken = driver::Entity::find()
        .filter(
            driver::Column::Username
                .eq(form.username.as_str())
                .or(driver::Column::LicenseNumber.eq(form.license_number.as_str())),
        )
        .count(&db)
        .await?;
    if taken > 0 {
        bail!(
            "A driver with username '{}' or license number '{}' already exists",
            form.username,
            form.license_number
        );
    }

    let created = driver::ActiveModel {
        username: Set(form.username),
        password: Set(hash_password(&form.password1)?),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        email: Set(String::new()),
        is_active: Set(true),
        is_staff: Set(new_driver.superuser),
        is_superuser: Set(new_driver.superuser),
        date_joined: Set(Utc::now().naive_utc()),
        last_login: Set(None),
        license_number: Set(form.license_number),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!("Driver '{}' created with ID {}", created.username, created.id);
    Ok(())
}
