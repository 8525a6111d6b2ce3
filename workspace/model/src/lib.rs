//! Persistent data model of the taxi fleet: SeaORM entities plus the
//! license number format shared by every flow that creates or edits drivers.

pub mod entities;
pub mod license;

pub use license::{validate_license_number, LicenseNumberError};
