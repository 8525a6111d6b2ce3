//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the taxi fleet application here:
//! manufacturers build cars, and drivers are assigned to cars through
//! a many-to-many join table.

pub mod car;
pub mod car_driver;
pub mod driver;
pub mod manufacturer;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::car::Entity as Car;
    pub use super::car_driver::Entity as CarDriver;
    pub use super::driver::Entity as Driver;
    pub use super::manufacturer::Entity as Manufacturer;
}
