use std::fmt;

use super::{car_driver, driver, manufacturer};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Set};
use tracing::debug;

/// A car in the fleet. Every car is built by exactly one manufacturer and may
/// be driven by any number of drivers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub model: String,
    pub manufacturer_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A car belongs to one manufacturer.
    #[sea_orm(
        belongs_to = "super::manufacturer::Entity",
        from = "Column::ManufacturerId",
        to = "super::manufacturer::Column::Id"
    )]
    Manufacturer,
    /// Relation for the many-to-many relationship with drivers.
    #[sea_orm(has_many = "super::car_driver::Entity")]
    CarDriver,
}

impl Related<manufacturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl Related<driver::Entity> for Entity {
    fn to() -> RelationDef {
        car_driver::Relation::Driver.def()
    }
    fn via() -> Option<RelationDef> {
        Some(car_driver::Relation::Car.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model)
    }
}

impl Model {
    /// Path of the car's detail page.
    pub fn absolute_url(&self) -> String {
        format!("/cars/{}/", self.id)
    }

    /// Whether `driver_id` is currently assigned to this car.
    pub async fn has_driver<C>(&self, db: &C, driver_id: i32) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let assignment = car_driver::Entity::find_by_id((self.id, driver_id))
            .one(db)
            .await?;
        Ok(assignment.is_some())
    }

    /// IDs of all drivers assigned to this car, ascending.
    pub async fn driver_ids<C>(&self, db: &C) -> Result<Vec<i32>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut ids: Vec<i32> = car_driver::Entity::find()
            .filter(car_driver::Column::CarId.eq(self.id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.driver_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Flip the assignment of `driver_id` to this car.
    ///
    /// Returns `true` when the driver is assigned after the call.
    pub async fn toggle_driver<C>(&self, db: &C, driver_id: i32) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        if self.has_driver(db, driver_id).await? {
            debug!("Removing driver {} from car {}", driver_id, self.id);
            car_driver::Entity::delete_by_id((self.id, driver_id))
                .exec(db)
                .await?;
            Ok(false)
        } else {
            debug!("Assigning driver {} to car {}", driver_id, self.id);
            let assignment = car_driver::ActiveModel {
                car_id: Set(self.id),
                driver_id: Set(driver_id),
            };
            car_driver::Entity::insert(assignment).exec(db).await?;
            Ok(true)
        }
    }

    /// Replace the set of assigned drivers with `driver_ids`.
    /// Duplicate IDs are ignored.
    pub async fn set_drivers<C>(&self, db: &C, driver_ids: &[i32]) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        car_driver::Entity::delete_many()
            .filter(car_driver::Column::CarId.eq(self.id))
            .exec(db)
            .await?;

        let mut ids = driver_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(());
        }

        debug!("Assigning drivers {:?} to car {}", ids, self.id);
        let rows = ids.into_iter().map(|driver_id| car_driver::ActiveModel {
            car_id: Set(self.id),
            driver_id: Set(driver_id),
        });
        car_driver::Entity::insert_many(rows).exec(db).await?;

        Ok(())
    }
}
