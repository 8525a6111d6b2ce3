use std::fmt;

use sea_orm::entity::prelude::*;

/// A driver is the user identity of the application: every login belongs to a
/// driver. On top of the usual account fields it carries a license number,
/// whose format is checked by [`crate::license::validate_license_number`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2id hash in PHC string format.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime,
    pub last_login: Option<DateTime>,
    #[sea_orm(unique)]
    pub license_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Relation for the many-to-many relationship with cars.
    #[sea_orm(has_many = "super::car_driver::Entity")]
    CarDriver,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        super::car_driver::Relation::Car.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::car_driver::Relation::Driver.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Path of the driver's detail page.
    pub fn absolute_url(&self) -> String {
        format!("/drivers/{}/", self.id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}
