use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create manufacturers table
        manager
            .create_table(
                Table::create()
                    .table(Manufacturers::Table)
                    .if_not_exists()
                    .col(pk_auto(Manufacturers::Id))
                    .col(string_len(Manufacturers::Name, 255).unique_key())
                    .col(string_len(Manufacturers::Country, 255))
                    .to_owned(),
            )
            .await?;

        // Create drivers table
        manager
            .create_table(
                Table::create()
                    .table(Drivers::Table)
                    .if_not_exists()
                    .col(pk_auto(Drivers::Id))
                    .col(string_len(Drivers::Username, 150).unique_key())
                    .col(string(Drivers::Password))
                    .col(string_len(Drivers::FirstName, 150).default(""))
                    .col(string_len(Drivers::LastName, 150).default(""))
                    .col(string_len(Drivers::Email, 254).default(""))
                    .col(boolean(Drivers::IsActive).default(true))
                    .col(boolean(Drivers::IsStaff).default(false))
                    .col(boolean(Drivers::IsSuperuser).default(false))
                    .col(date_time(Drivers::DateJoined))
                    .col(date_time_null(Drivers::LastLogin))
                    .col(string_len(Drivers::LicenseNumber, 255).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create cars table
        manager
            .create_table(
                Table::create()
                    .table(Cars::Table)
                    .if_not_exists()
                    .col(pk_auto(Cars::Id))
                    .col(string_len(Cars::Model, 255))
                    .col(integer(Cars::ManufacturerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cars_manufacturer")
                            .from(Cars::Table, Cars::ManufacturerId)
                            .to(Manufacturers::Table, Manufacturers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cars_manufacturer_id")
                    .table(Cars::Table)
                    .col(Cars::ManufacturerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Cars::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Drivers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Manufacturers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Manufacturers {
    Table,
    Id,
    Name,
    Country,
}

#[derive(DeriveIden)]
pub(crate) enum Drivers {
    Table,
    Id,
    Username,
    Password,
    FirstName,
    LastName,
    Email,
    IsActive,
    IsStaff,
    IsSuperuser,
    DateJoined,
    LastLogin,
    LicenseNumber,
}

#[derive(DeriveIden)]
pub(crate) enum Cars {
    Table,
    Id,
    Model,
    ManufacturerId,
}
