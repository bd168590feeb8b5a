use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmployeeProfiles::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmployeeProfiles::Id))
                    .col(string(EmployeeProfiles::FirstName))
                    .col(string(EmployeeProfiles::LastName))
                    .col(
                        ColumnDef::new(EmployeeProfiles::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::Vtid)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::StaffCode)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(EmployeeProfiles::JobTitle).string().null())
                    .col(ColumnDef::new(EmployeeProfiles::Department).string().null())
                    .col(ColumnDef::new(EmployeeProfiles::StartDate).date().null())
                    .col(
                        ColumnDef::new(EmployeeProfiles::Contact)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::Address)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::EmergencyContact)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::AccountId)
                            .uuid()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        timestamp_with_time_zone(EmployeeProfiles::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmployeeProfiles::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_employee_profiles_email_lower ON employee_profiles (LOWER(email))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmployeeProfiles::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum EmployeeProfiles {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Vtid,
    StaffCode,
    JobTitle,
    Department,
    StartDate,
    Contact,
    Address,
    EmergencyContact,
    AccountId,
    CreatedAt,
    UpdatedAt,
}
