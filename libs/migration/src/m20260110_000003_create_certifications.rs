use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certifications::Table)
                    .if_not_exists()
                    .col(pk_uuid(Certifications::Id))
                    .col(string(Certifications::Name))
                    .col(string(Certifications::Category))
                    .col(ColumnDef::new(Certifications::ProfileId).uuid().null())
                    .col(string(Certifications::HolderName))
                    .col(ColumnDef::new(Certifications::IssueDate).date().null())
                    .col(ColumnDef::new(Certifications::ExpiryDate).date().null())
                    .col(
                        ColumnDef::new(Certifications::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Certifications::Document).json_binary().null())
                    .col(ColumnDef::new(Certifications::Cost).double().null())
                    .col(timestamp_with_time_zone_null(
                        Certifications::ExpiryNotifiedAt,
                    ))
                    .col(
                        timestamp_with_time_zone(Certifications::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Certifications::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certifications_profile")
                            .from(Certifications::Table, Certifications::ProfileId)
                            .to(EmployeeProfiles::Table, EmployeeProfiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certifications_profile_id")
                    .table(Certifications::Table)
                    .col(Certifications::ProfileId)
                    .to_owned(),
            )
            .await?;

        // The expiry scans filter on this column every run
        manager
            .create_index(
                Index::create()
                    .name("idx_certifications_expiry_date")
                    .table(Certifications::Table)
                    .col(Certifications::ExpiryDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certifications::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Certifications {
    Table,
    Id,
    Name,
    Category,
    ProfileId,
    HolderName,
    IssueDate,
    ExpiryDate,
    Status,
    Document,
    Cost,
    ExpiryNotifiedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmployeeProfiles {
    Table,
    Id,
}
