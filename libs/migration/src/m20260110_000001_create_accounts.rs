use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_uuid(Accounts::Id))
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Vtid)
                            .string_len(32)
                            .null()
                            .unique_key(),
                    )
                    .col(string(Accounts::PasswordHash))
                    .col(
                        ColumnDef::new(Accounts::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(boolean(Accounts::IsActive).default(true))
                    .col(boolean(Accounts::IsVerified).default(false))
                    .col(boolean(Accounts::IsApproved).default(false))
                    .col(ColumnDef::new(Accounts::ProfileId).uuid().null().unique_key())
                    .col(
                        timestamp_with_time_zone(Accounts::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Accounts::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Emails are matched case-insensitively; index the lowered form
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_accounts_email_lower ON accounts (LOWER(email))",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_role")
                    .table(Accounts::Table)
                    .col(Accounts::Role)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Email,
    Username,
    Vtid,
    PasswordHash,
    Role,
    IsActive,
    IsVerified,
    IsApproved,
    ProfileId,
    CreatedAt,
    UpdatedAt,
}
