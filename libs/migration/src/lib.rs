pub use sea_orm_migration::prelude::*;

mod m20260110_000001_create_accounts;
mod m20260110_000002_create_employee_profiles;
mod m20260110_000003_create_certifications;
mod m20260110_000004_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_create_accounts::Migration),
            Box::new(m20260110_000002_create_employee_profiles::Migration),
            Box::new(m20260110_000003_create_certifications::Migration),
            Box::new(m20260110_000004_create_notifications::Migration),
        ]
    }
}
