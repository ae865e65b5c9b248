pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_catalog;
mod m20251001_000002_create_users_and_verifications;
mod m20251001_000003_create_carts_and_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_catalog::Migration),
            Box::new(m20251001_000002_create_users_and_verifications::Migration),
            Box::new(m20251001_000003_create_carts_and_orders::Migration),
        ]
    }
}
