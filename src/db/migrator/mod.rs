use sea_orm_migration::prelude::*;

mod m20250301_create_accounts;
mod m20250302_create_catalogs;
mod m20250309_create_reset_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_create_accounts::Migration),
            Box::new(m20250302_create_catalogs::Migration),
            Box::new(m20250309_create_reset_tokens::Migration),
        ]
    }
}
