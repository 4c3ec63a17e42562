use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::GardenBookConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &GardenBookConfig) -> Result<DatabaseConnection, DbErr> {
    let connection_string = config.database_url();
    info!(url = %connection_string, "opening database");

    let mut options = ConnectOptions::new(connection_string);
    options.sqlx_logging(false);

    Database::connect(options).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await
}
