pub mod attachment;
pub mod avatar;
pub mod entity;
pub mod html;
pub mod ids;
pub mod mailer;
pub mod models;
pub mod password;
pub mod upload;
pub mod validation;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::info;

use crate::mailer::{MailQueue, MailSettings, MailTransport};

pub mod service;

pub mod error;

pub mod config;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Main runtime handle for GardenBook: database, services and the mail worker.
pub struct GardenBook {
    pub config: config::GardenBookConfig,

    pub db: DatabaseConnection,

    /// Business operations, handed to the HTTP layer.
    pub services: service::Services,

    mail_worker: JoinHandle<()>,
}

impl GardenBook {
    /// Open (or create) the database, run migrations and start the mail worker.
    pub async fn start(
        config: config::GardenBookConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, error::StartError> {
        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        let settings = MailSettings {
            from: config.mail_from.clone(),
            site_url: config.site_url.clone(),
        };
        let (mailer, receiver) = MailQueue::new(settings);
        let mail_worker = mailer::spawn_mail_worker(receiver, transport);

        let services = service::Services::new(db.clone(), mailer);

        info!(bind = %config.bind, "gardenbook core started");
        Ok(Self {
            config,
            db,
            services,
            mail_worker,
        })
    }

    /// Drop the services, let the mail worker drain its queue and close the database.
    pub async fn shutdown(self) -> Result<(), error::StartError> {
        let GardenBook {
            db,
            services,
            mail_worker,
            ..
        } = self;

        drop(services);
        if let Err(error) = mail_worker.await {
            tracing::warn!(%error, "mail worker ended abnormally");
        }

        db.close().await?;
        info!("gardenbook core stopped");
        Ok(())
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;

    pub use super::error;

    pub use super::config;

    pub use super::GardenBook;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MemoryTransport;
    use crate::service::users::SignUp;

    #[tokio::test]
    async fn test_start_sign_up_and_shutdown_delivers_mail() {
        let transport = MemoryTransport::new();
        let core = GardenBook::start(config::GardenBookConfig::in_memory(), Arc::new(transport.clone()))
            .await
            .expect("core should start");

        core.services
            .users
            .sign_up(SignUp {
                name: "Rose".to_string(),
                email: "rose@example.com".to_string(),
                password: "sunflower".to_string(),
                password_confirmation: None,
            })
            .await
            .unwrap();

        core.shutdown().await.unwrap();

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, "rose@example.com");
    }
}
