use crate::{
    domain::migration::{Migration, migration_steps},
    infrastructure::{persistence::PersistenceAdapter, settings::Settings},
};
use blog_common::database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = database::connect(&settings.database).await?;
    tracing::info!("connected to DB");
    let persistence = PersistenceAdapter::new(database);

    // create missing tables of the blog schema
    let migration = Migration::new(persistence);
    let steps = migration_steps(migration.persistence()).await?;
    tracing::info!("{} migration step(s) to apply", steps.len());
    migration.apply(steps).await?;

    if let Some(admin) = settings.admin.as_ref() {
        let created = migration.bootstrap_admin(admin).await?;
        if created {
            tracing::info!("admin account {} created", admin.email);
        } else {
            tracing::info!("admin account {} already exists", admin.email);
        }
    }

    tracing::info!("schema migrated");
    Ok(())
}
