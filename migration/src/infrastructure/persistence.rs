use std::collections::HashSet;

use anyhow::Context;
use blog_common::{Database, Role, USERS_TABLE};
use sqlx::Executor;

use crate::domain::{migration::MigrationStep, persistence::Persistence};

#[derive(Clone)]
pub struct PersistenceAdapter {
    database: &'static Database,
}

impl PersistenceAdapter {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    /// Runs the DDL of one step atomically, nothing is kept when a statement fails
    async fn execute_in_transaction(&self, ddls: Vec<String>, ctx: &'static str) -> Result<(), anyhow::Error> {
        let mut transaction = self
            .database
            .database_pool()
            .begin()
            .await
            .with_context(|| format!("failed to start {} transaction", ctx))?;

        tracing::info!("{}", ctx);

        for ddl in ddls {
            tracing::debug!("{}", ddl);

            transaction
                .execute(sqlx::query(&ddl))
                .await
                .with_context(|| format!("failed to execute {} query", ctx))?;
        }

        transaction
            .commit()
            .await
            .with_context(|| format!("failed to commit {} transaction", ctx))?;

        Ok(())
    }
}

impl Persistence for PersistenceAdapter {
    async fn load(&self) -> Result<HashSet<String>, anyhow::Error> {
        let sql = "SELECT table_name
            FROM information_schema.tables
            WHERE
              table_schema = $1
              AND table_type = 'BASE TABLE'";

        let mut rows = sqlx::query_scalar::<_, String>(sql)
            .bind(self.database.database_schema())
            .fetch(self.database.database_pool());

        let mut set = HashSet::new();

        use futures::TryStreamExt;
        while let Some(name) = rows.try_next().await? {
            set.insert(name);
        }

        Ok(set)
    }

    async fn apply_migration_steps(&self, steps: Vec<impl MigrationStep>) -> Result<(), anyhow::Error> {
        use futures::stream::{self, StreamExt};

        let mut stream = stream::iter(steps);
        while let Some(step) = stream.next().await {
            let ctx = step.ctx();
            let ddls = step.ddls();
            self.execute_in_transaction(ddls, ctx).await?;
        }

        Ok(())
    }

    async fn insert_admin(
        &self,
        email: &str,
        pseudonym: &str,
        password_hash: &str,
    ) -> Result<bool, anyhow::Error> {
        let sql = format!(
            "INSERT INTO \"{}\".\"{}\" (email, password, pseudonym, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING",
            self.database.database_schema(),
            USERS_TABLE
        );

        let result = sqlx::query(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(pseudonym)
            .bind(Role::Admin.as_str())
            .execute(self.database.database_pool())
            .await?;

        Ok(result.rows_affected() == 1)
    }

    fn database_schema(&self) -> &str {
        self.database.database_schema()
    }
}
