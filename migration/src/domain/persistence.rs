use std::collections::HashSet;

use serde::Deserialize;

use crate::domain::migration::MigrationStep;

/// Admin account created on first migration
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    pub pseudonym: String,
    pub password: String,
}

pub trait Persistence: Send + Sync + Clone + 'static {
    /// load tables from database
    fn load(&self) -> impl Future<Output = Result<HashSet<String>, anyhow::Error>>;
    /// apply migration steps to database
    fn apply_migration_steps(&self, steps: Vec<impl MigrationStep>) -> impl Future<Output = Result<(), anyhow::Error>>;
    /// insert an admin user unless the email is taken, returns true when inserted
    fn insert_admin(
        &self,
        email: &str,
        pseudonym: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<bool, anyhow::Error>>;
    /// extract database schema
    fn database_schema(&self) -> &str;
}
