use blog_common::Database;

use crate::domain::{
    RepositoryError,
    user::{User, UserId, UserRepository},
};

#[derive(Clone, Debug)]
pub struct PostgresUserRepository {
    database: &'static Database,
}

impl PostgresUserRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

const SELECT_USER: &str =
    "SELECT id, email, password, pseudonym, role, photo, registration_date FROM users";

impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("{} WHERE id = $1", SELECT_USER);

        sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(self.database.database_pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("{} WHERE lower(email) = lower($1)", SELECT_USER);

        sqlx::query(&sql)
            .bind(email.trim())
            .fetch_optional(self.database.database_pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update_photo(&self, id: UserId, photo: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET photo = $1 WHERE id = $2")
            .bind(photo)
            .bind(id.0)
            .execute(self.database.database_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
