use blog_common::Role;
use chrono::{DateTime, Utc};
use sqlx::{Row, postgres::PgRow};

use crate::domain::{
    RepositoryError,
    article::{Article, ArticleId, Author},
    comment::{Comment, CommentId},
    slug::Slug,
    user::{User, UserId},
};

pub mod articles;
pub mod comments;
pub mod users;

pub use articles::PostgresArticleRepository;
pub use comments::PostgresCommentRepository;
pub use users::PostgresUserRepository;

impl From<sqlx::Error> for RepositoryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                RepositoryError::UniqueViolation(db_error.message().to_string())
            }
            sqlx::Error::Database(db_error) if db_error.is_foreign_key_violation() => {
                RepositoryError::ValidationFailed(db_error.message().to_string())
            }
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}

/// Reads the `author_*` columns every article and comment query joins in
fn author_from_row(row: &PgRow) -> Result<Author, sqlx::Error> {
    Ok(Author {
        id: UserId(row.try_get("author_id")?),
        pseudonym: row.try_get("author_pseudonym")?,
        photo: row.try_get("author_photo")?,
    })
}

impl TryFrom<PgRow> for Article {
    type Error = RepositoryError;

    fn try_from(row: PgRow) -> Result<Self, Self::Error> {
        let slug: String = row.try_get("slug")?;
        let slug = Slug::try_new(slug)
            .map_err(|e| RepositoryError::DatabaseError(format!("stored slug is invalid: {}", e)))?;
        let publication_date: DateTime<Utc> = row.try_get("publication_date")?;

        Ok(Article {
            id: ArticleId(row.try_get("id")?),
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            slug,
            publication_date,
            author: author_from_row(&row)?,
        })
    }
}

impl TryFrom<PgRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: PgRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: CommentId(row.try_get("id")?),
            content: row.try_get("content")?,
            publication_date: row.try_get("publication_date")?,
            author: author_from_row(&row)?,
            article_id: ArticleId(row.try_get("article_id")?),
        })
    }
}

impl TryFrom<PgRow> for User {
    type Error = RepositoryError;

    fn try_from(row: PgRow) -> Result<Self, Self::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<Role>()
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(User {
            id: UserId(row.try_get("id")?),
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            pseudonym: row.try_get("pseudonym")?,
            role,
            photo: row.try_get("photo")?,
            registration_date: row.try_get("registration_date")?,
        })
    }
}
