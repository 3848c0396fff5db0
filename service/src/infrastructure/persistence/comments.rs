use blog_common::Database;

use crate::domain::{
    RepositoryError,
    article::ArticleId,
    comment::{Comment, CommentRepository, NewComment},
};

#[derive(Clone, Debug)]
pub struct PostgresCommentRepository {
    database: &'static Database,
}

impl PostgresCommentRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

const COMMENT_COLUMNS: &str = "c.id, c.content, c.publication_date, c.article_id,
    u.id AS author_id, u.pseudonym AS author_pseudonym, u.photo AS author_photo";

impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let sql = format!(
            "WITH c AS (
                INSERT INTO comments (content, publication_date, author_id, article_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {} FROM c JOIN users u ON u.id = c.author_id",
            COMMENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(comment.content)
            .bind(comment.publication_date)
            .bind(comment.author_id.0)
            .bind(comment.article_id.0)
            .fetch_one(self.database.database_pool())
            .await?;

        Comment::try_from(row)
    }

    async fn for_article(&self, article_id: ArticleId) -> Result<Vec<Comment>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id
            WHERE c.article_id = $1
            ORDER BY c.publication_date, c.id",
            COMMENT_COLUMNS
        );

        let mut db_rows = sqlx::query(&sql)
            .bind(article_id.0)
            .fetch(self.database.database_pool());

        let mut comments = Vec::new();

        use futures::TryStreamExt;
        while let Some(row) = db_rows.try_next().await? {
            comments.push(Comment::try_from(row)?);
        }

        Ok(comments)
    }
}
