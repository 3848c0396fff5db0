use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    RepositoryError,
    article::{Article, ArticleId, Author},
    user::{User, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub publication_date: DateTime<Utc>,
    pub author: Author,
    pub article_id: ArticleId,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub publication_date: DateTime<Utc>,
    pub author_id: UserId,
    pub article_id: ArticleId,
}

pub trait CommentRepository: Clone + Send + Sync + 'static {
    fn create(
        &self,
        comment: NewComment,
    ) -> impl Future<Output = Result<Comment, RepositoryError>> + Send;

    /// Comments of one article, oldest first
    fn for_article(
        &self,
        article_id: ArticleId,
    ) -> impl Future<Output = Result<Vec<Comment>, RepositoryError>> + Send;
}

/// Attaches a comment written by `author` to `article`.
pub async fn comment_article<C: CommentRepository>(
    comments: &C,
    author: &User,
    article: &Article,
    content: String,
    now: DateTime<Utc>,
) -> Result<Comment, RepositoryError> {
    let comment = comments
        .create(NewComment {
            content,
            publication_date: now,
            author_id: author.id,
            article_id: article.id,
        })
        .await?;

    tracing::info!(article = %article.slug, author = %author.pseudonym, "comment added");
    Ok(comment)
}
