use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    RepositoryError,
    pagination::{Page, PageRequest},
    slug::{Slug, unique_slug},
    user::{User, UserId},
};

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user shown next to an article or a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: UserId,
    pub pseudonym: String,
    pub photo: Option<String>,
}

/// A blog post, publicly identified by its slug
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub slug: Slug,
    /// set once at creation
    pub publication_date: DateTime<Utc>,
    pub author: Author,
}

/// Validated title and content coming from the publication form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub slug: Slug,
    pub publication_date: DateTime<Utc>,
    pub author_id: UserId,
}

#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub slug: Slug,
}

pub trait ArticleRepository: Clone + Send + Sync + 'static {
    /// Insert a new article and return it with its author loaded
    fn create(
        &self,
        article: NewArticle,
    ) -> impl Future<Output = Result<Article, RepositoryError>> + Send;

    /// Overwrite title, content and slug of an existing article
    fn update(
        &self,
        id: ArticleId,
        changes: ArticleChanges,
    ) -> impl Future<Output = Result<Article, RepositoryError>> + Send;

    /// Delete an article together with its comments
    fn delete(&self, id: ArticleId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: ArticleId,
    ) -> impl Future<Output = Result<Option<Article>, RepositoryError>> + Send;

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Article>, RepositoryError>> + Send;

    /// The `limit` most recent articles, newest first
    fn latest(&self, limit: u32) -> impl Future<Output = Result<Vec<Article>, RepositoryError>> + Send;

    /// One page of articles, newest first
    fn page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<Article>, RepositoryError>> + Send;

    /// Is `slug` used by an article other than `except`?
    fn slug_exists(
        &self,
        slug: &Slug,
        except: Option<ArticleId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Stores a new article written by `author` at `now`.
pub async fn publish<R: ArticleRepository>(
    articles: &R,
    author: &User,
    draft: ArticleDraft,
    now: DateTime<Utc>,
) -> Result<Article, RepositoryError> {
    let slug = unique_slug(articles, &draft.title, None).await?;

    let article = articles
        .create(NewArticle {
            title: draft.title,
            content: draft.content,
            slug,
            publication_date: now,
            author_id: author.id,
        })
        .await?;

    tracing::info!(article = %article.slug, author = %author.pseudonym, "article published");
    Ok(article)
}

/// Applies an edited draft in place. The slug follows the title; publication
/// date and author are kept.
pub async fn revise<R: ArticleRepository>(
    articles: &R,
    article: &Article,
    draft: ArticleDraft,
) -> Result<Article, RepositoryError> {
    let slug = if draft.title == article.title {
        article.slug.clone()
    } else {
        unique_slug(articles, &draft.title, Some(article.id)).await?
    };

    let updated = articles
        .update(
            article.id,
            ArticleChanges {
                title: draft.title,
                content: draft.content,
                slug,
            },
        )
        .await?;

    tracing::info!(article = %updated.slug, id = %updated.id, "article edited");
    Ok(updated)
}
