use blog_common::Database;

use crate::domain::{
    RepositoryError,
    article::{Article, ArticleChanges, ArticleId, ArticleRepository, NewArticle},
    pagination::{Page, PageRequest},
    slug::Slug,
};

#[derive(Clone, Debug)]
pub struct PostgresArticleRepository {
    database: &'static Database,
}

impl PostgresArticleRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

/// Projection shared by every article read, `a` being the article row
const ARTICLE_COLUMNS: &str = "a.id, a.title, a.content, a.slug, a.publication_date,
    u.id AS author_id, u.pseudonym AS author_pseudonym, u.photo AS author_photo";

fn select_articles(condition: &str) -> String {
    format!(
        "SELECT {} FROM articles a JOIN users u ON u.id = a.author_id {}",
        ARTICLE_COLUMNS, condition
    )
}

impl ArticleRepository for PostgresArticleRepository {
    async fn create(&self, article: NewArticle) -> Result<Article, RepositoryError> {
        let sql = format!(
            "WITH a AS (
                INSERT INTO articles (title, content, slug, publication_date, author_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {} FROM a JOIN users u ON u.id = a.author_id",
            ARTICLE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(article.title)
            .bind(article.content)
            .bind(article.slug.into_inner())
            .bind(article.publication_date)
            .bind(article.author_id.0)
            .fetch_one(self.database.database_pool())
            .await?;

        Article::try_from(row)
    }

    async fn update(&self, id: ArticleId, changes: ArticleChanges) -> Result<Article, RepositoryError> {
        let sql = format!(
            "WITH a AS (
                UPDATE articles SET title = $1, content = $2, slug = $3
                WHERE id = $4
                RETURNING *
            )
            SELECT {} FROM a JOIN users u ON u.id = a.author_id",
            ARTICLE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.slug.into_inner())
            .bind(id.0)
            .fetch_optional(self.database.database_pool())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Article::try_from(row)
    }

    async fn delete(&self, id: ArticleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id.0)
            .execute(self.database.database_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let sql = select_articles("WHERE a.id = $1");

        sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(self.database.database_pool())
            .await?
            .map(Article::try_from)
            .transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepositoryError> {
        let sql = select_articles("WHERE a.slug = $1");

        sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.database.database_pool())
            .await?
            .map(Article::try_from)
            .transpose()
    }

    async fn latest(&self, limit: u32) -> Result<Vec<Article>, RepositoryError> {
        let sql = select_articles("ORDER BY a.publication_date DESC, a.id DESC LIMIT $1");

        sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.database.database_pool())
            .await?
            .into_iter()
            .map(Article::try_from)
            .collect()
    }

    async fn page(&self, request: PageRequest) -> Result<Page<Article>, RepositoryError> {
        let pool = self.database.database_pool();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(pool)
            .await?;

        let sql = select_articles("ORDER BY a.publication_date DESC, a.id DESC LIMIT $1 OFFSET $2");
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

        let items = sqlx::query(&sql)
            .bind(i64::from(request.size()))
            .bind(offset)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Article::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, request, u64::try_from(total).unwrap_or_default()))
    }

    async fn slug_exists(&self, slug: &Slug, except: Option<ArticleId>) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug.as_ref())
        .bind(except.map(|id| id.0))
        .fetch_one(self.database.database_pool())
        .await?;

        Ok(exists)
    }
}
