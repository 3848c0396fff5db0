use crate::domain::{
    article::ArticleRepository,
    comment::CommentRepository,
    photo::{ImageCache, PhotoStorage},
    user::UserRepository,
};

pub mod article;
pub mod comment;
pub mod pagination;
pub mod photo;
pub mod slug;
pub mod user;

/// Site-wide values the workflows read from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// how many articles the home page shows
    pub latest_articles_on_home: u32,
    pub articles_per_page: u32,
    /// upper bound for an uploaded profile photo
    pub photo_max_size_bytes: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latest_articles_on_home: 3,
            articles_per_page: 10,
            photo_max_size_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    ValidationFailed(String),
    UniqueViolation(String),
    DatabaseError(String),
}

//// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type A: ArticleRepository;
    type C: CommentRepository;
    type U: UserRepository;
    type P: PhotoStorage;
    type I: ImageCache;

    fn articles(&self) -> &Self::A;
    fn comments(&self) -> &Self::C;
    fn users(&self) -> &Self::U;
    fn photos(&self) -> &Self::P;
    fn image_cache(&self) -> &Self::I;
    fn site(&self) -> &SiteConfig;
}
