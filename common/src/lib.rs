pub mod database;
pub mod password;
pub mod role;

// Persisted table names

pub const USERS_TABLE: &str = "users";
pub const ARTICLES_TABLE: &str = "articles";
pub const COMMENTS_TABLE: &str = "comments";

// Shared column names

pub const ID_FIELD_NAME: &str = "id";
pub const AUTHOR_ID_FIELD_NAME: &str = "author_id";
pub const ARTICLE_ID_FIELD_NAME: &str = "article_id";
pub const PUBLICATION_DATE_FIELD_NAME: &str = "publication_date";

pub use database::{Database, DatabaseSettings};
pub use role::Role;
