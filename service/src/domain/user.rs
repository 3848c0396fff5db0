use std::fmt;
use std::future::Future;

use blog_common::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RepositoryError, article::Author};

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub pseudonym: String,
    pub role: Role,
    /// file name inside the photo directory
    pub photo: Option<String>,
    pub registration_date: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn as_author(&self) -> Author {
        Author {
            id: self.id,
            pseudonym: self.pseudonym.clone(),
            photo: self.photo.clone(),
        }
    }
}

pub trait UserRepository: Clone + Send + Sync + 'static {
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Record the profile photo file name of a user
    fn update_photo(
        &self,
        id: UserId,
        photo: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
