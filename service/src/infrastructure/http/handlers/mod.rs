use axum::http::StatusCode;
use axum::response::Html;
use tera::Context;

use crate::domain::AppState;
use crate::domain::article::ArticleId;
use crate::domain::user::{User, UserRepository};
use crate::infrastructure::http::WebState;
use crate::infrastructure::http::error::PageError;
use crate::infrastructure::http::session::Session;

pub mod blog;
pub mod home;
pub mod profile;
pub mod security;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found() -> PageError {
    PageError::NotFound
}

/// The authenticated user, if any. A session pointing to a user that no
/// longer exists counts as anonymous.
pub(crate) async fn viewer<S: AppState>(state: &S, session: &Session) -> Result<Option<User>, PageError> {
    match session.user_id() {
        Some(id) => Ok(state.users().find_by_id(id).await?),
        None => Ok(None),
    }
}

pub(crate) async fn require_user<S: AppState>(state: &S, session: &Session) -> Result<User, PageError> {
    viewer(state, session).await?.ok_or(PageError::LoginRequired)
}

pub(crate) async fn require_admin<S: AppState>(state: &S, session: &Session) -> Result<User, PageError> {
    let user = require_user(state, session).await?;
    if !user.is_admin() {
        tracing::warn!(user = %user.id, "admin page refused");
        return Err(PageError::AccessDenied);
    }
    Ok(user)
}

/// Ids in paths are matched as text so that a malformed one is a 404 like an unknown one
pub(crate) fn parse_article_id(raw: &str) -> Result<ArticleId, PageError> {
    raw.parse().map(ArticleId).map_err(|_| PageError::NotFound)
}

/// Renders `template` with the values every page layout needs: the viewer
/// and the pending flash messages.
pub(crate) fn render<S: WebState>(
    state: &S,
    session: &mut Session,
    viewer: Option<&User>,
    template: &str,
    mut context: Context,
) -> Result<Html<String>, PageError> {
    context.insert("app_user", &viewer);
    context.insert("flashes", &session.take_flashes());
    state.templates().render(template, &context)
}

pub(crate) fn csrf_token<S: WebState>(state: &S, session: &Session, token_id: &str) -> String {
    state.security().csrf().token(session.id(), token_id)
}

pub(crate) fn csrf_valid<S: WebState>(
    state: &S,
    session: &Session,
    token_id: &str,
    token: Option<&str>,
) -> bool {
    let valid = state.security().csrf().is_valid(session.id(), token_id, token);
    if !valid {
        tracing::warn!(token_id, "rejected csrf token");
    }
    valid
}
