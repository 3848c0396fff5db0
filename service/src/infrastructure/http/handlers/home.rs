use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tera::Context;

use crate::domain::article::ArticleRepository;
use crate::infrastructure::http::WebState;
use crate::infrastructure::http::error::PageError;
use crate::infrastructure::http::handlers::{render, viewer};
use crate::infrastructure::http::session::Session;

pub const HOME_PATH: &str = "/";

pub async fn home<S: WebState>(
    State(state): State<S>,
    mut session: Session,
) -> Result<Response, PageError> {
    let viewer = viewer(&state, &session).await?;
    let articles = state
        .articles()
        .latest(state.site().latest_articles_on_home)
        .await?;

    let mut context = Context::new();
    context.insert("articles", &articles);
    let html = render(&state, &mut session, viewer.as_ref(), "main/home.html", context)?;
    Ok((session, html).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::article::{ArticleDraft, publish};
    use crate::test_utils::{TestState, admin_user, get};

    #[tokio::test]
    async fn test_home_shows_latest_articles() {
        let state = TestState::new();
        let author = admin_user(1);
        state.users.insert(author.clone());
        for (i, title) in ["Premier", "Deuxième", "Troisième", "Quatrième"].iter().enumerate() {
            let when = Utc::now() - Duration::hours(10 - i as i64);
            publish(&state.articles, &author, ArticleDraft::new(*title, "Du contenu"), when)
                .await
                .unwrap();
        }

        let response = state.send(get(HOME_PATH, None)).await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(!response.body.contains("Premier"));
        let newest = response.body.find("Quatrième").unwrap();
        let oldest_shown = response.body.find("Deuxième").unwrap();
        assert!(newest < oldest_shown);
    }
}
