use axum::Form;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use blog_common::password::verify_password;
use tera::Context;

use crate::domain::user::{User, UserRepository};
use crate::infrastructure::http::WebState;
use crate::infrastructure::http::csrf::AUTHENTICATE_TOKEN_ID;
use crate::infrastructure::http::error::PageError;
use crate::infrastructure::http::forms::{FORM_ERRORS, FormErrors, LoginForm};
use crate::infrastructure::http::handlers::home::HOME_PATH;
use crate::infrastructure::http::handlers::{csrf_token, csrf_valid, render, viewer};
use crate::infrastructure::http::session::Session;

fn login_form<S: WebState>(
    state: &S,
    session: &mut Session,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token(state, session, AUTHENTICATE_TOKEN_ID));
    render(state, session, None, "security/login.html", context)
}

pub async fn login_page<S: WebState>(
    State(state): State<S>,
    mut session: Session,
) -> Result<Response, PageError> {
    if viewer(&state, &session).await?.is_some() {
        return Ok(Redirect::to(HOME_PATH).into_response());
    }

    let html = login_form(&state, &mut session, &LoginForm::default(), &FormErrors::default())?;
    Ok((session, html).into_response())
}

pub async fn login_submit<S: WebState>(
    State(state): State<S>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    if viewer(&state, &session).await?.is_some() {
        return Ok(Redirect::to(HOME_PATH).into_response());
    }

    let form = LoginForm {
        email: form.email.trim().to_string(),
        ..form
    };
    let token_valid = csrf_valid(&state, &session, AUTHENTICATE_TOKEN_ID, form.token.as_deref());
    let mut errors = FormErrors::check(&form, token_valid);

    if errors.is_empty() {
        match authenticate(state.users(), &form.email, &form.password).await? {
            Some(user) => {
                session.log_in(user.id);
                tracing::info!(user = %user.id, "user logged in");
                session.success("Vous êtes maintenant connecté.");
                return Ok((session, Redirect::to(HOME_PATH)).into_response());
            }
            None => {
                tracing::warn!(email = %form.email, "login refused");
                errors.add(FORM_ERRORS, "Identifiants invalides.");
            }
        }
    }

    let html = login_form(&state, &mut session, &form, &errors)?;
    Ok((session, html).into_response())
}

pub async fn logout<S: WebState>(mut session: Session) -> Response {
    if let Some(user) = session.user_id() {
        tracing::info!(user = %user, "user logged out");
    }
    session.log_out();
    session.success("Vous avez été déconnecté.");
    (session, Redirect::to(HOME_PATH)).into_response()
}

/// The user owning `email` when `password` matches its hash
async fn authenticate<U: UserRepository>(
    users: &U,
    email: &str,
    password: &str,
) -> Result<Option<User>, PageError> {
    let Some(user) = users.find_by_email(email).await? else {
        return Ok(None);
    };

    let password = password.to_string();
    let hash = user.password_hash.clone();
    // argon2 is deliberately slow, keep it off the request workers
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PageError::InternalServerError(e.to_string()))?;

    Ok(verified.then_some(user))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use blog_common::password::hash_password;

    use super::*;
    use crate::test_utils::{TestState, get, post_form, regular_user};

    fn with_password(id: i64, password: &str) -> User {
        User {
            password_hash: hash_password(password).unwrap(),
            ..regular_user(id)
        }
    }

    #[tokio::test]
    async fn test_login_opens_new_session() {
        let state = TestState::new();
        let user = with_password(2, "s3cret-pass");
        state.users.insert(user.clone());
        let session = state.session_for(None);
        let token = state.csrf_token(&session, AUTHENTICATE_TOKEN_ID);

        let response = state
            .send(post_form(
                "/connexion/",
                Some(&session),
                &[("email", " USER2@example.org "), ("password", "s3cret-pass"), ("_token", &token)],
            ))
            .await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some(HOME_PATH));
        assert_eq!(response.user_id(), Some(user.id));
        assert_ne!(response.session().unwrap().id, session.id);
        assert_eq!(response.flashes()[0].message, "Vous êtes maintenant connecté.");
    }

    #[tokio::test]
    async fn test_wrong_password_is_refused() {
        let state = TestState::new();
        state.users.insert(with_password(2, "s3cret-pass"));
        let session = state.session_for(None);
        let token = state.csrf_token(&session, AUTHENTICATE_TOKEN_ID);

        for (email, password) in [("user2@example.org", "guess"), ("nobody@example.org", "s3cret-pass")] {
            let response = state
                .send(post_form(
                    "/connexion/",
                    Some(&session),
                    &[("email", email), ("password", password), ("_token", &token)],
                ))
                .await;

            assert_eq!(response.status, StatusCode::OK);
            assert!(response.body.contains("Identifiants invalides."));
            assert!(response.user_id().is_none());
        }
    }

    #[tokio::test]
    async fn test_login_needs_token() {
        let state = TestState::new();
        state.users.insert(with_password(2, "s3cret-pass"));
        let session = state.session_for(None);

        let response = state
            .send(post_form(
                "/connexion/",
                Some(&session),
                &[("email", "user2@example.org"), ("password", "s3cret-pass")],
            ))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("Le jeton CSRF est invalide."));
        assert!(response.user_id().is_none());
    }

    #[tokio::test]
    async fn test_logged_in_user_skips_login_page() {
        let state = TestState::new();
        let user = regular_user(2);
        state.users.insert(user.clone());
        let session = state.session_for(Some(&user));

        let response = state.send(get("/connexion/", Some(&session))).await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some(HOME_PATH));
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let state = TestState::new();
        let user = regular_user(2);
        state.users.insert(user.clone());
        let session = state.session_for(Some(&user));

        let response = state.send(get("/deconnexion/", Some(&session))).await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert!(response.user_id().is_none());
        assert_eq!(response.flashes()[0].message, "Vous avez été déconnecté.");
    }
}
