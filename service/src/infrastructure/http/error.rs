use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::domain::RepositoryError;
use crate::domain::photo::PhotoError;

/// Where anonymous visitors of a protected page are sent
pub const LOGIN_PATH: &str = "/connexion/";

// PageError is what a page handler returns when it cannot render its page.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    NotFound,
    LoginRequired,
    AccessDenied,
    ConflictWithServerState(String),
    InternalServerError(String),
}

impl From<anyhow::Error> for PageError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<tera::Error> for PageError {
    fn from(e: tera::Error) -> Self {
        // the interesting part of a tera error is usually in its source chain
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::InternalServerError(message)
    }
}

impl From<RepositoryError> for PageError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::ValidationFailed(cause) => Self::InternalServerError(cause),
            RepositoryError::UniqueViolation(cause) => Self::ConflictWithServerState(cause),
            RepositoryError::DatabaseError(cause) => {
                tracing::error!("{:?}", cause);
                Self::InternalServerError("Database server error".to_string())
            }
        }
    }
}

impl From<PhotoError> for PageError {
    fn from(value: PhotoError) -> Self {
        match value {
            PhotoError::Repository(e) => e.into(),
            PhotoError::Storage(e) => Self::InternalServerError(format!("{:?}", e)),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        use PageError::*;

        match self {
            NotFound => error_page(StatusCode::NOT_FOUND, "Page introuvable"),
            LoginRequired => Redirect::to(LOGIN_PATH).into_response(),
            AccessDenied => error_page(StatusCode::FORBIDDEN, "Accès refusé"),
            ConflictWithServerState(message) => {
                tracing::warn!("{}", message);
                error_page(StatusCode::CONFLICT, "Conflit avec une donnée existante")
            }
            InternalServerError(e) => {
                tracing::error!("{}", e);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne du serveur")
            }
        }
    }
}

/// Bare page for errors, it must render even when templates are broken
fn error_page(status: StatusCode, title: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html lang=\"fr\"><head><meta charset=\"UTF-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p><a href=\"/\">Retour à l'accueil</a></p></body></html>"
    );
    (status, Html(body)).into_response()
}
