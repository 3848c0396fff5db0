use std::path::Path;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;
use tower_http::services::ServeDir;

use crate::domain::AppState;
use crate::infrastructure::http::csrf::CsrfTokens;
use crate::infrastructure::http::handlers::blog::{
    publication_comment, publication_delete, publication_edit_page, publication_edit_submit,
    publication_list, publication_new_page, publication_new_submit, publication_view,
};
use crate::infrastructure::http::handlers::home::home;
use crate::infrastructure::http::handlers::profile::{edit_photo_page, edit_photo_submit, profile};
use crate::infrastructure::http::handlers::security::{login_page, login_submit, logout};
use crate::infrastructure::http::handlers::{health_check, not_found};
use crate::infrastructure::http::session::SessionCodec;
use crate::infrastructure::http::templates::Templates;

pub mod csrf;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod querystring;
pub mod session;
pub mod templates;

// room for the multipart framing and the token around the photo itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state as the web layer sees it: the domain ports plus what
/// rendering pages and protecting forms needs.
pub trait WebState: AppState {
    fn templates(&self) -> &Templates;
    fn security(&self) -> &Security;
}

/// Keys derived from the configured secret
#[derive(Clone)]
pub struct Security {
    sessions: SessionCodec,
    csrf: CsrfTokens,
}

impl Security {
    pub fn new(secret: &str, secure_cookie: bool) -> anyhow::Result<Self> {
        Ok(Self {
            sessions: SessionCodec::new(secret.as_bytes(), secure_cookie)?,
            csrf: CsrfTokens::new(secret.as_bytes())?,
        })
    }

    pub fn sessions(&self) -> &SessionCodec {
        &self.sessions
    }

    pub fn csrf(&self) -> &CsrfTokens {
        &self.csrf
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
    /// stored profile photos, served under /images/profils
    pub photo_directory: &'a Path,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl WebState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("http_request", method = ?request.method(), uri)
            },
        );
        // see: https://github.com/metrics-rs/metrics
        // see: https://github.com/Ptrskay3/axum-prometheus
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = router(state, config.photo_directory)
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(trace_layer)
            .layer(prometheus_layer);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self
            .listener
            .local_addr()
            .context("listener has no local address")?;
        tracing::info!("listening on {}", address);
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

/// All pages of the site, without the server-level layers
pub fn router<S: WebState>(state: S, photo_directory: &Path) -> Router {
    let photo_body_limit = state.site().photo_max_size_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(home::<S>))
        .route("/health", get(health_check))
        .nest("/blog", blog_routes())
        .route("/mon-profil/", get(profile::<S>))
        .route(
            "/changer-photo-de-profil/",
            get(edit_photo_page::<S>)
                .post(edit_photo_submit::<S>)
                .layer(DefaultBodyLimit::max(photo_body_limit)),
        )
        .route("/connexion/", get(login_page::<S>).post(login_submit::<S>))
        .route("/deconnexion/", get(logout::<S>))
        .nest_service("/images/profils", ServeDir::new(photo_directory))
        .fallback(not_found)
        .with_state(state)
}

fn blog_routes<S: WebState>() -> Router<S> {
    Router::new()
        .route(
            "/nouvelle-publication/",
            get(publication_new_page::<S>).post(publication_new_submit::<S>),
        )
        .route("/publications/liste/", get(publication_list::<S>))
        .route(
            "/publication/{slug}/",
            get(publication_view::<S>).post(publication_comment::<S>),
        )
        .route("/publication/suppression/{id}/", get(publication_delete::<S>))
        .route(
            "/publication/modifier/{id}",
            get(publication_edit_page::<S>).post(publication_edit_submit::<S>),
        )
}
