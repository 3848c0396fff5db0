use std::num::IntErrorKind;

use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::domain::AppState;
use crate::domain::article::{Article, ArticleId, ArticleRepository, publish, revise};
use crate::domain::comment::{CommentRepository, comment_article};
use crate::domain::pagination::PageRequest;
use crate::domain::user::User;
use crate::infrastructure::http::WebState;
use crate::infrastructure::http::csrf::{COMMENT_TOKEN_ID, PUBLICATION_TOKEN_ID, delete_token_id};
use crate::infrastructure::http::error::PageError;
use crate::infrastructure::http::forms::{ArticleForm, CommentForm, FormErrors};
use crate::infrastructure::http::handlers::{
    csrf_token, csrf_valid, parse_article_id, render, require_admin, viewer,
};
use crate::infrastructure::http::querystring::QueryString;
use crate::infrastructure::http::session::Session;

pub const LIST_PATH: &str = "/blog/publications/liste/";

const NEW_TEMPLATE: &str = "blog/publication_new.html";
const EDIT_TEMPLATE: &str = "blog/publication_edit.html";
const LIST_TEMPLATE: &str = "blog/publication_list.html";
const VIEW_TEMPLATE: &str = "blog/publication_view.html";

pub fn publication_path(article: &Article) -> String {
    format!("/blog/publication/{}/", article.slug)
}

fn edit_path(id: ArticleId) -> String {
    format!("/blog/publication/modifier/{}", id)
}

fn delete_path<S: WebState>(state: &S, session: &Session, id: ArticleId) -> String {
    let token = csrf_token(state, session, &delete_token_id(id));
    format!("/blog/publication/suppression/{}/?csrf_token={}", id, token)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
}

impl ListParams {
    /// Page 1 when absent, 0 when not a number. Out of range integers saturate.
    fn page_number(&self) -> i64 {
        let Some(raw) = self.page.as_deref().map(str::trim) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(number) => number,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => 0,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    csrf_token: Option<String>,
}

/// An article as listed, with the admin actions the viewer may use
#[derive(Debug, Serialize)]
struct ArticleEntry {
    article: Article,
    edit_url: Option<String>,
    delete_url: Option<String>,
}

impl ArticleEntry {
    fn new<S: WebState>(state: &S, session: &Session, viewer: Option<&User>, article: Article) -> Self {
        let is_admin = viewer.is_some_and(User::is_admin);
        let edit_url = is_admin.then(|| edit_path(article.id));
        let delete_url = is_admin.then(|| delete_path(state, session, article.id));
        Self {
            article,
            edit_url,
            delete_url,
        }
    }
}

async fn article_by_slug<S: AppState>(state: &S, slug: &str) -> Result<Article, PageError> {
    state.articles().find_by_slug(slug).await?.ok_or(PageError::NotFound)
}

async fn article_by_id<S: AppState>(state: &S, raw_id: &str) -> Result<Article, PageError> {
    let id = parse_article_id(raw_id)?;
    state.articles().find_by_id(id).await?.ok_or(PageError::NotFound)
}

fn article_form_page<S: WebState>(
    state: &S,
    session: &mut Session,
    admin: &User,
    template: &str,
    form: &ArticleForm,
    errors: &FormErrors,
    article: Option<&Article>,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token(state, session, PUBLICATION_TOKEN_ID));
    if let Some(article) = article {
        context.insert("article", article);
    }
    render(state, session, Some(admin), template, context)
}

pub async fn publication_new_page<S: WebState>(
    State(state): State<S>,
    mut session: Session,
) -> Result<Response, PageError> {
    let admin = require_admin(&state, &session).await?;

    let page = article_form_page(
        &state,
        &mut session,
        &admin,
        NEW_TEMPLATE,
        &ArticleForm::default(),
        &FormErrors::default(),
        None,
    )?;
    Ok((session, page).into_response())
}

pub async fn publication_new_submit<S: WebState>(
    State(state): State<S>,
    mut session: Session,
    Form(form): Form<ArticleForm>,
) -> Result<Response, PageError> {
    let admin = require_admin(&state, &session).await?;
    let form = form.trimmed();

    let token_valid = csrf_valid(&state, &session, PUBLICATION_TOKEN_ID, form.token.as_deref());
    let errors = FormErrors::check(&form, token_valid);
    if !errors.is_empty() {
        let page =
            article_form_page(&state, &mut session, &admin, NEW_TEMPLATE, &form, &errors, None)?;
        return Ok((session, page).into_response());
    }

    let article = publish(state.articles(), &admin, form.draft(), Utc::now()).await?;
    session.success("Article publié avec succès !");
    Ok((session, Redirect::to(&publication_path(&article))).into_response())
}

pub async fn publication_list<S: WebState>(
    State(state): State<S>,
    mut session: Session,
    QueryString(params): QueryString<ListParams>,
) -> Result<Response, PageError> {
    let request = PageRequest::new(params.page_number(), state.site().articles_per_page)
        .ok_or(PageError::NotFound)?;
    let viewer = viewer(&state, &session).await?;

    let page = state.articles().page(request).await?;
    let page_count = page.page_count();
    let (has_previous, has_next) = (page.has_previous(), page.has_next());
    let page = page.map(|article| ArticleEntry::new(&state, &session, viewer.as_ref(), article));

    let mut context = Context::new();
    context.insert("page", &page);
    context.insert("page_count", &page_count);
    context.insert("has_previous", &has_previous);
    context.insert("has_next", &has_next);
    let html = render(&state, &mut session, viewer.as_ref(), LIST_TEMPLATE, context)?;
    Ok((session, html).into_response())
}

/// The detail page. The comment form is only part of it for authenticated viewers.
async fn publication_page<S: WebState>(
    state: &S,
    session: &mut Session,
    viewer: Option<&User>,
    article: Article,
    form: &CommentForm,
    errors: &FormErrors,
) -> Result<Html<String>, PageError> {
    let comments = state.comments().for_article(article.id).await?;

    let mut context = Context::new();
    context.insert("comments", &comments);
    if viewer.is_some() {
        context.insert("comment_form", form);
        context.insert("errors", errors);
        context.insert("csrf_token", &csrf_token(state, session, COMMENT_TOKEN_ID));
    }
    context.insert("entry", &ArticleEntry::new(state, session, viewer, article));
    render(state, session, viewer, VIEW_TEMPLATE, context)
}

pub async fn publication_view<S: WebState>(
    State(state): State<S>,
    Path(slug): Path<String>,
    mut session: Session,
) -> Result<Response, PageError> {
    let article = article_by_slug(&state, &slug).await?;
    let viewer = viewer(&state, &session).await?;

    let page = publication_page(
        &state,
        &mut session,
        viewer.as_ref(),
        article,
        &CommentForm::default(),
        &FormErrors::default(),
    )
    .await?;
    Ok((session, page).into_response())
}

pub async fn publication_comment<S: WebState>(
    State(state): State<S>,
    Path(slug): Path<String>,
    mut session: Session,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, PageError> {
    let article = article_by_slug(&state, &slug).await?;
    let viewer = viewer(&state, &session).await?;

    let (form, errors) = match &viewer {
        // anonymous submissions are dropped whatever their body, the page renders as on GET
        None => (CommentForm::default(), FormErrors::default()),
        Some(author) => {
            let form = match form {
                Ok(Form(form)) => form.trimmed(),
                Err(rejection) => return Ok(rejection.into_response()),
            };
            let token_valid = csrf_valid(&state, &session, COMMENT_TOKEN_ID, form.token.as_deref());
            let errors = FormErrors::check(&form, token_valid);
            if errors.is_empty() {
                comment_article(state.comments(), author, &article, form.content, Utc::now()).await?;
                session.success("Votre commentaire a été publié avec succès !");
                (CommentForm::default(), errors)
            } else {
                (form, errors)
            }
        }
    };

    let page =
        publication_page(&state, &mut session, viewer.as_ref(), article, &form, &errors).await?;
    Ok((session, page).into_response())
}

pub async fn publication_delete<S: WebState>(
    State(state): State<S>,
    Path(id): Path<String>,
    mut session: Session,
    QueryString(params): QueryString<DeleteParams>,
) -> Result<Response, PageError> {
    require_admin(&state, &session).await?;
    let article = article_by_id(&state, &id).await?;

    let token_id = delete_token_id(article.id);
    if csrf_valid(&state, &session, &token_id, params.csrf_token.as_deref()) {
        state.articles().delete(article.id).await?;
        tracing::info!(article = %article.slug, id = %article.id, "article deleted");
        session.success("La publication a été supprimée avec succès !");
    } else {
        session.error("Token sécurité invalide, veuillez ré-essayer.");
    }
    Ok((session, Redirect::to(LIST_PATH)).into_response())
}

pub async fn publication_edit_page<S: WebState>(
    State(state): State<S>,
    Path(id): Path<String>,
    mut session: Session,
) -> Result<Response, PageError> {
    let admin = require_admin(&state, &session).await?;
    let article = article_by_id(&state, &id).await?;

    let page = article_form_page(
        &state,
        &mut session,
        &admin,
        EDIT_TEMPLATE,
        &ArticleForm::from(&article),
        &FormErrors::default(),
        Some(&article),
    )?;
    Ok((session, page).into_response())
}

pub async fn publication_edit_submit<S: WebState>(
    State(state): State<S>,
    Path(id): Path<String>,
    mut session: Session,
    Form(form): Form<ArticleForm>,
) -> Result<Response, PageError> {
    let admin = require_admin(&state, &session).await?;
    let article = article_by_id(&state, &id).await?;
    let form = form.trimmed();

    let token_valid = csrf_valid(&state, &session, PUBLICATION_TOKEN_ID, form.token.as_deref());
    let errors = FormErrors::check(&form, token_valid);
    if !errors.is_empty() {
        let page = article_form_page(
            &state,
            &mut session,
            &admin,
            EDIT_TEMPLATE,
            &form,
            &errors,
            Some(&article),
        )?;
        return Ok((session, page).into_response());
    }

    let updated = revise(state.articles(), &article, form.draft()).await?;
    session.success("Publication modifiée avec succès !");
    Ok((session, Redirect::to(&publication_path(&updated))).into_response())
}
