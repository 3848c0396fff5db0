use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tera::Context;

use crate::domain::photo::{PhotoUpload, replace_photo};
use crate::domain::user::User;
use crate::infrastructure::http::WebState;
use crate::infrastructure::http::csrf::EDIT_PHOTO_TOKEN_ID;
use crate::infrastructure::http::error::PageError;
use crate::infrastructure::http::forms::{FORM_ERRORS, FormErrors, INVALID_CSRF_MESSAGE};
use crate::infrastructure::http::handlers::{csrf_token, csrf_valid, render, require_user};
use crate::infrastructure::http::session::Session;

pub const PROFILE_PATH: &str = "/mon-profil/";

const EDIT_PHOTO_TEMPLATE: &str = "main/edit_photo.html";
const PHOTO_FIELD: &str = "photo";

pub async fn profile<S: WebState>(
    State(state): State<S>,
    mut session: Session,
) -> Result<Response, PageError> {
    let user = require_user(&state, &session).await?;

    let html = render(&state, &mut session, Some(&user), "main/profil.html", Context::new())?;
    Ok((session, html).into_response())
}

fn edit_photo_form<S: WebState>(
    state: &S,
    session: &mut Session,
    user: &User,
    errors: &FormErrors,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token(state, session, EDIT_PHOTO_TOKEN_ID));
    context.insert("max_size", &human_size(state.site().photo_max_size_bytes));
    render(state, session, Some(user), EDIT_PHOTO_TEMPLATE, context)
}

pub async fn edit_photo_page<S: WebState>(
    State(state): State<S>,
    mut session: Session,
) -> Result<Response, PageError> {
    let user = require_user(&state, &session).await?;

    let html = edit_photo_form(&state, &mut session, &user, &FormErrors::default())?;
    Ok((session, html).into_response())
}

pub async fn edit_photo_submit<S: WebState>(
    State(state): State<S>,
    mut session: Session,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let user = require_user(&state, &session).await?;
    let max_size = state.site().photo_max_size_bytes;

    let submission = PhotoSubmission::read(multipart).await;
    let token_valid = csrf_valid(&state, &session, EDIT_PHOTO_TOKEN_ID, submission.token.as_deref());

    let mut errors = FormErrors::default();
    if !token_valid {
        errors.add(FORM_ERRORS, INVALID_CSRF_MESSAGE);
    }
    let upload = match submission.photo {
        _ if submission.too_large => {
            errors.add(PHOTO_FIELD, too_large_message(max_size));
            None
        }
        None => {
            errors.add(PHOTO_FIELD, "Veuillez sélectionner une photo.");
            None
        }
        Some(bytes) if bytes.len() > max_size => {
            errors.add(PHOTO_FIELD, too_large_message(max_size));
            None
        }
        Some(bytes) => {
            let upload = PhotoUpload::new(bytes);
            if upload.is_none() {
                errors.add(PHOTO_FIELD, "Le fichier doit être une image JPEG, PNG ou GIF.");
            }
            upload
        }
    };

    let upload = match upload {
        Some(upload) if errors.is_empty() => upload,
        _ => {
            let html = edit_photo_form(&state, &mut session, &user, &errors)?;
            return Ok((session, html).into_response());
        }
    };

    replace_photo(state.users(), state.photos(), state.image_cache(), &user, upload).await?;
    session.success("Photo de profil modifiée avec succès !");
    Ok((session, Redirect::to(PROFILE_PATH)).into_response())
}

/// What the photo form sent, read from the multipart body
#[derive(Debug, Default)]
struct PhotoSubmission {
    token: Option<String>,
    photo: Option<Vec<u8>>,
    /// the body went over the size limit while being read
    too_large: bool,
}

impl PhotoSubmission {
    async fn read(mut multipart: Multipart) -> Self {
        let mut submission = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    submission.reject(e);
                    break;
                }
            };

            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "_token" => submission.token = field.text().await.ok(),
                PHOTO_FIELD => {
                    // browsers send an empty part when no file was chosen
                    if field.file_name().is_none_or(str::is_empty) {
                        continue;
                    }
                    match field.bytes().await {
                        Ok(bytes) if !bytes.is_empty() => submission.photo = Some(bytes.to_vec()),
                        Ok(_) => {}
                        Err(e) => {
                            submission.reject(e);
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        submission
    }

    fn reject(&mut self, e: MultipartError) {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            self.too_large = true;
        } else {
            tracing::warn!("unreadable photo form: {}", e);
        }
    }
}

fn too_large_message(max_size: usize) -> String {
    format!(
        "Le fichier est trop volumineux. La taille maximale autorisée est de {}.",
        human_size(max_size)
    )
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} Mo", bytes / MIB)
    } else {
        format!("{} Ko", bytes.div_ceil(1024))
    }
}
