use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize, Serializer};
use validator::{Validate, ValidationErrors};

use crate::domain::article::{Article, ArticleDraft};

pub const INVALID_CSRF_MESSAGE: &str = "Le jeton CSRF est invalide. Veuillez renvoyer le formulaire.";

/// Key of errors that concern the whole form rather than one field
pub const FORM_ERRORS: &str = "form";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ArticleForm {
    #[serde(default)]
    #[validate(length(min = 2, max = 150, message = "Le titre doit contenir entre 2 et 150 caractères."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(
        min = 2,
        max = 50000,
        message = "Le contenu doit contenir entre 2 et 50000 caractères."
    ))]
    pub content: String,
    #[serde(default, rename = "_token", skip_serializing)]
    pub token: Option<String>,
}

impl ArticleForm {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            token: self.token,
        }
    }

    pub fn draft(&self) -> ArticleDraft {
        ArticleDraft::new(&self.title, &self.content)
    }
}

impl From<&Article> for ArticleForm {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(
        min = 2,
        max = 2000,
        message = "Le commentaire doit contenir entre 2 et 2000 caractères."
    ))]
    pub content: String,
    #[serde(default, rename = "_token", skip_serializing)]
    pub token: Option<String>,
}

impl CommentForm {
    pub fn trimmed(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
            token: self.token,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Veuillez saisir votre adresse email."))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "Veuillez saisir votre mot de passe."))]
    pub password: String,
    #[serde(default, rename = "_token", skip_serializing)]
    pub token: Option<String>,
}

/// Messages to show next to form fields, keyed by field name.
///
/// Templates receive them as a flat list of `{field, message}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

#[derive(Serialize)]
struct FieldError<'a> {
    field: &'a str,
    message: &'a str,
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |message| FieldError { field, message })
        }))
    }
}

impl FormErrors {
    /// Field errors of a bound form, plus the CSRF error when its token did not verify
    pub fn check<F: Validate>(form: &F, token_valid: bool) -> Self {
        let mut errors = match form.validate() {
            Ok(()) => Self::default(),
            Err(e) => Self::from(&e),
        };
        if !token_valid {
            errors.add(FORM_ERRORS, INVALID_CSRF_MESSAGE);
        }
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let grouped = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    (field.to_string(), message)
                })
            })
            .into_group_map();
        Self(grouped.into_iter().collect())
    }
}
