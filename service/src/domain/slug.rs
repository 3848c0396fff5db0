use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

use crate::domain::{
    RepositoryError,
    article::{ArticleId, ArticleRepository},
};

// Lowercase ASCII words joined by single dashes, e.g. "hello-world-2".
pub const SLUG_REGEX: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

static SLUG_REGEX_COMPILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_REGEX).expect("SLUG_REGEX must be a valid regex"));

const SLUG_MAX_LEN: usize = 255;
const SLUG_FALLBACK: &str = "publication";

pub fn is_url_safe(slug: &str) -> bool {
    SLUG_REGEX_COMPILED.is_match(slug)
}

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255, predicate = is_url_safe),
    derive(
        Clone,
        Debug,
        Display,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Slug(String);

/// Slugified title, cut so that a numeric suffix still fits the column.
fn base_slug(title: &str) -> String {
    let slug = slug::slugify(title);
    let slug: String = slug.chars().take(SLUG_MAX_LEN - 15).collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

/// Derives a slug from `title` that no other article uses. `except` is the
/// article being edited, whose own slug never counts as taken.
pub async fn unique_slug<R: ArticleRepository>(
    articles: &R,
    title: &str,
    except: Option<ArticleId>,
) -> Result<Slug, RepositoryError> {
    let base = base_slug(title);
    let mut candidate = base.clone();
    let mut suffix = 0u32;

    loop {
        let slug = Slug::try_new(candidate)
            .map_err(|e| RepositoryError::ValidationFailed(e.to_string()))?;

        if !articles.slug_exists(&slug, except).await? {
            return Ok(slug);
        }

        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}
