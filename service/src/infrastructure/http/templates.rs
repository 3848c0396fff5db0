use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use axum::response::Html;
use tera::{Context, Tera};

use crate::infrastructure::http::error::PageError;

/// The compiled page templates, shared between requests
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn load(directory: &Path) -> anyhow::Result<Self> {
        let pattern = format!("{}/**/*.html", directory.display());
        let tera = Tera::new(&pattern)
            .with_context(|| format!("failed to load templates from {}", directory.display()))?;
        tracing::debug!("loaded {} templates", tera.get_template_names().count());
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, PageError> {
        Ok(Html(self.tera.render(name, context)?))
    }
}
