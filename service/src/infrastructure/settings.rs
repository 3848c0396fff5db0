use std::env;
use std::path::PathBuf;

use anyhow::Context;
use blog_common::DatabaseSettings;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::domain::SiteConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    pub database: DatabaseSettings,
    pub blog: BlogSettings,
    pub security: SecuritySettings,
    pub photos: PhotoSettings,
    pub image_cache: ImageCacheSettings,
    pub templates: TemplateSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogSettings {
    pub latest_articles_on_home: u32,
    pub articles_per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    /// signs session cookies and CSRF tokens
    pub secret: String,
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSettings {
    pub directory: PathBuf,
    pub max_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCacheSettings {
    pub directory: PathBuf,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSettings {
    pub directory: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("app").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize().with_context(|| "failed to read config")?;
        if settings.security.secret.len() < 32 {
            anyhow::bail!("security.secret must be at least 32 bytes long");
        }
        Ok(settings)
    }

    pub fn site_config(&self) -> SiteConfig {
        SiteConfig {
            latest_articles_on_home: self.blog.latest_articles_on_home,
            articles_per_page: self.blog.articles_per_page,
            photo_max_size_bytes: self.photos.max_size_bytes,
        }
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
