use blog_common::database::Database;

use crate::{
    domain::{AppState, SiteConfig},
    infrastructure::{
        http::{Security, WebState, templates::Templates},
        persistence::{PostgresArticleRepository, PostgresCommentRepository, PostgresUserRepository},
        settings::Settings,
        storage::{FsImageCache, FsPhotoStorage},
    },
};

pub mod http;
pub mod persistence;
pub mod settings;
pub mod storage;

#[derive(Clone)]
pub struct AppStateImpl {
    articles: PostgresArticleRepository,
    comments: PostgresCommentRepository,
    users: PostgresUserRepository,
    photos: FsPhotoStorage,
    image_cache: FsImageCache,
    site: SiteConfig,
    templates: Templates,
    security: Security,
}

impl AppStateImpl {
    /// Wires the PostgreSQL repositories and the file-system adapters together
    pub fn new(database: &'static Database, settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            articles: PostgresArticleRepository::new(database),
            comments: PostgresCommentRepository::new(database),
            users: PostgresUserRepository::new(database),
            photos: FsPhotoStorage::new(&settings.photos.directory),
            image_cache: FsImageCache::new(
                &settings.image_cache.directory,
                settings.image_cache.filters.clone(),
            ),
            site: settings.site_config(),
            templates: Templates::load(&settings.templates.directory)?,
            security: Security::new(&settings.security.secret, settings.security.secure_cookie)?,
        })
    }
}

impl AppState for AppStateImpl {
    type A = PostgresArticleRepository;
    type C = PostgresCommentRepository;
    type U = PostgresUserRepository;
    type P = FsPhotoStorage;
    type I = FsImageCache;

    fn articles(&self) -> &Self::A {
        &self.articles
    }

    fn comments(&self) -> &Self::C {
        &self.comments
    }

    fn users(&self) -> &Self::U {
        &self.users
    }

    fn photos(&self) -> &Self::P {
        &self.photos
    }

    fn image_cache(&self) -> &Self::I {
        &self.image_cache
    }

    fn site(&self) -> &SiteConfig {
        &self.site
    }
}

impl WebState for AppStateImpl {
    fn templates(&self) -> &Templates {
        &self.templates
    }

    fn security(&self) -> &Security {
        &self.security
    }
}
