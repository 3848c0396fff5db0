use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use blog_common::Role;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::domain::article::{
    Article, ArticleChanges, ArticleId, ArticleRepository, Author, NewArticle,
};
use crate::domain::comment::{Comment, CommentId, CommentRepository, NewComment};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::photo::{ImageCache, PhotoStorage, StorageError};
use crate::domain::slug::Slug;
use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::{AppState, RepositoryError, SiteConfig};
use crate::infrastructure::http::session::{Flash, SESSION_COOKIE, SessionData};
use crate::infrastructure::http::templates::Templates;
use crate::infrastructure::http::{Security, WebState, router};

pub const TEST_SECRET: &str = "test secret that is long enough for hmac";

pub fn admin_user(id: i64) -> User {
    User {
        role: Role::Admin,
        ..regular_user(id)
    }
}

pub fn regular_user(id: i64) -> User {
    User {
        id: UserId(id),
        email: format!("user{id}@example.org"),
        password_hash: String::new(),
        pseudonym: format!("pseudo{id}"),
        role: Role::User,
        photo: None,
        registration_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// A 1x1 transparent PNG
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// Just enough of a JPEG for format detection
pub fn jpeg_bytes() -> Vec<u8> {
    vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0xFF, 0xD9,
    ]
}

// In-memory ports

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUsers {
    pub fn with(users: Vec<User>) -> Self {
        let store = Self::default();
        for user in users {
            store.insert(user);
        }
        store
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn author(&self, id: UserId) -> Author {
        self.get(id).map(|user| user.as_author()).unwrap_or(Author {
            id,
            pseudonym: format!("user{id}"),
            photo: None,
        })
    }
}

impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_photo(&self, id: UserId, photo: &str) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.photo = Some(photo.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryArticles {
    articles: Arc<Mutex<Vec<Article>>>,
    users: InMemoryUsers,
}

impl InMemoryArticles {
    pub fn with_users(users: InMemoryUsers) -> Self {
        Self {
            articles: Arc::default(),
            users,
        }
    }

    pub fn all(&self) -> Vec<Article> {
        self.articles.lock().unwrap().clone()
    }
}

impl ArticleRepository for InMemoryArticles {
    async fn create(&self, article: NewArticle) -> Result<Article, RepositoryError> {
        let mut articles = self.articles.lock().unwrap();
        if articles.iter().any(|a| a.slug == article.slug) {
            return Err(RepositoryError::UniqueViolation(article.slug.to_string()));
        }
        let id = articles.iter().map(|a| a.id.0).max().unwrap_or(0) + 1;
        let created = Article {
            id: ArticleId(id),
            title: article.title,
            content: article.content,
            slug: article.slug,
            publication_date: article.publication_date,
            author: self.users.author(article.author_id),
        };
        articles.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: ArticleId, changes: ArticleChanges) -> Result<Article, RepositoryError> {
        let mut articles = self.articles.lock().unwrap();
        if articles.iter().any(|a| a.slug == changes.slug && a.id != id) {
            return Err(RepositoryError::UniqueViolation(changes.slug.to_string()));
        }
        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        article.title = changes.title;
        article.content = changes.content;
        article.slug = changes.slug;
        Ok(article.clone())
    }

    async fn delete(&self, id: ArticleId) -> Result<(), RepositoryError> {
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        if articles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        Ok(self.all().into_iter().find(|a| a.id == id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepositoryError> {
        Ok(self.all().into_iter().find(|a| a.slug.as_ref() == slug))
    }

    async fn latest(&self, limit: u32) -> Result<Vec<Article>, RepositoryError> {
        Ok(newest_first(self.all()).into_iter().take(limit as usize).collect())
    }

    async fn page(&self, request: PageRequest) -> Result<Page<Article>, RepositoryError> {
        let all = newest_first(self.all());
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();
        Ok(Page::new(items, request, total))
    }

    async fn slug_exists(&self, slug: &Slug, except: Option<ArticleId>) -> Result<bool, RepositoryError> {
        Ok(self
            .all()
            .iter()
            .any(|a| &a.slug == slug && Some(a.id) != except))
    }
}

fn newest_first(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| {
        b.publication_date
            .cmp(&a.publication_date)
            .then(b.id.0.cmp(&a.id.0))
    });
    articles
}

#[derive(Clone, Default)]
pub struct InMemoryComments {
    comments: Arc<Mutex<Vec<Comment>>>,
    users: InMemoryUsers,
}

impl InMemoryComments {
    pub fn with_users(users: InMemoryUsers) -> Self {
        Self {
            comments: Arc::default(),
            users,
        }
    }

    pub fn all(&self) -> Vec<Comment> {
        self.comments.lock().unwrap().clone()
    }
}

impl CommentRepository for InMemoryComments {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let mut comments = self.comments.lock().unwrap();
        let created = Comment {
            id: CommentId(comments.len() as i64 + 1),
            content: comment.content,
            publication_date: comment.publication_date,
            author: self.users.author(comment.author_id),
            article_id: comment.article_id,
        };
        comments.push(created.clone());
        Ok(created)
    }

    async fn for_article(&self, article_id: ArticleId) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self
            .all()
            .into_iter()
            .filter(|c| c.article_id == article_id)
            .collect();
        comments.sort_by_key(|c| (c.publication_date, c.id.0));
        Ok(comments)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPhotos {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    removals: Arc<Mutex<Vec<String>>>,
}

impl InMemoryPhotos {
    pub fn put(&self, file_name: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(file_name.to_string(), bytes);
    }

    pub fn read(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(file_name).cloned()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.lock().unwrap().contains_key(file_name)
    }

    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().unwrap().clone()
    }
}

impl PhotoStorage for InMemoryPhotos {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.put(file_name, bytes);
        Ok(())
    }

    async fn exists(&self, file_name: &str) -> bool {
        self.contains(file_name)
    }

    async fn remove(&self, file_name: &str) -> Result<(), StorageError> {
        self.files.lock().unwrap().remove(file_name);
        self.removals.lock().unwrap().push(file_name.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingImageCache {
    removed: Arc<Mutex<Vec<String>>>,
}

impl RecordingImageCache {
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl ImageCache for RecordingImageCache {
    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

// Application state and HTTP helpers

#[derive(Clone)]
pub struct TestState {
    pub articles: InMemoryArticles,
    pub comments: InMemoryComments,
    pub users: InMemoryUsers,
    pub photos: InMemoryPhotos,
    pub image_cache: RecordingImageCache,
    pub site: SiteConfig,
    templates: Templates,
    security: Security,
}

impl TestState {
    pub fn new() -> Self {
        let users = InMemoryUsers::default();
        let templates_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        Self {
            articles: InMemoryArticles::with_users(users.clone()),
            comments: InMemoryComments::with_users(users.clone()),
            users,
            photos: InMemoryPhotos::default(),
            image_cache: RecordingImageCache::default(),
            site: SiteConfig::default(),
            templates: Templates::load(&templates_dir).unwrap(),
            security: Security::new(TEST_SECRET, false).unwrap(),
        }
    }

    pub fn router(&self) -> Router {
        let photo_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests-photos");
        router(self.clone(), &photo_dir)
    }

    /// A signed session cookie as the browser of `user` would send it
    pub fn session_for(&self, user: Option<&User>) -> TestSession {
        let data = SessionData::fresh(user.map(|user| user.id));
        TestSession {
            id: data.id.clone(),
            cookie: format!("{}={}", SESSION_COOKIE, self.security.sessions().encode(&data)),
        }
    }

    pub fn csrf_token(&self, session: &TestSession, token_id: &str) -> String {
        self.security.csrf().token(&session.id, token_id)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            security: self.security.clone(),
        }
    }
}

impl AppState for TestState {
    type A = InMemoryArticles;
    type C = InMemoryComments;
    type U = InMemoryUsers;
    type P = InMemoryPhotos;
    type I = RecordingImageCache;

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

impl WebState for TestState {
    fn templates(&self) -> &Templates {
        &self.templates
    }

    fn security(&self) -> &Security {
        &self.security
    }
}

#[derive(Debug, Clone)]
pub struct TestSession {
    pub id: String,
    /// value of the `Cookie` request header
    pub cookie: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    security: Security,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    fn session_data(&self) -> Option<SessionData> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| cookie::Cookie::parse(v).ok())
            .filter(|c| c.name() == SESSION_COOKIE)
            .find_map(|c| self.security.sessions().decode(c.value()))
    }

    /// The session the browser holds after this response
    pub fn session(&self) -> Option<TestSession> {
        let data = self.session_data()?;
        Some(TestSession {
            cookie: format!("{}={}", SESSION_COOKIE, self.security.sessions().encode(&data)),
            id: data.id,
        })
    }

    pub fn flashes(&self) -> Vec<Flash> {
        self.session_data().map(|data| data.flashes).unwrap_or_default()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session_data().and_then(|data| data.user_id)
    }
}

pub fn get(uri: &str, session: Option<&TestSession>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(session) = session {
        builder = builder.header(COOKIE, &session.cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, session: Option<&TestSession>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{}={}", url_encode(key), url_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(session) = session {
        builder = builder.header(COOKIE, &session.cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

const BOUNDARY: &str = "blog-test-boundary";

/// A multipart photo form with an optional file part
pub fn post_photo(
    uri: &str,
    session: &TestSession,
    token: &str,
    photo: Option<(&str, Vec<u8>)>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"_token\"\r\n\r\n{token}\r\n"
        )
        .as_bytes(),
    );
    if let Some((file_name, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(COOKIE, &session.cookie)
        .body(Body::from(body))
        .unwrap()
}

fn url_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
