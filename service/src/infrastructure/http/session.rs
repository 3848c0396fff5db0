use std::convert::Infallible;

use anyhow::anyhow;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponseParts, ResponseParts};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::user::UserId;
use crate::infrastructure::http::WebState;

pub type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "blog_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionData {
    pub(crate) id: String,
    pub(crate) user_id: Option<UserId>,
    #[serde(default)]
    pub(crate) flashes: Vec<Flash>,
}

impl SessionData {
    pub(crate) fn fresh(user_id: Option<UserId>) -> Self {
        Self {
            id: new_session_id(),
            user_id,
            flashes: Vec::new(),
        }
    }
}

fn new_session_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Turns session data into a signed cookie value and back.
///
/// The value is `base64url(json) "." hex(hmac)`; anything that does not verify
/// is treated as no session at all.
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: &[u8], secure: bool) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| anyhow!("invalid session key"))?;
        Ok(Self { mac, secure })
    }

    fn signature(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(b"session|");
        mac.update(payload.as_bytes());
        mac
    }

    pub(crate) fn encode(&self, data: &SessionData) -> String {
        // serializing plain strings and integers cannot fail
        let json = serde_json::to_vec(data).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.signature(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    pub(crate) fn decode(&self, value: &str) -> Option<SessionData> {
        let (payload, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        self.signature(payload).verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

/// The visitor's session, read from and written back to the session cookie.
///
/// Handlers take it as an extractor and return it as a response part so that
/// changes made during the request reach the browser.
pub struct Session {
    data: SessionData,
    codec: SessionCodec,
    changed: bool,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.data.user_id
    }

    /// Binds the session to `user_id` under a new identifier
    pub fn log_in(&mut self, user_id: UserId) {
        self.data.id = new_session_id();
        self.data.user_id = Some(user_id);
        self.changed = true;
    }

    pub fn log_out(&mut self) {
        self.data = SessionData::fresh(None);
        self.changed = true;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Error, message.into());
    }

    fn flash(&mut self, level: FlashLevel, message: String) {
        self.data.flashes.push(Flash { level, message });
        self.changed = true;
    }

    /// Hands out the pending flash messages, they are shown only once
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if !self.data.flashes.is_empty() {
            self.changed = true;
        }
        std::mem::take(&mut self.data.flashes)
    }

    fn cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.codec.encode(&self.data)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.codec.secure)
            .build()
    }
}

impl<S: WebState> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = state.security().sessions().clone();

        let data = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .filter(|cookie| cookie.name() == SESSION_COOKIE)
            .find_map(|cookie| codec.decode(cookie.value()));

        Ok(match data {
            Some(data) => Session {
                data,
                codec,
                changed: false,
            },
            None => Session {
                data: SessionData::fresh(None),
                codec,
                changed: true,
            },
        })
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.changed {
            match HeaderValue::from_str(&self.cookie().to_string()) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!("session cookie is not a valid header: {}", e),
            }
        }
        Ok(res)
    }
}
