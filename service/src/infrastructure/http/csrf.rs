use anyhow::anyhow;
use hmac::Mac;

use crate::domain::article::ArticleId;
use crate::infrastructure::http::session::HmacSha256;

pub const PUBLICATION_TOKEN_ID: &str = "publication";
pub const COMMENT_TOKEN_ID: &str = "comment";
pub const EDIT_PHOTO_TOKEN_ID: &str = "edit_photo";
pub const AUTHENTICATE_TOKEN_ID: &str = "authenticate";

/// Token id guarding the deletion link of one article
pub fn delete_token_id(id: ArticleId) -> String {
    format!("blog_publication_delete{}", id)
}

/// Issues and checks CSRF tokens. A token is bound to the session id and to the
/// purpose (token id) of the form it protects, so no server-side storage is needed.
#[derive(Clone)]
pub struct CsrfTokens {
    mac: HmacSha256,
}

impl CsrfTokens {
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| anyhow!("invalid csrf key"))?;
        Ok(Self { mac })
    }

    fn keyed(&self, session_id: &str, token_id: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(b"csrf|");
        mac.update(session_id.as_bytes());
        mac.update(b"|");
        mac.update(token_id.as_bytes());
        mac
    }

    pub fn token(&self, session_id: &str, token_id: &str) -> String {
        hex::encode(self.keyed(session_id, token_id).finalize().into_bytes())
    }

    pub fn is_valid(&self, session_id: &str, token_id: &str, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        let Ok(bytes) = hex::decode(token) else {
            return false;
        };
        self.keyed(session_id, token_id).verify_slice(&bytes).is_ok()
    }
}
