use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::accounts::PublicAccount;
use crate::auth::TokenPair;
use crate::readmodel::Page;

/// Envelope wrapping every API response. `success` mirrors
/// `statusCode < 400`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            data,
            success: status_code < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, Some(data), message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(201, Some(data), message)
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload; `data` serializes as `null`.
    pub fn empty(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(status_code, None, message)
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(status_code, None, message)
    }
}

/// Payload of a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: PublicAccount,
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionResponse {
    pub fn new(user: PublicAccount, tokens: &TokenPair) -> Self {
        Self {
            user,
            access_token: tokens.access.token.clone(),
            refresh_token: tokens.refresh.token.clone(),
        }
    }
}

/// Payload of a successful refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenPair> for TokenResponse {
    fn from(tokens: &TokenPair) -> Self {
        Self {
            access_token: tokens.access.token.clone(),
            refresh_token: tokens.refresh.token.clone(),
        }
    }
}

/// A page serialized under an entity-specific key:
/// `{"<key>": [...], "total": n, "page": p, "limit": l, "totalPages": t}`.
#[derive(Debug, Clone)]
pub struct Listing {
    key: &'static str,
    page: Page,
}

impl Listing {
    pub fn new(key: &'static str, page: Page) -> Self {
        Self { key, page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(self.key, &self.page.items)?;
        map.serialize_entry("total", &self.page.total)?;
        map.serialize_entry("page", &self.page.page)?;
        map.serialize_entry("limit", &self.page.limit)?;
        map.serialize_entry("totalPages", &self.page.total_pages())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::readmodel::PageRequest;

    #[test]
    fn success_follows_status_code() {
        let ok = serde_json::to_value(ApiResponse::ok(1, "fine")).unwrap();
        assert_eq!(
            ok,
            json!({ "statusCode": 200, "message": "fine", "data": 1, "success": true })
        );

        let err = serde_json::to_value(ApiResponse::error(401, "unauthorized")).unwrap();
        assert_eq!(err["success"], json!(false));
        assert!(err["data"].is_null());
    }

    #[test]
    fn listing_uses_entity_key() {
        let page = Page {
            items: vec![json!({ "_id": "a" }).as_object().cloned().unwrap()],
            total: 3,
            ..Page::empty(PageRequest::new(2, 1))
        };
        let value = serde_json::to_value(Listing::new("comments", page)).unwrap();
        assert_eq!(value["comments"][0]["_id"], json!("a"));
        assert_eq!(value["total"], json!(3));
        assert_eq!(value["page"], json!(2));
        assert_eq!(value["totalPages"], json!(3));
    }
}
