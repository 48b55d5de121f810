use std::fmt;

use serde::Deserialize;
use uuid::Uuid;

use crate::accounts::ProfileUpdate;
use crate::auth::LoginCredential;
use crate::content::LikeTarget;
use crate::readmodel::PageRequest;
use crate::store::{SortDirection, SortSpec};

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(flatten)]
    pub credential: LoginCredential,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("credential", &self.credential)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(request: ProfileRequest) -> Self {
        ProfileUpdate {
            display_name: request.display_name,
            email: request.email,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

impl fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChangeRequest { .. }")
    }
}

/// New avatar or cover image, already hosted.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

/// Body of tweet creation and of tweet/comment edits.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    pub video_id: Uuid,
    pub content: String,
}

/// Body of the like endpoints; each route reads its own id field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub tweet_id: Option<Uuid>,
}

impl LikeRequest {
    pub fn video(&self) -> Option<LikeTarget> {
        self.video_id.map(LikeTarget::Video)
    }

    pub fn comment(&self) -> Option<LikeTarget> {
        self.comment_id.map(LikeTarget::Comment)
    }

    pub fn tweet(&self) -> Option<LikeTarget> {
        self.tweet_id.map(LikeTarget::Tweet)
    }
}

/// Query string shared by listing endpoints. Everything arrives as text so
/// malformed paging values fall back to defaults instead of rejecting the
/// request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub subscriber_id: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }

    /// Requested sort, if a field was named. An unrecognised direction
    /// means descending.
    pub fn sort(&self) -> Option<SortSpec> {
        let field = self.sort_by.as_deref().map(str::trim).filter(|f| !f.is_empty())?;
        let direction = self
            .sort_type
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or_default();
        Some(SortSpec::new(field, direction))
    }
}
