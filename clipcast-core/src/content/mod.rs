//! Content records and the write side of the platform.
//!
//! Reads go through [`crate::catalog`]; everything here creates, edits or
//! deletes documents. Mutations of content owned by another account fail
//! with [`ContentError::Forbidden`].

use serde::Deserialize;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::store::StoreError;

mod engagement;
mod records;
mod service;

pub use engagement::{ChannelStats, LikeToggle, SubscriptionToggle};
pub use records::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, Video};
pub use service::ContentService;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you do not own this {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ContentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContentError::Invalid(_) => ErrorKind::Validation,
            ContentError::NotFound(_) => ErrorKind::NotFound,
            ContentError::Forbidden(_) => ErrorKind::Forbidden,
            ContentError::Store(err) => err.kind(),
        }
    }
}

pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Trimmed value, or a validation error naming the field.
pub(crate) fn required(field: &str, value: &str) -> ContentResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ContentError::Invalid(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
