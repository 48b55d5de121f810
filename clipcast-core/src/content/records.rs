use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{collections, document::timestamp};

/// Uploaded video. Media arrives as already-hosted URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    /// Seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub owner: Uuid,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub video: Uuid,
    pub owner: Uuid,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    /// Field on the like document holding the target id.
    pub fn field(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    /// Collection the target lives in.
    pub fn collection(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => collections::VIDEOS,
            LikeTarget::Comment(_) => collections::COMMENTS,
            LikeTarget::Tweet(_) => collections::TWEETS,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

/// A like has exactly one of `video`, `comment` or `tweet` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub liked_by: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<Uuid>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(liked_by: Uuid, target: LikeTarget) -> Self {
        let mut like = Self {
            id: Uuid::now_v7(),
            liked_by,
            video: None,
            comment: None,
            tweet: None,
            created_at: Utc::now(),
        };
        match target {
            LikeTarget::Video(id) => like.video = Some(id),
            LikeTarget::Comment(id) => like.comment = Some(id),
            LikeTarget::Tweet(id) => like.tweet = Some(id),
        }
        like
    }

    pub fn target(&self) -> Option<LikeTarget> {
        match (self.video, self.comment, self.tweet) {
            (Some(id), None, None) => Some(LikeTarget::Video(id)),
            (None, Some(id), None) => Some(LikeTarget::Comment(id)),
            (None, None, Some(id)) => Some(LikeTarget::Tweet(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub subscriber: Uuid,
    pub channel: Uuid,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Video ids in the order they were added
    #[serde(default)]
    pub videos: Vec<Uuid>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}
