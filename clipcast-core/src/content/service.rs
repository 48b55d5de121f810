use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::records::{Comment, Playlist, Tweet, Video};
use super::{
    ContentError, ContentResult, NewPlaylist, NewVideo, PlaylistUpdate, VideoUpdate, required,
};
use crate::catalog;
use crate::store::{
    Document, DocumentStore, Filter, UpdateOp, collections,
    document::{from_document, id_value, to_document},
};

/// Create, edit and delete videos, tweets, comments and playlists.
#[derive(Clone)]
pub struct ContentService {
    pub(super) store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for ContentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentService").finish_non_exhaustive()
    }
}

impl ContentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // Videos

    pub async fn create_video(&self, owner: Uuid, new: NewVideo) -> ContentResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::now_v7(),
            owner,
            title: required("title", &new.title)?,
            description: required("description", &new.description)?,
            video_file: required("videoFile", &new.video_file)?,
            thumbnail: required("thumbnail", &new.thumbnail)?,
            duration: new.duration.filter(|d| d.is_finite() && *d >= 0.0).unwrap_or(0.0),
            views: 0,
            is_published: new.is_published.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert(collections::VIDEOS, to_document(&video)?).await?;
        info!(video_id = %video.id, owner = %owner, "video created");
        Ok(from_document(stored)?)
    }

    pub async fn update_video(
        &self,
        caller: Uuid,
        video_id: Uuid,
        update: VideoUpdate,
    ) -> ContentResult<Video> {
        let mut ops = Vec::new();
        if let Some(title) = update.title {
            ops.push(UpdateOp::set("title", required("title", &title)?));
        }
        if let Some(description) = update.description {
            ops.push(UpdateOp::set("description", required("description", &description)?));
        }
        if let Some(thumbnail) = update.thumbnail {
            ops.push(UpdateOp::set("thumbnail", required("thumbnail", &thumbnail)?));
        }
        if ops.is_empty() {
            return Err(ContentError::Invalid(
                "one of title, description or thumbnail is required".into(),
            ));
        }
        self.update_owned(collections::VIDEOS, "video", caller, video_id, ops)
            .await
    }

    pub async fn toggle_publish(&self, caller: Uuid, video_id: Uuid) -> ContentResult<Video> {
        let current: Video = self
            .owned(collections::VIDEOS, "video", caller, video_id)
            .await?;
        self.update_owned(
            collections::VIDEOS,
            "video",
            caller,
            video_id,
            vec![UpdateOp::set("isPublished", !current.is_published)],
        )
        .await
    }

    /// Remove a video with its comments and every like pointing at it or at
    /// its comments.
    pub async fn delete_video(&self, caller: Uuid, video_id: Uuid) -> ContentResult<()> {
        self.delete_owned(collections::VIDEOS, "video", caller, video_id)
            .await?;

        let comments = self
            .store
            .find(collections::COMMENTS, &Filter::eq_id("video", video_id))
            .await?;
        let comment_ids: Vec<Value> = comments
            .iter()
            .filter_map(|comment| comment.get("_id").cloned())
            .collect();
        if !comment_ids.is_empty() {
            self.store
                .delete_many(collections::LIKES, &Filter::any_of("comment", comment_ids))
                .await?;
        }
        self.store
            .delete_many(collections::COMMENTS, &Filter::eq_id("video", video_id))
            .await?;
        self.store
            .delete_many(collections::LIKES, &Filter::eq_id("video", video_id))
            .await?;
        info!(video_id = %video_id, "video deleted");
        Ok(())
    }

    /// Fails with `NotFound` unless the video exists and is published or
    /// owned by `caller`.
    pub async fn ensure_video_visible(&self, caller: Uuid, video_id: Uuid) -> ContentResult<()> {
        let filter = Filter::by_id(video_id).and(catalog::visible_videos(Some(caller)));
        self.store
            .find_one(collections::VIDEOS, &filter)
            .await?
            .ok_or(ContentError::NotFound("video"))?;
        Ok(())
    }

    pub async fn record_view(&self, video_id: Uuid) -> ContentResult<()> {
        self.store
            .update_one(
                collections::VIDEOS,
                &Filter::by_id(video_id),
                &[UpdateOp::Increment("views".into(), 1)],
            )
            .await?
            .ok_or(ContentError::NotFound("video"))?;
        Ok(())
    }

    // Tweets

    pub async fn create_tweet(&self, owner: Uuid, content: &str) -> ContentResult<Tweet> {
        let now = Utc::now();
        let tweet = Tweet {
            id: Uuid::now_v7(),
            owner,
            content: required("content", content)?,
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert(collections::TWEETS, to_document(&tweet)?).await?;
        Ok(from_document(stored)?)
    }

    pub async fn update_tweet(
        &self,
        caller: Uuid,
        tweet_id: Uuid,
        content: &str,
    ) -> ContentResult<Tweet> {
        let ops = vec![UpdateOp::set("content", required("content", content)?)];
        self.update_owned(collections::TWEETS, "tweet", caller, tweet_id, ops)
            .await
    }

    pub async fn delete_tweet(&self, caller: Uuid, tweet_id: Uuid) -> ContentResult<()> {
        self.delete_owned(collections::TWEETS, "tweet", caller, tweet_id)
            .await?;
        self.store
            .delete_many(collections::LIKES, &Filter::eq_id("tweet", tweet_id))
            .await?;
        Ok(())
    }

    // Comments

    pub async fn add_comment(
        &self,
        owner: Uuid,
        video_id: Uuid,
        content: &str,
    ) -> ContentResult<Comment> {
        let content = required("content", content)?;
        self.ensure_video_visible(owner, video_id).await?;

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::now_v7(),
            video: video_id,
            owner,
            content,
            created_at: now,
            updated_at: now,
        };
        let stored = self
            .store
            .insert(collections::COMMENTS, to_document(&comment)?)
            .await?;
        Ok(from_document(stored)?)
    }

    pub async fn update_comment(
        &self,
        caller: Uuid,
        comment_id: Uuid,
        content: &str,
    ) -> ContentResult<Comment> {
        let ops = vec![UpdateOp::set("content", required("content", content)?)];
        self.update_owned(collections::COMMENTS, "comment", caller, comment_id, ops)
            .await
    }

    pub async fn delete_comment(&self, caller: Uuid, comment_id: Uuid) -> ContentResult<()> {
        self.delete_owned(collections::COMMENTS, "comment", caller, comment_id)
            .await?;
        self.store
            .delete_many(collections::LIKES, &Filter::eq_id("comment", comment_id))
            .await?;
        Ok(())
    }

    // Playlists

    pub async fn create_playlist(&self, owner: Uuid, new: NewPlaylist) -> ContentResult<Playlist> {
        let now = Utc::now();
        let playlist = Playlist {
            id: Uuid::now_v7(),
            owner,
            name: required("name", &new.name)?,
            description: new.description.unwrap_or_default().trim().to_string(),
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let stored = self
            .store
            .insert(collections::PLAYLISTS, to_document(&playlist)?)
            .await?;
        Ok(from_document(stored)?)
    }

    pub async fn update_playlist(
        &self,
        caller: Uuid,
        playlist_id: Uuid,
        update: PlaylistUpdate,
    ) -> ContentResult<Playlist> {
        let mut ops = Vec::new();
        if let Some(name) = update.name {
            ops.push(UpdateOp::set("name", required("name", &name)?));
        }
        if let Some(description) = update.description {
            ops.push(UpdateOp::set("description", description.trim()));
        }
        if ops.is_empty() {
            return Err(ContentError::Invalid("name or description is required".into()));
        }
        self.update_owned(collections::PLAYLISTS, "playlist", caller, playlist_id, ops)
            .await
    }

    pub async fn delete_playlist(&self, caller: Uuid, playlist_id: Uuid) -> ContentResult<()> {
        self.delete_owned(collections::PLAYLISTS, "playlist", caller, playlist_id)
            .await
    }

    /// Append a video; adding one that is already present changes nothing.
    pub async fn add_to_playlist(
        &self,
        caller: Uuid,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> ContentResult<Playlist> {
        self.ensure_video_visible(caller, video_id).await?;
        let ops = vec![UpdateOp::AddToSet("videos".into(), id_value(video_id))];
        self.update_owned(collections::PLAYLISTS, "playlist", caller, playlist_id, ops)
            .await
    }

    pub async fn remove_from_playlist(
        &self,
        caller: Uuid,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> ContentResult<Playlist> {
        let ops = vec![UpdateOp::Pull("videos".into(), id_value(video_id))];
        self.update_owned(collections::PLAYLISTS, "playlist", caller, playlist_id, ops)
            .await
    }

    // Ownership

    /// Load a document the caller owns.
    async fn owned<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        entity: &'static str,
        caller: Uuid,
        id: Uuid,
    ) -> ContentResult<T> {
        let doc = self
            .store
            .find_one(collection, &Filter::by_id(id))
            .await?
            .ok_or(ContentError::NotFound(entity))?;
        ensure_owner(&doc, entity, caller)?;
        Ok(from_document(doc)?)
    }

    /// Update only when the caller owns the document; the ownership check and
    /// the write happen in one atomic store update.
    async fn update_owned<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        entity: &'static str,
        caller: Uuid,
        id: Uuid,
        mut ops: Vec<UpdateOp>,
    ) -> ContentResult<T> {
        ops.push(UpdateOp::Touch);
        let filter = Filter::by_id(id).and(Filter::eq_id("owner", caller));
        match self.store.update_one(collection, &filter, &ops).await? {
            Some(doc) => Ok(from_document(doc)?),
            None => Err(self.missing_or_forbidden(collection, entity, id).await),
        }
    }

    async fn delete_owned(
        &self,
        collection: &str,
        entity: &'static str,
        caller: Uuid,
        id: Uuid,
    ) -> ContentResult<()> {
        let filter = Filter::by_id(id).and(Filter::eq_id("owner", caller));
        match self.store.delete_one(collection, &filter).await? {
            Some(_) => Ok(()),
            None => Err(self.missing_or_forbidden(collection, entity, id).await),
        }
    }

    async fn missing_or_forbidden(
        &self,
        collection: &str,
        entity: &'static str,
        id: Uuid,
    ) -> ContentError {
        match self.store.find_one(collection, &Filter::by_id(id)).await {
            Ok(Some(_)) => ContentError::Forbidden(entity),
            Ok(None) => ContentError::NotFound(entity),
            Err(err) => err.into(),
        }
    }
}

fn ensure_owner(doc: &Document, entity: &'static str, caller: Uuid) -> ContentResult<()> {
    if doc.get("owner") == Some(&id_value(caller)) {
        Ok(())
    } else {
        Err(ContentError::Forbidden(entity))
    }
}
