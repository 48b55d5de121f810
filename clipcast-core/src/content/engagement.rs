use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::records::{Comment, Like, LikeTarget, Subscription};
use super::service::ContentService;
use super::{ContentError, ContentResult};
use crate::store::{
    Filter, collections,
    document::{from_document, id_value, to_document},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    /// Likes on the target after the toggle
    pub likes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionToggle {
    pub subscribed: bool,
    pub subscribers: u64,
}

/// Channel dashboard totals. `likes` counts likes received on the channel's
/// videos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub videos: u64,
    pub views: u64,
    pub likes: u64,
    pub subscribers: u64,
}

impl ContentService {
    /// Like the target, or remove the caller's like when one exists.
    pub async fn toggle_like(&self, caller: Uuid, target: LikeTarget) -> ContentResult<LikeToggle> {
        let found = self
            .store
            .find_one(target.collection(), &Filter::by_id(target.id()))
            .await?
            .ok_or(ContentError::NotFound(entity_name(target)))?;
        match target {
            LikeTarget::Video(video) => self.ensure_video_visible(caller, video).await?,
            LikeTarget::Comment(_) => {
                let comment: Comment = from_document(found)?;
                match self.ensure_video_visible(caller, comment.video).await {
                    Err(ContentError::NotFound(_)) => {
                        return Err(ContentError::NotFound("comment"));
                    }
                    other => other?,
                }
            }
            LikeTarget::Tweet(_) => {}
        }

        let on_target = Filter::eq_id(target.field(), target.id());
        let mine = Filter::eq_id("likedBy", caller).and(on_target.clone());

        let liked = match self.store.delete_one(collections::LIKES, &mine).await? {
            Some(_) => false,
            None => {
                // A concurrent toggle that already inserted leaves the like in place.
                self.store
                    .insert_if_absent(
                        collections::LIKES,
                        &mine,
                        to_document(&Like::new(caller, target))?,
                    )
                    .await?;
                true
            }
        };
        let likes = self.store.count(collections::LIKES, &on_target).await?;
        debug!(caller = %caller, target = ?target, liked, likes, "like toggled");
        Ok(LikeToggle { liked, likes })
    }

    pub async fn toggle_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> ContentResult<SubscriptionToggle> {
        if subscriber == channel {
            return Err(ContentError::Invalid(
                "cannot subscribe to your own channel".into(),
            ));
        }
        self.store
            .find_one(collections::USERS, &Filter::by_id(channel))
            .await?
            .ok_or(ContentError::NotFound("channel"))?;

        let of_channel = Filter::eq_id("channel", channel);
        let existing = Filter::eq_id("subscriber", subscriber).and(of_channel.clone());

        let subscribed = match self
            .store
            .delete_one(collections::SUBSCRIPTIONS, &existing)
            .await?
        {
            Some(_) => false,
            None => {
                let subscription = Subscription {
                    id: Uuid::now_v7(),
                    subscriber,
                    channel,
                    created_at: chrono::Utc::now(),
                };
                self.store
                    .insert_if_absent(
                        collections::SUBSCRIPTIONS,
                        &existing,
                        to_document(&subscription)?,
                    )
                    .await?;
                true
            }
        };
        let subscribers = self
            .store
            .count(collections::SUBSCRIPTIONS, &of_channel)
            .await?;
        debug!(subscriber = %subscriber, channel = %channel, subscribed, "subscription toggled");
        Ok(SubscriptionToggle {
            subscribed,
            subscribers,
        })
    }

    pub async fn channel_stats(&self, channel: Uuid) -> ContentResult<ChannelStats> {
        let videos = self
            .store
            .find(collections::VIDEOS, &Filter::eq_id("owner", channel))
            .await?;

        let views = videos
            .iter()
            .filter_map(|video| video.get("views").and_then(Value::as_u64))
            .sum();
        let video_ids: Vec<Value> = videos
            .iter()
            .filter_map(|video| video.get("_id").cloned())
            .collect();
        let likes = if video_ids.is_empty() {
            0
        } else {
            self.store
                .count(collections::LIKES, &Filter::any_of("video", video_ids))
                .await?
        };
        let subscribers = self
            .store
            .count(collections::SUBSCRIPTIONS, &Filter::eq("channel", id_value(channel)))
            .await?;

        Ok(ChannelStats {
            videos: videos.len() as u64,
            views,
            likes,
            subscribers,
        })
    }
}

fn entity_name(target: LikeTarget) -> &'static str {
    match target {
        LikeTarget::Video(_) => "video",
        LikeTarget::Comment(_) => "comment",
        LikeTarget::Tweet(_) => "tweet",
    }
}
