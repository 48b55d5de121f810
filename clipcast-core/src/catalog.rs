//! Listing and detail views for each entity.
//!
//! Every function returns a [`ListingSpec`]; handlers pass it to the
//! [`ReadModelComposer`](crate::readmodel::ReadModelComposer) together with
//! the page request and the caller. Joined accounts are always reduced to
//! [`PROFILE_FIELDS`].

use serde_json::Value;
use uuid::Uuid;

use crate::accounts::{PROFILE_FIELDS, normalize_identifier};
use crate::readmodel::{DerivedField, JoinSpec, ListingSpec, Projection};
use crate::store::{Filter, collections, document::ID_FIELD};

/// Fields of a video row in listings.
const VIDEO_FIELDS: &[&str] = &[
    "_id",
    "owner",
    "title",
    "description",
    "videoFile",
    "thumbnail",
    "duration",
    "views",
    "isPublished",
    "createdAt",
    "updatedAt",
];

const VIDEO_SORT_FIELDS: &[&str] = &["views", "duration", "title", "updatedAt"];

fn owner_profile() -> JoinSpec {
    JoinSpec::to_one(collections::USERS, "owner", ID_FIELD, "owner").retain(PROFILE_FIELDS)
}

/// Likes pointing at each record through `field`, reduced to who liked.
fn likes_on(field: &str) -> JoinSpec {
    JoinSpec::many(collections::LIKES, ID_FIELD, field, "likes").retain(&["likedBy"])
}

fn like_counters() -> [DerivedField; 2] {
    [
        DerivedField::count("likesCount", "likes"),
        DerivedField::contains_caller("isLiked", "likes", Some("likedBy")),
    ]
}

fn with_fields(base: &[&str], extra: &[&str]) -> Projection {
    let fields: Vec<&str> = base.iter().chain(extra).copied().collect();
    Projection::fields(&fields)
}

fn published() -> Filter {
    Filter::eq("isPublished", Value::Bool(true))
}

/// Videos `caller` may see: every published video plus their own drafts.
pub fn visible_videos(caller: Option<Uuid>) -> Filter {
    match caller {
        Some(caller) => Filter::Or(vec![published(), Filter::eq_id("owner", caller)]),
        None => published(),
    }
}

/// Joined video rows with their owner, limited to what `caller` may see.
fn visible_video_rows(join: JoinSpec, caller: Uuid) -> JoinSpec {
    join.matching(visible_videos(Some(caller)))
        .retain(VIDEO_FIELDS)
        .join(owner_profile())
}

fn video_listing(filter: Filter) -> ListingSpec {
    ListingSpec::new(collections::VIDEOS)
        .matching(filter)
        .join(owner_profile())
        .project(Projection::fields(VIDEO_FIELDS))
        .sortable(VIDEO_SORT_FIELDS)
}

/// Every published video.
pub fn published_videos() -> ListingSpec {
    video_listing(published())
}

/// One channel's videos. Unpublished videos are included only when asked,
/// which callers do for the channel owner.
pub fn videos_by_owner(owner: Uuid, include_unpublished: bool) -> ListingSpec {
    let filter = Filter::eq_id("owner", owner);
    if include_unpublished {
        video_listing(filter)
    } else {
        video_listing(filter.and(published()))
    }
}

/// Owner dashboard: every video of the channel with its like count.
pub fn channel_videos(owner: Uuid) -> ListingSpec {
    ListingSpec::new(collections::VIDEOS)
        .matching(Filter::eq_id("owner", owner))
        .join(likes_on("video"))
        .derive(DerivedField::count("likesCount", "likes"))
        .project(with_fields(VIDEO_FIELDS, &["likesCount"]))
        .sortable(VIDEO_SORT_FIELDS)
        .sortable(&["likesCount"])
}

/// A single video as seen by `caller`. Unpublished videos resolve only for
/// their owner.
pub fn video_detail(video: Uuid, caller: Option<Uuid>) -> ListingSpec {
    let [count, liked] = like_counters();
    ListingSpec::new(collections::VIDEOS)
        .matching(Filter::by_id(video).and(visible_videos(caller)))
        .join(owner_profile())
        .join(likes_on("video"))
        .derive(count)
        .derive(liked)
        .project(with_fields(VIDEO_FIELDS, &["likesCount", "isLiked"]))
}

/// Comments on a video, newest first, with author and like counters.
pub fn video_comments(video: Uuid) -> ListingSpec {
    let [count, liked] = like_counters();
    ListingSpec::new(collections::COMMENTS)
        .matching(Filter::eq_id("video", video))
        .join(owner_profile())
        .join(likes_on("comment"))
        .derive(count)
        .derive(liked)
        .project(Projection::fields(&[
            "_id",
            "video",
            "content",
            "owner",
            "likesCount",
            "isLiked",
            "createdAt",
            "updatedAt",
        ]))
        .sortable(&["likesCount"])
}

pub fn tweets_by_owner(owner: Uuid) -> ListingSpec {
    let [count, liked] = like_counters();
    ListingSpec::new(collections::TWEETS)
        .matching(Filter::eq_id("owner", owner))
        .join(owner_profile())
        .join(likes_on("tweet"))
        .derive(count)
        .derive(liked)
        .project(Projection::fields(&[
            "_id",
            "content",
            "owner",
            "likesCount",
            "isLiked",
            "createdAt",
            "updatedAt",
        ]))
}

/// Videos the caller liked, most recently liked first. Likes whose video
/// is gone or no longer visible to the caller are skipped.
pub fn liked_videos(caller: Uuid) -> ListingSpec {
    ListingSpec::new(collections::LIKES)
        .matching(Filter::eq_id("likedBy", caller).and(Filter::exists("video")))
        .join(visible_video_rows(
            JoinSpec::to_one(collections::VIDEOS, "video", ID_FIELD, "video").required(),
            caller,
        ))
        .project(Projection::all().with_root("video"))
}

/// Accounts subscribed to `channel`.
pub fn channel_subscribers(channel: Uuid) -> ListingSpec {
    ListingSpec::new(collections::SUBSCRIPTIONS)
        .matching(Filter::eq_id("channel", channel))
        .join(
            JoinSpec::to_one(collections::USERS, "subscriber", ID_FIELD, "subscriber")
                .required()
                .retain(PROFILE_FIELDS),
        )
        .project(Projection::all().with_root("subscriber"))
}

/// Channels `subscriber` follows.
pub fn subscribed_channels(subscriber: Uuid) -> ListingSpec {
    ListingSpec::new(collections::SUBSCRIPTIONS)
        .matching(Filter::eq_id("subscriber", subscriber))
        .join(
            JoinSpec::to_one(collections::USERS, "channel", ID_FIELD, "channel")
                .required()
                .retain(PROFILE_FIELDS),
        )
        .project(Projection::all().with_root("channel"))
}

/// Public channel page looked up by handle, with subscription counters and
/// whether the caller is subscribed.
pub fn channel_profile(handle: &str) -> ListingSpec {
    ListingSpec::new(collections::USERS)
        .matching(Filter::eq("handle", normalize_identifier(handle)))
        .join(
            JoinSpec::many(collections::SUBSCRIPTIONS, ID_FIELD, "channel", "subscribers")
                .retain(&["subscriber"]),
        )
        .join(
            JoinSpec::many(collections::SUBSCRIPTIONS, ID_FIELD, "subscriber", "subscribedTo")
                .retain(&["channel"]),
        )
        .derive(DerivedField::count("subscribersCount", "subscribers"))
        .derive(DerivedField::count("channelsSubscribedToCount", "subscribedTo"))
        .derive(DerivedField::contains_caller(
            "isSubscribed",
            "subscribers",
            Some("subscriber"),
        ))
        .project(Projection::fields(&[
            "_id",
            "handle",
            "displayName",
            "avatar",
            "cover",
            "subscribersCount",
            "channelsSubscribedToCount",
            "isSubscribed",
            "createdAt",
        ]))
}

/// The account's watch history in viewing order, each video with its owner.
/// Videos unpublished since they were watched drop out. The single resulting
/// record holds the list under `watchHistory`.
pub fn watch_history(account: Uuid) -> ListingSpec {
    ListingSpec::new(collections::USERS)
        .matching(Filter::by_id(account))
        .join(visible_video_rows(
            JoinSpec::many(collections::VIDEOS, "watchHistory", ID_FIELD, "watchHistory"),
            account,
        ))
        .project(Projection::fields(&["watchHistory"]))
}

pub fn playlists_by_owner(owner: Uuid) -> ListingSpec {
    ListingSpec::new(collections::PLAYLISTS)
        .matching(Filter::eq_id("owner", owner))
        .derive(DerivedField::count("videoCount", "videos"))
        .project(Projection::fields(&[
            "_id",
            "name",
            "description",
            "videoCount",
            "createdAt",
            "updatedAt",
        ]))
        .sortable(&["name", "updatedAt"])
}

/// A playlist with its videos in playlist order, as seen by `caller`.
/// Deleted videos and other accounts' unpublished videos drop out.
pub fn playlist_detail(playlist: Uuid, caller: Uuid) -> ListingSpec {
    ListingSpec::new(collections::PLAYLISTS)
        .matching(Filter::by_id(playlist))
        .join(visible_video_rows(
            JoinSpec::many(collections::VIDEOS, "videos", ID_FIELD, "videos"),
            caller,
        ))
        .join(owner_profile())
        .derive(DerivedField::count("videoCount", "videos"))
        .project(Projection::fields(&[
            "_id",
            "name",
            "description",
            "owner",
            "videos",
            "videoCount",
            "createdAt",
            "updatedAt",
        ]))
}
