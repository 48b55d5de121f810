use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;

use axum_test::TestServer;
use clipcast_core::store::{Filter, collections};
use support::{Session, bearer, build_test_app, create_video, signed_up};

async fn toggle_publish(server: &TestServer, session: &Session, video: &str) {
    server
        .patch(&format!("/api/v1/videos/{video}/publish"))
        .add_header("Authorization", bearer(&session.access))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn comment_pages_are_newest_first_with_stable_totals() -> Result<()> {
    let app = build_test_app()?;
    let author = signed_up(&app.server, "ada").await;
    let video = create_video(&app.server, &author, "engines").await;

    for content in ["first", "second", "third"] {
        app.server
            .post("/api/v1/comments")
            .add_header("Authorization", bearer(&author.access))
            .json(&json!({ "videoId": video, "content": content }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page = app
        .server
        .get(&format!("/api/v1/comments?videoId={video}&page=2&limit=1"))
        .add_header("Authorization", bearer(&author.access))
        .await;
    page.assert_status_ok();
    let body: Value = page.json();
    let data = &body["data"];
    assert_eq!(data["total"], 3);
    assert_eq!(data["page"], 2);
    assert_eq!(data["limit"], 1);
    assert_eq!(data["totalPages"], 3);
    let comments = data["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "second");
    assert_eq!(comments[0]["owner"]["handle"], "ada");
    assert!(comments[0]["owner"].get("email").is_none());
    assert_eq!(comments[0]["likesCount"], 0);
    assert_eq!(comments[0]["isLiked"], false);

    // Malformed paging falls back to page 1, limit 10
    let fallback = app
        .server
        .get(&format!("/api/v1/comments?videoId={video}&page=abc&limit=-4"))
        .add_header("Authorization", bearer(&author.access))
        .await;
    let body: Value = fallback.json();
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 10);
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["comments"][0]["content"], "third");

    let missing = app
        .server
        .get("/api/v1/comments")
        .add_header("Authorization", bearer(&author.access))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn like_toggle_flips_and_never_duplicates() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "grace").await;
    let fan = signed_up(&app.server, "linus").await;
    let video = create_video(&app.server, &owner, "cobol").await;

    let like = |session: &support::Session| {
        app.server
            .post("/api/v1/like/video")
            .add_header("Authorization", bearer(&session.access))
            .json(&json!({ "videoId": video }))
    };

    let first: Value = like(&fan).await.json();
    assert_eq!(first["data"], json!({ "liked": true, "likes": 1 }));

    let second: Value = like(&fan).await.json();
    assert_eq!(second["data"], json!({ "liked": false, "likes": 0 }));

    like(&fan).await.assert_status_ok();
    let other: Value = like(&owner).await.json();
    assert_eq!(other["data"], json!({ "liked": true, "likes": 2 }));

    let detail: Value = app
        .server
        .get(&format!("/api/v1/videos/{video}"))
        .add_header("Authorization", bearer(&fan.access))
        .await
        .json();
    assert_eq!(detail["data"]["likesCount"], 2);
    assert_eq!(detail["data"]["isLiked"], true);

    let liked: Value = app
        .server
        .get("/api/v1/like/videos")
        .add_header("Authorization", bearer(&fan.access))
        .await
        .json();
    assert_eq!(liked["data"]["total"], 1);
    assert_eq!(liked["data"]["videos"][0]["title"], "cobol");
    assert_eq!(liked["data"]["videos"][0]["owner"]["handle"], "grace");

    let missing_field = app
        .server
        .post("/api/v1/like/video")
        .add_header("Authorization", bearer(&fan.access))
        .json(&json!({ "commentId": video }))
        .await;
    missing_field.assert_status(StatusCode::BAD_REQUEST);

    let unknown = app
        .server
        .post("/api/v1/like/tweet")
        .add_header("Authorization", bearer(&fan.access))
        .json(&json!({ "tweetId": video }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn only_owners_may_change_their_content() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "owner").await;
    let intruder = signed_up(&app.server, "intruder").await;
    let video = create_video(&app.server, &owner, "mine").await;

    let edit = app
        .server
        .patch(&format!("/api/v1/videos/{video}"))
        .add_header("Authorization", bearer(&intruder.access))
        .json(&json!({ "title": "theirs" }))
        .await;
    edit.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(edit.json::<Value>()["success"], false);

    let delete = app
        .server
        .delete(&format!("/api/v1/videos/{video}"))
        .add_header("Authorization", bearer(&intruder.access))
        .await;
    delete.assert_status(StatusCode::FORBIDDEN);

    let tweet: Value = app
        .server
        .post("/api/v1/tweets")
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "content": "hello" }))
        .await
        .json();
    let tweet_id = tweet["data"]["_id"].as_str().unwrap().to_string();
    app.server
        .patch(&format!("/api/v1/tweets/{tweet_id}"))
        .add_header("Authorization", bearer(&intruder.access))
        .json(&json!({ "content": "hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let gone = app
        .server
        .patch(&format!("/api/v1/videos/{}", uuid::Uuid::now_v7()))
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "title": "ghost" }))
        .await;
    gone.assert_status(StatusCode::NOT_FOUND);

    let malformed = app
        .server
        .get("/api/v1/videos/not-a-uuid")
        .add_header("Authorization", bearer(&owner.access))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);

    let renamed = app
        .server
        .patch(&format!("/api/v1/videos/{video}"))
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "title": "  renamed  " }))
        .await;
    renamed.assert_status_ok();
    assert_eq!(renamed.json::<Value>()["data"]["title"], "renamed");
    Ok(())
}

#[tokio::test]
async fn unpublished_videos_are_visible_to_their_owner_only() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "studio").await;
    let viewer = signed_up(&app.server, "viewer").await;
    let draft = create_video(&app.server, &owner, "draft").await;
    create_video(&app.server, &owner, "public").await;

    app.server
        .patch(&format!("/api/v1/videos/{draft}/publish"))
        .add_header("Authorization", bearer(&owner.access))
        .await
        .assert_status_ok();

    let as_owner: Value = app
        .server
        .get(&format!("/api/v1/videos?userId={}", owner.user_id))
        .add_header("Authorization", bearer(&owner.access))
        .await
        .json();
    assert_eq!(as_owner["data"]["total"], 2);

    let as_viewer: Value = app
        .server
        .get(&format!("/api/v1/videos?userId={}", owner.user_id))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .json();
    assert_eq!(as_viewer["data"]["total"], 1);
    assert_eq!(as_viewer["data"]["videos"][0]["title"], "public");

    app.server
        .get(&format!("/api/v1/videos/{draft}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/v1/videos/{draft}"))
        .add_header("Authorization", bearer(&owner.access))
        .await
        .assert_status_ok();

    let dashboard: Value = app
        .server
        .get("/api/v1/dashboard/videos")
        .add_header("Authorization", bearer(&owner.access))
        .await
        .json();
    assert_eq!(dashboard["data"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn drafts_stay_hidden_from_other_accounts_everywhere() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "studio").await;
    let viewer = signed_up(&app.server, "viewer").await;
    let clip = create_video(&app.server, &owner, "clip").await;
    let draft = create_video(&app.server, &owner, "secret draft").await;
    toggle_publish(&app.server, &owner, &draft).await;

    let playlist = app
        .server
        .post("/api/v1/playlists")
        .add_header("Authorization", bearer(&viewer.access))
        .json(&json!({ "name": "Later" }))
        .await
        .json::<Value>()["data"]["_id"]
        .as_str()
        .unwrap()
        .to_string();

    app.server
        .post("/api/v1/like/video")
        .add_header("Authorization", bearer(&viewer.access))
        .json(&json!({ "videoId": draft }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .post("/api/v1/comments")
        .add_header("Authorization", bearer(&viewer.access))
        .json(&json!({ "videoId": draft, "content": "found it" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/v1/comments?videoId={draft}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .put(&format!("/api/v1/playlists/{playlist}/videos/{draft}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Engage with a public video, then have its owner unpublish it.
    app.server
        .get(&format!("/api/v1/videos/{clip}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .assert_status_ok();
    app.server
        .post("/api/v1/like/video")
        .add_header("Authorization", bearer(&viewer.access))
        .json(&json!({ "videoId": clip }))
        .await
        .assert_status_ok();
    app.server
        .put(&format!("/api/v1/playlists/{playlist}/videos/{clip}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .assert_status_ok();
    toggle_publish(&app.server, &owner, &clip).await;

    let liked: Value = app
        .server
        .get("/api/v1/like/videos")
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .json();
    assert_eq!(liked["data"]["total"], 0);
    assert_eq!(liked["data"]["videos"], json!([]));

    let history: Value = app
        .server
        .get("/api/v1/users/me/history")
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .json();
    assert_eq!(history["data"], json!([]));

    let detail: Value = app
        .server
        .get(&format!("/api/v1/playlists/{playlist}"))
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .json();
    assert_eq!(detail["data"]["videos"], json!([]));

    // The owner still reaches their drafts.
    app.server
        .post("/api/v1/like/video")
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "videoId": draft }))
        .await
        .assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn watching_counts_views_and_fills_history() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "channel").await;
    let viewer = signed_up(&app.server, "watcher").await;
    let first = create_video(&app.server, &owner, "first").await;
    let second = create_video(&app.server, &owner, "second").await;

    for video in [&first, &second, &first] {
        app.server
            .get(&format!("/api/v1/videos/{video}"))
            .add_header("Authorization", bearer(&viewer.access))
            .await
            .assert_status_ok();
    }

    let history: Value = app
        .server
        .get("/api/v1/users/me/history")
        .add_header("Authorization", bearer(&viewer.access))
        .await
        .json();
    let entries = history["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["_id"], first.as_str());
    assert_eq!(entries[1]["_id"], second.as_str());
    assert_eq!(entries[0]["owner"]["handle"], "channel");

    let stats: Value = app
        .server
        .get("/api/v1/dashboard/stats")
        .add_header("Authorization", bearer(&owner.access))
        .await
        .json();
    assert_eq!(stats["data"]["videos"], 2);
    assert_eq!(stats["data"]["views"], 3);
    Ok(())
}

#[tokio::test]
async fn subscriptions_toggle_and_list_both_directions() -> Result<()> {
    let app = build_test_app()?;
    let creator = signed_up(&app.server, "creator").await;
    let fan = signed_up(&app.server, "fan").await;

    let subscribe: Value = app
        .server
        .post(&format!("/api/v1/subscriptions/{}", creator.user_id))
        .add_header("Authorization", bearer(&fan.access))
        .await
        .json();
    assert_eq!(subscribe["data"], json!({ "subscribed": true, "subscribers": 1 }));

    app.server
        .post(&format!("/api/v1/subscriptions/{}", fan.user_id))
        .add_header("Authorization", bearer(&fan.access))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let subscribers: Value = app
        .server
        .get("/api/v1/subscriptions/subscribers")
        .add_header("Authorization", bearer(&creator.access))
        .await
        .json();
    assert_eq!(subscribers["data"]["total"], 1);
    assert_eq!(subscribers["data"]["subscribers"][0]["handle"], "fan");

    let channels: Value = app
        .server
        .get(&format!(
            "/api/v1/subscriptions/channels?subscriberId={}",
            fan.user_id
        ))
        .add_header("Authorization", bearer(&creator.access))
        .await
        .json();
    assert_eq!(channels["data"]["channels"][0]["handle"], "creator");

    let profile: Value = app
        .server
        .get("/api/v1/users/channel/CREATOR")
        .add_header("Authorization", bearer(&fan.access))
        .await
        .json();
    assert_eq!(profile["data"]["subscribersCount"], 1);
    assert_eq!(profile["data"]["isSubscribed"], true);
    assert!(profile["data"].get("email").is_none());

    app.server
        .get("/api/v1/users/channel/nobody")
        .add_header("Authorization", bearer(&fan.access))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let unsubscribe: Value = app
        .server
        .post(&format!("/api/v1/subscriptions/{}", creator.user_id))
        .add_header("Authorization", bearer(&fan.access))
        .await
        .json();
    assert_eq!(
        unsubscribe["data"],
        json!({ "subscribed": false, "subscribers": 0 })
    );
    Ok(())
}

#[tokio::test]
async fn playlists_hold_each_video_once() -> Result<()> {
    let app = build_test_app()?;
    let curator = signed_up(&app.server, "curator").await;
    let video = create_video(&app.server, &curator, "clip").await;

    let created = app
        .server
        .post("/api/v1/playlists")
        .add_header("Authorization", bearer(&curator.access))
        .json(&json!({ "name": "Favourites" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let playlist = created.json::<Value>()["data"]["_id"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..2 {
        app.server
            .put(&format!("/api/v1/playlists/{playlist}/videos/{video}"))
            .add_header("Authorization", bearer(&curator.access))
            .await
            .assert_status_ok();
    }

    let detail: Value = app
        .server
        .get(&format!("/api/v1/playlists/{playlist}"))
        .add_header("Authorization", bearer(&curator.access))
        .await
        .json();
    assert_eq!(detail["data"]["videoCount"], 1);
    assert_eq!(detail["data"]["videos"][0]["title"], "clip");
    assert_eq!(detail["data"]["owner"]["handle"], "curator");

    let removed: Value = app
        .server
        .delete(&format!("/api/v1/playlists/{playlist}/videos/{video}"))
        .add_header("Authorization", bearer(&curator.access))
        .await
        .json();
    assert_eq!(removed["data"]["videos"], json!([]));

    let listing: Value = app
        .server
        .get("/api/v1/playlists")
        .add_header("Authorization", bearer(&curator.access))
        .await
        .json();
    assert_eq!(listing["data"]["total"], 1);
    assert_eq!(listing["data"]["playlists"][0]["videoCount"], 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_video_removes_its_comments() -> Result<()> {
    let app = build_test_app()?;
    let owner = signed_up(&app.server, "remover").await;
    let video = create_video(&app.server, &owner, "doomed").await;

    app.server
        .post("/api/v1/comments")
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "videoId": video, "content": "soon gone" }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .delete(&format!("/api/v1/videos/{video}"))
        .add_header("Authorization", bearer(&owner.access))
        .await
        .assert_status_ok();

    app.server
        .get(&format!("/api/v1/comments?videoId={video}"))
        .add_header("Authorization", bearer(&owner.access))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let remaining = app
        .state
        .store
        .count(collections::COMMENTS, &Filter::All)
        .await?;
    assert_eq!(remaining, 0);

    app.server
        .post("/api/v1/comments")
        .add_header("Authorization", bearer(&owner.access))
        .json(&json!({ "videoId": video, "content": "too late" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}
