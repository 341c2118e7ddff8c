use reqwest::Method;
use serde_json::Value;

use crate::common::{FilePart, TestApp, routes};

fn titles(res: &Value) -> Vec<String> {
    res["data"]["docs"]
        .as_array()
        .expect("docs should be an array")
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect()
}

mod publishing {
    use super::*;

    #[tokio::test]
    async fn publish_stores_both_files_and_returns_the_video() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .multipart(
                Method::POST,
                routes::PUBLISH_VIDEO,
                &[("title", "  First clip "), ("description", "Hello")],
                vec![FilePart::video(), FilePart::image("thumbnail")],
                Some(&alice.access_token),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["title"], "First clip");
        assert_eq!(res.data()["ownerId"], alice.id.as_str());
        assert_eq!(res.data()["views"], 0);
        assert_eq!(res.data()["isPublished"], true);
        assert!(res.data()["videoUrl"].as_str().unwrap().starts_with("http://localhost/media/"));
        assert!(res.data().get("videoFileId").is_none());

        let stored = std::fs::read_dir(app.media_root.join("video")).unwrap().count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn publish_requires_title_and_description() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .multipart(
                Method::POST,
                routes::PUBLISH_VIDEO,
                &[("title", "Clip")],
                vec![FilePart::video(), FilePart::image("thumbnail")],
                Some(&alice.access_token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Title and description are required");
    }

    #[tokio::test]
    async fn publish_requires_a_video_file() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .multipart(
                Method::POST,
                routes::PUBLISH_VIDEO,
                &[("title", "Clip"), ("description", "Desc")],
                vec![FilePart::image("thumbnail")],
                Some(&alice.access_token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Video file is required");
    }

    #[tokio::test]
    async fn publish_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                Method::POST,
                routes::PUBLISH_VIDEO,
                &[("title", "Clip"), ("description", "Desc")],
                vec![FilePart::video(), FilePart::image("thumbnail")],
                None,
            )
            .await;

        assert_eq!(res.status, 401);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn pagination_splits_results_into_pages() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        for i in 1..=25 {
            app.publish_video(&alice.access_token, &format!("Video {i:02}")).await;
        }

        let first = app.get(&format!("{}?page=1&sortBy=title&sortType=asc", routes::VIDEOS), None).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["totalDocs"], 25);
        assert_eq!(first.data()["totalPages"], 3);
        assert_eq!(first.data()["limit"], 10);
        assert_eq!(first.data()["hasPrevPage"], false);
        assert_eq!(first.data()["hasNextPage"], true);

        let second = app.get(&format!("{}?page=2&sortBy=title&sortType=asc", routes::VIDEOS), None).await;
        let expected: Vec<String> = (11..=20).map(|i| format!("Video {i:02}")).collect();
        assert_eq!(titles(&second.body), expected);
        assert_eq!(second.data()["hasPrevPage"], true);

        let beyond = app.get(&format!("{}?page=9", routes::VIDEOS), None).await;
        assert_eq!(beyond.status, 200);
        assert!(titles(&beyond.body).is_empty());
        assert_eq!(beyond.data()["totalDocs"], 25);
    }

    #[tokio::test]
    async fn enormous_page_numbers_return_an_empty_page() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.publish_video(&alice.access_token, "Only one").await;

        for page in ["18446744073709551615", "1000000000000000000"] {
            let res = app.get(&format!("{}?page={page}", routes::VIDEOS), None).await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert!(titles(&res.body).is_empty());
            assert_eq!(res.data()["totalDocs"], 1);
            assert_eq!(res.data()["totalPages"], 1);
            assert_eq!(res.data()["hasNextPage"], false);
        }
    }

    #[tokio::test]
    async fn invalid_paging_values_fall_back_to_defaults() {
        let app = TestApp::spawn().await;

        let res = app.get(&format!("{}?page=abc&limit=0", routes::VIDEOS), None).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["page"], 1);
        assert_eq!(res.data()["limit"], 10);
    }

    #[tokio::test]
    async fn only_published_videos_are_listed() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let shown = app.publish_video(&alice.access_token, "Shown").await;
        let hidden = app.publish_video(&alice.access_token, "Hidden").await;

        let toggle = app
            .patch_empty(&routes::toggle_publish(&hidden), Some(&alice.access_token))
            .await;
        assert_eq!(toggle.status, 200, "{}", toggle.text);
        assert_eq!(toggle.data()["isPublished"], false);

        let res = app.get(routes::VIDEOS, None).await;
        assert_eq!(titles(&res.body), vec!["Shown".to_string()]);
        assert_eq!(res.data()["docs"][0]["id"], shown.as_str());
        assert_eq!(res.data()["docs"][0]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn search_matches_title_words() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.publish_video(&alice.access_token, "Learning Rust ownership").await;
        app.publish_video(&alice.access_token, "Baking bread").await;

        let res = app.get(&format!("{}?query=rust", routes::VIDEOS), None).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(titles(&res.body), vec!["Learning Rust ownership".to_string()]);
    }

    #[tokio::test]
    async fn user_filter_restricts_to_one_owner() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        app.publish_video(&alice.access_token, "Alice clip").await;
        app.publish_video(&bob.access_token, "Bob clip").await;

        let res = app.get(&format!("{}?userId={}", routes::VIDEOS, bob.id), None).await;
        assert_eq!(titles(&res.body), vec!["Bob clip".to_string()]);

        let bad = app.get(&format!("{}?userId=nope", routes::VIDEOS), None).await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&format!("{}?sortBy=password&sortType=asc", routes::VIDEOS), None)
            .await;

        assert_eq!(res.status, 400);
    }
}

mod watching {
    use super::*;

    #[tokio::test]
    async fn each_view_counts_but_history_holds_one_entry() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.access_token, "Clip").await;

        let first = app.get(&routes::video(&video_id), Some(&bob.access_token)).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["views"], 1);

        let second = app.get(&routes::video(&video_id), Some(&bob.access_token)).await;
        assert_eq!(second.data()["views"], 2);
        assert_eq!(second.data()["likesCount"], 0);
        assert_eq!(second.data()["isLiked"], false);
        assert_eq!(second.data()["owner"]["username"], "alice");
        assert_eq!(second.data()["owner"]["isSubscribed"], false);

        let history = app.get(routes::HISTORY, Some(&bob.access_token)).await;
        assert_eq!(history.status, 200, "{}", history.text);
        let entries = history.data().as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], video_id.as_str());
    }

    #[tokio::test]
    async fn unpublished_video_is_visible_only_to_its_owner() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.access_token, "Draft").await;
        app.patch_empty(&routes::toggle_publish(&video_id), Some(&alice.access_token))
            .await;

        let stranger = app.get(&routes::video(&video_id), Some(&bob.access_token)).await;
        assert_eq!(stranger.status, 404);

        let owner = app.get(&routes::video(&video_id), Some(&alice.access_token)).await;
        assert_eq!(owner.status, 200, "{}", owner.text);
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let bad = app.get(&routes::video("not-an-id"), Some(&alice.access_token)).await;
        assert_eq!(bad.status, 400);

        let missing = app
            .get(&routes::video(&uuid::Uuid::now_v7().to_string()), Some(&alice.access_token))
            .await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body["message"], "Video not found");
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn non_owner_cannot_update_and_video_is_unchanged() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.access_token, "Original").await;

        let res = app
            .multipart(
                Method::PATCH,
                &routes::video(&video_id),
                &[("title", "Hijacked"), ("description", "Mine now")],
                vec![FilePart::image("thumbnail")],
                Some(&bob.access_token),
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["message"], "You are not the owner of this video");

        let view = app.get(&routes::video(&video_id), Some(&alice.access_token)).await;
        assert_eq!(view.data()["title"], "Original");
    }

    #[tokio::test]
    async fn rejected_update_never_stages_the_upload() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.access_token, "Original").await;
        std::fs::remove_dir_all(&app.staging_root).unwrap();

        let res = app
            .multipart(
                Method::PATCH,
                &routes::video(&video_id),
                &[("title", "Hijacked"), ("description", "Mine now")],
                vec![FilePart::image("thumbnail")],
                Some(&bob.access_token),
            )
            .await;
        assert_eq!(res.status, 403, "{}", res.text);

        let missing = app
            .multipart(
                Method::PATCH,
                &routes::video(&uuid::Uuid::now_v7().to_string()),
                &[("title", "Ghost"), ("description", "None")],
                vec![FilePart::image("thumbnail")],
                Some(&bob.access_token),
            )
            .await;
        assert_eq!(missing.status, 404, "{}", missing.text);

        assert!(!app.staging_root.exists());
    }

    #[tokio::test]
    async fn non_owner_cannot_delete_or_toggle() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.access_token, "Original").await;

        let delete = app.delete(&routes::video(&video_id), Some(&bob.access_token)).await;
        assert_eq!(delete.status, 403);

        let toggle = app
            .patch_empty(&routes::toggle_publish(&video_id), Some(&bob.access_token))
            .await;
        assert_eq!(toggle.status, 403);
    }

    #[tokio::test]
    async fn owner_can_update_details_and_thumbnail() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let video_id = app.publish_video(&alice.access_token, "Original").await;
        let before = app.get(&routes::video(&video_id), Some(&alice.access_token)).await;

        let res = app
            .multipart(
                Method::PATCH,
                &routes::video(&video_id),
                &[("title", "Renamed"), ("description", "Better")],
                vec![FilePart::image("thumbnail")],
                Some(&alice.access_token),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["title"], "Renamed");
        assert_ne!(res.data()["thumbnailUrl"], before.data()["thumbnailUrl"]);
    }

    #[tokio::test]
    async fn owner_delete_removes_video_and_files() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let video_id = app.publish_video(&alice.access_token, "Doomed").await;
        let comment = app
            .post_json(
                &routes::comments(&video_id),
                &serde_json::json!({"content": "first"}),
                Some(&alice.access_token),
            )
            .await;
        assert_eq!(comment.status, 201, "{}", comment.text);

        let res = app.delete(&routes::video(&video_id), Some(&alice.access_token)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let gone = app.get(&routes::video(&video_id), Some(&alice.access_token)).await;
        assert_eq!(gone.status, 404);

        let stored = std::fs::read_dir(app.media_root.join("video")).unwrap().count();
        assert_eq!(stored, 0);
    }
}
