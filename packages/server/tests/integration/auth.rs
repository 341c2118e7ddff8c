use serde_json::json;

use crate::common::{ACCESS_SECRET, FilePart, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_and_secrets_are_not_returned() {
        let app = TestApp::spawn().await;

        let res = app.register("alice", "Alice@Example.com", "securepass").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["statusCode"], 201);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.data()["username"], "alice");
        assert_eq!(res.data()["email"], "alice@example.com");
        assert!(res.data()["id"].is_string());
        assert!(res.data()["avatarUrl"].as_str().unwrap().starts_with("http://localhost/media/"));
        assert!(res.data().get("password").is_none());
        assert!(res.data().get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_used_email() {
        let app = TestApp::spawn().await;

        let first = app.register("alice", "alice@example.com", "securepass").await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.register("alice2", "ALICE@example.com", "securepass").await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["success"], false);
        assert!(res.body["data"].is_null());
        assert_eq!(res.body["message"], "User with email or username already exists");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                reqwest::Method::POST,
                routes::REGISTER,
                &[("fullName", "Alice"), ("username", "   "), ("email", "a@b.co"), ("password", "securepass")],
                vec![FilePart::image("avatar")],
                None,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "All fields are required");
    }

    #[tokio::test]
    async fn avatar_is_required() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                reqwest::Method::POST,
                routes::REGISTER,
                &[
                    ("fullName", "Alice"),
                    ("username", "alice"),
                    ("email", "alice@example.com"),
                    ("password", "securepass"),
                ],
                vec![],
                None,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Avatar file is required");
    }

    #[tokio::test]
    async fn cannot_register_with_a_password_that_is_too_short() {
        let app = TestApp::spawn().await;

        let res = app.register("alice", "alice@example.com", "short").await;

        assert_eq!(res.status, 400);
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_sets_both_cookies_and_token_subject_is_the_user() {
        let app = TestApp::spawn().await;
        let reg = app.register("alice", "alice@example.com", "securepass").await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);
        let user_id = reg.id();

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "securepass"}),
                None,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.sets_cookie("accessToken"), "cookies: {:?}", res.cookies);
        assert!(res.sets_cookie("refreshToken"), "cookies: {:?}", res.cookies);
        assert!(res.cookies.iter().all(|c| c.contains("HttpOnly")));
        assert_eq!(res.data()["user"]["id"], user_id.as_str());
        assert!(res.data()["user"].get("password").is_none());

        let auth = vidhub_server::config::AuthConfig {
            access_token_secret: ACCESS_SECRET.to_string(),
            access_token_ttl: 3600,
            refresh_token_secret: String::new(),
            refresh_token_ttl: 0,
            cookie_secure: false,
        };
        let claims =
            vidhub_server::utils::jwt::verify_access(res.data()["accessToken"].as_str().unwrap(), &auth)
                .unwrap();
        assert_eq!(claims.sub.to_string(), user_id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"username": "alice", "password": "wrongpass"}),
                None,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["message"], "Password is incorrect");
        assert!(res.cookies.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"username": "ghost", "password": "securepass"}),
                None,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "User does not exist");
    }

    #[tokio::test]
    async fn username_or_email_is_required() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LOGIN, &json!({"password": "securepass"}), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Username or email is required");
    }

    #[tokio::test]
    async fn malformed_json_uses_the_error_envelope() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::LOGIN))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        let res = crate::common::TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["success"], false);
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn refresh_token_rotates_and_old_token_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let first = app
            .post_json(
                routes::REFRESH_TOKEN,
                &json!({"refreshToken": user.refresh_token}),
                None,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        let rotated = first.data()["refreshToken"].as_str().unwrap().to_string();
        assert_ne!(rotated, user.refresh_token);
        assert!(first.sets_cookie("accessToken"));

        let reused = app
            .post_json(
                routes::REFRESH_TOKEN,
                &json!({"refreshToken": user.refresh_token}),
                None,
            )
            .await;
        assert_eq!(reused.status, 401);

        let again = app
            .post_json(routes::REFRESH_TOKEN, &json!({"refreshToken": rotated}), None)
            .await;
        assert_eq!(again.status, 200, "{}", again.text);
    }

    #[tokio::test]
    async fn refresh_without_a_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.post_empty(routes::REFRESH_TOKEN, None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["message"], "Unauthorized request");
    }

    #[tokio::test]
    async fn logout_revokes_the_refresh_token() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app.post_empty(routes::LOGOUT, Some(&user.access_token)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let refresh = app
            .post_json(
                routes::REFRESH_TOKEN,
                &json!({"refreshToken": user.refresh_token}),
                None,
            )
            .await;
        assert_eq!(refresh.status, 401);
    }

    #[tokio::test]
    async fn access_cookie_authenticates() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .get_with_cookie(
                routes::CURRENT_USER,
                &format!("accessToken={}", user.access_token),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["username"], "alice");
    }
}

mod account {
    use super::*;

    #[tokio::test]
    async fn protected_route_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::CURRENT_USER, None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["statusCode"], 401);
    }

    #[tokio::test]
    async fn lowercase_bearer_scheme_is_accepted() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::CURRENT_USER))
            .header("Authorization", format!("bearer {}", alice.access_token))
            .send()
            .await
            .expect("Failed to send GET request");

        assert_eq!(res.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::CURRENT_USER, Some("not-a-jwt")).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn change_password_requires_the_old_password() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let wrong = app
            .post_json(
                routes::CHANGE_PASSWORD,
                &json!({"oldPassword": "nope-nope", "newPassword": "brandnewpass"}),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(wrong.status, 400);
        assert_eq!(wrong.body["message"], "Invalid old password");

        let ok = app
            .patch_json(
                routes::CHANGE_PASSWORD,
                &json!({"oldPassword": "securepass", "newPassword": "brandnewpass"}),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);

        let login = app
            .post_json(
                routes::LOGIN,
                &json!({"username": "alice", "password": "brandnewpass"}),
                None,
            )
            .await;
        assert_eq!(login.status, 200);
    }

    #[tokio::test]
    async fn update_account_changes_name_and_email() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .patch_json(
                routes::UPDATE_ACCOUNT,
                &json!({"fullName": "Alice L", "email": "New@Example.com"}),
                Some(&user.access_token),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["fullName"], "Alice L");
        assert_eq!(res.data()["email"], "new@example.com");
    }

    #[tokio::test]
    async fn update_account_to_a_taken_email_conflicts() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.create_user("bob").await;

        let res = app
            .patch_json(
                routes::UPDATE_ACCOUNT,
                &json!({"fullName": "Alice", "email": "bob@example.com"}),
                Some(&alice.access_token),
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn channel_profile_reports_subscription_counts() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        let sub = app
            .post_empty(&routes::subscription(&alice.id), Some(&bob.access_token))
            .await;
        assert_eq!(sub.status, 200, "{}", sub.text);

        let res = app.get(&routes::channel("alice"), Some(&bob.access_token)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["subscribersCount"], 1);
        assert_eq!(res.data()["channelsSubscribedToCount"], 0);
        assert_eq!(res.data()["isSubscribed"], true);

        let missing = app.get(&routes::channel("nobody"), Some(&bob.access_token)).await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn unknown_route_returns_the_envelope() {
        let app = TestApp::spawn().await;

        let res = app.get("/api/v1/nowhere", None).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["statusCode"], 404);
    }
}
