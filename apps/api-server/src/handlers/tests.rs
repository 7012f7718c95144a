use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use quill_core::domain::{Role, User};
use quill_core::ports::BaseRepository;
use quill_infra::{InMemoryPostRepository, InMemoryUserRepository, JwtConfig};

use super::configure_routes;
use crate::state::AppState;

struct Fixture {
    state: AppState,
    users: Arc<InMemoryUserRepository>,
}

impl Fixture {
    fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let jwt = JwtConfig {
            secret: "handler-test-secret".to_string(),
            expiration_hours: 1,
            issuer: "quill-test".to_string(),
        };
        Self {
            state: AppState::from_repositories(users.clone(), posts, jwt),
            users,
        }
    }

    /// Store a user directly and mint a bearer header for them.
    async fn login_as(&self, username: &str, role: Role) -> (User, String) {
        let mut user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused-hash".to_string(),
        );
        user.role = role;
        let user = self.users.create(user).await.unwrap();
        let token = self.state.tokens.issue_for(&user).unwrap();
        (user, format!("Bearer {token}"))
    }
}

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fx.state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn post_body(title: &str) -> Value {
    json!({ "title": title, "content": "Some interesting content" })
}

#[actix_web::test]
async fn health_reports_ok() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn creating_a_post_requires_a_token() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(post_body("Anonymous"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_then_fetch_by_slug_and_id() {
    let fx = Fixture::new();
    let (alice, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({
            "title": "Hello, Quill!",
            "content": "A short post",
            "tags": [" Rust ", "Web"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["message"], "Post created successfully");
    assert_eq!(created["post"]["slug"], "hello-quill");
    assert_eq!(created["post"]["readTime"], 1);
    assert_eq!(created["post"]["tags"], json!(["rust", "web"]));
    assert_eq!(created["post"]["author"]["username"], "alice");
    assert_eq!(created["post"]["authorId"], alice.id.to_string());
    let id = created["post"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/posts/hello-quill")
        .to_request();
    let by_slug: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(by_slug["post"]["id"], id.as_str());
    assert_eq!(by_slug["post"]["views"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let by_id: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(by_id["post"]["title"], "Hello, Quill!");
    assert_eq!(by_id["post"]["views"], 2);
}

#[actix_web::test]
async fn duplicate_slug_is_a_bad_request() {
    let fx = Fixture::new();
    let (_, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    let create = |title: &str| {
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", auth.clone()))
            .set_json(post_body(title))
            .to_request()
    };

    let resp = test::call_service(&app, create("Same Title")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, create("same  title!")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Conflict");
}

#[actix_web::test]
async fn malformed_input_is_rejected_with_field_errors() {
    let fx = Fixture::new();
    let (_, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "title": "Tagged", "content": "x", "tags": "rust" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "tags");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", auth))
        .set_json(json!({ "content": "no title" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "title");
}

#[actix_web::test]
async fn only_author_or_admin_may_edit() {
    let fx = Fixture::new();
    let (_, alice) = fx.login_as("alice", Role::User).await;
    let (_, bob) = fx.login_as("bob", Role::User).await;
    let (_, admin) = fx.login_as("root", Role::Admin).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", alice))
        .set_json(post_body("Mine"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/posts/{}", created["post"]["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(("Authorization", bob))
        .set_json(json!({ "title": "Stolen" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({ "title": "Moderated" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["post"]["slug"], "moderated");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn non_uuid_path_is_not_found() {
    let fx = Fixture::new();
    let (_, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts/not-a-uuid/like")
        .insert_header(("Authorization", auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn like_and_comment_round_trip() {
    let fx = Fixture::new();
    let (_, alice) = fx.login_as("alice", Role::User).await;
    let (_, bob) = fx.login_as("bob", Role::User).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", alice))
        .set_json(post_body("Popular"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["post"]["id"].as_str().unwrap().to_string();

    let like = |auth: String| {
        test::TestRequest::post()
            .uri(&format!("/api/posts/{id}/like"))
            .insert_header(("Authorization", auth))
            .to_request()
    };
    let first: Value = test::call_and_read_body_json(&app, like(bob.clone())).await;
    assert_eq!(first["isLiked"], true);
    assert_eq!(first["likeCount"], 1);
    let second: Value = test::call_and_read_body_json(&app, like(bob.clone())).await;
    assert_eq!(second["isLiked"], false);
    assert_eq!(second["likeCount"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/comments"))
        .insert_header(("Authorization", bob))
        .set_json(json!({ "content": "Nice one" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["comment"]["content"], "Nice one");
    assert_eq!(body["comment"]["author"]["username"], "bob");
    assert_eq!(body["comment"]["isApproved"], true);
    assert_eq!(body["post"]["commentCount"], 1);
}

#[actix_web::test]
async fn listing_validates_pagination() {
    let fx = Fixture::new();
    let (_, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    for i in 0..12 {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", auth.clone()))
            .set_json(post_body(&format!("Entry {i}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?page=2&limit=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["totalPosts"], 12);
    assert_eq!(body["pagination"]["hasNext"], true);
    assert_eq!(body["pagination"]["hasPrev"], true);

    for uri in [
        "/api/posts?limit=100",
        "/api/posts?page=0",
        "/api/posts?page=abc",
        "/api/posts?page=18446744073709551615",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[actix_web::test]
async fn admin_routes_are_guarded() {
    let fx = Fixture::new();
    let (_, alice) = fx.login_as("alice", Role::User).await;
    let (root, admin) = fx.login_as("root", Role::Admin).await;
    let app = app!(fx);

    for uri in ["/api/users", "/api/users/stats/overview"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", alice.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let req = test::TestRequest::get()
        .uri("/api/users?search=ALI")
        .insert_header(("Authorization", admin.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["totalUsers"], 1);
    assert_eq!(body["users"][0]["username"], "alice");
    assert!(body["users"][0].get("passwordHash").is_none());

    let req = test::TestRequest::get()
        .uri("/api/users/stats/overview")
        .insert_header(("Authorization", admin.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["overview"]["totalUsers"], 2);
    assert_eq!(body["overview"]["totalPosts"], 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", root.id))
        .insert_header(("Authorization", admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn user_posts_respect_visibility() {
    let fx = Fixture::new();
    let (alice, auth) = fx.login_as("alice", Role::User).await;
    let app = app!(fx);

    for (title, status) in [("Out There", "published"), ("Not Yet", "draft")] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({ "title": title, "content": "body", "status": status }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let uri = format!("/api/users/{}/posts", alice.id);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let anonymous: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(anonymous["pagination"]["totalPosts"], 1);
    assert_eq!(anonymous["posts"][0]["title"], "Out There");

    let req = test::TestRequest::get()
        .uri(&format!("{uri}?status=draft"))
        .insert_header(("Authorization", auth))
        .to_request();
    let drafts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(drafts["pagination"]["totalPosts"], 1);
    assert_eq!(drafts["posts"][0]["title"], "Not Yet");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", alice.id))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["user"]["postsCount"], 1);
}

#[actix_web::test]
async fn register_login_and_me() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "dana",
            "email": "dana@example.com",
            "password": "long-enough-pw",
            "firstName": "Dana"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered: Value = test::read_body_json(resp).await;
    assert_eq!(registered["tokenType"], "Bearer");
    assert_eq!(registered["user"]["role"], "user");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "dana@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "dana@example.com", "password": "long-enough-pw" }))
        .to_request();
    let logged_in: Value = test::call_and_read_body_json(&app, req).await;
    let token = logged_in["accessToken"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["user"]["username"], "dana");
    assert_eq!(me["user"]["firstName"], "Dana");
}

#[actix_web::test]
async fn deleted_users_token_is_rejected() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.login_as("alice", Role::User).await;
    let (_, admin) = fx.login_as("root", Role::Admin).await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", alice.id))
        .insert_header(("Authorization", admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", alice_auth))
        .set_json(post_body("Ghost Writer"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts?author={}", alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["totalPosts"], 0);
}

#[actix_web::test]
async fn deactivation_and_demotion_apply_to_live_tokens() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.login_as("alice", Role::User).await;
    let (deputy, deputy_auth) = fx.login_as("deputy", Role::Admin).await;
    let (_, admin) = fx.login_as("root", Role::Admin).await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", alice.id))
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({ "isActive": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", alice_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", deputy.id))
        .insert_header(("Authorization", admin))
        .set_json(json!({ "role": "user" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(("Authorization", deputy_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
