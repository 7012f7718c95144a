use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::json;
use uuid::Uuid;

use quill_core::domain::{Post, PostStatus};
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn post_model(id: Uuid, author_id: Uuid) -> post::Model {
    let now = Utc::now();
    let comment_id = Uuid::new_v4();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        slug: "test-post".to_owned(),
        featured_image: None,
        tags: json!(["rust", "web"]),
        read_time: 1,
        views: 4,
        likes: json!([author_id]),
        comments: json!([{
            "id": comment_id,
            "author_id": author_id,
            "content": "Nice",
            "created_at": now,
            "is_approved": true
        }]),
        status: "published".to_owned(),
        published_at: Some(now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, author_id)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.tags, vec!["rust", "web"]);
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.like_count(), 1);
    assert_eq!(post.comments[0].content, "Nice");
}

#[tokio::test]
async fn test_corrupt_status_is_reported() {
    let mut model = post_model(Uuid::new_v4(), Uuid::new_v4());
    model.status = "deleted".to_owned();
    let id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result: Result<Option<Post>, _> = repo.find_by_id(id).await;
    assert!(matches!(
        result,
        Err(quill_core::error::RepoError::Corrupt(_))
    ));
}

#[tokio::test]
async fn test_increment_views_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo.increment_views(Uuid::new_v4()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_by_author_reports_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 3,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert_eq!(repo.delete_by_author(Uuid::new_v4()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_find_user_by_email() {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id,
            username: "alice".to_owned(),
            email: "alice@example.com".to_owned(),
            password_hash: "hash".to_owned(),
            first_name: Some("Alice".to_owned()),
            last_name: None,
            bio: None,
            avatar: None,
            role: "admin".to_owned(),
            is_active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, id);
    assert!(user.is_admin());
}

#[test]
fn test_db_errors_map_onto_repo_errors() {
    use sea_orm::DbErr;

    use crate::database::postgres_base::map_db_err;
    use quill_core::error::RepoError;

    assert!(matches!(
        map_db_err(DbErr::RecordNotUpdated),
        RepoError::NotFound
    ));
    assert!(matches!(
        map_db_err(DbErr::Custom("syntax error".to_owned())),
        RepoError::Query(_)
    ));
}
