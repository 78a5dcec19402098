//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p quill-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `quill_test`)
//!   `TEST_DB_PASSWORD` (default: `quill_test`)
//!   `TEST_DB_NAME` (default: `quill_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use quill_common::AppError;
use quill_db::entities::{post, post_reaction::ReactionType, user};
use quill_db::repositories::{
    PostRepository, ReactionRepository, ReadingProgressRepository, UserRepository, new_reaction,
};
use quill_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{DatabaseConnection, Set};

async fn seed_user(db: &Arc<DatabaseConnection>, id: &str) -> user::Model {
    UserRepository::new(db.clone())
        .create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(id.to_string()),
            username_lower: Set(id.to_lowercase()),
            email: Set(format!("{id}@example.com")),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            token: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .expect("seed user")
}

fn new_post(id: &str, slug: &str, author_id: &str) -> post::ActiveModel {
    post::ActiveModel {
        id: Set(id.to_string()),
        title: Set("Integration".to_string()),
        slug: Set(slug.to_string()),
        author_id: Set(author_id.to_string()),
        content: Set("body".to_string()),
        excerpt: Set(String::new()),
        featured_image_url: Set(None),
        category_id: Set(None),
        status: Set(post::PostStatus::Published),
        meta_description: Set(String::new()),
        meta_keywords: Set(String::new()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
        published_at: Set(Some(Utc::now().into())),
        view_count: Set(0),
        featured: Set(false),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_slug_is_conflict() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = Arc::new(test_db.conn.clone());
    let author = seed_user(&db, "author1").await;
    let posts = PostRepository::new(db.clone());

    posts.create(new_post("p1", "same-slug", &author.id)).await.unwrap();
    let second = posts.create(new_post("p2", "same-slug", &author.id)).await;

    assert!(matches!(&second, Err(AppError::Conflict(msg)) if msg.starts_with("slug:")));
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_one_reaction_row_per_pair() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = Arc::new(test_db.conn.clone());
    let author = seed_user(&db, "author1").await;
    let reader = seed_user(&db, "reader1").await;
    PostRepository::new(db.clone())
        .create(new_post("p1", "reacted", &author.id))
        .await
        .unwrap();

    let reactions = ReactionRepository::new(db.clone());
    reactions
        .upsert(new_reaction("r1".to_string(), "p1", &reader.id, ReactionType::Like))
        .await
        .unwrap();
    reactions
        .upsert(new_reaction("r2".to_string(), "p1", &reader.id, ReactionType::Love))
        .await
        .unwrap();

    let counts = reactions.count_by_type("p1").await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].reaction_type, ReactionType::Love);
    assert_eq!(counts[0].count, 1);

    assert_eq!(reactions.delete_matching("p1", &reader.id, ReactionType::Love).await.unwrap(), 1);
    assert!(reactions.find_by_post_and_user("p1", &reader.id).await.unwrap().is_none());
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_one_progress_row_per_pair() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = Arc::new(test_db.conn.clone());
    let author = seed_user(&db, "author1").await;
    PostRepository::new(db.clone())
        .create(new_post("p1", "progress", &author.id))
        .await
        .unwrap();

    let progress = ReadingProgressRepository::new(db.clone());
    progress.upsert("rp1".to_string(), "p1", &author.id, 10).await.unwrap();
    progress.upsert("rp2".to_string(), "p1", &author.id, 80).await.unwrap();

    let stored = progress.find("p1", &author.id).await.unwrap().unwrap();
    assert_eq!(stored.id, "rp1");
    assert_eq!(stored.percentage, 80);
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_view_increments() {
    const VIEWS: i32 = 50;

    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = Arc::new(test_db.conn.clone());
    let author = seed_user(&db, "author1").await;
    let posts = PostRepository::new(db.clone());
    posts.create(new_post("p1", "popular", &author.id)).await.unwrap();

    let handles: Vec<_> = (0..VIEWS)
        .map(|_| {
            let posts = posts.clone();
            tokio::spawn(async move { posts.increment_view_count("p1").await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(posts.get_by_id("p1").await.unwrap().view_count, VIEWS);
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.database.is_empty());
}
