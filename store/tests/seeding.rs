//! Integration tests for first-run seeding against a real database file.
//!
//! Verifies that:
//! - Seeding happens once per collection and is byte-stable on reopen
//! - The reserved category exists exactly once, whatever the fixtures say
//! - A collection stored as an empty list is never re-seeded
//! - Missing or broken fixtures seed empty collections
//! - Records from other versions keep values this version does not know

mod common;

use std::path::Path;

use promptverse_shared::{
    Category, CategoryStatus, NewCategory, NewUser, Prompt, User, UNCATEGORIZED_ID,
};
use promptverse_store::{Collection, FixtureLocation, Session, Store, StoreConfig};
use serde_json::Value;
use tempfile::TempDir;

use common::write_fixtures;

const CATEGORIES: &str = r#"[
    {"id": "writing", "name": "Writing", "status": "official", "promptCount": 1,
     "subcategories": [{"id": "fiction", "name": "Fiction", "promptCount": 1}]},
    {"id": "code", "name": "Code", "status": "approved"}
]"#;

const PROMPTS: &str = r#"[
    {"id": "p1", "title": "Story starter", "content": "Once upon a time",
     "categoryId": "writing", "subcategoryId": "fiction", "tags": ["story"]}
]"#;

const USERS: &str = r#"[
    {"id": "u1", "username": "ada", "email": "ada@example.com", "role": "admin"}
]"#;

fn open(db_dir: &TempDir, fixtures: &Path) -> Store {
    let config = StoreConfig {
        database_url: db_dir.path().join("store.db").display().to_string(),
        fixtures: FixtureLocation::Directory(fixtures.to_path_buf()),
        pool_size: 2,
    };
    Store::open(&config).unwrap()
}

async fn snapshot(store: &Store) -> Vec<Option<String>> {
    let mut values = Vec::new();
    for collection in Collection::ALL {
        values.push(store.records().raw(collection).await.unwrap());
    }
    values
}

#[tokio::test]
async fn seeds_from_directory_fixtures() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(
        fixtures.path(),
        &[("categories", CATEGORIES), ("prompts", PROMPTS), ("users", USERS)],
    );

    let store = open(&db_dir, fixtures.path());
    assert!(!store.is_initialized());
    store.initialize().await.unwrap();
    assert!(store.is_initialized());

    let prompts: Vec<Prompt> = store.records().read_collection(Collection::Prompts).await;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].difficulty, "intermediate");
    assert!(prompts[0].allow_comments);

    let users: Vec<User> = store.records().read_collection(Collection::Users).await;
    assert_eq!(users[0].username, "ada");

    // Two fixture categories plus the reserved one.
    let categories: Vec<Category> = store.records().read_collection(Collection::Categories).await;
    assert_eq!(categories.len(), 3);

    // Collections without a fixture file are stored empty.
    assert_eq!(
        store.records().raw(Collection::Votes).await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn reopening_does_not_reseed() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(fixtures.path(), &[("categories", CATEGORIES), ("prompts", PROMPTS)]);

    let first = open(&db_dir, fixtures.path());
    first.initialize().await.unwrap();
    first.initialize().await.unwrap();
    let before = snapshot(&first).await;
    drop(first);

    // Changed fixtures must not leak into an already seeded store.
    write_fixtures(fixtures.path(), &[("prompts", "[]")]);

    let second = open(&db_dir, fixtures.path());
    second.initialize().await.unwrap();
    assert_eq!(snapshot(&second).await, before);
}

#[tokio::test]
async fn reserved_category_is_added_once() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(fixtures.path(), &[("categories", CATEGORIES)]);

    let store = open(&db_dir, fixtures.path());
    store.initialize().await.unwrap();

    let reserved = store.get_category(UNCATEGORIZED_ID).await.unwrap();
    assert_eq!(reserved.name, "Uncategorized");
    assert_eq!(reserved.prompt_count, 0);

    let categories: Vec<Category> = store.records().read_collection(Collection::Categories).await;
    assert_eq!(categories.iter().filter(|c| c.id == UNCATEGORIZED_ID).count(), 1);
}

#[tokio::test]
async fn fixture_copies_of_reserved_category_collapse_to_one() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(
        fixtures.path(),
        &[(
            "categories",
            r#"[
                {"id": "uncategorized", "name": "Uncategorized", "status": "official"},
                {"id": "code", "name": "Code"},
                {"id": "uncategorized", "name": "Uncategorized again"}
            ]"#,
        )],
    );

    let store = open(&db_dir, fixtures.path());
    store.initialize().await.unwrap();

    let categories: Vec<Category> = store.records().read_collection(Collection::Categories).await;
    let reserved: Vec<&Category> = categories.iter().filter(|c| c.id == UNCATEGORIZED_ID).collect();
    assert_eq!(reserved.len(), 1);
    assert_eq!(reserved[0].name, "Uncategorized");
    assert_eq!(categories.len(), 2);
}

#[tokio::test]
async fn stored_empty_collection_is_not_reseeded() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(fixtures.path(), &[("prompts", PROMPTS), ("users", USERS)]);

    let store = open(&db_dir, fixtures.path());
    store
        .records()
        .write_collection::<Prompt>(Collection::Prompts, &[])
        .await
        .unwrap();
    store.initialize().await.unwrap();

    let prompts: Vec<Prompt> = store.records().read_collection(Collection::Prompts).await;
    assert!(prompts.is_empty());
    let users: Vec<User> = store.records().read_collection(Collection::Users).await;
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn broken_fixtures_seed_what_they_can() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(
        fixtures.path(),
        &[
            ("prompts", "not json at all"),
            ("users", "   "),
            (
                "favorites",
                r#"[{"promptId": "p1", "userId": "u1"}, {"promptId": "p2"}]"#,
            ),
        ],
    );

    let store = open(&db_dir, fixtures.path());
    store.initialize().await.unwrap();

    assert!(store.list_prompts(&Default::default()).await.is_empty());
    assert!(store.get_user("u1").await.is_none());
    assert_eq!(store.list_favorites_for_user("u1").await.len(), 1);
}

#[tokio::test]
async fn missing_fixture_directory_seeds_empty() {
    let db_dir = TempDir::new().unwrap();
    let store = open(&db_dir, &db_dir.path().join("does-not-exist"));
    store.initialize().await.unwrap();

    let stats = store.stats().await;
    assert_eq!(stats.len(), Collection::ALL.len());
    for (collection, count) in stats {
        let expected = usize::from(collection == Collection::Categories);
        assert_eq!(count, expected, "{collection}");
    }
}

#[tokio::test]
async fn unknown_status_and_role_survive_writes() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(
        fixtures.path(),
        &[
            ("categories", r#"[{"id": "old", "name": "Old", "status": "archived"}]"#),
            (
                "users",
                r#"[{"id": "u9", "username": "root", "email": "root@example.com", "role": "superuser"}]"#,
            ),
        ],
    );

    let store = open(&db_dir, fixtures.path());
    store.initialize().await.unwrap();
    assert_eq!(
        store.get_category("old").await.unwrap().status,
        CategoryStatus::Unknown("archived".to_string())
    );

    // Both writes rewrite the whole collection.
    store
        .add_category(
            &Session::new("u9"),
            NewCategory {
                name: "Fresh".to_string(),
                description: String::new(),
                icon: None,
                color: None,
                tags: Vec::new(),
                subcategories: Vec::new(),
            },
        )
        .await
        .unwrap();
    store
        .add_user(NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            profile_picture: None,
            bio: None,
            role: None,
            preferences: None,
        })
        .await
        .unwrap();

    let raw = store.records().raw(Collection::Categories).await.unwrap().unwrap();
    let categories: Vec<Value> = serde_json::from_str(&raw).unwrap();
    let old = categories.iter().find(|c| c["id"] == "old").unwrap();
    assert_eq!(old["status"], "archived");

    let raw = store.records().raw(Collection::Users).await.unwrap().unwrap();
    let users: Vec<Value> = serde_json::from_str(&raw).unwrap();
    let root = users.iter().find(|u| u["id"] == "u9").unwrap();
    assert_eq!(root["role"], "superuser");
}

#[tokio::test]
async fn null_text_fields_do_not_drop_records() {
    let db_dir = TempDir::new().unwrap();
    let fixtures = TempDir::new().unwrap();
    write_fixtures(
        fixtures.path(),
        &[
            (
                "categories",
                r#"[{"id": "c1", "name": "Code", "description": null, "createdBy": null}]"#,
            ),
            (
                "prompts",
                r#"[{"id": "p1", "userId": null, "title": "T", "content": "C", "categoryId": "c1"}]"#,
            ),
        ],
    );

    let store = open(&db_dir, fixtures.path());
    store.initialize().await.unwrap();

    let category = store.get_category("c1").await.unwrap();
    assert_eq!(category.description, "");
    let prompt = store.get_prompt("p1").await.unwrap();
    assert_eq!(prompt.user_id, "");
}
