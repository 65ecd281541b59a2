//! Integration tests for prompts and categories.
//!
//! Focuses on the cached `promptCount` counters staying in step with the
//! prompts they count, and on version history.

mod common;

use assert_matches::assert_matches;
use promptverse_shared::{
    CategoryFilter, CategoryPatch, CategorySort, CategoryStatus, PromptFilter, PromptPatch,
    PromptSort, StatusFilter, UNCATEGORIZED_ID,
};
use promptverse_store::StoreError;

use common::{empty_store, new_category, new_prompt, session};

#[tokio::test]
async fn prompt_counts_follow_create_move_and_delete() {
    let store = empty_store().await;
    let alice = session("alice");

    let writing = store
        .add_category(&alice, new_category("Writing", &["Fiction"]))
        .await
        .unwrap();
    let fiction = writing.subcategories[0].id.clone();

    let p1 = store
        .add_prompt(&alice, new_prompt("Dragon", Some(&writing.id), Some(&fiction)))
        .await
        .unwrap();
    let p2 = store
        .add_prompt(&alice, new_prompt("Haiku", Some(&writing.id), None))
        .await
        .unwrap();

    let category = store.get_category(&writing.id).await.unwrap();
    assert_eq!(category.prompt_count, 2);
    assert_eq!(category.subcategory(&fiction).unwrap().prompt_count, 1);

    // Changing category without naming a subcategory drops the old one.
    let moved = store
        .update_prompt(
            &alice,
            &p1.id,
            PromptPatch {
                category_id: Some(Some(UNCATEGORIZED_ID.to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.subcategory_id, None);

    let category = store.get_category(&writing.id).await.unwrap();
    assert_eq!(category.prompt_count, 1);
    assert_eq!(category.subcategory(&fiction).unwrap().prompt_count, 0);
    assert_eq!(
        store.get_category(UNCATEGORIZED_ID).await.unwrap().prompt_count,
        1
    );

    store.delete_prompt(&p2.id).await.unwrap();
    assert_eq!(store.get_category(&writing.id).await.unwrap().prompt_count, 0);

    // Deleting again is an error and changes nothing.
    assert_matches!(
        store.delete_prompt(&p2.id).await,
        Err(StoreError::NotFound { entity: "Prompt", .. })
    );
    assert_eq!(store.get_category(&writing.id).await.unwrap().prompt_count, 0);

    assert!(store.audit_counters().await.unwrap().is_clean());
}

#[tokio::test]
async fn prompts_move_between_subcategories() {
    let store = empty_store().await;
    let alice = session("alice");

    let writing = store
        .add_category(&alice, new_category("Writing", &["Fiction", "Poetry"]))
        .await
        .unwrap();
    let fiction = writing.subcategories[0].id.clone();
    let poetry = writing.subcategories[1].id.clone();
    let code = store
        .add_category(&alice, new_category("Code", &["Rust"]))
        .await
        .unwrap();
    let rust = code.subcategories[0].id.clone();

    let prompt = store
        .add_prompt(&alice, new_prompt("Verse", Some(&writing.id), Some(&fiction)))
        .await
        .unwrap();

    // Same category, other subcategory.
    let moved = store
        .update_prompt(
            &alice,
            &prompt.id,
            PromptPatch {
                subcategory_id: Some(Some(poetry.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.subcategory_id.as_deref(), Some(poetry.as_str()));

    let category = store.get_category(&writing.id).await.unwrap();
    assert_eq!(category.prompt_count, 1);
    assert_eq!(category.subcategory(&fiction).unwrap().prompt_count, 0);
    assert_eq!(category.subcategory(&poetry).unwrap().prompt_count, 1);
    assert!(store.audit_counters().await.unwrap().is_clean());

    // Another category, straight into one of its subcategories.
    let moved = store
        .update_prompt(
            &alice,
            &prompt.id,
            PromptPatch {
                category_id: Some(Some(code.id.clone())),
                subcategory_id: Some(Some(rust.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.category_id.as_deref(), Some(code.id.as_str()));
    assert_eq!(moved.subcategory_id.as_deref(), Some(rust.as_str()));

    let writing = store.get_category(&writing.id).await.unwrap();
    assert_eq!(writing.prompt_count, 0);
    assert_eq!(writing.subcategory(&fiction).unwrap().prompt_count, 0);
    assert_eq!(writing.subcategory(&poetry).unwrap().prompt_count, 0);
    let code = store.get_category(&code.id).await.unwrap();
    assert_eq!(code.prompt_count, 1);
    assert_eq!(code.subcategory(&rust).unwrap().prompt_count, 1);
    assert!(store.audit_counters().await.unwrap().is_clean());
}

#[tokio::test]
async fn deleting_a_category_moves_its_prompts() {
    let store = empty_store().await;
    let alice = session("alice");

    let writing = store
        .add_category(&alice, new_category("Writing", &["Fiction"]))
        .await
        .unwrap();
    let fiction = writing.subcategories[0].id.clone();
    let p1 = store
        .add_prompt(&alice, new_prompt("P1", Some(&writing.id), Some(&fiction)))
        .await
        .unwrap();
    let p2 = store
        .add_prompt(&alice, new_prompt("P2", Some(&writing.id), None))
        .await
        .unwrap();
    store
        .add_prompt(&alice, new_prompt("Loose", Some(UNCATEGORIZED_ID), None))
        .await
        .unwrap();

    store.delete_category(&writing.id).await.unwrap();

    assert!(store.get_category(&writing.id).await.is_none());
    for id in [&p1.id, &p2.id] {
        let prompt = store.get_prompt(id).await.unwrap();
        assert_eq!(prompt.category_id.as_deref(), Some(UNCATEGORIZED_ID));
        assert_eq!(prompt.subcategory_id, None);
    }
    assert_eq!(
        store.get_category(UNCATEGORIZED_ID).await.unwrap().prompt_count,
        3
    );
    assert!(store.audit_counters().await.unwrap().is_clean());
}

#[tokio::test]
async fn reserved_category_cannot_be_deleted() {
    let store = empty_store().await;
    assert_matches!(
        store.delete_category(UNCATEGORIZED_ID).await,
        Err(StoreError::Reserved(_))
    );
    assert!(store.get_category(UNCATEGORIZED_ID).await.is_some());
}

#[tokio::test]
async fn reserved_category_stays_official() {
    let store = empty_store().await;

    assert_matches!(
        store
            .update_category(
                UNCATEGORIZED_ID,
                CategoryPatch {
                    status: Some(CategoryStatus::Rejected),
                    ..Default::default()
                },
            )
            .await,
        Err(StoreError::Reserved(_))
    );
    assert_matches!(
        store
            .review_category(UNCATEGORIZED_ID, CategoryStatus::Pending, None)
            .await,
        Err(StoreError::Reserved(_))
    );
    assert_eq!(
        store.get_category(UNCATEGORIZED_ID).await.unwrap().status,
        CategoryStatus::Official
    );

    // Other edits to the reserved category are allowed.
    let updated = store
        .update_category(
            UNCATEGORIZED_ID,
            CategoryPatch {
                description: Some("Loose prompts".to_string()),
                status: Some(CategoryStatus::Official),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "Loose prompts");
}

#[tokio::test]
async fn deleting_a_subcategory_clears_its_prompts() {
    let store = empty_store().await;
    let alice = session("alice");

    let writing = store
        .add_category(&alice, new_category("Writing", &["Fiction", "Poetry"]))
        .await
        .unwrap();
    let fiction = writing.subcategories[0].id.clone();
    let poetry = writing.subcategories[1].id.clone();
    let story = store
        .add_prompt(&alice, new_prompt("Story", Some(&writing.id), Some(&fiction)))
        .await
        .unwrap();
    let poem = store
        .add_prompt(&alice, new_prompt("Poem", Some(&writing.id), Some(&poetry)))
        .await
        .unwrap();

    store.delete_subcategory(&writing.id, &fiction).await.unwrap();

    let category = store.get_category(&writing.id).await.unwrap();
    assert_eq!(category.subcategories.len(), 1);
    assert_eq!(category.prompt_count, 2);
    assert_eq!(store.get_prompt(&story.id).await.unwrap().subcategory_id, None);
    assert_eq!(
        store.get_prompt(&poem.id).await.unwrap().subcategory_id.as_deref(),
        Some(poetry.as_str())
    );

    assert_matches!(
        store.delete_subcategory(&writing.id, &fiction).await,
        Err(StoreError::NotFound { entity: "Subcategory", .. })
    );
}

#[tokio::test]
async fn subcategories_can_be_added_and_renamed() {
    let store = empty_store().await;
    let writing = store
        .add_category(&session("alice"), new_category("Writing", &[]))
        .await
        .unwrap();

    let category = store.add_subcategory(&writing.id, "  Essays ").await.unwrap();
    let essays = category.subcategories[0].clone();
    assert_eq!(essays.name, "Essays");
    assert_eq!(essays.prompt_count, 0);

    let category = store
        .rename_subcategory(&writing.id, &essays.id, "Long form")
        .await
        .unwrap();
    assert_eq!(category.subcategory(&essays.id).unwrap().name, "Long form");

    assert_matches!(
        store.add_subcategory(&writing.id, " ").await,
        Err(StoreError::Validation(_))
    );
}

#[tokio::test]
async fn content_edits_append_versions() {
    let store = empty_store().await;
    let alice = session("alice");
    let bob = session("bob");

    let prompt = store
        .add_prompt(&alice, new_prompt("Summarize", None, None))
        .await
        .unwrap();
    assert_eq!(prompt.version_history.len(), 1);
    assert_eq!(prompt.version_history[0].reason, "Initial creation");

    let edit = |content: &str, reason: Option<&str>| PromptPatch {
        content: Some(content.to_string()),
        edit_reason: reason.map(str::to_string),
        ..Default::default()
    };

    store
        .update_prompt(&bob, &prompt.id, edit("Summarize briefly", Some("Shorter")))
        .await
        .unwrap();
    // Same content again is not a new version.
    store
        .update_prompt(&bob, &prompt.id, edit("Summarize briefly", None))
        .await
        .unwrap();
    // Neither is a title-only change.
    store
        .update_prompt(
            &bob,
            &prompt.id,
            PromptPatch {
                title: Some("Summarizer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let updated = store
        .update_prompt(&alice, &prompt.id, edit("Summarize in one line", None))
        .await
        .unwrap();

    let versions: Vec<u32> = updated.version_history.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(updated.version_history[1].user_id, "bob");
    assert_eq!(updated.version_history[1].reason, "Shorter");
    assert_eq!(updated.version_history[2].reason, "Content updated");
    assert_eq!(updated.title, "Summarizer");
    assert_eq!(updated.content, "Summarize in one line");
}

#[tokio::test]
async fn blank_prompts_are_rejected() {
    let store = empty_store().await;
    let mut data = new_prompt("Title", None, None);
    data.content = "   ".to_string();

    assert_matches!(
        store.add_prompt(&session("alice"), data).await,
        Err(StoreError::Validation(_))
    );
    assert!(store.list_prompts(&PromptFilter::default()).await.is_empty());
}

#[tokio::test]
async fn listing_filters_sorts_and_pages() {
    let store = empty_store().await;
    let alice = session("alice");

    for n in 0..7 {
        let mut data = new_prompt(&format!("Prompt {n}"), Some(UNCATEGORIZED_ID), None);
        data.tags = vec!["Shared".to_string(), format!("tag{}", n % 2)];
        store.add_prompt(&alice, data).await.unwrap();
    }

    let tagged = store
        .list_prompts(&PromptFilter {
            tags: vec!["Shared".to_string(), "tag1".to_string()],
            sort: Some(PromptSort::Title),
            ..Default::default()
        })
        .await;
    let titles: Vec<&str> = tagged.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Prompt 5", "Prompt 3", "Prompt 1"]);

    let page = store
        .list_prompts_page(&PromptFilter::default(), 2, 5)
        .await;
    assert_eq!(page.total, 7);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages(), 2);

    let none = store
        .list_prompts(&PromptFilter {
            user_id: Some("bob".to_string()),
            ..Default::default()
        })
        .await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn categories_are_reviewed_and_filtered() {
    let store = empty_store().await;
    let alice = session("alice");

    let art = store
        .add_category(&alice, new_category("Art", &[]))
        .await
        .unwrap();
    let code = store
        .add_category(&alice, new_category("Code", &[]))
        .await
        .unwrap();
    assert_eq!(art.status, CategoryStatus::Pending);

    let rejected = store
        .review_category(&art.id, CategoryStatus::Rejected, Some("Too broad".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Too broad"));

    let approved = store
        .review_category(&code.id, CategoryStatus::Approved, Some("ignored".to_string()))
        .await
        .unwrap();
    assert_eq!(approved.rejection_reason, None);

    let public = store
        .list_categories(&CategoryFilter {
            status: Some(StatusFilter::AllApproved),
            sort: Some("name".parse::<CategorySort>().unwrap()),
            ..Default::default()
        })
        .await;
    let names: Vec<&str> = public.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Code", "Uncategorized"]);

    let updated = store
        .update_category(
            &code.id,
            CategoryPatch {
                name: Some("Programming".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Programming");

    assert_matches!(
        store.update_category("missing", CategoryPatch::default()).await,
        Err(StoreError::NotFound { entity: "Category", .. })
    );
}
