use chrono::Utc;
use promptverse_shared::{
    NewPrompt, Paginated, Prompt, PromptFilter, PromptPatch, PromptSort, VersionEntry,
    DEFAULT_DIFFICULTY, DEFAULT_LICENSE,
};

use crate::categories::CountShift;
use crate::error::{require_text, StoreError, StoreResult};
use crate::query::{compare_json, contains_ci, directed, field_value, normalize_tags};
use crate::records::{new_id, Collection};
use crate::{Session, Store};

const INITIAL_REASON: &str = "Initial creation";
const DEFAULT_EDIT_REASON: &str = "Content updated";

pub(crate) fn filter_prompts(mut prompts: Vec<Prompt>, filter: &PromptFilter) -> Vec<Prompt> {
    if let Some(category_id) = filter.category_id.as_deref().filter(|c| *c != "all") {
        prompts.retain(|p| p.category_id.as_deref() == Some(category_id));
    }
    if let Some(sub_id) = filter.subcategory_id.as_deref() {
        prompts.retain(|p| p.subcategory_id.as_deref() == Some(sub_id));
    }
    if let Some(user_id) = filter.user_id.as_deref() {
        prompts.retain(|p| p.user_id == user_id);
    }
    if !filter.tags.is_empty() {
        prompts.retain(|p| filter.tags.iter().all(|tag| p.tags.contains(tag)));
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        prompts.retain(|p| {
            contains_ci(&p.title, &term)
                || contains_ci(&p.content, &term)
                || p.description.as_deref().is_some_and(|d| contains_ci(d, &term))
        });
    }
    if let Some(difficulty) = filter.difficulty.as_deref() {
        prompts.retain(|p| p.difficulty == difficulty);
    }

    if let Some(sort) = &filter.sort {
        let order = filter.order.unwrap_or_default();
        match sort {
            PromptSort::Title => prompts.sort_by(|a, b| {
                directed(a.title.to_lowercase().cmp(&b.title.to_lowercase()), order)
            }),
            PromptSort::CreatedDate => {
                prompts.sort_by(|a, b| directed(a.created_date.cmp(&b.created_date), order))
            }
            PromptSort::UpdatedDate => {
                prompts.sort_by(|a, b| directed(a.updated_date.cmp(&b.updated_date), order))
            }
            PromptSort::Views => prompts.sort_by(|a, b| directed(a.views.cmp(&b.views), order)),
            PromptSort::FavoritesCount => prompts
                .sort_by(|a, b| directed(a.favorites_count.cmp(&b.favorites_count), order)),
            PromptSort::Field(field) => {
                let mut keyed: Vec<_> = prompts
                    .into_iter()
                    .map(|p| (field_value(&p, field), p))
                    .collect();
                keyed.sort_by(|a, b| directed(compare_json(&a.0, &b.0), order));
                prompts = keyed.into_iter().map(|(_, p)| p).collect();
            }
        }
    }
    prompts
}

impl Store {
    pub async fn list_prompts(&self, filter: &PromptFilter) -> Vec<Prompt> {
        let prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        filter_prompts(prompts, filter)
    }

    pub async fn list_prompts_page(
        &self,
        filter: &PromptFilter,
        page: usize,
        per_page: usize,
    ) -> Paginated<Prompt> {
        Paginated::from_items(self.list_prompts(filter).await, page, per_page)
    }

    pub async fn get_prompt(&self, id: &str) -> Option<Prompt> {
        let prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        prompts.into_iter().find(|p| p.id == id)
    }

    /// Creates a prompt owned by the session user and counts it in its
    /// category and subcategory.
    pub async fn add_prompt(&self, session: &Session, data: NewPrompt) -> StoreResult<Prompt> {
        require_text("title", &data.title)?;
        require_text("content", &data.content)?;

        let _guard = self.write_lock.lock().await;
        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;

        let now = Utc::now();
        let user_id = session.user_id().to_string();
        let prompt = Prompt {
            id: new_id(),
            user_id: user_id.clone(),
            category_id: data.category_id,
            subcategory_id: data.subcategory_id,
            title: data.title,
            description: data.description,
            version_history: vec![VersionEntry {
                version: 1,
                content: data.content.clone(),
                user_id: user_id.clone(),
                date: now,
                reason: INITIAL_REASON.to_string(),
            }],
            content: data.content,
            tags: normalize_tags(data.tags),
            difficulty: data.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            license: data.license.unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
            allow_edits: data.allow_edits.unwrap_or(true),
            allow_comments: data.allow_comments.unwrap_or(true),
            show_author: data.show_author.unwrap_or(true),
            views: 0,
            favorites_count: 0,
            created_date: now,
            updated_date: now,
        };

        prompts.push(prompt.clone());
        self.records.write_collection(Collection::Prompts, &prompts).await?;

        self.shift_prompt_counts(&[CountShift::of(&prompt, 1)]).await?;
        self.credit_user(&user_id, |u| u.prompts_uploaded = u.prompts_uploaded.saturating_add(1))
            .await?;

        tracing::info!(prompt_id = %prompt.id, category_id = ?prompt.category_id, "Prompt added");
        Ok(prompt)
    }

    /// Merges `patch` into a prompt. A content change appends a version; a
    /// category or subcategory change moves the prompt's counts.
    ///
    /// Changing the category without also naming a subcategory clears the
    /// prompt's subcategory. To move into a subcategory of the new category,
    /// set both `category_id` and `subcategory_id`.
    ///
    /// The prompt is stored before the category counters. If that second
    /// write fails the counters lag behind until [`Store::repair_counters`].
    pub async fn update_prompt(
        &self,
        session: &Session,
        id: &str,
        patch: PromptPatch,
    ) -> StoreResult<Prompt> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        if let Some(content) = &patch.content {
            require_text("content", content)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;

        let index = prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("Prompt", id))?;
        let old = prompts[index].clone();
        let prompt = &mut prompts[index];
        let now = Utc::now();

        if let Some(title) = patch.title {
            prompt.title = title;
        }
        if let Some(description) = patch.description {
            prompt.description = description;
        }
        if let Some(category_id) = patch.category_id {
            // A subcategory only exists under its own category.
            if category_id != old.category_id && patch.subcategory_id.is_none() {
                prompt.subcategory_id = None;
            }
            prompt.category_id = category_id;
        }
        if let Some(subcategory_id) = patch.subcategory_id {
            prompt.subcategory_id = subcategory_id;
        }
        if let Some(tags) = patch.tags {
            prompt.tags = normalize_tags(tags);
        }
        if let Some(difficulty) = patch.difficulty {
            prompt.difficulty = difficulty;
        }
        if let Some(license) = patch.license {
            prompt.license = license;
        }
        if let Some(allow_edits) = patch.allow_edits {
            prompt.allow_edits = allow_edits;
        }
        if let Some(allow_comments) = patch.allow_comments {
            prompt.allow_comments = allow_comments;
        }
        if let Some(show_author) = patch.show_author {
            prompt.show_author = show_author;
        }
        prompt.updated_date = now;

        if let Some(content) = patch.content.filter(|c| *c != old.content) {
            let version = u32::try_from(prompt.version_history.len())
                .unwrap_or(u32::MAX)
                .saturating_add(1);
            prompt.version_history.push(VersionEntry {
                version,
                content: content.clone(),
                user_id: session.user_id().to_string(),
                date: now,
                reason: patch
                    .edit_reason
                    .unwrap_or_else(|| DEFAULT_EDIT_REASON.to_string()),
            });
            prompt.content = content;
            tracing::debug!(prompt_id = %id, version, "Prompt content versioned");
        }

        let updated = prompt.clone();
        self.records.write_collection(Collection::Prompts, &prompts).await?;

        if updated.category_id != old.category_id || updated.subcategory_id != old.subcategory_id {
            self.shift_prompt_counts(&[CountShift::of(&old, -1), CountShift::of(&updated, 1)])
                .await?;
        }

        Ok(updated)
    }

    /// Deletes a prompt and uncounts it. Comments, outputs, favorites and
    /// votes that reference it are kept; see [`Store::purge_orphans`].
    pub async fn delete_prompt(&self, id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;

        let index = prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("Prompt", id))?;
        let removed = prompts.remove(index);

        self.records.write_collection(Collection::Prompts, &prompts).await?;
        self.shift_prompt_counts(&[CountShift::of(&removed, -1)]).await?;

        tracing::info!(prompt_id = %id, "Prompt deleted");
        Ok(())
    }

    pub async fn increment_prompt_views(&self, id: &str) -> StoreResult<Prompt> {
        let _guard = self.write_lock.lock().await;
        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;

        let prompt = prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("Prompt", id))?;
        prompt.views = prompt.views.saturating_add(1);
        let updated = prompt.clone();

        self.records.write_collection(Collection::Prompts, &prompts).await?;
        Ok(updated)
    }
}
