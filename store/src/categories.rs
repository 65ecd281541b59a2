use chrono::{DateTime, Utc};
use promptverse_shared::{
    Category, CategoryFilter, CategoryPatch, CategorySortKey, CategoryStatus, NewCategory,
    Paginated, Prompt, Subcategory, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON,
    UNCATEGORIZED_ID,
};

use crate::error::{require_text, StoreError, StoreResult};
use crate::query::{compare_json, contains_ci, directed, field_value, normalize_tags};
use crate::records::{new_id, Collection};
use crate::{Session, Store};

pub(crate) fn reserved_category(now: DateTime<Utc>) -> Category {
    Category {
        id: UNCATEGORIZED_ID.to_string(),
        name: "Uncategorized".to_string(),
        description: "Prompts that have not yet been categorized.".to_string(),
        icon: "fas fa-question-circle".to_string(),
        color: "#757575".to_string(),
        status: CategoryStatus::Official,
        rejection_reason: None,
        created_by: "system".to_string(),
        created_date: now,
        updated_date: now,
        prompt_count: 0,
        tags: Vec::new(),
        upvotes: 0,
        downvotes: 0,
        subcategories: Vec::new(),
    }
}

/// One `promptCount` adjustment: the category and optional subcategory a
/// prompt enters (`delta > 0`) or leaves (`delta < 0`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct CountShift<'a> {
    pub category_id: Option<&'a str>,
    pub subcategory_id: Option<&'a str>,
    pub delta: i32,
}

impl<'a> CountShift<'a> {
    pub(crate) fn of(prompt: &'a Prompt, delta: i32) -> Self {
        Self {
            category_id: prompt.category_id.as_deref(),
            subcategory_id: prompt.subcategory_id.as_deref(),
            delta,
        }
    }
}

/// Applies a shift to the in-memory categories. Counters floor at zero.
/// Returns whether anything changed.
pub(crate) fn apply_shift(categories: &mut [Category], shift: CountShift<'_>) -> bool {
    let Some(category_id) = shift.category_id else {
        return false;
    };
    let Some(category) = categories.iter_mut().find(|c| c.id == category_id) else {
        return false;
    };

    category.prompt_count = category.prompt_count.saturating_add_signed(shift.delta);

    if let Some(sub_id) = shift.subcategory_id {
        if let Some(sub) = category.subcategories.iter_mut().find(|s| s.id == sub_id) {
            sub.prompt_count = sub.prompt_count.saturating_add_signed(shift.delta);
        }
    }
    true
}

/// The reserved category is always official.
fn check_reserved_status(id: &str, status: &CategoryStatus) -> StoreResult<()> {
    if id == UNCATEGORIZED_ID && *status != CategoryStatus::Official {
        return Err(StoreError::Reserved(format!(
            "category {UNCATEGORIZED_ID} must stay {}",
            CategoryStatus::Official
        )));
    }
    Ok(())
}

pub(crate) fn filter_categories(mut categories: Vec<Category>, filter: &CategoryFilter) -> Vec<Category> {
    if let Some(status) = &filter.status {
        categories.retain(|c| status.matches(&c.status));
    }
    if let Some(creator) = &filter.created_by {
        categories.retain(|c| &c.created_by == creator);
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        categories.retain(|c| {
            contains_ci(&c.name, &term)
                || contains_ci(&c.description, &term)
                || c.tags.iter().any(|t| contains_ci(t, &term))
        });
    }

    if let Some(sort) = &filter.sort {
        let order = filter.order.unwrap_or(sort.order);
        match &sort.key {
            CategorySortKey::Name => categories.sort_by(|a, b| {
                directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), order)
            }),
            CategorySortKey::PromptCount => {
                categories.sort_by(|a, b| directed(a.prompt_count.cmp(&b.prompt_count), order))
            }
            CategorySortKey::CreatedDate => {
                categories.sort_by(|a, b| directed(a.created_date.cmp(&b.created_date), order))
            }
            CategorySortKey::NetScore => {
                categories.sort_by(|a, b| directed(a.net_score().cmp(&b.net_score()), order))
            }
            CategorySortKey::Field(field) => {
                let mut keyed: Vec<_> = categories
                    .into_iter()
                    .map(|c| (field_value(&c, field), c))
                    .collect();
                keyed.sort_by(|a, b| directed(compare_json(&a.0, &b.0), order));
                categories = keyed.into_iter().map(|(_, c)| c).collect();
            }
        }
    }
    categories
}

impl Store {
    pub async fn list_categories(&self, filter: &CategoryFilter) -> Vec<Category> {
        let categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;
        filter_categories(categories, filter)
    }

    pub async fn list_categories_page(
        &self,
        filter: &CategoryFilter,
        page: usize,
        per_page: usize,
    ) -> Paginated<Category> {
        Paginated::from_items(self.list_categories(filter).await, page, per_page)
    }

    pub async fn get_category(&self, id: &str) -> Option<Category> {
        let categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;
        categories.into_iter().find(|c| c.id == id)
    }

    /// Proposes a new category. It starts out `pending`.
    pub async fn add_category(&self, session: &Session, data: NewCategory) -> StoreResult<Category> {
        require_text("name", &data.name)?;

        let _guard = self.write_lock.lock().await;
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name: data.name.trim().to_string(),
            description: data.description,
            icon: data.icon.unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            color: data.color.unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            status: CategoryStatus::Pending,
            rejection_reason: None,
            created_by: session.user_id().to_string(),
            created_date: now,
            updated_date: now,
            prompt_count: 0,
            tags: normalize_tags(data.tags),
            upvotes: 0,
            downvotes: 0,
            subcategories: data
                .subcategories
                .into_iter()
                .filter(|name| !name.trim().is_empty())
                .map(|name| Subcategory {
                    id: new_id(),
                    name: name.trim().to_string(),
                    prompt_count: 0,
                })
                .collect(),
        };

        categories.push(category.clone());
        self.records
            .write_collection(Collection::Categories, &categories)
            .await?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category added");
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, patch: CategoryPatch) -> StoreResult<Category> {
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        if let Some(status) = &patch.status {
            check_reserved_status(id, status)?;
        }

        self.modify_category(id, |category| {
            if let Some(name) = patch.name {
                category.name = name.trim().to_string();
            }
            if let Some(description) = patch.description {
                category.description = description;
            }
            if let Some(icon) = patch.icon {
                category.icon = icon;
            }
            if let Some(color) = patch.color {
                category.color = color;
            }
            if let Some(status) = patch.status {
                category.status = status;
            }
            if let Some(tags) = patch.tags {
                category.tags = normalize_tags(tags);
            }
            if let Some(reason) = patch.rejection_reason {
                category.rejection_reason = reason;
            }
            Ok(())
        })
        .await
    }

    /// Moderator decision on a category. A reason is kept only for
    /// rejections.
    pub async fn review_category(
        &self,
        id: &str,
        status: CategoryStatus,
        reason: Option<String>,
    ) -> StoreResult<Category> {
        check_reserved_status(id, &status)?;

        let category = self
            .modify_category(id, |category| {
                category.rejection_reason = match status {
                    CategoryStatus::Rejected => reason,
                    _ => None,
                };
                category.status = status;
                Ok(())
            })
            .await?;
        tracing::info!(category_id = %id, status = %category.status, "Category reviewed");
        Ok(category)
    }

    /// Deletes a category. Its prompts move to the reserved category with
    /// their subcategory cleared.
    pub async fn delete_category(&self, id: &str) -> StoreResult<()> {
        if id == UNCATEGORIZED_ID {
            return Err(StoreError::Reserved(format!(
                "category {UNCATEGORIZED_ID} cannot be deleted"
            )));
        }

        let _guard = self.write_lock.lock().await;
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;

        let index = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("Category", id))?;
        categories.remove(index);

        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let mut reassigned: u32 = 0;
        for prompt in prompts.iter_mut().filter(|p| p.category_id.as_deref() == Some(id)) {
            prompt.category_id = Some(UNCATEGORIZED_ID.to_string());
            prompt.subcategory_id = None;
            reassigned += 1;
        }
        if reassigned > 0 {
            self.records.write_collection(Collection::Prompts, &prompts).await?;
        }

        let now = Utc::now();
        match categories.iter_mut().find(|c| c.id == UNCATEGORIZED_ID) {
            Some(uncategorized) => {
                uncategorized.prompt_count = uncategorized.prompt_count.saturating_add(reassigned)
            }
            None => {
                let mut uncategorized = reserved_category(now);
                uncategorized.prompt_count = reassigned;
                categories.push(uncategorized);
            }
        }

        self.records
            .write_collection(Collection::Categories, &categories)
            .await?;
        tracing::info!(category_id = %id, reassigned, "Category deleted");
        Ok(())
    }

    /// Appends a subcategory and returns the updated parent.
    pub async fn add_subcategory(&self, category_id: &str, name: &str) -> StoreResult<Category> {
        require_text("name", name)?;
        let name = name.trim().to_string();

        self.modify_category(category_id, |category| {
            category.subcategories.push(Subcategory {
                id: new_id(),
                name,
                prompt_count: 0,
            });
            Ok(())
        })
        .await
    }

    pub async fn rename_subcategory(
        &self,
        category_id: &str,
        subcategory_id: &str,
        name: &str,
    ) -> StoreResult<Category> {
        require_text("name", name)?;
        let name = name.trim().to_string();

        self.modify_category(category_id, |category| {
            let sub = category
                .subcategories
                .iter_mut()
                .find(|s| s.id == subcategory_id)
                .ok_or_else(|| StoreError::not_found("Subcategory", subcategory_id))?;
            sub.name = name;
            Ok(())
        })
        .await
    }

    /// Removes a subcategory. Prompts filed under it stay in the parent
    /// category with no subcategory.
    pub async fn delete_subcategory(&self, category_id: &str, subcategory_id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;

        let category = categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| StoreError::not_found("Category", category_id))?;

        let before = category.subcategories.len();
        category.subcategories.retain(|s| s.id != subcategory_id);
        if category.subcategories.len() == before {
            return Err(StoreError::not_found("Subcategory", subcategory_id));
        }
        category.updated_date = Utc::now();
        self.records
            .write_collection(Collection::Categories, &categories)
            .await?;

        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let mut cleared = 0usize;
        for prompt in prompts.iter_mut().filter(|p| {
            p.category_id.as_deref() == Some(category_id)
                && p.subcategory_id.as_deref() == Some(subcategory_id)
        }) {
            prompt.subcategory_id = None;
            cleared += 1;
        }
        if cleared > 0 {
            self.records.write_collection(Collection::Prompts, &prompts).await?;
        }

        tracing::info!(category_id, subcategory_id, cleared, "Subcategory deleted");
        Ok(())
    }

    /// Read-modify-write of one category under the write lock. `change`
    /// may refuse by returning an error, in which case nothing is written.
    async fn modify_category(
        &self,
        id: &str,
        change: impl FnOnce(&mut Category) -> StoreResult<()>,
    ) -> StoreResult<Category> {
        let _guard = self.write_lock.lock().await;
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;

        let category = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("Category", id))?;
        change(category)?;
        category.updated_date = Utc::now();
        let updated = category.clone();

        self.records
            .write_collection(Collection::Categories, &categories)
            .await?;
        Ok(updated)
    }

    /// Applies prompt-count shifts in one categories write. Caller holds the
    /// write lock.
    pub(crate) async fn shift_prompt_counts(&self, shifts: &[CountShift<'_>]) -> StoreResult<()> {
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;

        let mut changed = false;
        for shift in shifts {
            changed |= apply_shift(&mut categories, *shift);
        }
        if changed {
            self.records
                .write_collection(Collection::Categories, &categories)
                .await?;
        }
        Ok(())
    }
}
