//! Recomputes the denormalized counters from the records they summarize and
//! cleans up records whose target has been deleted.

use std::collections::{HashMap, HashSet};

use promptverse_shared::{Category, Comment, Favorite, ItemType, Output, Prompt, Vote};
use serde::Serialize;

use crate::error::StoreResult;
use crate::records::Collection;
use crate::votes::{count_votes, Votable};
use crate::Store;

/// A stored counter that disagrees with its ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub entity: &'static str,
    pub id: String,
    pub field: &'static str,
    pub stored: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub drifts: Vec<CounterDrift>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}

/// Number of records removed per collection by [`Store::purge_orphans`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub comments: usize,
    pub outputs: usize,
    pub favorites: usize,
    pub votes: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.comments + self.outputs + self.favorites + self.votes
    }
}

/// Compares `stored` with `actual`, records the drift, and overwrites the
/// counter when `repair` is set. Returns whether they differed.
fn check(
    drifts: &mut Vec<CounterDrift>,
    entity: &'static str,
    id: &str,
    field: &'static str,
    stored: &mut u32,
    actual: u32,
    repair: bool,
) -> bool {
    if *stored == actual {
        return false;
    }
    drifts.push(CounterDrift {
        entity,
        id: id.to_string(),
        field,
        stored: *stored,
        actual,
    });
    if repair {
        *stored = actual;
    }
    true
}

fn check_prompt_counts(
    categories: &mut [Category],
    prompts: &[Prompt],
    drifts: &mut Vec<CounterDrift>,
    repair: bool,
) -> bool {
    let mut per_category: HashMap<&str, u32> = HashMap::new();
    let mut per_subcategory: HashMap<(&str, &str), u32> = HashMap::new();
    for prompt in prompts {
        let Some(category_id) = prompt.category_id.as_deref() else {
            continue;
        };
        *per_category.entry(category_id).or_default() += 1;
        if let Some(sub_id) = prompt.subcategory_id.as_deref() {
            *per_subcategory.entry((category_id, sub_id)).or_default() += 1;
        }
    }

    let mut changed = false;
    for category in categories.iter_mut() {
        let actual = per_category.get(category.id.as_str()).copied().unwrap_or(0);
        changed |= check(
            drifts,
            "Category",
            &category.id,
            "promptCount",
            &mut category.prompt_count,
            actual,
            repair,
        );
        for sub in category.subcategories.iter_mut() {
            let actual = per_subcategory
                .get(&(category.id.as_str(), sub.id.as_str()))
                .copied()
                .unwrap_or(0);
            changed |= check(
                drifts,
                "Subcategory",
                &sub.id,
                "promptCount",
                &mut sub.prompt_count,
                actual,
                repair,
            );
        }
    }
    changed
}

fn check_favorite_counts(
    prompts: &mut [Prompt],
    favorites: &[Favorite],
    drifts: &mut Vec<CounterDrift>,
    repair: bool,
) -> bool {
    let mut per_prompt: HashMap<&str, u32> = HashMap::new();
    for favorite in favorites {
        *per_prompt.entry(favorite.prompt_id.as_str()).or_default() += 1;
    }

    let mut changed = false;
    for prompt in prompts.iter_mut() {
        let actual = per_prompt.get(prompt.id.as_str()).copied().unwrap_or(0);
        changed |= check(
            drifts,
            "Prompt",
            &prompt.id,
            "favoritesCount",
            &mut prompt.favorites_count,
            actual,
            repair,
        );
    }
    changed
}

fn check_vote_counts<T: Votable>(
    items: &mut [T],
    votes: &[Vote],
    drifts: &mut Vec<CounterDrift>,
    repair: bool,
) -> bool {
    let mut changed = false;
    for item in items.iter_mut() {
        let id = item.id().to_string();
        let actual = count_votes(votes, &id, T::ITEM_TYPE);
        let (up, down) = item.counters_mut();
        changed |= check(drifts, T::ENTITY, &id, "upvotes", up, actual.upvotes, repair);
        changed |= check(drifts, T::ENTITY, &id, "downvotes", down, actual.downvotes, repair);
    }
    changed
}

impl Store {
    /// Reports every counter that disagrees with the records it summarizes.
    pub async fn audit_counters(&self) -> StoreResult<AuditReport> {
        let _guard = self.write_lock.lock().await;
        self.reconcile(false).await
    }

    /// Like [`Store::audit_counters`], but also rewrites the drifted
    /// counters. The report lists what was fixed.
    pub async fn repair_counters(&self) -> StoreResult<AuditReport> {
        let _guard = self.write_lock.lock().await;
        let report = self.reconcile(true).await?;
        if !report.is_clean() {
            tracing::warn!(drifts = report.drifts.len(), "Counters repaired");
        }
        Ok(report)
    }

    /// Removes comments, outputs and favorites of deleted prompts, and votes
    /// on items that no longer exist.
    pub async fn purge_orphans(&self) -> StoreResult<PurgeReport> {
        let _guard = self.write_lock.lock().await;
        let mut report = PurgeReport::default();

        let prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let prompt_ids: HashSet<&str> = prompts.iter().map(|p| p.id.as_str()).collect();

        let mut comments: Vec<Comment> = self.records.read_collection(Collection::Comments).await;
        let before = comments.len();
        comments.retain(|c| prompt_ids.contains(c.prompt_id.as_str()));
        report.comments = before - comments.len();
        if report.comments > 0 {
            self.records.write_collection(Collection::Comments, &comments).await?;
        }

        let mut outputs: Vec<Output> = self.records.read_collection(Collection::Outputs).await;
        let before = outputs.len();
        outputs.retain(|o| prompt_ids.contains(o.prompt_id.as_str()));
        report.outputs = before - outputs.len();
        if report.outputs > 0 {
            self.records.write_collection(Collection::Outputs, &outputs).await?;
        }

        let mut favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;
        let before = favorites.len();
        favorites.retain(|f| prompt_ids.contains(f.prompt_id.as_str()));
        report.favorites = before - favorites.len();
        if report.favorites > 0 {
            self.records.write_collection(Collection::Favorites, &favorites).await?;
        }

        let categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;
        let live: HashSet<(ItemType, &str)> = categories
            .iter()
            .map(|c| (ItemType::Category, c.id.as_str()))
            .chain(comments.iter().map(|c| (ItemType::Comment, c.id.as_str())))
            .chain(outputs.iter().map(|o| (ItemType::Output, o.id.as_str())))
            .collect();

        let mut votes: Vec<Vote> = self.records.read_collection(Collection::Votes).await;
        let before = votes.len();
        votes.retain(|v| live.contains(&(v.item_type, v.item_id.as_str())));
        report.votes = before - votes.len();
        if report.votes > 0 {
            self.records.write_collection(Collection::Votes, &votes).await?;
        }

        tracing::info!(
            comments = report.comments,
            outputs = report.outputs,
            favorites = report.favorites,
            votes = report.votes,
            "Orphans purged"
        );
        Ok(report)
    }

    /// Caller holds the write lock.
    async fn reconcile(&self, repair: bool) -> StoreResult<AuditReport> {
        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let mut categories: Vec<Category> = self.records.read_collection(Collection::Categories).await;
        let mut comments: Vec<Comment> = self.records.read_collection(Collection::Comments).await;
        let mut outputs: Vec<Output> = self.records.read_collection(Collection::Outputs).await;
        let favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;
        let votes: Vec<Vote> = self.records.read_collection(Collection::Votes).await;

        let mut drifts = Vec::new();
        let categories_changed = check_prompt_counts(&mut categories, &prompts, &mut drifts, repair)
            | check_vote_counts(&mut categories, &votes, &mut drifts, repair);
        let prompts_changed = check_favorite_counts(&mut prompts, &favorites, &mut drifts, repair);
        let comments_changed = check_vote_counts(&mut comments, &votes, &mut drifts, repair);
        let outputs_changed = check_vote_counts(&mut outputs, &votes, &mut drifts, repair);

        if repair {
            if categories_changed {
                self.records
                    .write_collection(Collection::Categories, &categories)
                    .await?;
            }
            if prompts_changed {
                self.records.write_collection(Collection::Prompts, &prompts).await?;
            }
            if comments_changed {
                self.records.write_collection(Collection::Comments, &comments).await?;
            }
            if outputs_changed {
                self.records.write_collection(Collection::Outputs, &outputs).await?;
            }
        }

        Ok(AuditReport { drifts })
    }
}
