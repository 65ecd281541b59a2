//! Up/down voting on categories, comments and outputs.

use chrono::{DateTime, Utc};
use promptverse_shared::{
    Category, Comment, ItemType, Output, Vote, VoteCounts, VoteOutcome, VoteType,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::records::Collection;
use crate::{Session, Store};

/// A record that carries cached `upvotes`/`downvotes` counters.
pub(crate) trait Votable: Serialize + DeserializeOwned + Send {
    const COLLECTION: Collection;
    const ITEM_TYPE: ItemType;
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn counts(&self) -> VoteCounts;
    fn counters_mut(&mut self) -> (&mut u32, &mut u32);
}

macro_rules! impl_votable {
    ($ty:ty, $collection:expr, $item_type:expr, $entity:literal) => {
        impl Votable for $ty {
            const COLLECTION: Collection = $collection;
            const ITEM_TYPE: ItemType = $item_type;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn counts(&self) -> VoteCounts {
                VoteCounts {
                    upvotes: self.upvotes,
                    downvotes: self.downvotes,
                }
            }

            fn counters_mut(&mut self) -> (&mut u32, &mut u32) {
                (&mut self.upvotes, &mut self.downvotes)
            }
        }
    };
}

impl_votable!(Category, Collection::Categories, ItemType::Category, "Category");
impl_votable!(Comment, Collection::Comments, ItemType::Comment, "Comment");
impl_votable!(Output, Collection::Outputs, ItemType::Output, "Output");

/// Counter change produced by one vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TallyDelta {
    pub up: i32,
    pub down: i32,
}

impl TallyDelta {
    fn bump(&mut self, vote_type: VoteType, by: i32) {
        match vote_type {
            VoteType::Up => self.up += by,
            VoteType::Down => self.down += by,
        }
    }
}

/// Applies the toggle rules to the votes list:
/// no vote casts it, the same vote withdraws it, the other vote flips it.
/// Returns the counter change and the user's resulting vote.
pub(crate) fn apply_vote(
    votes: &mut Vec<Vote>,
    item_id: &str,
    item_type: ItemType,
    user_id: &str,
    vote_type: VoteType,
    now: DateTime<Utc>,
) -> (TallyDelta, Option<VoteType>) {
    let mut delta = TallyDelta::default();
    let existing = votes
        .iter()
        .position(|v| v.item_id == item_id && v.item_type == item_type && v.user_id == user_id);

    let user_vote = match existing {
        Some(index) if votes[index].vote_type == vote_type => {
            votes.remove(index);
            delta.bump(vote_type, -1);
            None
        }
        Some(index) => {
            let vote = &mut votes[index];
            delta.bump(vote.vote_type, -1);
            delta.bump(vote_type, 1);
            vote.vote_type = vote_type;
            vote.date = now;
            Some(vote_type)
        }
        None => {
            votes.push(Vote {
                item_id: item_id.to_string(),
                item_type,
                user_id: user_id.to_string(),
                vote_type,
                date: now,
            });
            delta.bump(vote_type, 1);
            Some(vote_type)
        }
    };

    (delta, user_vote)
}

/// Tally of `votes` for one item, independent of any cached counters.
pub(crate) fn count_votes(votes: &[Vote], item_id: &str, item_type: ItemType) -> VoteCounts {
    votes
        .iter()
        .filter(|v| v.item_id == item_id && v.item_type == item_type)
        .fold(VoteCounts::default(), |mut counts, v| {
            match v.vote_type {
                VoteType::Up => counts.upvotes += 1,
                VoteType::Down => counts.downvotes += 1,
            }
            counts
        })
}

impl Store {
    /// Casts, withdraws or flips the session user's vote on an item and
    /// returns the item's updated counters.
    pub async fn vote(
        &self,
        session: &Session,
        item_id: &str,
        item_type: ItemType,
        vote_type: VoteType,
    ) -> StoreResult<VoteOutcome> {
        let _guard = self.write_lock.lock().await;

        let exists = match item_type {
            ItemType::Category => self.votable_exists::<Category>(item_id).await,
            ItemType::Comment => self.votable_exists::<Comment>(item_id).await,
            ItemType::Output => self.votable_exists::<Output>(item_id).await,
        };
        if !exists {
            return Err(StoreError::not_found(item_type_entity(item_type), item_id));
        }

        let mut votes: Vec<Vote> = self.records.read_collection(Collection::Votes).await;
        let (delta, user_vote) = apply_vote(
            &mut votes,
            item_id,
            item_type,
            session.user_id(),
            vote_type,
            Utc::now(),
        );
        self.records.write_collection(Collection::Votes, &votes).await?;

        let counts = match item_type {
            ItemType::Category => self.apply_tally::<Category>(item_id, delta).await?,
            ItemType::Comment => self.apply_tally::<Comment>(item_id, delta).await?,
            ItemType::Output => self.apply_tally::<Output>(item_id, delta).await?,
        };

        tracing::debug!(item_id, %item_type, ?user_vote, "Vote recorded");
        Ok(VoteOutcome {
            upvotes: counts.upvotes,
            downvotes: counts.downvotes,
            user_vote,
        })
    }

    /// Counts recomputed from the vote records themselves.
    pub async fn get_votes_for_item(&self, item_id: &str, item_type: ItemType) -> VoteCounts {
        let votes: Vec<Vote> = self.records.read_collection(Collection::Votes).await;
        count_votes(&votes, item_id, item_type)
    }

    pub async fn get_user_vote_for_item(
        &self,
        item_id: &str,
        item_type: ItemType,
        user_id: &str,
    ) -> Option<VoteType> {
        let votes: Vec<Vote> = self.records.read_collection(Collection::Votes).await;
        votes
            .into_iter()
            .find(|v| v.item_id == item_id && v.item_type == item_type && v.user_id == user_id)
            .map(|v| v.vote_type)
    }

    async fn votable_exists<T: Votable>(&self, item_id: &str) -> bool {
        let items: Vec<T> = self.records.read_collection(T::COLLECTION).await;
        items.iter().any(|item| item.id() == item_id)
    }

    async fn apply_tally<T: Votable>(&self, item_id: &str, delta: TallyDelta) -> StoreResult<VoteCounts> {
        let mut items: Vec<T> = self.records.read_collection(T::COLLECTION).await;
        let item = items
            .iter_mut()
            .find(|item| item.id() == item_id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, item_id))?;

        let (up, down) = item.counters_mut();
        *up = up.saturating_add_signed(delta.up);
        *down = down.saturating_add_signed(delta.down);
        let counts = item.counts();

        self.records.write_collection(T::COLLECTION, &items).await?;
        Ok(counts)
    }
}

fn item_type_entity(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Category => Category::ENTITY,
        ItemType::Comment => Comment::ENTITY,
        ItemType::Output => Output::ENTITY,
    }
}
