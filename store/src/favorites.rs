use chrono::Utc;
use promptverse_shared::{Favorite, Prompt};

use crate::error::{StoreError, StoreResult};
use crate::records::Collection;
use crate::Store;

impl Store {
    /// Marks a prompt as a favorite of `user_id`. Returns `false` without
    /// changing anything if it already was one.
    pub async fn add_favorite(&self, prompt_id: &str, user_id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;

        if favorites
            .iter()
            .any(|f| f.prompt_id == prompt_id && f.user_id == user_id)
        {
            return Ok(false);
        }

        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let prompt = prompts
            .iter_mut()
            .find(|p| p.id == prompt_id)
            .ok_or_else(|| StoreError::not_found("Prompt", prompt_id))?;

        favorites.push(Favorite {
            prompt_id: prompt_id.to_string(),
            user_id: user_id.to_string(),
            date: Utc::now(),
        });
        self.records
            .write_collection(Collection::Favorites, &favorites)
            .await?;

        prompt.favorites_count = prompt.favorites_count.saturating_add(1);
        self.records.write_collection(Collection::Prompts, &prompts).await?;
        Ok(true)
    }

    /// Returns `false` if the prompt was not a favorite of `user_id`.
    pub async fn remove_favorite(&self, prompt_id: &str, user_id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;

        let before = favorites.len();
        favorites.retain(|f| !(f.prompt_id == prompt_id && f.user_id == user_id));
        if favorites.len() == before {
            return Ok(false);
        }
        self.records
            .write_collection(Collection::Favorites, &favorites)
            .await?;

        let mut prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        if let Some(prompt) = prompts.iter_mut().find(|p| p.id == prompt_id) {
            prompt.favorites_count = prompt.favorites_count.saturating_sub(1);
            self.records.write_collection(Collection::Prompts, &prompts).await?;
        }
        Ok(true)
    }

    pub async fn list_favorites_for_user(&self, user_id: &str) -> Vec<Favorite> {
        let favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;
        favorites.into_iter().filter(|f| f.user_id == user_id).collect()
    }

    pub async fn is_favorite(&self, prompt_id: &str, user_id: &str) -> bool {
        let favorites: Vec<Favorite> = self.records.read_collection(Collection::Favorites).await;
        favorites
            .iter()
            .any(|f| f.prompt_id == prompt_id && f.user_id == user_id)
    }
}
