//! Comments and shared outputs. Both are flat, votable notes attached to a
//! single prompt and share one implementation.

use chrono::{DateTime, Utc};
use promptverse_shared::{Comment, NewComment, NewOutput, Output, Prompt, User};

use crate::error::{require_text, StoreError, StoreResult};
use crate::records::{new_id, Collection};
use crate::votes::Votable;
use crate::{Session, Store};

pub(crate) trait Remark: Votable + Clone {
    /// Whether the prompt's `allowComments` flag applies.
    const GATED_BY_ALLOW_COMMENTS: bool;

    fn create(id: String, prompt_id: String, user_id: String, content: String, now: DateTime<Utc>)
        -> Self;
    fn prompt_id(&self) -> &str;
    fn created_date(&self) -> DateTime<Utc>;
    fn edit(&mut self, content: String, now: DateTime<Utc>);
    fn credit_author(user: &mut User);
}

macro_rules! impl_remark {
    ($ty:ident, $gated:literal, $counter:ident) => {
        impl Remark for $ty {
            const GATED_BY_ALLOW_COMMENTS: bool = $gated;

            fn create(
                id: String,
                prompt_id: String,
                user_id: String,
                content: String,
                now: DateTime<Utc>,
            ) -> Self {
                $ty {
                    id,
                    prompt_id,
                    user_id,
                    content,
                    created_date: now,
                    updated_date: now,
                    upvotes: 0,
                    downvotes: 0,
                }
            }

            fn prompt_id(&self) -> &str {
                &self.prompt_id
            }

            fn created_date(&self) -> DateTime<Utc> {
                self.created_date
            }

            fn edit(&mut self, content: String, now: DateTime<Utc>) {
                self.content = content;
                self.updated_date = now;
            }

            fn credit_author(user: &mut User) {
                user.$counter = user.$counter.saturating_add(1);
            }
        }
    };
}

impl_remark!(Comment, true, comments_made);
impl_remark!(Output, false, outputs_shared);

/// Sanitized, non-empty remark text.
fn clean_content(content: &str) -> StoreResult<String> {
    let content = ammonia::clean(content);
    require_text("content", &content)?;
    Ok(content)
}

impl Store {
    pub async fn list_comments_for_prompt(&self, prompt_id: &str) -> Vec<Comment> {
        self.list_remarks(prompt_id).await
    }

    pub async fn add_comment(&self, session: &Session, data: NewComment) -> StoreResult<Comment> {
        self.add_remark(session, &data.prompt_id, &data.content).await
    }

    pub async fn update_comment(&self, id: &str, content: &str) -> StoreResult<Comment> {
        self.update_remark(id, content).await
    }

    pub async fn delete_comment(&self, id: &str) -> StoreResult<()> {
        self.delete_remark::<Comment>(id).await
    }

    pub async fn list_outputs_for_prompt(&self, prompt_id: &str) -> Vec<Output> {
        self.list_remarks(prompt_id).await
    }

    pub async fn add_output(&self, session: &Session, data: NewOutput) -> StoreResult<Output> {
        self.add_remark(session, &data.prompt_id, &data.content).await
    }

    pub async fn update_output(&self, id: &str, content: &str) -> StoreResult<Output> {
        self.update_remark(id, content).await
    }

    pub async fn delete_output(&self, id: &str) -> StoreResult<()> {
        self.delete_remark::<Output>(id).await
    }

    /// Newest first.
    async fn list_remarks<R: Remark>(&self, prompt_id: &str) -> Vec<R> {
        let mut remarks: Vec<R> = self.records.read_collection(R::COLLECTION).await;
        remarks.retain(|r| r.prompt_id() == prompt_id);
        remarks.sort_by_key(|r| std::cmp::Reverse(r.created_date()));
        remarks
    }

    async fn add_remark<R: Remark>(
        &self,
        session: &Session,
        prompt_id: &str,
        content: &str,
    ) -> StoreResult<R> {
        let content = clean_content(content)?;

        let _guard = self.write_lock.lock().await;

        let prompts: Vec<Prompt> = self.records.read_collection(Collection::Prompts).await;
        let prompt = prompts
            .iter()
            .find(|p| p.id == prompt_id)
            .ok_or_else(|| StoreError::not_found("Prompt", prompt_id))?;
        if R::GATED_BY_ALLOW_COMMENTS && !prompt.allow_comments {
            return Err(StoreError::Validation(format!(
                "comments are disabled on prompt {prompt_id}"
            )));
        }

        let mut remarks: Vec<R> = self.records.read_collection(R::COLLECTION).await;
        let remark = R::create(
            new_id(),
            prompt_id.to_string(),
            session.user_id().to_string(),
            content,
            Utc::now(),
        );
        remarks.push(remark.clone());
        self.records.write_collection(R::COLLECTION, &remarks).await?;

        self.credit_user(session.user_id(), R::credit_author).await?;

        tracing::info!(entity = R::ENTITY, id = %remark.id(), prompt_id, "Remark added");
        Ok(remark)
    }

    async fn update_remark<R: Remark>(&self, id: &str, content: &str) -> StoreResult<R> {
        let content = clean_content(content)?;

        let _guard = self.write_lock.lock().await;
        let mut remarks: Vec<R> = self.records.read_collection(R::COLLECTION).await;

        let remark = remarks
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found(R::ENTITY, id))?;
        remark.edit(content, Utc::now());
        let updated = remark.clone();

        self.records.write_collection(R::COLLECTION, &remarks).await?;
        Ok(updated)
    }

    async fn delete_remark<R: Remark>(&self, id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut remarks: Vec<R> = self.records.read_collection(R::COLLECTION).await;

        let before = remarks.len();
        remarks.retain(|r| r.id() != id);
        if remarks.len() == before {
            return Err(StoreError::not_found(R::ENTITY, id));
        }

        self.records.write_collection(R::COLLECTION, &remarks).await?;
        tracing::info!(entity = R::ENTITY, id, "Remark deleted");
        Ok(())
    }
}
