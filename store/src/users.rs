use chrono::{DateTime, Utc};
use promptverse_shared::{NewUser, Preferences, User, UserRole, ANONYMOUS_USER_ID};

use crate::error::{require_text, StoreError, StoreResult};
use crate::records::{new_id, Collection};
use crate::Store;

/// The acting user for a sequence of store calls. Owned by the caller and
/// passed to every operation that records who did something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_USER_ID)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Guest record for a session id nobody registered. Each guest gets a
/// username and email derived from its id.
fn placeholder_user(id: &str, now: DateTime<Utc>) -> User {
    let (username, email) = if id == ANONYMOUS_USER_ID {
        (
            "Anonymous User".to_string(),
            "anonymous@promptverse.example.com".to_string(),
        )
    } else {
        (
            format!("guest-{id}"),
            format!("{id}@guest.promptverse.example.com"),
        )
    };

    User {
        id: id.to_string(),
        username,
        email,
        profile_picture: Some(format!("https://i.pravatar.cc/150?u={id}")),
        bio: Some("A guest exploring PromptVerse.".to_string()),
        role: UserRole::Guest,
        join_date: now,
        last_login: now,
        preferences: Preferences::default(),
        prompts_uploaded: 0,
        comments_made: 0,
        outputs_shared: 0,
    }
}

/// Index of the session user in `users`, appending a guest placeholder if
/// the user does not exist yet. The bool is true when a user was created.
pub(crate) fn ensure_user(users: &mut Vec<User>, user_id: &str, now: DateTime<Utc>) -> (usize, bool) {
    match users.iter().position(|u| u.id == user_id) {
        Some(index) => (index, false),
        None => {
            tracing::info!(user_id, "Creating placeholder user for session");
            users.push(placeholder_user(user_id, now));
            (users.len() - 1, true)
        }
    }
}

impl Store {
    /// The session's user, created as a guest on first access.
    pub async fn current_user(&self, session: &Session) -> StoreResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.records.read_collection(Collection::Users).await;
        let (index, created) = ensure_user(&mut users, session.user_id(), Utc::now());
        if created {
            self.records.write_collection(Collection::Users, &users).await?;
        }
        Ok(users.swap_remove(index))
    }

    /// Points the session at another user and returns that user, creating a
    /// placeholder if needed.
    pub async fn switch_user(&self, session: &mut Session, user_id: &str) -> StoreResult<User> {
        session.user_id = user_id.to_string();
        self.current_user(session).await
    }

    pub async fn get_user(&self, id: &str) -> Option<User> {
        let users: Vec<User> = self.records.read_collection(Collection::Users).await;
        users.into_iter().find(|u| u.id == id)
    }

    /// Registers a member. Username and email must not be taken by another
    /// registered user; guest placeholders do not reserve either.
    pub async fn add_user(&self, data: NewUser) -> StoreResult<User> {
        require_text("username", &data.username)?;
        require_text("email", &data.email)?;

        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.records.read_collection(Collection::Users).await;

        let taken = users
            .iter()
            .filter(|u| u.role != UserRole::Guest)
            .any(|u| u.username == data.username || u.email.eq_ignore_ascii_case(&data.email));
        if taken {
            tracing::warn!(username = %data.username, "User with this username or email already exists");
            return Err(StoreError::Duplicate(format!(
                "user {} / {}",
                data.username, data.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            username: data.username,
            email: data.email,
            profile_picture: data.profile_picture,
            bio: data.bio,
            role: data.role.unwrap_or(UserRole::Member),
            join_date: now,
            last_login: now,
            preferences: data.preferences.unwrap_or(Preferences {
                notifications: true,
                ..Preferences::default()
            }),
            prompts_uploaded: 0,
            comments_made: 0,
            outputs_shared: 0,
        };

        users.push(user.clone());
        self.records.write_collection(Collection::Users, &users).await?;
        tracing::info!(user_id = %user.id, "User added");
        Ok(user)
    }

    pub async fn update_preferences(
        &self,
        session: &Session,
        preferences: Preferences,
    ) -> StoreResult<User> {
        self.modify_session_user(session, |user, _| user.preferences = preferences)
            .await
    }

    /// Stamps `lastLogin` with the current time.
    pub async fn touch_login(&self, session: &Session) -> StoreResult<User> {
        self.modify_session_user(session, |user, now| user.last_login = now)
            .await
    }

    async fn modify_session_user(
        &self,
        session: &Session,
        change: impl FnOnce(&mut User, DateTime<Utc>),
    ) -> StoreResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.records.read_collection(Collection::Users).await;
        let now = Utc::now();
        let (index, _) = ensure_user(&mut users, session.user_id(), now);
        change(&mut users[index], now);
        self.records.write_collection(Collection::Users, &users).await?;
        Ok(users.swap_remove(index))
    }

    /// Applies `change` to user `user_id`. Caller holds the write lock.
    pub(crate) async fn credit_user(
        &self,
        user_id: &str,
        change: impl FnOnce(&mut User),
    ) -> StoreResult<()> {
        let mut users: Vec<User> = self.records.read_collection(Collection::Users).await;
        let (index, _) = ensure_user(&mut users, user_id, Utc::now());
        change(&mut users[index]);
        self.records.write_collection(Collection::Users, &users).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_user_creates_once() {
        let mut users = Vec::new();
        let now = Utc::now();
        assert_eq!(ensure_user(&mut users, ANONYMOUS_USER_ID, now), (0, true));
        assert_eq!(ensure_user(&mut users, ANONYMOUS_USER_ID, now), (0, false));
        assert_eq!(users[0].role, UserRole::Guest);
        assert_eq!(users[0].email, "anonymous@promptverse.example.com");
        assert_eq!(users[0].username, "Anonymous User");

        ensure_user(&mut users, "visitor", now);
        assert_eq!(users[1].username, "guest-visitor");
        assert_eq!(users[1].email, "visitor@guest.promptverse.example.com");
    }
}
