use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::view::{PostView, with_authors};
use crate::domain::{
    Caller, NewUser, Page, PageRequest, Paginated, PostFilter, PostSort, PostStatus, User,
    UserChanges, UserProfile,
};
use crate::error::DomainError;
use crate::ports::{PasswordService, PostRepository, UserRepository};

/// User management: registration, profiles, admin listing and removal.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { users, posts }
    }

    /// Create a regular account. Email is stored lowercased.
    #[instrument(skip(self, input, passwords), fields(username = %input.username))]
    pub async fn register(
        &self,
        input: NewUser,
        passwords: &dyn PasswordService,
    ) -> Result<User, DomainError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate("Email already registered".to_string()));
        }
        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(DomainError::Duplicate("Username already taken".to_string()));
        }

        let password_hash = passwords
            .hash(&input.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut user = User::new(input.username, email, password_hash);
        user.first_name = input.first_name;
        user.last_name = input.last_name;

        let saved = self.users.create(user).await?;
        tracing::info!(user_id = %saved.id, "User registered");
        Ok(saved)
    }

    /// Check credentials. Unknown email, wrong password and deactivated
    /// accounts are indistinguishable to the caller.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        passwords: &dyn PasswordService,
    ) -> Result<User, DomainError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(DomainError::Unauthorized);
        };

        let valid = passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid || !user.is_active {
            tracing::warn!(user_id = %user.id, "Rejected login attempt");
            return Err(DomainError::Unauthorized);
        }

        Ok(user)
    }

    pub async fn find(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    /// Admin-only listing with optional free-text search.
    pub async fn list(
        &self,
        caller: &Caller,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paginated<User>, DomainError> {
        caller.require_admin()?;

        let found = self.users.list(search, page).await?;
        Ok(Paginated::new(found, page))
    }

    /// Public profile, with the number of published posts.
    pub async fn profile(&self, id: Uuid) -> Result<UserProfile, DomainError> {
        let user = self.find(id).await?;
        let posts_count = self
            .posts
            .count(&PostFilter::by_author(id, Some(PostStatus::Published)))
            .await?;

        Ok(UserProfile { user, posts_count })
    }

    /// Posts written by `id`.
    ///
    /// Anonymous callers only see published posts; authenticated callers may
    /// pick a status, and see every status when they do not.
    pub async fn posts(
        &self,
        caller: Option<&Caller>,
        id: Uuid,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<Paginated<PostView>, DomainError> {
        self.find(id).await?;

        let status = match caller {
            None => Some(PostStatus::Published),
            Some(_) => status,
        };
        let found = self
            .posts
            .list(&PostFilter::by_author(id, status), PostSort::PublishedAt, page)
            .await?;
        let total = found.total;
        let items = with_authors(self.users.as_ref(), found.items).await?;

        Ok(Paginated::new(Page::new(items, total), page))
    }

    /// Update a profile. Role and active flag are silently dropped unless the
    /// caller is an admin.
    #[instrument(skip(self, changes), fields(caller_id = %caller.id))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<User, DomainError> {
        caller.require_self_or_admin(id)?;
        changes.validate()?;

        let changes = if caller.is_admin() {
            changes
        } else {
            changes.without_privileged()
        };

        let mut user = self.find(id).await?;
        user.apply(changes);

        let saved = self.users.update(user).await?;
        tracing::info!(user_id = %saved.id, "User updated");
        Ok(saved)
    }

    /// Admin-only hard delete that removes the user's posts first.
    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        caller.require_admin()?;
        if caller.id == id {
            return Err(DomainError::InvalidOperation(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.find(id).await?;

        let removed = self.posts.delete_by_author(id).await?;
        self.users.delete(id).await?;
        tracing::info!(user_id = %id, posts_removed = removed, "User deleted");
        Ok(())
    }
}
