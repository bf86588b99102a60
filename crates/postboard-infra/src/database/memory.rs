//! In-memory store - auto-provisioned, lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use postboard_core::domain::{MAX_VIEWS, Post, User};
use postboard_core::error::RepoError;
use postboard_core::ports::{BaseRepository, PostRepository, UserRepository};

/// Entities that can live in an [`InMemoryRepository`].
pub trait Keyed: Clone + Send + Sync + 'static {
    fn key(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;

    /// Unique-column check: `true` if `other` is a different row holding a
    /// value that must be unique.
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }
}

impl Keyed for User {
    fn key(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.id != other.id && self.email == other.email
    }
}

impl Keyed for Post {
    fn key(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Generic in-memory table using a HashMap behind an async RwLock.
///
/// Every operation takes the lock once, so each call is atomic with respect
/// to the others.
pub struct InMemoryRepository<T: Keyed> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Keyed> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Keyed> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory user repository.
pub type InMemoryUserRepository = InMemoryRepository<User>;

/// In-memory post repository.
pub type InMemoryPostRepository = InMemoryRepository<Post>;

#[async_trait]
impl<T: Keyed> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<T>, RepoError> {
        let rows = self.rows.read().await;
        let mut all: Vec<T> = rows.values().cloned().collect();
        all.sort_by_key(|row| row.created_at());
        Ok(all)
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|row| entity.conflicts_with(row)) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        rows.insert(entity.key(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.write().await;
        rows.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let mut rows = self.rows.write().await;
        let Some(post) = rows.get_mut(&id) else {
            return Ok(None);
        };

        post.views = post
            .views
            .checked_add(1)
            .filter(|views| *views <= MAX_VIEWS)
            .ok_or_else(|| RepoError::Constraint("views counter is at its maximum".to_string()))?;
        Ok(Some(post.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn post(title: &str) -> Post {
        Post::new(title.to_string(), "Some text body".to_string(), "alice".to_string())
    }

    #[tokio::test]
    async fn test_save_find_delete() {
        let repo = InMemoryPostRepository::new();
        let saved = repo.save(post("Hello World")).await.unwrap();

        let found = repo.find_by_id(saved.id).await.unwrap();
        assert_eq!(found, Some(saved.clone()));

        repo.delete(saved.id).await.unwrap();
        assert!(repo.find_by_id(saved.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(saved.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_find_all_oldest_first() {
        let repo = InMemoryPostRepository::new();
        let mut first = post("First post");
        first.created_at -= chrono::TimeDelta::minutes(5);
        let second = post("Second post");

        repo.save(second.clone()).await.unwrap();
        repo.save(first.clone()).await.unwrap();

        let ids: Vec<Uuid> = repo.find_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = repo.save(post("Hello World")).await.unwrap().id;

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment_views(id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().views, 50);
    }

    #[tokio::test]
    async fn test_increment_missing_post() {
        let repo = InMemoryPostRepository::new();
        assert!(repo.increment_views(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_stops_at_max_views() {
        let repo = InMemoryPostRepository::new();
        let mut full = post("Hello World");
        full.views = MAX_VIEWS;
        let id = repo.save(full).await.unwrap().id;

        assert!(matches!(
            repo.increment_views(id).await,
            Err(RepoError::Constraint(_))
        ));
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().views, MAX_VIEWS);
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = User::new(
            "Alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            None,
            false,
        );
        repo.save(user.clone()).await.unwrap();

        let found = repo.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_email_unique() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let user = User::new(
                        format!("User {i}"),
                        "same@example.com".into(),
                        "hash".into(),
                        None,
                        true,
                    );
                    repo.save(user).await
                })
            })
            .collect();

        let mut saved = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => saved += 1,
                Err(err) => assert!(matches!(err, RepoError::Constraint(_))),
            }
        }

        assert_eq!(saved, 1);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resaving_user_is_not_a_conflict() {
        let repo = InMemoryUserRepository::new();
        let mut user = User::new(
            "Alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            None,
            false,
        );
        repo.save(user.clone()).await.unwrap();

        user.activate();
        repo.save(user.clone()).await.unwrap();

        assert!(repo.find_by_id(user.id).await.unwrap().unwrap().active);
    }
}
