//! crates/turntable_core/src/ports.rs
//!
//! Defines the service contracts (traits) the turntable core depends on.
//! These traits form the boundary of the hexagonal architecture: the store and
//! the persistence bridge only ever talk to a `CategoryRepository` and a
//! `KeyValueStore`, never to HTTP or the filesystem directly.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Category, CategoryDraft, CategoryId, CategoryType, Resource};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Remote backend is not configured")]
    NotConfigured,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Remote call failed: {0}")]
    Remote(String),
    #[error("Local storage failed: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Remote CRUD over the `categories` and `resources` tables.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories with their resources, oldest first, already normalized.
    async fn fetch_categories(&self) -> PortResult<Vec<Category>>;

    /// Inserts one category row and returns it with the server-assigned id.
    async fn create_category(&self, draft: &CategoryDraft) -> PortResult<Category>;

    async fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> PortResult<()>;

    /// Deleting a category that does not exist succeeds.
    async fn delete_category(&self, id: &CategoryId) -> PortResult<()>;

    /// Best-effort cleanup: remote failures are logged, not returned.
    async fn delete_category_resources(&self, category_id: &CategoryId) -> PortResult<()>;

    /// Inserts the valid resources for `category_id`; no request when none are valid.
    async fn create_resources(
        &self,
        category_id: &CategoryId,
        resources: &[Resource],
    ) -> PortResult<()>;

    /// Clears `selected` on every category of `kind`, then sets it on `id`.
    /// The two writes are not atomic.
    async fn update_selection(&self, kind: CategoryType, id: Option<&CategoryId>)
        -> PortResult<()>;

    /// Whether the backend already holds at least one category.
    async fn has_categories(&self) -> PortResult<bool>;

    /// Creates or updates the category, then replaces all of its resources.
    ///
    /// Unsaved ids (empty or temporary) are inserted, everything else is
    /// patched. Resources are deleted and re-inserted rather than diffed, and
    /// nothing wraps the steps in a transaction: a failure after the category
    /// write leaves the resources out of sync.
    async fn save_category_with_resources(&self, category: &Category) -> PortResult<Category> {
        let draft = CategoryDraft::from(category);

        let id = if category.id.is_unsaved() {
            let created = self.create_category(&draft).await?;
            debug!(old_id = %category.id, new_id = %created.id, "Category created remotely");
            created.id
        } else {
            self.update_category(&category.id, &draft).await?;
            category.id.clone()
        };

        self.delete_category_resources(&id).await?;
        if !category.resources.is_empty() {
            self.create_resources(&id, &category.resources).await?;
        }

        Ok(Category {
            id,
            ..category.clone()
        })
    }
}

/// A synchronous string key/value store, the local-storage half of persistence.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> PortResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove_item(&self, key: &str) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRepository;

    #[tokio::test]
    async fn save_inserts_unsaved_category_and_replaces_resources() {
        let repo = FakeRepository::default();
        let category = Category::new("Rust", "systems", CategoryType::Learning).with_resources(vec![
            Resource::new("Book", "https://doc.rust-lang.org/book/"),
            Resource::new("", "https://missing-title.example"),
        ]);

        let saved = repo.save_category_with_resources(&category).await.unwrap();

        assert!(!saved.id.is_unsaved());
        assert_eq!(saved.label, "Rust");
        assert_eq!(
            repo.calls(),
            vec![
                "create".to_string(),
                format!("delete_resources {}", saved.id),
                format!("create_resources {} 1", saved.id),
            ]
        );
    }

    #[tokio::test]
    async fn save_updates_persisted_category() {
        let repo = FakeRepository::default();
        let mut category = Category::new("Rust", "", CategoryType::Project);
        category.id = CategoryId::new("3f1d2c4b-remote");

        let saved = repo.save_category_with_resources(&category).await.unwrap();

        assert_eq!(saved.id, category.id);
        assert_eq!(
            repo.calls(),
            vec![
                "update 3f1d2c4b-remote".to_string(),
                "delete_resources 3f1d2c4b-remote".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn save_stops_when_category_write_fails() {
        let repo = FakeRepository::default();
        repo.fail_writes(true);

        let category = Category::new("Rust", "", CategoryType::Learning);
        let err = repo.save_category_with_resources(&category).await.unwrap_err();

        assert!(matches!(err, PortError::Remote(_)));
        assert!(repo.calls().is_empty());
    }
}
