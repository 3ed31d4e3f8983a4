//! crates/turntable_core/src/store.rs
//!
//! The turntable store: owns the state, commits mutations through the reducer,
//! notifies subscribers and runs the asynchronous actions that talk to the
//! remote repository.
//!
//! Whether a remote backend exists is decided once, when the store is built.
//! Remote failures never block local use; only `save_category` hands an error
//! back, and only after the local state has already been updated.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::defaults::default_categories;
use crate::domain::{Category, CategoryId, CategoryType};
use crate::persistence::PersistenceBridge;
use crate::ports::{CategoryRepository, PortResult};
use crate::state::{Mutation, TurntableState};

/// Called with each committed mutation and the state it produced.
pub type Subscriber = Box<dyn Fn(&Mutation, &TurntableState) + Send + Sync>;

pub struct Turntable {
    state: TurntableState,
    backend: Option<Arc<dyn CategoryRepository>>,
    subscribers: Vec<Subscriber>,
}

impl Turntable {
    /// Creates a store over `initial`. Pass `None` as the backend to run local-only.
    pub fn new(initial: TurntableState, backend: Option<Arc<dyn CategoryRepository>>) -> Self {
        Self {
            state: initial,
            backend,
            subscribers: Vec::new(),
        }
    }

    /// Restores the state from local storage and persists every later mutation there.
    pub fn with_persistence(
        bridge: &PersistenceBridge,
        backend: Option<Arc<dyn CategoryRepository>>,
    ) -> Self {
        let initial = bridge
            .load()
            .map(|snapshot| snapshot.into_state())
            .unwrap_or_default();
        let mut store = Self::new(initial, backend);
        store.subscribe(bridge.subscriber());
        store
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&Mutation, &TurntableState) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn state(&self) -> &TurntableState {
        &self.state
    }

    pub fn remote_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Applies a mutation and notifies every subscriber.
    pub fn commit(&mut self, mutation: Mutation) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(mutation.clone());
        for subscriber in &self.subscribers {
            subscriber(&mutation, &self.state);
        }
    }

    //=====================================================================================
    // Actions
    //=====================================================================================

    /// Brings the state up at startup.
    ///
    /// Local data is kept when there is no backend, and refreshed from the backend
    /// when there is one. Without local data the backend is asked first and the
    /// bundled defaults are the last resort.
    pub async fn initialize(&mut self) {
        if !self.state.is_empty() {
            if self.backend.is_some() {
                if let Err(e) = self.resync().await {
                    warn!("Failed to sync from backend, using local data: {}", e);
                }
            }
            return;
        }

        if let Some(backend) = self.backend.clone() {
            match backend.fetch_categories().await {
                Ok(categories) if !categories.is_empty() => {
                    let resources: usize = categories.iter().map(|c| c.resources.len()).sum();
                    info!(
                        categories = categories.len(),
                        resources, "Loaded categories from backend"
                    );
                    self.adopt_remote(categories);
                    return;
                }
                Ok(_) => info!("Backend has no categories yet"),
                Err(e) => error!("Failed to load categories from backend: {}", e),
            }
        }

        info!("Using bundled default categories");
        self.commit(Mutation::SetCategories(default_categories()));
    }

    /// Replaces the list with the remote one, then points each type at the
    /// first category the backend reports as selected.
    fn adopt_remote(&mut self, categories: Vec<Category>) {
        let selected_project = categories
            .iter()
            .find(|c| c.kind == CategoryType::Project && c.selected)
            .map(|c| c.id.clone());
        let selected_learning = categories
            .iter()
            .find(|c| c.kind != CategoryType::Project && c.selected)
            .map(|c| c.id.clone());

        self.commit(Mutation::SetCategories(categories));

        if let Some(id) = selected_project {
            self.commit(Mutation::MarkSelected {
                kind: CategoryType::Project,
                id: Some(id),
            });
        }
        if let Some(id) = selected_learning {
            self.commit(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: Some(id),
            });
        }
    }

    /// Pulls the remote list and replaces the local one if it is non-empty.
    pub async fn resync(&mut self) -> PortResult<()> {
        let Some(backend) = self.backend.clone() else {
            return Ok(());
        };

        let categories = backend.fetch_categories().await?;
        if !categories.is_empty() {
            self.commit(Mutation::SetCategories(categories));
        }
        Ok(())
    }

    /// Saves a category with its resources and returns the stored version.
    ///
    /// A temporary id is swapped for the server id on success. On failure the
    /// category is still applied locally before the error is returned.
    pub async fn save_category(&mut self, category: Category) -> PortResult<Category> {
        let Some(backend) = self.backend.clone() else {
            self.commit(Mutation::UpdateCategory {
                category: category.clone(),
                previous_id: None,
            });
            return Ok(category);
        };

        let previous_id = (category.id.is_unsaved() && !category.id.as_str().is_empty())
            .then(|| category.id.clone());

        match backend.save_category_with_resources(&category).await {
            Ok(saved) => {
                self.commit(Mutation::UpdateCategory {
                    category: saved.clone(),
                    previous_id,
                });
                Ok(saved)
            }
            Err(e) => {
                error!(id = %category.id, "Failed to save category to backend: {}", e);
                self.commit(Mutation::UpdateCategory {
                    category,
                    previous_id: None,
                });
                Err(e)
            }
        }
    }

    /// Removes a category. The local removal happens whatever the backend says.
    pub async fn delete_category(&mut self, id: &CategoryId) {
        let backend = match &self.backend {
            Some(backend) if !id.is_unsaved() => backend.clone(),
            _ => {
                self.commit(Mutation::RemoveCategory(id.clone()));
                return;
            }
        };

        if self.state.find(id).is_none() {
            warn!(%id, "Category not found");
            self.commit(Mutation::RemoveCategory(id.clone()));
            return;
        }

        if let Err(e) = backend.delete_category(id).await {
            error!(%id, "Failed to delete category from backend: {}", e);
        }
        self.commit(Mutation::RemoveCategory(id.clone()));
    }

    /// Picks `id` for `kind`, or clears the pick when `id` is `None`.
    /// The local selection is applied whatever the backend says.
    pub async fn select_category(&mut self, kind: CategoryType, id: Option<CategoryId>) {
        let target = match (&self.backend, &id) {
            (Some(backend), Some(target)) if !target.is_unsaved() => {
                Some((backend.clone(), target.clone()))
            }
            _ => None,
        };

        if let Some((backend, target)) = target {
            if self.state.find(&target).is_none() {
                warn!(id = %target, "Category not found for selection");
            } else if let Err(e) = backend.update_selection(kind, Some(&target)).await {
                error!(id = %target, "Failed to select category in backend: {}", e);
            }
        }

        self.commit(Mutation::MarkSelected { kind, id });
    }
}
