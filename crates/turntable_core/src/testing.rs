//! In-memory fakes of the core ports, shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Category, CategoryDraft, CategoryId, CategoryType, Resource};
use crate::ports::{CategoryRepository, KeyValueStore, PortError, PortResult};

#[derive(Default)]
struct RepoInner {
    remote: Vec<Category>,
    calls: Vec<String>,
    fail_reads: bool,
    fail_writes: bool,
    next_id: usize,
}

/// A `CategoryRepository` backed by a vector, recording every successful call.
#[derive(Default)]
pub struct FakeRepository {
    inner: Mutex<RepoInner>,
}

impl FakeRepository {
    pub fn with_remote(categories: Vec<Category>) -> Self {
        let repo = Self::default();
        repo.inner.lock().unwrap().remote = categories;
        repo
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn remote(&self) -> Vec<Category> {
        self.inner.lock().unwrap().remote.clone()
    }
}

fn write_failure() -> PortError {
    PortError::Remote("simulated write failure".to_string())
}

#[async_trait]
impl CategoryRepository for FakeRepository {
    async fn fetch_categories(&self) -> PortResult<Vec<Category>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(PortError::Remote("simulated read failure".to_string()));
        }
        inner.calls.push("fetch".to_string());
        Ok(inner.remote.clone())
    }

    async fn create_category(&self, draft: &CategoryDraft) -> PortResult<Category> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(write_failure());
        }
        inner.next_id += 1;
        let created = Category {
            id: CategoryId::new(format!("srv-{}", inner.next_id)),
            label: draft.label.clone(),
            description: draft.description.clone(),
            kind: draft.kind,
            selected: draft.selected,
            resources: Vec::new(),
        };
        inner.remote.push(created.clone());
        inner.calls.push("create".to_string());
        Ok(created)
    }

    async fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(write_failure());
        }
        if let Some(row) = inner.remote.iter_mut().find(|c| &c.id == id) {
            row.label = draft.label.clone();
            row.description = draft.description.clone();
            row.kind = draft.kind;
            row.selected = draft.selected;
        }
        inner.calls.push(format!("update {}", id));
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(write_failure());
        }
        inner.remote.retain(|c| &c.id != id);
        inner.calls.push(format!("delete {}", id));
        Ok(())
    }

    async fn delete_category_resources(&self, category_id: &CategoryId) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.remote.iter_mut().find(|c| &c.id == category_id) {
            row.resources.clear();
        }
        inner.calls.push(format!("delete_resources {}", category_id));
        Ok(())
    }

    async fn create_resources(
        &self,
        category_id: &CategoryId,
        resources: &[Resource],
    ) -> PortResult<()> {
        let valid: Vec<Resource> = resources.iter().filter(|r| r.is_valid()).cloned().collect();
        if valid.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(write_failure());
        }
        let count = valid.len();
        if let Some(row) = inner.remote.iter_mut().find(|c| &c.id == category_id) {
            row.resources.extend(valid);
        }
        inner
            .calls
            .push(format!("create_resources {} {}", category_id, count));
        Ok(())
    }

    async fn update_selection(
        &self,
        kind: CategoryType,
        id: Option<&CategoryId>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(write_failure());
        }
        for row in inner.remote.iter_mut().filter(|c| c.kind == kind) {
            row.selected = Some(&row.id) == id;
        }
        let target = id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        inner.calls.push(format!("select {} {}", kind, target));
        Ok(())
    }

    async fn has_categories(&self) -> PortResult<bool> {
        Ok(!self.inner.lock().unwrap().remote.is_empty())
    }
}

/// A `KeyValueStore` over a `HashMap`, with a switch to make writes fail.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(PortError::Storage("quota exceeded".to_string()));
        }
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}
