//! crates/turntable_core/src/state.rs
//!
//! The in-memory turntable state and the pure reducer that applies mutations to it.

use crate::domain::{Category, CategoryId, CategoryType, SelectionPointers};

/// A synchronous, local-only change to the turntable state.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the whole category list.
    SetCategories(Vec<Category>),
    /// Append one category.
    AddCategory(Category),
    /// Remove a category, clearing its selection pointer if it was the pick.
    RemoveCategory(CategoryId),
    /// Replace the category matching `previous_id` (or the category's own id),
    /// appending it when nothing matches.
    UpdateCategory {
        category: Category,
        previous_id: Option<CategoryId>,
    },
    /// Make `id` the only selected category of `kind`, or clear the pick.
    MarkSelected {
        kind: CategoryType,
        id: Option<CategoryId>,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetCategories(_) => "set_categories",
            Mutation::AddCategory(_) => "add_category",
            Mutation::RemoveCategory(_) => "remove_category",
            Mutation::UpdateCategory { .. } => "update_category",
            Mutation::MarkSelected { .. } => "mark_selected",
        }
    }
}

/// Categories plus the current pick for each category type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurntableState {
    categories: Vec<Category>,
    current: SelectionPointers,
}

impl TurntableState {
    pub fn new(categories: Vec<Category>, current: SelectionPointers) -> Self {
        Self {
            categories,
            current,
        }
    }

    // --- Getters ---

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn project_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .filter(|c| c.kind == CategoryType::Project)
    }

    /// Everything that is not a project.
    pub fn learning_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .filter(|c| c.kind != CategoryType::Project)
    }

    pub fn current_ids(&self) -> &SelectionPointers {
        &self.current
    }

    /// The category the pointer of `kind` refers to, if it still exists.
    pub fn current_category(&self, kind: CategoryType) -> Option<&Category> {
        let id = self.current.get(kind)?;
        self.find(id)
    }

    pub fn find(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    // --- Reducer ---

    /// Applies one mutation and returns the resulting state.
    pub fn reduce(mut self, mutation: Mutation) -> Self {
        match mutation {
            Mutation::SetCategories(categories) => {
                self.categories = categories;
            }
            Mutation::AddCategory(category) => {
                self.categories.push(category);
            }
            Mutation::RemoveCategory(id) => {
                if let Some(index) = self.categories.iter().position(|c| c.id == id) {
                    let removed = self.categories.remove(index);
                    if self.current.get(removed.kind) == Some(&id) {
                        self.current.set(removed.kind, None);
                    }
                }
            }
            Mutation::UpdateCategory {
                category,
                previous_id,
            } => {
                let old_id = previous_id.unwrap_or_else(|| category.id.clone());
                let index = self
                    .categories
                    .iter()
                    .position(|c| c.id == old_id || c.id == category.id);

                match index {
                    Some(index) => {
                        let kind = category.kind;
                        let new_id = category.id.clone();
                        self.categories[index] = category;

                        if old_id != new_id && self.current.get(kind) == Some(&old_id) {
                            self.current.set(kind, Some(new_id));
                        }
                    }
                    None => self.categories.push(category),
                }
            }
            Mutation::MarkSelected { kind, id } => {
                for category in self.categories.iter_mut().filter(|c| c.kind == kind) {
                    category.selected = id.as_ref() == Some(&category.id);
                }
                self.current.set(kind, id);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Resource;

    fn category(id: &str, kind: CategoryType) -> Category {
        Category {
            id: CategoryId::new(id),
            label: id.to_uppercase(),
            description: String::new(),
            kind,
            selected: false,
            resources: vec![Resource::new("Docs", "https://example.com/docs")],
        }
    }

    fn seeded() -> TurntableState {
        TurntableState::default().reduce(Mutation::SetCategories(vec![
            category("p1", CategoryType::Project),
            category("p2", CategoryType::Project),
            category("l1", CategoryType::Learning),
            category("l2", CategoryType::Learning),
        ]))
    }

    fn selected_count(state: &TurntableState, kind: CategoryType) -> usize {
        state
            .categories()
            .iter()
            .filter(|c| c.kind == kind && c.selected)
            .count()
    }

    #[test]
    fn getters_split_by_type() {
        let state = seeded();
        assert_eq!(state.project_categories().count(), 2);
        assert_eq!(state.learning_categories().count(), 2);
        assert!(state.current_category(CategoryType::Project).is_none());
    }

    #[test]
    fn selection_keeps_at_most_one_per_type() {
        let state = seeded()
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Project,
                id: Some("p1".into()),
            })
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Project,
                id: Some("p2".into()),
            })
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: Some("l1".into()),
            });

        assert_eq!(selected_count(&state, CategoryType::Project), 1);
        assert_eq!(selected_count(&state, CategoryType::Learning), 1);
        assert_eq!(
            state.current_category(CategoryType::Project).map(|c| c.id.as_str()),
            Some("p2")
        );
        assert_eq!(state.current_ids().learning, Some(CategoryId::new("l1")));
    }

    #[test]
    fn clearing_selection_unselects_the_whole_type() {
        let state = seeded()
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: Some("l2".into()),
            })
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: None,
            });

        assert_eq!(selected_count(&state, CategoryType::Learning), 0);
        assert_eq!(state.current_ids().learning, None);
    }

    #[test]
    fn removing_the_pick_clears_its_pointer_only() {
        let state = seeded()
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Project,
                id: Some("p1".into()),
            })
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: Some("l1".into()),
            })
            .reduce(Mutation::RemoveCategory("p1".into()));

        assert!(state.find(&"p1".into()).is_none());
        assert_eq!(state.current_ids().project, None);
        assert_eq!(state.current_ids().learning, Some(CategoryId::new("l1")));
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let before = seeded();
        let after = before.clone().reduce(Mutation::RemoveCategory("nope".into()));
        assert_eq!(before, after);
    }

    #[test]
    fn update_swaps_temporary_id_and_rewrites_pointer() {
        let temp = category("custom-abc", CategoryType::Learning);
        let state = seeded()
            .reduce(Mutation::AddCategory(temp.clone()))
            .reduce(Mutation::MarkSelected {
                kind: CategoryType::Learning,
                id: Some(temp.id.clone()),
            });

        let saved = Category {
            id: CategoryId::new("0b6f4a52-server"),
            ..temp.clone()
        };
        let state = state.reduce(Mutation::UpdateCategory {
            category: saved,
            previous_id: Some(temp.id.clone()),
        });

        assert_eq!(state.categories().len(), 5);
        assert!(state.find(&temp.id).is_none());
        assert_eq!(
            state.current_ids().learning,
            Some(CategoryId::new("0b6f4a52-server"))
        );
    }

    #[test]
    fn update_without_match_appends() {
        let state = seeded().reduce(Mutation::UpdateCategory {
            category: category("l3", CategoryType::Learning),
            previous_id: None,
        });
        assert_eq!(state.categories().len(), 5);
        assert_eq!(state.categories()[4].id, CategoryId::new("l3"));
    }

    #[test]
    fn update_in_place_keeps_position() {
        let mut renamed = category("p2", CategoryType::Project);
        renamed.label = "Renamed".into();
        let state = seeded().reduce(Mutation::UpdateCategory {
            category: renamed,
            previous_id: None,
        });
        assert_eq!(state.categories()[1].label, "Renamed");
        assert_eq!(state.categories().len(), 4);
    }
}
