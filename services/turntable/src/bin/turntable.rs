//! services/turntable/src/bin/turntable.rs

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turntable_core::{
    Category, CategoryId, CategoryRepository, CategoryType, KeyValueStore, PersistenceBridge,
    Resource, Turntable, TurntableState,
};
use turntable_lib::{
    adapters::{FileStorage, MemoryStorage, SupabaseAdapter},
    config::Config,
    error::AppError,
    tools::{clear_local_data, export_local_data, migrate_local_to_remote},
};

#[derive(Parser, Debug)]
#[command(name = "turntable", about = "Pick what to learn next")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Keep state in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all categories and the current picks.
    List,
    /// Create a category.
    Add {
        label: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "learning")]
        kind: CategoryType,
        /// A resource as `TITLE=LINK`, optionally followed by `=done` or `=todo`.
        /// Can be given multiple times.
        #[arg(long = "resource", value_parser = parse_resource)]
        resources: Vec<ResourceArg>,
    },
    /// Change a category. Given resources replace the existing ones; a resource
    /// with the same title and link keeps its completed flag unless marked.
    Edit {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        kind: Option<CategoryType>,
        #[arg(long = "resource", value_parser = parse_resource)]
        resources: Vec<ResourceArg>,
    },
    /// Delete a category.
    Remove { id: String },
    /// Pick a category for a type, or clear the pick when no id is given.
    Select { kind: CategoryType, id: Option<String> },
    /// Pull the latest categories from the backend.
    Sync,
    /// Write a backup of local storage.
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Copy local categories into the backend.
    Migrate {
        #[arg(long)]
        yes: bool,
    },
    /// Delete all local data.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

/// A `--resource` value. `completed` is `None` when no marker was given.
#[derive(Debug, Clone, PartialEq)]
struct ResourceArg {
    title: String,
    link: String,
    completed: Option<bool>,
}

impl ResourceArg {
    /// Builds the resource, taking the completed flag from a matching existing
    /// resource when no marker was given.
    fn into_resource(self, existing: &[Resource]) -> Resource {
        let previous = existing
            .iter()
            .find(|r| r.title == self.title && r.link == self.link);
        let mut resource = Resource::new(self.title, self.link);
        resource.completed = self
            .completed
            .or(previous.map(|r| r.completed))
            .unwrap_or(false);
        resource
    }
}

fn parse_resource(raw: &str) -> Result<ResourceArg, String> {
    let (title, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TITLE=LINK, got '{}'", raw))?;
    // Links may contain '=' themselves, so only a trailing marker is special.
    let (link, completed) = if let Some(link) = rest.strip_suffix("=done") {
        (link, Some(true))
    } else if let Some(link) = rest.strip_suffix("=todo") {
        (link, Some(false))
    } else {
        (rest, None)
    };
    Ok(ResourceArg {
        title: title.trim().to_string(),
        link: link.trim().to_string(),
        completed,
    })
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_state(state: &TurntableState) {
    for kind in CategoryType::ALL {
        let current = state.current_category(kind);
        println!(
            "== {} (pick: {})",
            kind,
            current.map(|c| c.label.as_str()).unwrap_or("none")
        );
        let categories: Vec<&Category> = match kind {
            CategoryType::Project => state.project_categories().collect(),
            CategoryType::Learning => state.learning_categories().collect(),
        };
        for category in categories {
            let marker = if category.selected { '*' } else { ' ' };
            println!("{} {}  [{}]", marker, category.label, category.id);
            for resource in &category.resources {
                let done = if resource.completed { 'x' } else { ' ' };
                println!("    [{}] {} <{}>", done, resource.title, resource.link);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // --- 2. Resolve Storage and Backend ---
    let storage: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        info!(dir = %config.data_dir.display(), "Using file storage");
        Arc::new(FileStorage::new(config.data_dir.clone()))
    };
    let bridge = PersistenceBridge::new(storage);

    let backend: Option<Arc<dyn CategoryRepository>> = match &config.backend {
        Some(connection) => {
            info!(url = %connection.url, "Remote backend configured");
            Some(Arc::new(SupabaseAdapter::new(Some(connection.clone()))))
        }
        None => {
            warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set, using local storage only");
            None
        }
    };

    // --- 3. Developer Utilities (operate on storage directly) ---
    let command = args.command.unwrap_or(Command::List);
    match command {
        Command::Export { dir } => {
            let path = export_local_data(&bridge, &dir)?;
            println!("Exported to {}", path.display());
            return Ok(());
        }
        Command::Migrate { yes } => {
            let report = migrate_local_to_remote(&bridge, backend.as_deref(), || {
                yes || confirm("The backend already has data and migrating may create duplicates. Continue?")
            })
            .await?;
            println!(
                "Migrated {} categories, {} failed",
                report.success_count, report.error_count
            );
            for failure in &report.errors {
                println!("  {}: {}", failure.label, failure.error);
            }
            return Ok(());
        }
        Command::Clear { yes } => {
            let cleared = clear_local_data(&bridge, || {
                yes || confirm("Clear all local data? This cannot be undone.")
            })?;
            if cleared {
                println!("Local data cleared");
            }
            return Ok(());
        }
        _ => {}
    }

    // --- 4. Build the Store and Run the Command ---
    let mut store = Turntable::with_persistence(&bridge, backend);
    store.initialize().await;

    match command {
        Command::List => {}
        Command::Add {
            label,
            description,
            kind,
            resources,
        } => {
            let resources = resources
                .into_iter()
                .map(|arg| arg.into_resource(&[]))
                .collect();
            let category = Category::new(label, description, kind).with_resources(resources);
            let saved = store.save_category(category).await?;
            println!("Saved {} [{}]", saved.label, saved.id);
        }
        Command::Edit {
            id,
            label,
            description,
            kind,
            resources,
        } => {
            let id = CategoryId::new(id);
            let mut category = store
                .state()
                .find(&id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("no category with id '{}'", id)))?;
            if let Some(label) = label {
                category.label = label;
            }
            if let Some(description) = description {
                category.description = description;
            }
            if let Some(kind) = kind {
                category.kind = kind;
            }
            if !resources.is_empty() {
                category.resources = resources
                    .into_iter()
                    .map(|arg| arg.into_resource(&category.resources))
                    .collect();
            }
            let saved = store.save_category(category).await?;
            println!("Saved {} [{}]", saved.label, saved.id);
        }
        Command::Remove { id } => {
            store.delete_category(&CategoryId::new(id)).await;
        }
        Command::Select { kind, id } => {
            store.select_category(kind, id.map(CategoryId::new)).await;
        }
        Command::Sync => {
            store.resync().await?;
        }
        Command::Export { .. } | Command::Migrate { .. } | Command::Clear { .. } => {}
    }

    print_state(store.state());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_markers_set_completed() {
        let done = parse_resource("Book=https://doc.rust-lang.org/book/=done").unwrap();
        assert_eq!(done.link, "https://doc.rust-lang.org/book/");
        assert_eq!(done.completed, Some(true));

        let todo = parse_resource("Book=https://x=todo").unwrap();
        assert_eq!(todo.completed, Some(false));

        let plain = parse_resource("Search = https://example.com/?q=rust").unwrap();
        assert_eq!(plain.title, "Search");
        assert_eq!(plain.link, "https://example.com/?q=rust");
        assert_eq!(plain.completed, None);

        assert!(parse_resource("no separator").is_err());
    }

    #[test]
    fn unmarked_resource_keeps_existing_completed_flag() {
        let mut read = Resource::new("Book", "https://x");
        read.completed = true;
        let existing = vec![read];

        let kept = parse_resource("Book=https://x").unwrap().into_resource(&existing);
        assert!(kept.completed);

        let reset = parse_resource("Book=https://x=todo").unwrap().into_resource(&existing);
        assert!(!reset.completed);

        let fresh = parse_resource("Other=https://y").unwrap().into_resource(&existing);
        assert!(!fresh.completed);
    }
}
