pub mod local_storage;
pub mod supabase;

pub use local_storage::{FileStorage, MemoryStorage};
pub use supabase::SupabaseAdapter;
