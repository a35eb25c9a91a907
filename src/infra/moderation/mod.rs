// Moderation infrastructure - in-memory and SQLite implementations of the core ports.

mod in_memory;
mod sqlite_store;

pub use in_memory::InMemoryModerationStore;
pub use sqlite_store::SqliteModerationStore;
