//! Profile persistence implementations

mod file;
mod memory;

pub use file::FileProfilePersistence;
pub use memory::InMemoryProfilePersistence;
