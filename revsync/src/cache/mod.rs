//! Cache storage.

mod directory;
mod memory;
mod traits;

pub use directory::Directory;
pub use memory::MemoryCache;
pub use traits::{CacheStorage, CacheStorageExt};
