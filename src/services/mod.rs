pub mod cache_store;
pub mod file_lock;
pub mod memory_cache;
pub mod providers;
pub mod refresh;
pub mod registry;
