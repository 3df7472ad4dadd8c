pub mod fjall;
pub mod memory;

pub use fjall::FjallCacheStore;
pub use memory::InMemoryCacheStore;
