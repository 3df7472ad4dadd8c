pub mod fjall;
pub mod memory;

pub use fjall::FjallMutationQueue;
pub use memory::InMemoryMutationQueue;
