//! Durable, ordered queue of mutations captured while offline.
//!
//! Mutations are appended when a write request fails with a connectivity
//! error and replayed in FIFO order when a sync trigger fires. An entry
//! leaves the queue only on successful replay or explicit removal; failed
//! replays increment its attempt counter and put it back.

pub mod backend;
pub mod mutation;
pub mod queue;
pub mod serializers;

pub use backend::{FjallMutationQueue, InMemoryMutationQueue};
pub use mutation::{MutationId, PendingMutation};
pub use queue::{AbstractMutationQueue, MutationQueue};
pub use serializers::{JsonSerializer, MutationSerializer};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue error: {0}")]
    QueueError(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Mutation not found: {0}")]
    MutationNotFound(MutationId),
    #[error("Queue is empty")]
    QueueEmpty,
    #[error("Fjall error")]
    FjallError(#[from] fjall::Error),
}
