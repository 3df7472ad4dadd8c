//! Trait for pending-mutation storage. The queue is FIFO by creation
//! time; a requeued entry returns to its original position because
//! mutation ids sort by creation time.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{MutationId, PendingMutation, QueueError};

#[async_trait]
pub trait MutationQueue: Send + Sync {
    /// Append a mutation. Durable backends must have persisted the entry
    /// before this returns.
    async fn push(&self, mutation: &PendingMutation) -> Result<(), QueueError>;

    /// Take the oldest queued mutation. `QueueError::QueueEmpty` when
    /// nothing is left.
    async fn pop(&self) -> Result<PendingMutation, QueueError>;

    /// Delete a mutation after a successful replay.
    async fn ack(&self, id: &MutationId) -> Result<(), QueueError>;

    /// Put a popped mutation back after a failed replay, with its updated
    /// attempt counter.
    async fn requeue(&self, mutation: &PendingMutation) -> Result<(), QueueError>;

    /// Explicit user-action removal. The only way besides `ack` that an
    /// entry ever leaves the queue.
    async fn remove(&self, id: &MutationId) -> Result<(), QueueError>;

    async fn len(&self) -> Result<usize, QueueError>;

    async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

pub type AbstractMutationQueue = Arc<dyn MutationQueue + Send + Sync>;
