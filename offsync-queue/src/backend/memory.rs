//! In-memory implementation of the MutationQueue trait. Entry bytes live
//! in a map keyed by id; FIFO order is a deque of ids kept sorted by id,
//! which is creation order for v7 ids.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Mutex;

use crate::{
    MutationId, MutationQueue, MutationSerializer, PendingMutation, QueueError,
};

pub struct InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    entries: Mutex<HashMap<MutationId, Vec<u8>>>,
    order: Mutex<VecDeque<MutationId>>,
    _marker: PhantomData<S>,
}

impl<S> InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            _marker: PhantomData,
        }
    }
}

impl<S> Default for InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> MutationQueue for InMemoryMutationQueue<S>
where
    S: MutationSerializer + Send + Sync,
{
    async fn push(&self, mutation: &PendingMutation) -> Result<(), QueueError> {
        let bytes = S::serialize_mutation(mutation)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let mut order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;

        entries.insert(mutation.id, bytes);
        if !order.contains(&mutation.id) {
            order.push_back(mutation.id);
        }
        Ok(())
    }

    async fn pop(&self) -> Result<PendingMutation, QueueError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let mut order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;

        if let Some(id) = order.pop_front() {
            let bytes = entries
                .get(&id)
                .ok_or(QueueError::MutationNotFound(id))?;
            S::deserialize_mutation(bytes)
        } else {
            Err(QueueError::QueueEmpty)
        }
    }

    async fn ack(&self, id: &MutationId) -> Result<(), QueueError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let mut order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        entries
            .remove(id)
            .ok_or(QueueError::MutationNotFound(*id))?;
        // acking an entry that was never popped must not leave its id
        // queued, or the next pop dangles
        order.retain(|existing| existing != id);
        Ok(())
    }

    async fn requeue(&self, mutation: &PendingMutation) -> Result<(), QueueError> {
        let bytes = S::serialize_mutation(mutation)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let mut order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;

        entries.insert(mutation.id, bytes);
        if !order.contains(&mutation.id) {
            // reinsert at the position its id sorts to (creation order)
            let pos = order
                .iter()
                .position(|existing| *existing > mutation.id)
                .unwrap_or(order.len());
            order.insert(pos, mutation.id);
        }
        Ok(())
    }

    async fn remove(&self, id: &MutationId) -> Result<(), QueueError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let mut order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;

        entries.remove(id);
        order.retain(|existing| existing != id);
        Ok(())
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let order = self
            .order
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        Ok(order.len())
    }
}

impl<S> std::fmt::Debug for InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().unwrap();
        let order = self.order.lock().unwrap();
        f.debug_struct("InMemoryMutationQueue")
            .field("entries", &entries.len())
            .field("order", &*order)
            .finish()
    }
}
