//! Fjall-backed mutation queue (the durable backend).
//!
//! Layout:
//! - `mutations`: mutation_id -> serialized mutation bytes
//! - `queue`: mutation_id (uuid v7 bytes) -> empty value
//!
//! Uuid v7 keys sort by creation time, so `first_key_value` on the queue
//! partition is FIFO pop and a requeued id lands back in its original
//! position. There is deliberately no dead-letter partition: a mutation is
//! only removed by ack or explicit user removal.

use std::{marker::PhantomData, path::Path, sync::Mutex};

use async_trait::async_trait;
use fjall::{
    Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode,
};
use uuid::Uuid;

use crate::{
    MutationId, MutationQueue, MutationSerializer, PendingMutation, QueueError,
};

pub struct FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    db: Keyspace,
    mutations: PartitionHandle,
    queue: PartitionHandle,
    // Serialize push/pop/ack/requeue to keep ordering simple.
    lock: Mutex<()>,
    _marker: PhantomData<S>,
}

impl<S> FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let keyspace = Config::new(path).open()?;
        let mutations = keyspace
            .open_partition("mutations", PartitionCreateOptions::default())?;
        let queue =
            keyspace.open_partition("queue", PartitionCreateOptions::default())?;

        Ok(Self {
            db: keyspace,
            mutations,
            queue,
            lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    fn id_to_bytes(id: &MutationId) -> [u8; 16] {
        *id.get().as_bytes()
    }

    fn id_from_bytes(bytes: &[u8]) -> Result<MutationId, QueueError> {
        let uuid = Uuid::from_slice(bytes).map_err(|e| {
            QueueError::QueueError(format!("Invalid mutation id bytes: {e}"))
        })?;
        Ok(MutationId::from_uuid(uuid))
    }

    fn insert_entry(&self, mutation: &PendingMutation) -> Result<(), QueueError> {
        let bytes = S::serialize_mutation(mutation)?;
        let id_bytes = Self::id_to_bytes(&mutation.id);

        self.mutations.insert(id_bytes, &bytes)?;
        self.queue.insert(id_bytes, &[] as &[u8])?;

        // Must hit disk before the host gets a chance to terminate us.
        self.db.persist(PersistMode::SyncAll)?;
        tracing::debug!(id = %mutation.id, "mutation persisted");
        Ok(())
    }
}

#[async_trait]
impl<S> MutationQueue for FjallMutationQueue<S>
where
    S: MutationSerializer + Send + Sync,
{
    async fn push(&self, mutation: &PendingMutation) -> Result<(), QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        self.insert_entry(mutation)
    }

    async fn pop(&self) -> Result<PendingMutation, QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;

        let Some(entry) = self.queue.first_key_value()? else {
            return Err(QueueError::QueueEmpty);
        };

        let (id_bytes, _) = entry;
        let id_bytes = id_bytes.as_ref().to_vec();
        self.queue.remove(id_bytes.clone())?;

        let id = Self::id_from_bytes(&id_bytes)?;
        let bytes = self
            .mutations
            .get(id_bytes)?
            .ok_or(QueueError::MutationNotFound(id))?;

        S::deserialize_mutation(&bytes)
    }

    async fn ack(&self, id: &MutationId) -> Result<(), QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let id_bytes = Self::id_to_bytes(id);
        self.mutations.remove(id_bytes)?;
        // usually already gone via pop; acking a never-popped entry must
        // not leave its id queued
        self.queue.remove(id_bytes)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn requeue(&self, mutation: &PendingMutation) -> Result<(), QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        self.insert_entry(mutation)
    }

    async fn remove(&self, id: &MutationId) -> Result<(), QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        let id_bytes = Self::id_to_bytes(id);
        self.queue.remove(id_bytes)?;
        self.mutations.remove(id_bytes)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| QueueError::QueueError(e.to_string()))?;
        Ok(self.queue.len()?)
    }
}

impl<S> std::fmt::Debug for FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallMutationQueue").finish()
    }
}
