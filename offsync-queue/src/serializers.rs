use crate::{PendingMutation, QueueError};

pub trait MutationSerializer: Send + Sync {
    fn serialize_mutation(mutation: &PendingMutation) -> Result<Vec<u8>, QueueError>;
    fn deserialize_mutation(data: &[u8]) -> Result<PendingMutation, QueueError>;
}

#[derive(Debug, Clone, Copy)]
pub struct JsonSerializer;

impl MutationSerializer for JsonSerializer {
    fn serialize_mutation(mutation: &PendingMutation) -> Result<Vec<u8>, QueueError> {
        serde_json::to_vec(mutation)
            .map_err(|e| QueueError::Serialization(e.to_string()))
    }

    fn deserialize_mutation(data: &[u8]) -> Result<PendingMutation, QueueError> {
        serde_json::from_slice(data)
            .map_err(|e| QueueError::Deserialization(e.to_string()))
    }
}
