//! Queue drain on a sync trigger. Replays queued mutations in FIFO order;
//! each entry succeeds or fails on its own, and a failed entry stays in
//! the queue with its attempt counter bumped. There is no attempt cutoff:
//! an entry is removed on success or explicit user action, never because
//! it has failed too often.

use std::sync::Arc;

use offsync_queue::{MutationQueue, PendingMutation, QueueError};
use tracing::{debug, info, warn};
use url::Url;

use crate::fetcher::Fetcher;
use crate::http::Request;
use crate::WorkerError;

/// The only sync-trigger tag that causes a drain.
pub const SYNC_PENDING_CHANGES: &str = "sync-pending-changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    /// Mutations replayed successfully and removed
    pub replayed: usize,
    /// Mutations that failed and stay queued for the next trigger
    pub retained: usize,
}

fn replay_request(mutation: &PendingMutation) -> Result<Request, WorkerError> {
    let url = Url::parse(&mutation.endpoint)?;
    let mut request = Request::new(&mutation.method, url);
    request.headers = mutation.headers.clone();
    request.body = mutation.body.clone();
    Ok(request)
}

/// Drain the queue once. Pops at most the number of entries present when
/// the drain started, so entries requeued by this very drain are not
/// retried until the next trigger.
pub async fn drain(
    queue: &Arc<dyn MutationQueue>,
    fetcher: &Arc<dyn Fetcher>,
) -> Result<DrainOutcome, WorkerError> {
    let pending = queue.len().await?;
    if pending == 0 {
        return Ok(DrainOutcome::default());
    }
    info!(pending, "draining pending mutations");

    let mut outcome = DrainOutcome::default();
    let mut failed: Vec<PendingMutation> = Vec::new();

    for _ in 0..pending {
        let mut mutation = match queue.pop().await {
            Ok(mutation) => mutation,
            Err(QueueError::QueueEmpty) => break,
            Err(err) => return Err(err.into()),
        };

        match replay_one(fetcher, &mutation).await {
            Ok(()) => {
                queue.ack(&mutation.id).await?;
                outcome.replayed += 1;
                debug!(id = %mutation.id, "mutation replayed");
            }
            Err(reason) => {
                mutation.record_failure(&reason);
                warn!(
                    id = %mutation.id,
                    attempts = mutation.attempts,
                    %reason,
                    "mutation replay failed, keeping it queued"
                );
                failed.push(mutation);
            }
        }
    }

    for mutation in failed {
        queue.requeue(&mutation).await?;
        outcome.retained += 1;
    }

    Ok(outcome)
}

async fn replay_one(
    fetcher: &Arc<dyn Fetcher>,
    mutation: &PendingMutation,
) -> Result<(), String> {
    let request = replay_request(mutation).map_err(|e| e.to_string())?;
    match fetcher.fetch(&request).await {
        Ok(response) if response.is_success() => Ok(()),
        // A repeated 4xx cannot be told apart from "retry later"; the
        // entry is retained indefinitely either way.
        Ok(response) => Err(format!("replay answered status {}", response.status)),
        Err(err) => Err(err.to_string()),
    }
}
