// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::CoralConfig;
use crate::error::{CoralError, Result};
use crate::store::adapter::{BatchCommand, Store};
use crate::store::cas::{CasOutcome, check_and_commit};
use log::debug;
use std::time::Duration;

/// Rotating work queue where taking an item also claims it.
///
/// `take` rotates the queue (tail back to head) and then tries to create a
/// claim record for the rotated item, keyed by the item's value and holding
/// the consumer's token. The item stays in the queue for the whole rotation;
/// only a valid `complete` removes it, so a consumer crash costs at most the
/// claim's time-to-live.
///
/// Items carry no identity beyond their value: two queued items with equal
/// payloads share one claim record and cannot be processed concurrently.
/// Callers that need concurrent duplicates must make the payloads distinct
/// themselves.
#[derive(Debug, Clone)]
pub struct ClaimQueue {
    key: String,
    consumer: String,
    claim_duration: Duration,
}

impl ClaimQueue {
    pub fn new(
        key: impl Into<String>,
        consumer: impl Into<String>,
        claim_duration: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            consumer: consumer.into(),
            claim_duration,
        }
    }

    /// Like [`ClaimQueue::new`] with the configured default claim duration.
    pub fn from_config(
        key: impl Into<String>,
        consumer: impl Into<String>,
        config: &CoralConfig,
    ) -> Self {
        Self::new(key, consumer, config.claim_duration())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// Appends an item to the queue.
    pub fn push<S: Store + ?Sized>(&self, store: &mut S, item: &str) -> Result<()> {
        store.list_push(&self.key, item)
    }

    /// Rotates the queue and claims the rotated item.
    ///
    /// Returns `None` when the queue is empty, or when the rotated item's
    /// claim is already held; in the latter case the rotation still happened
    /// and the item stays queued for a later rotation. The claim expires on
    /// its own if the consumer never completes the item.
    pub fn take<S: Store + ?Sized>(&self, store: &mut S) -> Result<Option<String>> {
        let Some(item) = store.list_rotate(&self.key)? else {
            return Ok(None);
        };

        let claimed = store.set_if_absent(
            &self.item_lock_key(&item),
            &self.consumer,
            self.claim_duration,
        )?;
        if !claimed {
            return Ok(None);
        }

        debug!(
            "Consumer '{}' claimed '{item}' from queue '{}'",
            self.consumer, self.key
        );
        Ok(Some(item))
    }

    /// Removes a claimed item from the queue and deletes its claim.
    ///
    /// Ownership is validated under a watch on both the queue and the claim
    /// key, then one occurrence is removed and the claim deleted in one
    /// batch. Fails with [`CoralError::ItemNotClaimed`] when this consumer
    /// does not hold the claim, and with [`CoralError::ItemComplete`] when
    /// the batch aborted or did not mutate exactly what it expected.
    pub fn complete<S: Store + ?Sized>(&self, store: &mut S, item: &str) -> Result<()> {
        let lock_key = self.item_lock_key(item);

        let outcome = check_and_commit(
            store,
            &[self.key.as_str(), lock_key.as_str()],
            |s| Ok(s.get(&lock_key)?.as_deref() == Some(self.consumer.as_str())),
            &[
                BatchCommand::ListRemove {
                    key: self.key.clone(),
                    count: 1,
                    value: item.to_string(),
                },
                BatchCommand::Delete(lock_key.clone()),
            ],
        )?;

        match outcome {
            CasOutcome::Committed(replies) if replies == [1, 1] => {
                debug!(
                    "Consumer '{}' completed '{item}' in queue '{}'",
                    self.consumer, self.key
                );
                Ok(())
            }
            CasOutcome::Committed(_) | CasOutcome::Aborted => Err(CoralError::ItemComplete {
                queue: self.key.clone(),
                consumer: self.consumer.clone(),
                item: item.to_string(),
            }),
            CasOutcome::ValidationFailed => Err(CoralError::ItemNotClaimed {
                queue: self.key.clone(),
                consumer: self.consumer.clone(),
                item: item.to_string(),
            }),
        }
    }

    fn item_lock_key(&self, item: &str) -> String {
        format!("{}:lock:{item}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::InMemoryStore;

    fn queue(consumer: &str) -> ClaimQueue {
        ClaimQueue::new("jobs", consumer, Duration::from_secs(1))
    }

    #[test]
    fn take_on_empty_queue_returns_none() {
        let mut store = InMemoryStore::new();
        assert_eq!(queue("worker-1").take(&mut store).unwrap(), None);
    }

    #[test]
    fn take_claims_and_rotation_preserves_the_item() {
        let mut store = InMemoryStore::new();
        let consumer = queue("worker-1");

        consumer.push(&mut store, "job-a").unwrap();
        assert_eq!(consumer.take(&mut store).unwrap().as_deref(), Some("job-a"));
        assert_eq!(store.string("jobs:lock:job-a"), Some("worker-1"));
        assert_eq!(store.list("jobs"), vec!["job-a"]);
    }

    #[test]
    fn repeated_take_returns_none_while_claim_lives() {
        let mut store = InMemoryStore::new();
        let consumer = queue("worker-1");

        consumer.push(&mut store, "job-a").unwrap();
        assert_eq!(consumer.take(&mut store).unwrap().as_deref(), Some("job-a"));
        assert_eq!(consumer.take(&mut store).unwrap(), None);
        assert_eq!(consumer.take(&mut store).unwrap(), None);
        // The rotations never lose the item.
        assert_eq!(store.list("jobs"), vec!["job-a"]);

        store.expire_now("jobs:lock:job-a");
        assert_eq!(consumer.take(&mut store).unwrap().as_deref(), Some("job-a"));
    }

    #[test]
    fn second_consumer_cannot_claim_a_held_item() {
        let mut store = InMemoryStore::new();
        let first = queue("worker-1");
        let second = queue("worker-2");

        first.push(&mut store, "job-a").unwrap();
        assert_eq!(first.take(&mut store).unwrap().as_deref(), Some("job-a"));
        assert_eq!(second.take(&mut store).unwrap(), None);
        assert_eq!(store.string("jobs:lock:job-a"), Some("worker-1"));
    }

    #[test]
    fn complete_removes_one_occurrence_and_the_claim() {
        let mut store = InMemoryStore::new();
        let consumer = queue("worker-1");

        consumer.push(&mut store, "job-a").unwrap();
        consumer.push(&mut store, "job-b").unwrap();
        let taken = consumer.take(&mut store).unwrap().unwrap();
        consumer.complete(&mut store, &taken).unwrap();

        assert!(store.string(&format!("jobs:lock:{taken}")).is_none());
        assert_eq!(store.list("jobs").len(), 1);
    }

    #[test]
    fn complete_by_non_claimant_fails_not_claimed() {
        let mut store = InMemoryStore::new();
        let first = queue("worker-1");
        let second = queue("worker-2");

        first.push(&mut store, "job-a").unwrap();
        first.take(&mut store).unwrap();
        let err = second.complete(&mut store, "job-a").unwrap_err();
        assert!(matches!(err, CoralError::ItemNotClaimed { .. }));
        assert_eq!(store.list("jobs"), vec!["job-a"]);
    }

    #[test]
    fn second_complete_fails_and_removes_nothing() {
        let mut store = InMemoryStore::new();
        let consumer = queue("worker-1");

        consumer.push(&mut store, "job-a").unwrap();
        consumer.push(&mut store, "job-a").unwrap();
        consumer.take(&mut store).unwrap();
        consumer.complete(&mut store, "job-a").unwrap();

        let err = consumer.complete(&mut store, "job-a").unwrap_err();
        assert!(matches!(err, CoralError::ItemNotClaimed { .. }));
        assert_eq!(store.list("jobs"), vec!["job-a"]);
    }

    #[test]
    fn complete_surfaces_watch_abort_as_complete_error() {
        let mut store = InMemoryStore::new();
        let consumer = queue("worker-1");

        consumer.push(&mut store, "job-a").unwrap();
        consumer.take(&mut store).unwrap();
        store.force_abort_on_next_exec();
        let err = consumer.complete(&mut store, "job-a").unwrap_err();
        assert!(matches!(err, CoralError::ItemComplete { .. }));
        assert_eq!(store.list("jobs"), vec!["job-a"]);
    }

    #[test]
    fn duplicate_payloads_share_one_claim() {
        let mut store = InMemoryStore::new();
        let first = queue("worker-1");
        let second = queue("worker-2");

        first.push(&mut store, "job-a").unwrap();
        first.push(&mut store, "job-a").unwrap();
        assert_eq!(first.take(&mut store).unwrap().as_deref(), Some("job-a"));
        // The second copy rotates but cannot be claimed while the first
        // consumer holds the shared claim record.
        assert_eq!(second.take(&mut store).unwrap(), None);
    }
}
