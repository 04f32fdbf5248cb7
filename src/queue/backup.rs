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
use crate::store::adapter::Store;
use log::debug;

/// Work queue that parks taken items in a processing list until completed.
///
/// Weaker than [`ClaimQueue`](crate::queue::ClaimQueue): there is no claim
/// record, so consumers sharing a discriminator also share the processing
/// list, and there is no visibility timeout. An item whose consumer crashes
/// stays parked until an external reconciliation pushes it back onto the
/// main queue.
#[derive(Debug, Clone)]
pub struct BackupQueue {
    key: String,
    processing_key: String,
}

impl BackupQueue {
    /// `discriminator` names the processing list, `{key}:{discriminator}`,
    /// and is typically shared by one class of consumers.
    pub fn new(key: impl Into<String>, discriminator: &str) -> Self {
        let key = key.into();
        let processing_key = format!("{key}:{discriminator}");
        Self {
            key,
            processing_key,
        }
    }

    /// Like [`BackupQueue::new`] with the configured processing suffix.
    pub fn from_config(key: impl Into<String>, config: &CoralConfig) -> Self {
        Self::new(key, &config.queue.processing_suffix)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn processing_key(&self) -> &str {
        &self.processing_key
    }

    /// Appends an item to the main queue.
    pub fn push<S: Store + ?Sized>(&self, store: &mut S, item: &str) -> Result<()> {
        store.list_push(&self.key, item)
    }

    /// Atomically moves the oldest queued item to the processing list.
    /// Returns `None` when the main queue is empty; no processing list is
    /// created in that case.
    pub fn take<S: Store + ?Sized>(&self, store: &mut S) -> Result<Option<String>> {
        let item = store.list_move(&self.key, &self.processing_key)?;
        if let Some(item) = &item {
            debug!("Took '{item}' from queue '{}' for processing", self.key);
        }
        Ok(item)
    }

    /// Removes one occurrence of `item` from the processing list. Fails with
    /// [`CoralError::QueueComplete`] unless exactly one occurrence was
    /// removed — the item was already completed, never taken, or raced with
    /// a duplicate.
    pub fn complete<S: Store + ?Sized>(&self, store: &mut S, item: &str) -> Result<()> {
        let removed = store.list_remove(&self.processing_key, 1, item)?;
        if removed != 1 {
            return Err(CoralError::QueueComplete {
                queue: self.key.clone(),
                item: item.to_string(),
            });
        }

        debug!("Completed '{item}' in queue '{}'", self.key);
        Ok(())
    }
}
