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

/// Mutual-exclusion lock using the optimistic watch/validate/commit pattern.
///
/// The lock is held by whoever's token is stored under `key`. The token is
/// chosen by the caller and compared by value; it is the caller's proof of
/// ownership, never generated here. Expiry is enforced by the store and
/// never tracked locally.
#[derive(Debug, Clone)]
pub struct Lock {
    key: String,
    token: String,
    duration: Duration,
}

impl Lock {
    pub fn new(key: impl Into<String>, token: impl Into<String>, duration: Duration) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
            duration,
        }
    }

    /// Like [`Lock::new`] with the configured default duration.
    pub fn from_config(
        key: impl Into<String>,
        token: impl Into<String>,
        config: &CoralConfig,
    ) -> Self {
        Self::new(key, token, config.lock_duration())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// True when the stored value equals this lock's token. Pure read.
    pub fn check<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        Ok(store.get(&self.key)?.as_deref() == Some(self.token.as_str()))
    }

    /// Attempts to take the lock; never blocks or retries. The record is
    /// created only if the key is currently absent.
    pub fn acquire<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        let acquired = store.set_if_absent(&self.key, &self.token, self.duration)?;
        if acquired {
            debug!("Acquired lock '{}' as '{}'", self.key, self.token);
        }
        Ok(acquired)
    }

    /// Releases the lock if this instance still holds it.
    ///
    /// The ownership check runs under a watch on the lock key and the delete
    /// commits only if the key stayed untouched. A concurrent change in that
    /// window surfaces as [`CoralError::LockRelease`]; a failed ownership
    /// check surfaces as [`CoralError::LockNotHeld`].
    pub fn release<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        let outcome = check_and_commit(
            store,
            &[self.key.as_str()],
            |s| self.check(s),
            &[BatchCommand::Delete(self.key.clone())],
        )?;

        match outcome {
            CasOutcome::Committed(replies) if replies.first() == Some(&1) => {
                debug!("Released lock '{}' as '{}'", self.key, self.token);
                Ok(())
            }
            CasOutcome::Committed(_) | CasOutcome::Aborted => Err(CoralError::LockRelease {
                key: self.key.clone(),
                token: self.token.clone(),
            }),
            CasOutcome::ValidationFailed => Err(CoralError::LockNotHeld {
                key: self.key.clone(),
                token: self.token.clone(),
            }),
        }
    }
}

/// [`Lock`] variant whose time-to-live can be extended while held.
#[derive(Debug, Clone)]
pub struct RefreshableLock {
    inner: Lock,
}

impl RefreshableLock {
    pub fn new(key: impl Into<String>, token: impl Into<String>, duration: Duration) -> Self {
        Self {
            inner: Lock::new(key, token, duration),
        }
    }

    pub fn from_config(
        key: impl Into<String>,
        token: impl Into<String>,
        config: &CoralConfig,
    ) -> Self {
        Self {
            inner: Lock::from_config(key, token, config),
        }
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn token(&self) -> &str {
        self.inner.token()
    }

    pub fn check<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        self.inner.check(store)
    }

    pub fn acquire<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        self.inner.acquire(store)
    }

    pub fn release<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        self.inner.release(store)
    }

    /// Extends the time-to-live back to the full duration; same
    /// check-then-commit discipline and failure modes as release, with
    /// [`CoralError::LockRefresh`] reporting the race.
    pub fn refresh<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        let outcome = check_and_commit(
            store,
            &[self.inner.key.as_str()],
            |s| self.inner.check(s),
            &[BatchCommand::Expire(
                self.inner.key.clone(),
                self.inner.duration,
            )],
        )?;

        match outcome {
            CasOutcome::Committed(replies) if replies.first() == Some(&1) => {
                debug!(
                    "Refreshed lock '{}' as '{}'",
                    self.inner.key, self.inner.token
                );
                Ok(())
            }
            CasOutcome::Committed(_) | CasOutcome::Aborted => Err(CoralError::LockRefresh {
                key: self.inner.key.clone(),
                token: self.inner.token.clone(),
            }),
            CasOutcome::ValidationFailed => Err(CoralError::LockNotHeld {
                key: self.inner.key.clone(),
                token: self.inner.token.clone(),
            }),
        }
    }
}
