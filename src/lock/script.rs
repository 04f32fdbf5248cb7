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
use crate::store::adapter::{ScriptReply, Store};
use log::debug;
use std::time::Duration;

pub(crate) const CHECK_SCRIPT: &str = r#"
local holder = redis.call('GET', KEYS[1])
if holder == ARGV[1] then
    return 1
end
return 0
"#;

pub(crate) const ACQUIRE_SCRIPT: &str = r#"
return redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2])
"#;

pub(crate) const RELEASE_SCRIPT: &str = r#"
local holder = redis.call('GET', KEYS[1])
if not holder or holder ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
return 1
"#;

pub(crate) const REFRESH_SCRIPT: &str = r#"
local holder = redis.call('GET', KEYS[1])
if holder ~= ARGV[1] then
    return 0
end
redis.call('PEXPIRE', KEYS[1], ARGV[2])
return 1
"#;

fn ttl_arg(duration: Duration) -> String {
    duration.as_millis().max(1).to_string()
}

/// Mutual-exclusion lock whose ownership check and mutation run as one
/// server-side evaluation.
///
/// There is no window between the check and the commit, so release and
/// refresh have a single failure mode: [`CoralError::LockNotHeld`].
#[derive(Debug, Clone)]
pub struct ScriptLock {
    key: String,
    token: String,
    duration: Duration,
}

impl ScriptLock {
    pub fn new(key: impl Into<String>, token: impl Into<String>, duration: Duration) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
            duration,
        }
    }

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

    pub fn check<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        let reply = store.eval(CHECK_SCRIPT, &[self.key.as_str()], &[self.token.as_str()])?;
        Ok(reply.is_truthy())
    }

    pub fn acquire<S: Store + ?Sized>(&self, store: &mut S) -> Result<bool> {
        let ttl = ttl_arg(self.duration);
        let reply = store.eval(
            ACQUIRE_SCRIPT,
            &[self.key.as_str()],
            &[self.token.as_str(), ttl.as_str()],
        )?;
        let acquired = !matches!(reply, ScriptReply::Nil);
        if acquired {
            debug!("Acquired lock '{}' as '{}'", self.key, self.token);
        }
        Ok(acquired)
    }

    pub fn release<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        let reply = store.eval(RELEASE_SCRIPT, &[self.key.as_str()], &[self.token.as_str()])?;
        if reply.is_truthy() {
            debug!("Released lock '{}' as '{}'", self.key, self.token);
            Ok(())
        } else {
            Err(CoralError::LockNotHeld {
                key: self.key.clone(),
                token: self.token.clone(),
            })
        }
    }
}

/// [`ScriptLock`] variant whose time-to-live can be extended while held.
#[derive(Debug, Clone)]
pub struct RefreshableScriptLock {
    inner: ScriptLock,
}

impl RefreshableScriptLock {
    pub fn new(key: impl Into<String>, token: impl Into<String>, duration: Duration) -> Self {
        Self {
            inner: ScriptLock::new(key, token, duration),
        }
    }

    pub fn from_config(
        key: impl Into<String>,
        token: impl Into<String>,
        config: &CoralConfig,
    ) -> Self {
        Self {
            inner: ScriptLock::from_config(key, token, config),
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

    pub fn refresh<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        let ttl = ttl_arg(self.inner.duration);
        let reply = store.eval(
            REFRESH_SCRIPT,
            &[self.inner.key.as_str()],
            &[self.inner.token.as_str(), ttl.as_str()],
        )?;
        if reply.is_truthy() {
            debug!(
                "Refreshed lock '{}' as '{}'",
                self.inner.key, self.inner.token
            );
            Ok(())
        } else {
            Err(CoralError::LockNotHeld {
                key: self.inner.key.clone(),
                token: self.inner.token.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::InMemoryStore;

    #[test]
    fn acquire_succeeds_only_while_absent() {
        let mut store = InMemoryStore::new();
        let first = ScriptLock::new("app:lock", "worker-1", Duration::from_secs(1));
        let second = ScriptLock::new("app:lock", "worker-2", Duration::from_secs(1));

        assert!(first.acquire(&mut store).unwrap());
        assert!(!second.acquire(&mut store).unwrap());
        assert!(first.check(&mut store).unwrap());
        assert!(!second.check(&mut store).unwrap());
    }

    #[test]
    fn release_by_holder_deletes_the_record() {
        let mut store = InMemoryStore::new();
        let held = ScriptLock::new("app:lock", "worker-1", Duration::from_secs(1));

        held.acquire(&mut store).unwrap();
        held.release(&mut store).unwrap();
        assert!(store.string("app:lock").is_none());
    }

    #[test]
    fn release_by_non_holder_fails_not_held() {
        let mut store = InMemoryStore::new();
        let held = ScriptLock::new("app:lock", "worker-1", Duration::from_secs(1));
        let other = ScriptLock::new("app:lock", "worker-2", Duration::from_secs(1));

        held.acquire(&mut store).unwrap();
        let err = other.release(&mut store).unwrap_err();
        assert!(matches!(err, CoralError::LockNotHeld { .. }));
        assert_eq!(store.string("app:lock"), Some("worker-1"));
    }

    #[test]
    fn refresh_extends_ttl_for_holder_only() {
        let mut store = InMemoryStore::new();
        let held = RefreshableScriptLock::new("app:lock", "worker-1", Duration::from_secs(3));
        let other = RefreshableScriptLock::new("app:lock", "worker-2", Duration::from_secs(3));

        held.acquire(&mut store).unwrap();
        store.set_ttl("app:lock", Duration::from_millis(10));
        held.refresh(&mut store).unwrap();
        assert_eq!(store.ttl("app:lock"), Some(Duration::from_secs(3)));

        let err = other.refresh(&mut store).unwrap_err();
        assert!(matches!(err, CoralError::LockNotHeld { .. }));
    }

    #[test]
    fn release_after_expiry_fails_not_held() {
        let mut store = InMemoryStore::new();
        let held = ScriptLock::new("app:lock", "worker-1", Duration::from_secs(1));

        held.acquire(&mut store).unwrap();
        store.expire_now("app:lock");
        let err = held.release(&mut store).unwrap_err();
        assert!(matches!(err, CoralError::LockNotHeld { .. }));
    }
}
