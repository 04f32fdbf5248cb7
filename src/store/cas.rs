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

use crate::error::Result;
use crate::store::adapter::{BatchCommand, Store};
use log::debug;

/// Outcome of one optimistic check-then-commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// Validation passed and the batch committed; one integer reply per
    /// queued command.
    Committed(Vec<i64>),
    /// The validation read rejected the attempt; nothing was queued and the
    /// watch has been released.
    ValidationFailed,
    /// A watched key changed between the watch and the commit, so the store
    /// discarded the batch.
    Aborted,
}

/// Runs the two-phase optimistic pattern: watch `watched`, run `validate`,
/// and commit `commands` only when validation passes.
///
/// The validation read and the commit are not atomic with respect to each
/// other; the watch guards only the commit step. A concurrent writer that
/// touches a watched key after the watch is taken makes the commit abort,
/// reported as [`CasOutcome::Aborted`]. Nothing is retried here: whether an
/// aborted attempt is worth repeating is the caller's decision.
pub fn check_and_commit<S, F>(
    store: &mut S,
    watched: &[&str],
    validate: F,
    commands: &[BatchCommand],
) -> Result<CasOutcome>
where
    S: Store + ?Sized,
    F: FnOnce(&mut S) -> Result<bool>,
{
    store.watch(watched)?;

    match validate(store) {
        Ok(true) => {}
        Ok(false) => {
            store.unwatch()?;
            return Ok(CasOutcome::ValidationFailed);
        }
        Err(err) => {
            if let Err(unwatch_err) = store.unwatch() {
                debug!("Failed to release watch after validation error: {unwatch_err}");
            }
            return Err(err);
        }
    }

    match store.exec(commands)? {
        Some(replies) => Ok(CasOutcome::Committed(replies)),
        None => Ok(CasOutcome::Aborted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::InMemoryStore;
    use std::time::Duration;

    #[test]
    fn commits_when_validation_passes() {
        let mut store = InMemoryStore::new();
        store
            .set_if_absent("record", "value", Duration::from_secs(1))
            .unwrap();

        let outcome = check_and_commit(
            &mut store,
            &["record"],
            |s| Ok(s.get("record")?.is_some()),
            &[BatchCommand::Delete("record".to_string())],
        )
        .unwrap();

        assert_eq!(outcome, CasOutcome::Committed(vec![1]));
        assert!(store.string("record").is_none());
    }

    #[test]
    fn failed_validation_skips_commit() {
        let mut store = InMemoryStore::new();

        let outcome = check_and_commit(
            &mut store,
            &["record"],
            |s| Ok(s.get("record")?.is_some()),
            &[BatchCommand::Delete("record".to_string())],
        )
        .unwrap();

        assert_eq!(outcome, CasOutcome::ValidationFailed);
    }

    #[test]
    fn concurrent_change_aborts_commit() {
        let mut store = InMemoryStore::new();
        store
            .set_if_absent("record", "value", Duration::from_secs(1))
            .unwrap();
        store.force_abort_on_next_exec();

        let outcome = check_and_commit(
            &mut store,
            &["record"],
            |s| Ok(s.get("record")?.is_some()),
            &[BatchCommand::Delete("record".to_string())],
        )
        .unwrap();

        assert_eq!(outcome, CasOutcome::Aborted);
        assert_eq!(store.string("record"), Some("value"));
    }
}
