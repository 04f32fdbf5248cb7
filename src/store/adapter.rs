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
use std::time::Duration;

/// A mutating command queued inside a watched transaction batch.
///
/// Every batch command replies with an integer, which is how the store
/// reports whether the mutation took effect (keys deleted, occurrences
/// removed, expiry applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCommand {
    /// Remove a key; replies with the number of keys removed.
    Delete(String),
    /// Reset a key's time-to-live; replies 1 when the key existed.
    Expire(String, Duration),
    /// Remove up to `count` occurrences of `value`, scanning from the head;
    /// replies with the number of occurrences removed.
    ListRemove {
        key: String,
        count: i64,
        value: String,
    },
}

/// Structured result of a server-side script evaluation.
///
/// Raw wire payloads are decoded into this shape at the adapter boundary, so
/// components never see store-native byte values.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptReply {
    Nil,
    Int(i64),
    Status(String),
    Bulk(String),
    Array(Vec<ScriptReply>),
}

impl ScriptReply {
    /// Truthiness under the store's scripting conventions: absent values and
    /// zero are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptReply::Nil => false,
            ScriptReply::Int(n) => *n != 0,
            ScriptReply::Status(_) | ScriptReply::Bulk(_) | ScriptReply::Array(_) => true,
        }
    }
}

/// Capabilities coral requires from the shared store.
///
/// This is the sole boundary to the outside world: single-key records with
/// expiry, lists with atomic rotation, a descending-ordered scored set,
/// watched transactions, and server-side scripting. One implementation
/// exists per store technology; [`RedisStore`](crate::store::RedisStore) is
/// the production one, and the components stay oblivious to which one they
/// are handed.
pub trait Store {
    /// Read a single-key record.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value` with expiry `ttl`, only if the key is absent.
    /// Returns whether the write happened.
    fn set_if_absent(&mut self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete a key, returning how many keys were removed (0 or 1).
    fn delete(&mut self, key: &str) -> Result<i64>;

    /// Reset a key's time-to-live. Returns false when the key is absent.
    fn expire(&mut self, key: &str, ttl: Duration) -> Result<bool>;

    /// Append a value at the head of a list.
    fn list_push(&mut self, key: &str, value: &str) -> Result<()>;

    /// Atomically pop the tail of a list and push it back onto its own head,
    /// returning the rotated value.
    fn list_rotate(&mut self, key: &str) -> Result<Option<String>>;

    /// Atomically pop the tail of `source` and push it onto the head of
    /// `destination`.
    fn list_move(&mut self, source: &str, destination: &str) -> Result<Option<String>>;

    /// Remove up to `count` occurrences of `value` from a list, scanning from
    /// the head. Returns how many were removed.
    fn list_remove(&mut self, key: &str, count: i64, value: &str) -> Result<i64>;

    /// Upsert a member with a score.
    fn sorted_insert(&mut self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Score of a member, if present.
    fn sorted_score(&mut self, key: &str, member: &str) -> Result<Option<f64>>;

    /// 0-based position of a member in descending score order.
    fn sorted_rank_desc(&mut self, key: &str, member: &str) -> Result<Option<u64>>;

    /// First member at exactly `score` in descending order, i.e. the
    /// best-placed member of a tied group.
    fn sorted_first_by_score_desc(&mut self, key: &str, score: f64) -> Result<Option<String>>;

    /// All members with scores, best first.
    fn sorted_all_desc(&mut self, key: &str) -> Result<Vec<(String, f64)>>;

    /// Start observing `keys` for concurrent modification. A later
    /// [`exec`](Store::exec) on this connection aborts if any watched key
    /// changed in between.
    fn watch(&mut self, keys: &[&str]) -> Result<()>;

    /// Stop observing watched keys without committing anything.
    fn unwatch(&mut self) -> Result<()>;

    /// Commit a batch under the current watch. Returns one integer reply per
    /// command, or `None` when a watched key changed and the store discarded
    /// the batch.
    fn exec(&mut self, commands: &[BatchCommand]) -> Result<Option<Vec<i64>>>;

    /// Evaluate a parameterized script bound to `keys` and `args` as one
    /// indivisible server-side step.
    fn eval(&mut self, script: &str, keys: &[&str], args: &[&str]) -> Result<ScriptReply>;
}
