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

use crate::error::{CoralError, Result};
use crate::store::adapter::{BatchCommand, ScriptReply, Store};
use redis::{Commands, Connection, Value};
use std::time::Duration;

/// Production [`Store`] backed by a synchronous Redis connection.
///
/// The connection is supplied by the caller; coral neither constructs nor
/// configures network clients. Watched transactions map to WATCH/MULTI/EXEC
/// on this connection, scripting maps to EVALSHA with an EVAL fallback, and
/// durations are sent in milliseconds (PX / PEXPIRE).
pub struct RedisStore {
    conn: Connection,
}

impl RedisStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Hands the underlying connection back to the caller.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

/// Redis rejects a zero expiry, so the shortest representable time-to-live
/// is one millisecond.
fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

/// Normalizes a raw wire reply into [`ScriptReply`]. This is the single
/// point where store bytes become native values.
fn decode_reply(value: Value) -> Result<ScriptReply> {
    match value {
        Value::Nil => Ok(ScriptReply::Nil),
        Value::Int(n) => Ok(ScriptReply::Int(n)),
        Value::Okay => Ok(ScriptReply::Status("OK".to_string())),
        Value::SimpleString(status) => Ok(ScriptReply::Status(status)),
        Value::BulkString(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Ok(ScriptReply::Bulk(text)),
            Err(err) => Err(CoralError::StoreReply {
                details: format!("non-UTF-8 bulk payload: {err}"),
            }),
        },
        Value::Double(value) => Ok(ScriptReply::Bulk(value.to_string())),
        Value::Boolean(value) => Ok(ScriptReply::Int(i64::from(value))),
        Value::Array(items) => items
            .into_iter()
            .map(decode_reply)
            .collect::<Result<Vec<_>>>()
            .map(ScriptReply::Array),
        other => Err(CoralError::StoreReply {
            details: format!("unsupported reply type: {other:?}"),
        }),
    }
}

impl Store for RedisStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.conn.get(key)?)
    }

    fn set_if_absent(&mut self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let reply: Value = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query(&mut self.conn)?;
        Ok(!matches!(reply, Value::Nil))
    }

    fn delete(&mut self, key: &str) -> Result<i64> {
        Ok(self.conn.del(key)?)
    }

    fn expire(&mut self, key: &str, ttl: Duration) -> Result<bool> {
        let applied: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_millis(ttl))
            .query(&mut self.conn)?;
        Ok(applied == 1)
    }

    fn list_push(&mut self, key: &str, value: &str) -> Result<()> {
        let _length: i64 = self.conn.lpush(key, value)?;
        Ok(())
    }

    fn list_rotate(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.conn.rpoplpush(key, key)?)
    }

    fn list_move(&mut self, source: &str, destination: &str) -> Result<Option<String>> {
        Ok(self.conn.rpoplpush(source, destination)?)
    }

    fn list_remove(&mut self, key: &str, count: i64, value: &str) -> Result<i64> {
        Ok(self.conn.lrem(key, count as isize, value)?)
    }

    fn sorted_insert(&mut self, key: &str, member: &str, score: f64) -> Result<()> {
        let _added: i64 = self.conn.zadd(key, member, score)?;
        Ok(())
    }

    fn sorted_score(&mut self, key: &str, member: &str) -> Result<Option<f64>> {
        Ok(self.conn.zscore(key, member)?)
    }

    fn sorted_rank_desc(&mut self, key: &str, member: &str) -> Result<Option<u64>> {
        let rank: Option<i64> = redis::cmd("ZREVRANK")
            .arg(key)
            .arg(member)
            .query(&mut self.conn)?;
        Ok(rank.map(|rank| rank as u64))
    }

    fn sorted_first_by_score_desc(&mut self, key: &str, score: f64) -> Result<Option<String>> {
        let members: Vec<String> = redis::cmd("ZREVRANGEBYSCORE")
            .arg(key)
            .arg(score)
            .arg(score)
            .arg("LIMIT")
            .arg(0)
            .arg(1)
            .query(&mut self.conn)?;
        Ok(members.into_iter().next())
    }

    fn sorted_all_desc(&mut self, key: &str) -> Result<Vec<(String, f64)>> {
        Ok(redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .arg("WITHSCORES")
            .query(&mut self.conn)?)
    }

    fn watch(&mut self, keys: &[&str]) -> Result<()> {
        let mut cmd = redis::cmd("WATCH");
        for key in keys {
            cmd.arg(*key);
        }
        cmd.query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn unwatch(&mut self) -> Result<()> {
        redis::cmd("UNWATCH").query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn exec(&mut self, commands: &[BatchCommand]) -> Result<Option<Vec<i64>>> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            match command {
                BatchCommand::Delete(key) => {
                    pipe.cmd("DEL").arg(key);
                }
                BatchCommand::Expire(key, ttl) => {
                    pipe.cmd("PEXPIRE").arg(key).arg(ttl_millis(*ttl));
                }
                BatchCommand::ListRemove { key, count, value } => {
                    pipe.cmd("LREM").arg(key).arg(*count).arg(value);
                }
            }
        }
        Ok(pipe.query(&mut self.conn)?)
    }

    fn eval(&mut self, script: &str, keys: &[&str], args: &[&str]) -> Result<ScriptReply> {
        let script = redis::Script::new(script);
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(*key);
        }
        for arg in args {
            invocation.arg(*arg);
        }
        let value: Value = invocation.invoke(&mut self.conn)?;
        decode_reply(value)
    }
}
