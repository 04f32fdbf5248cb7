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
use crate::leaderboard::standings::{Placement, Standing};
use crate::store::adapter::{ScriptReply, Store};

pub(crate) const SET_SCORE_SCRIPT: &str = r#"
return redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
"#;

pub(crate) const GET_SCORE_SCRIPT: &str = r#"
return redis.call('ZSCORE', KEYS[1], ARGV[1])
"#;

pub(crate) const RANK_AND_SCORE_SCRIPT: &str = r#"
local score = redis.call('ZSCORE', KEYS[1], ARGV[1])
if not score then
    return nil
end
local top = redis.call('ZREVRANGEBYSCORE', KEYS[1], score, score, 'LIMIT', 0, 1)
local rank = redis.call('ZREVRANK', KEYS[1], top[1])
return {rank, score}
"#;

pub(crate) const PLACEMENT_SCRIPT: &str = r#"
local score = redis.call('ZSCORE', KEYS[1], ARGV[1])
if not score then
    return nil
end
local individual = redis.call('ZREVRANK', KEYS[1], ARGV[1])
local top = redis.call('ZREVRANGEBYSCORE', KEYS[1], score, score, 'LIMIT', 0, 1)
local competition = redis.call('ZREVRANK', KEYS[1], top[1])
return {individual, competition, score}
"#;

pub(crate) const STANDINGS_SCRIPT: &str = r#"
local entries = redis.call('ZREVRANGE', KEYS[1], 0, -1, 'WITHSCORES')
local standings = {}
local rank = 0
local position = 0
local previous = false
for i = 1, #entries, 2 do
    position = position + 1
    local member = entries[i]
    local score = entries[i + 1]
    if score ~= previous then
        rank = position
        previous = score
    end
    table.insert(standings, {member, rank, score})
end
return standings
"#;

/// Leaderboard whose queries each run as one server-side evaluation,
/// making every call snapshot-consistent on its own. Calls are still
/// independent of each other.
#[derive(Debug, Clone)]
pub struct ScriptLeaderboard {
    key: String,
}

impl ScriptLeaderboard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
        score: f64,
    ) -> Result<()> {
        let score_arg = score.to_string();
        store.eval(
            SET_SCORE_SCRIPT,
            &[self.key.as_str()],
            &[member, score_arg.as_str()],
        )?;
        Ok(())
    }

    pub fn get_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<f64>> {
        match store.eval(GET_SCORE_SCRIPT, &[self.key.as_str()], &[member])? {
            ScriptReply::Nil => Ok(None),
            ScriptReply::Bulk(raw) => Ok(Some(parse_score(&raw)?)),
            other => Err(unexpected(&other)),
        }
    }

    /// Dense competition rank of `member`, 1-based, highest score first.
    pub fn get_rank<S: Store + ?Sized>(&self, store: &mut S, member: &str) -> Result<Option<u64>> {
        Ok(self.rank_and_score(store, member)?.map(|(rank, _)| rank))
    }

    pub fn get_placement<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<Placement>> {
        let reply = store.eval(PLACEMENT_SCRIPT, &[self.key.as_str()], &[member])?;
        match reply {
            ScriptReply::Nil => Ok(None),
            ScriptReply::Array(items) => match items.as_slice() {
                [
                    ScriptReply::Int(individual),
                    ScriptReply::Int(competition),
                    ScriptReply::Bulk(raw),
                ] => Ok(Some(Placement {
                    individual_rank: *individual as u64 + 1,
                    competition_rank: *competition as u64 + 1,
                    score: parse_score(raw)?,
                })),
                other => Err(CoralError::StoreReply {
                    details: format!("unexpected leaderboard reply: {other:?}"),
                }),
            },
            other => Err(unexpected(&other)),
        }
    }

    /// Full listing with dense competition ranks, computed server-side over
    /// a single snapshot of the board.
    pub fn get_standings<S: Store + ?Sized>(&self, store: &mut S) -> Result<Vec<Standing>> {
        let reply = store.eval(STANDINGS_SCRIPT, &[self.key.as_str()], &[])?;
        let ScriptReply::Array(rows) = reply else {
            return Err(unexpected(&reply));
        };

        let mut standings = Vec::with_capacity(rows.len());
        for row in rows {
            let ScriptReply::Array(fields) = &row else {
                return Err(unexpected(&row));
            };
            match fields.as_slice() {
                [
                    ScriptReply::Bulk(member),
                    ScriptReply::Int(rank),
                    ScriptReply::Bulk(raw),
                ] => standings.push(Standing {
                    member: member.clone(),
                    rank: *rank as u64,
                    score: parse_score(raw)?,
                }),
                _ => return Err(unexpected(&row)),
            }
        }

        Ok(standings)
    }

    fn rank_and_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<(u64, f64)>> {
        let reply = store.eval(RANK_AND_SCORE_SCRIPT, &[self.key.as_str()], &[member])?;
        match reply {
            ScriptReply::Nil => Ok(None),
            ScriptReply::Array(items) => match items.as_slice() {
                [ScriptReply::Int(rank), ScriptReply::Bulk(raw)] => {
                    Ok(Some((*rank as u64 + 1, parse_score(raw)?)))
                }
                other => Err(CoralError::StoreReply {
                    details: format!("unexpected leaderboard reply: {other:?}"),
                }),
            },
            other => Err(unexpected(&other)),
        }
    }
}

fn parse_score(raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| CoralError::StoreReply {
        details: format!("unparseable score '{raw}'"),
    })
}

fn unexpected(reply: &ScriptReply) -> CoralError {
    CoralError::StoreReply {
        details: format!("unexpected leaderboard reply: {reply:?}"),
    }
}
