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
use crate::leaderboard::standings::{Placement, Standing, dense_standings};
use crate::store::adapter::Store;

/// Leaderboard whose queries compose several independent store reads.
///
/// The reads are not atomic with one another, so a score update landing
/// between them makes the result best-effort rather than snapshot-consistent.
/// A member vanishing mid-query yields `None`, never an error.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    key: String,
}

impl Leaderboard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upserts the member's score.
    pub fn set_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
        score: f64,
    ) -> Result<()> {
        store.sorted_insert(&self.key, member, score)
    }

    pub fn get_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<f64>> {
        store.sorted_score(&self.key, member)
    }

    /// Dense competition rank of `member`, 1-based, highest score first:
    /// the rank of the best-placed member sharing the same score.
    pub fn get_rank<S: Store + ?Sized>(&self, store: &mut S, member: &str) -> Result<Option<u64>> {
        Ok(self.rank_and_score(store, member)?.map(|(rank, _)| rank))
    }

    /// Both ranks of `member`: its absolute position and its shared
    /// competition rank, along with the score. `None` when absent.
    pub fn get_placement<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<Placement>> {
        let Some((competition_rank, score)) = self.rank_and_score(store, member)? else {
            return Ok(None);
        };
        let Some(individual) = store.sorted_rank_desc(&self.key, member)? else {
            return Ok(None);
        };

        Ok(Some(Placement {
            individual_rank: individual + 1,
            competition_rank,
            score,
        }))
    }

    /// Full listing with dense competition ranks, best score first.
    pub fn get_standings<S: Store + ?Sized>(&self, store: &mut S) -> Result<Vec<Standing>> {
        Ok(dense_standings(store.sorted_all_desc(&self.key)?))
    }

    fn rank_and_score<S: Store + ?Sized>(
        &self,
        store: &mut S,
        member: &str,
    ) -> Result<Option<(u64, f64)>> {
        let Some(score) = store.sorted_score(&self.key, member)? else {
            return Ok(None);
        };
        let Some(top_member) = store.sorted_first_by_score_desc(&self.key, score)? else {
            return Ok(None);
        };
        let Some(top_rank) = store.sorted_rank_desc(&self.key, &top_member)? else {
            return Ok(None);
        };

        Ok(Some((top_rank + 1, score)))
    }
}
