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

/// One row of a full leaderboard listing, best score first.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub member: String,
    /// Dense competition rank, 1-based; tied members share it.
    pub rank: u64,
    pub score: f64,
}

/// A single member's position relative to the whole board.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Absolute 1-based position in descending score order, ties broken by
    /// the store's member ordering.
    pub individual_rank: u64,
    /// Dense competition rank, shared across tied members.
    pub competition_rank: u64,
    pub score: f64,
}

/// Folds a descending (member, score) listing into dense competition ranks.
///
/// The first member takes rank 1. Whenever the score changes, the rank jumps
/// to the current 1-based position — equivalently, it advances by the size
/// of the tied group that just ended.
pub(crate) fn dense_standings(entries: Vec<(String, f64)>) -> Vec<Standing> {
    let mut standings = Vec::with_capacity(entries.len());
    let mut current_score = None;
    let mut rank = 0u64;

    for (position, (member, score)) in entries.into_iter().enumerate() {
        if current_score != Some(score) {
            rank = position as u64 + 1;
            current_score = Some(score);
        }
        standings.push(Standing {
            member,
            rank,
            score,
        });
    }

    standings
}
