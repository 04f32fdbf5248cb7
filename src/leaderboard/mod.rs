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

//! Tie-aware ranked leaderboards over the store's scored set.
//!
//! Ranking is dense competition ranking: members with equal scores share a
//! rank, and the next distinct score resumes at its absolute 1-based
//! position, so ranks skip after a tie but never repeat. Rank 1 is the
//! highest score.
//!
//! [`optimistic::Leaderboard`] composes independent reads client-side and is
//! best-effort under concurrent score updates; [`script::ScriptLeaderboard`]
//! runs the same logic as one server-side evaluation per call, which makes
//! each call snapshot-consistent (though not calls with each other).

pub mod optimistic;
pub mod script;
mod standings;

pub use optimistic::Leaderboard;
pub use script::ScriptLeaderboard;
pub use standings::{Placement, Standing};
