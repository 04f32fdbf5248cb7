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

//! Distributed mutual exclusion over the shared store.
//!
//! Two backends implement the same contract. [`optimistic::Lock`] composes a
//! client-side ownership check with a watched transaction and reports the
//! check/commit race as a distinct failure. [`script::ScriptLock`] folds the
//! check and the mutation into one server-side evaluation, so the only way
//! release or refresh can fail is to not hold the lock.

pub mod optimistic;
pub mod script;

pub use optimistic::{Lock, RefreshableLock};
pub use script::{RefreshableScriptLock, ScriptLock};
