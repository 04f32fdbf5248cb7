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

use thiserror::Error;

/// Failures surfaced by the coordination components.
///
/// Ownership failures (`LockNotHeld`, `ItemNotClaimed`) are deterministic:
/// the caller's invariant was already false. Race failures (`LockRelease`,
/// `LockRefresh`, `ItemComplete`) mean a concurrent actor invalidated a
/// watched transaction and the operation may be worth retrying. No component
/// retries on its own; every failure is raised to the caller as-is.
#[derive(Error, Debug)]
pub enum CoralError {
    #[error("Lock '{key}' is not held by '{token}'")]
    LockNotHeld { key: String, token: String },

    #[error("Lock '{key}' was not released cleanly (holder: '{token}')")]
    LockRelease { key: String, token: String },

    #[error("Lock '{key}' was not refreshed (holder: '{token}')")]
    LockRefresh { key: String, token: String },

    #[error("Item '{item}' in queue '{queue}' is not claimed by consumer '{consumer}'")]
    ItemNotClaimed {
        queue: String,
        consumer: String,
        item: String,
    },

    #[error("Item '{item}' in queue '{queue}' was not completed cleanly by consumer '{consumer}'")]
    ItemComplete {
        queue: String,
        consumer: String,
        item: String,
    },

    #[error("Item '{item}' in queue '{queue}' was not completed cleanly")]
    QueueComplete { queue: String, item: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    #[error("Unexpected reply from store: {details}")]
    StoreReply { details: String },

    #[error(transparent)]
    Store(#[from] redis::RedisError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoralError>;
