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
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "coral.toml";
const DEFAULT_LOCK_DURATION_MS: u64 = 1000;
const DEFAULT_CLAIM_DURATION_MS: u64 = 1000;
const DEFAULT_PROCESSING_SUFFIX: &str = "processing";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoralConfig {
    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Time-to-live applied when a lock is acquired or refreshed.
    #[serde(default = "default_lock_duration_ms")]
    pub duration_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_LOCK_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Time-to-live of a claim created by a circular-queue take.
    #[serde(default = "default_claim_duration_ms")]
    pub claim_duration_ms: u64,

    /// Suffix appended to a backup queue's key to name its processing list.
    #[serde(default = "default_processing_suffix")]
    pub processing_suffix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            claim_duration_ms: DEFAULT_CLAIM_DURATION_MS,
            processing_suffix: DEFAULT_PROCESSING_SUFFIX.to_string(),
        }
    }
}

fn default_lock_duration_ms() -> u64 {
    DEFAULT_LOCK_DURATION_MS
}

fn default_claim_duration_ms() -> u64 {
    DEFAULT_CLAIM_DURATION_MS
}

fn default_processing_suffix() -> String {
    DEFAULT_PROCESSING_SUFFIX.to_string()
}

impl CoralConfig {
    /// Loads `coral.toml` from `dir`, falling back to defaults when the file
    /// does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        toml::from_str(&content).map_err(|err| CoralError::ConfigFile(err.to_string()))
    }

    pub fn lock_duration(&self) -> Duration {
        Duration::from_millis(self.lock.duration_ms)
    }

    pub fn claim_duration(&self) -> Duration {
        Duration::from_millis(self.queue.claim_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = CoralConfig::load(temp.path()).unwrap();
        assert_eq!(config.lock.duration_ms, DEFAULT_LOCK_DURATION_MS);
        assert_eq!(config.queue.claim_duration_ms, DEFAULT_CLAIM_DURATION_MS);
        assert_eq!(config.queue.processing_suffix, "processing");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[lock]\nduration_ms = 5000\n",
        )
        .unwrap();

        let config = CoralConfig::load(temp.path()).unwrap();
        assert_eq!(config.lock_duration(), Duration::from_millis(5000));
        assert_eq!(config.queue.processing_suffix, "processing");
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "[lock\n").unwrap();

        let err = CoralConfig::load(temp.path()).unwrap_err();
        assert!(matches!(err, CoralError::ConfigFile(_)));
    }
}
