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

use coral::store::RedisStore;

/// Redis instance used by the integration tests; defaults to a local server.
fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
}

pub fn connect() -> RedisStore {
    let client = redis::Client::open(redis_url()).expect("invalid REDIS_URL");
    let conn = client
        .get_connection()
        .expect("failed to connect to Redis for integration tests");
    RedisStore::new(conn)
}

/// Raw connection for assertions and cleanup outside the store adapter.
pub fn raw_connection() -> redis::Connection {
    let client = redis::Client::open(redis_url()).expect("invalid REDIS_URL");
    client
        .get_connection()
        .expect("failed to connect to Redis for integration tests")
}

/// Key that cannot collide across test runs or concurrent test processes.
pub fn unique_key(prefix: &str) -> String {
    format!("coral:test:{prefix}:{}", uuid::Uuid::new_v4())
}

pub fn key_exists(conn: &mut redis::Connection, key: &str) -> bool {
    let count: i64 = redis::cmd("EXISTS")
        .arg(key)
        .query(conn)
        .expect("EXISTS failed");
    count == 1
}

pub fn cleanup(conn: &mut redis::Connection, keys: &[&str]) {
    for key in keys {
        let _: i64 = redis::cmd("DEL").arg(key).query(conn).expect("DEL failed");
    }
}
