// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value storage seam: the opaque TTL store trait, the in-process
//! implementation, and the two adapters built on top of it (per-user
//! sessions and the outbound message correlation cache).

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::session::Session;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Opaque key-value store with per-key TTL.
///
/// Every write refreshes the key's TTL. Object-safe for use as
/// `Arc<dyn KvStore>`; all operations may suspend on I/O.
pub trait KvStore: Send + Sync {
    fn get_map<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<BTreeMap<String, String>>>;

    fn put_map<'a>(
        &'a self,
        key: &'a str,
        value: BTreeMap<String, String>,
        ttl: Duration,
    ) -> StoreFuture<'a, ()>;

    fn get_string<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    fn put_string<'a>(&'a self, key: &'a str, value: String, ttl: Duration)
        -> StoreFuture<'a, ()>;

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

#[derive(Debug, Clone)]
enum Value {
    Map(BTreeMap<String, String>),
    Text(String),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-process [`KvStore`] with lazy TTL expiry.
///
/// Expired keys are dropped on the next access rather than by a sweeper;
/// durability is out of scope, a lost key is equivalent to "user starts
/// over".
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_live(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) {
        let entry = Entry { value, expires_at: Instant::now() + ttl };
        self.entries.lock().await.insert(key.to_owned(), entry);
    }
}

impl KvStore for MemoryStore {
    fn get_map<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<BTreeMap<String, String>>> {
        Box::pin(async move {
            match self.get_live(key).await {
                Some(Value::Map(map)) => Ok(Some(map)),
                _ => Ok(None),
            }
        })
    }

    fn put_map<'a>(
        &'a self,
        key: &'a str,
        value: BTreeMap<String, String>,
        ttl: Duration,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.put(key, Value::Map(value), ttl).await;
            Ok(())
        })
    }

    fn get_string<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            match self.get_live(key).await {
                Some(Value::Text(text)) => Ok(Some(text)),
                _ => Ok(None),
            }
        })
    }

    fn put_string<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Duration,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.put(key, Value::Text(value), ttl).await;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.entries.lock().await.remove(key);
            Ok(())
        })
    }
}

/// Session persistence namespaced by a worker prefix.
///
/// Keys are `{prefix}:{user_id}`; every write refreshes the session TTL.
/// An empty or missing record is indistinguishable from "no session".
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KvStore>,
    prefix: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KvStore>, prefix: &str, ttl: Duration) -> Self {
        Self { store, prefix: prefix.to_owned(), ttl }
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}:{}", self.prefix, user_id)
    }

    pub async fn load(&self, user_id: &str) -> anyhow::Result<Option<Session>> {
        match self.store.get_map(&self.key(user_id)).await? {
            Some(map) if !map.is_empty() => Ok(Some(Session::from_map(&map)?)),
            _ => Ok(None),
        }
    }

    /// Persist a fresh session, stamping `created_at`.
    pub async fn create(&self, user_id: &str, mut session: Session) -> anyhow::Result<Session> {
        session.created_at = Some(iso8601_now());
        self.save(user_id, &session).await?;
        Ok(session)
    }

    pub async fn save(&self, user_id: &str, session: &Session) -> anyhow::Result<()> {
        self.store.put_map(&self.key(user_id), session.to_map()?, self.ttl).await
    }

    pub async fn clear(&self, user_id: &str) -> anyhow::Result<()> {
        self.store.delete(&self.key(user_id)).await
    }
}

/// Maps outbound message ids back to user ids so late delivery events can be
/// routed after the outbound has left.
///
/// Keys are `{prefix}:cache:{message_id}`. Eviction under TTL is acceptable:
/// an event arriving after expiry is dropped.
#[derive(Clone)]
pub struct CorrelationCache {
    store: Arc<dyn KvStore>,
    prefix: String,
    ttl: Duration,
}

impl CorrelationCache {
    pub fn new(store: Arc<dyn KvStore>, prefix: &str, ttl: Duration) -> Self {
        Self { store, prefix: prefix.to_owned(), ttl }
    }

    fn key(&self, message_id: &str) -> String {
        format!("{}:cache:{}", self.prefix, message_id)
    }

    pub async fn put(&self, message_id: &str, user_id: &str) -> anyhow::Result<()> {
        self.store.put_string(&self.key(message_id), user_id.to_owned(), self.ttl).await
    }

    pub async fn get(&self, message_id: &str) -> anyhow::Result<Option<String>> {
        self.store.get_string(&self.key(message_id)).await
    }
}

/// Return the current UTC time as an ISO 8601 string (e.g. "2026-02-14T01:23:45Z").
pub(crate) fn iso8601_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let dur = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = dur.as_secs();
    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let minutes = (time_secs % 3600) / 60;
    let seconds = time_secs % 60;
    // Civil calendar from days since epoch (Howard Hinnant's algorithm).
    let days = secs / 86400;
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}Z")
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
