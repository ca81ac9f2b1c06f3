//! Watchable key-value store (§4.B): the primary rendezvous mechanism
//! between dependent services.
//!
//! `wait` is edge-triggered on the appearance of a value: delete-then-set
//! wakes waiters, multiple concurrent waiters on one key are all unblocked
//! by a single `set`, and a waiter that is dropped before it is woken
//! (client disconnect, deadline) removes itself from the waiter set so a
//! late `set` never tries to deliver to a dead caller (§5 cancellation,
//! §9 design note).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::{SkeinError, Result};

struct KvInner {
    values: HashMap<String, String>,
    waiters: HashMap<String, Vec<(u64, oneshot::Sender<String>)>>,
    next_waiter_id: u64,
}

impl KvInner {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            waiters: HashMap::new(),
            next_waiter_id: 0,
        }
    }
}

/// Concurrent map with blocking `get` semantics, owned by the Application
/// Master for its lifetime only (§3: "entries survive for the AM's
/// lifetime only").
///
/// Cheap to clone: internally an `Arc`, so the reconciler, the RPC
/// surface, and the dependency scheduler can each hold their own handle.
#[derive(Clone)]
pub struct KvStore {
    inner: Arc<Mutex<KvInner>>,
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(KvInner::new())),
        }
    }

    /// Read a key, optionally blocking until it is set.
    ///
    /// If `wait` is `false` and the key is absent, fails immediately with
    /// [`SkeinError::NotFound`]. If `wait` is `true`, the returned future
    /// resolves as soon as the value appears; dropping the future before
    /// it resolves (caller cancellation) deregisters the waiter.
    pub async fn get(&self, key: &str, wait: bool) -> Result<String> {
        let (receiver, _guard) = {
            let mut inner = self.inner.lock();
            if let Some(value) = inner.values.get(key) {
                return Ok(value.clone());
            }
            if !wait {
                return Err(SkeinError::unknown_key(key));
            }
            let (tx, rx) = oneshot::channel();
            let id = inner.next_waiter_id;
            inner.next_waiter_id += 1;
            inner
                .waiters
                .entry(key.to_string())
                .or_default()
                .push((id, tx));
            debug!(key, id, "kv: registered waiter");
            (
                rx,
                WaiterGuard {
                    inner: Arc::clone(&self.inner),
                    key: key.to_string(),
                    id,
                },
            )
        };

        receiver.await.map_err(|_| SkeinError::Cancelled)
    }

    /// Unconditional upsert. On an absent->present transition, wakes every
    /// waiter registered on this key.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let waiters = {
            let mut inner = self.inner.lock();
            inner.values.insert(key.clone(), value.clone());
            inner.waiters.remove(&key)
        };
        if let Some(waiters) = waiters {
            debug!(key = %key, woken = waiters.len(), "kv: waking waiters");
            for (_, tx) in waiters {
                // Receiver may already be gone (cancelled); that is not an error.
                let _ = tx.send(value.clone());
            }
        }
    }

    /// Remove a key if present. Idempotent; returns whether a value was
    /// actually removed. Does not wake waiters (waiters only exist while
    /// the key is absent).
    pub fn del(&self, key: &str) -> bool {
        self.inner.lock().values.remove(key).is_some()
    }

    /// Non-blocking presence check, used by the dependency scheduler to
    /// evaluate readiness without registering a waiter.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().values.contains_key(key)
    }

    /// Snapshot of every key-value pair currently stored.
    pub fn get_all(&self) -> HashMap<String, String> {
        self.inner.lock().values.clone()
    }
}

/// RAII handle that deregisters a `get(wait=true)` waiter when dropped,
/// whether because it was woken (no-op, already removed by `set`) or
/// because the caller cancelled before that happened.
struct WaiterGuard {
    inner: Arc<Mutex<KvInner>>,
    key: String,
    id: u64,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if let Some(waiters) = inner.waiters.get_mut(&self.key) {
            waiters.retain(|(id, _)| *id != self.id);
            if waiters.is_empty() {
                inner.waiters.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let kv = KvStore::new();
        kv.set("k", "v");
        assert_eq!(kv.get("k", false).await.unwrap(), "v");
    }

    #[tokio::test]
    async fn get_without_wait_fails_not_found() {
        let kv = KvStore::new();
        let err = kv.get("missing", false).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn set_delete_get_fails_not_found() {
        let kv = KvStore::new();
        kv.set("k", "v");
        assert!(kv.del("k"));
        assert!(kv.get("k", false).await.is_err());
    }

    #[tokio::test]
    async fn waiting_get_wakes_on_set() {
        let kv = KvStore::new();
        let kv2 = kv.clone();
        let handle = tokio::spawn(async move { kv2.get("k", true).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        kv.set("k", "ready");

        let value = handle.await.unwrap().unwrap();
        assert_eq!(value, "ready");
    }

    #[tokio::test]
    async fn multiple_waiters_all_wake_on_one_set() {
        let kv = KvStore::new();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let kv2 = kv.clone();
            handles.push(tokio::spawn(async move { kv2.get("k", true).await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        kv.set("k", "go");
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "go");
        }
    }

    #[tokio::test]
    async fn delete_then_set_wakes_new_waiter_not_old_value() {
        let kv = KvStore::new();
        kv.set("k", "v1");
        assert!(kv.del("k"));

        let kv2 = kv.clone();
        let handle = tokio::spawn(async move { kv2.get("k", true).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        kv.set("k", "v2");
        assert_eq!(handle.await.unwrap().unwrap(), "v2");
    }

    #[tokio::test]
    async fn cancelling_waiter_does_not_stop_set_from_succeeding() {
        let kv = KvStore::new();
        {
            let fut = kv.get("k", true);
            tokio::pin!(fut);
            // Poll once to register the waiter, then drop it (cancel).
            let _ = futures_poll_once(&mut fut).await;
        }
        kv.set("k", "v");
        assert_eq!(kv.get("k", false).await.unwrap(), "v");
    }

    /// Polls a future exactly once without running it to completion, used
    /// to register a KV waiter and then drop it mid-flight to simulate
    /// cancellation.
    async fn futures_poll_once<F: std::future::Future>(fut: &mut std::pin::Pin<&mut F>) {
        use std::task::Poll;
        std::future::poll_fn(|cx| {
            let _ = fut.as_mut().poll(cx);
            Poll::Ready(())
        })
        .await;
    }

    #[tokio::test]
    async fn get_all_snapshots_current_state() {
        let kv = KvStore::new();
        kv.set("a", "1");
        kv.set("b", "2");
        let all = kv.get_all();
        assert_eq!(all.get("a").map(String::as_str), Some("1"));
        assert_eq!(all.get("b").map(String::as_str), Some("2"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(String, String),
        Del(String),
    }

    fn op_strategy() -> impl proptest::strategy::Strategy<Value = Op> {
        use proptest::prelude::*;
        prop_oneof![
            ("[a-c]", "[0-9]").prop_map(|(k, v)| Op::Set(k, v)),
            "[a-c]".prop_map(Op::Del),
        ]
    }

    proptest::proptest! {
        /// A sequential history of `set`/`del` applied single-threaded
        /// against a real `KvStore` must always agree with a plain
        /// `HashMap` run through the same history: the store's blocking
        /// machinery must never change the value a non-blocking `get`
        /// observes afterwards.
        #[test]
        fn sequential_history_matches_hashmap_model(
            ops in proptest::collection::vec(op_strategy(), 0..40),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("build current-thread runtime");
            rt.block_on(async {
                let kv = KvStore::new();
                let mut model: HashMap<String, String> = HashMap::new();
                for op in &ops {
                    match op {
                        Op::Set(k, v) => {
                            kv.set(k.clone(), v.clone());
                            model.insert(k.clone(), v.clone());
                        }
                        Op::Del(k) => {
                            kv.del(k);
                            model.remove(k);
                        }
                    }
                }
                for key in ["a", "b", "c"] {
                    let actual = kv.get(key, false).await.ok();
                    let expected = model.get(key).cloned();
                    proptest::prop_assert_eq!(actual, expected);
                }
                Ok(())
            })?;
        }
    }
}
