#![allow(dead_code)]

use async_trait::async_trait;
use quotebook_core::{
    KeyValueStore, Quote, QuoteId, RemoteError, RemoteResult, RemoteSource, SessionStore,
    StoreError, StoreResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: SessionStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Serialization("quota exceeded".to_string()));
        }
        self.inner.save(key, value)
    }
}

/// Remote double that replays a scripted fetch result and records pushes.
pub struct ScriptedRemote {
    fetch_result: Mutex<RemoteResult<Vec<Quote>>>,
    push_fails: AtomicBool,
    fetch_calls: AtomicUsize,
    pushes: Mutex<Vec<Vec<Quote>>>,
    gate: Option<Gate>,
}

/// Holds a fetch open until released.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedRemote {
    pub fn returning(quotes: Vec<Quote>) -> Self {
        Self::with_result(Ok(quotes))
    }

    pub fn failing(error: RemoteError) -> Self {
        Self::with_result(Err(error))
    }

    pub fn gated(quotes: Vec<Quote>) -> Self {
        Self {
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::returning(quotes)
        }
    }

    fn with_result(result: RemoteResult<Vec<Quote>>) -> Self {
        Self {
            fetch_result: Mutex::new(result),
            push_fails: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
            pushes: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn set_result(&self, result: RemoteResult<Vec<Quote>>) {
        *self.fetch_result.lock().unwrap() = result;
    }

    pub fn set_push_fails(&self, fails: bool) {
        self.push_fails.store(fails, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn pushes(&self) -> Vec<Vec<Quote>> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("remote was not built with a gate")
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn fetch_snapshot(&self) -> RemoteResult<Vec<Quote>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.fetch_result.lock().unwrap().clone()
    }

    async fn push_snapshot(&self, quotes: &[Quote]) -> RemoteResult<()> {
        self.pushes.lock().unwrap().push(quotes.to_vec());
        if self.push_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Status(503));
        }
        Ok(())
    }
}

pub fn remote_quote(id: u64, text: &str, category: &str) -> Quote {
    Quote::with_id(QuoteId::remote(id), text, category).unwrap()
}

pub fn pairs(quotes: &[Quote]) -> Vec<(String, String)> {
    quotes
        .iter()
        .map(|quote| (quote.text.clone(), quote.category.clone()))
        .collect()
}
