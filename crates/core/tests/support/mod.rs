//! Shared test helpers for `sunat-core` integration tests.
//!
//! `ScriptedResolver` replays a fixed list of replies and counts every query,
//! so poll tests can assert on exactly how often SUNAT would have been hit.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sunat_core::StatusResolver;
use sunat_domain::{AccessToken, ResponseCode, Result, StatusResult, Ticket};

pub struct ScriptedResolver {
    replies: Mutex<VecDeque<Result<StatusResult>>>,
    fallback: ResponseCode,
    latency: Duration,
    calls: AtomicU32,
    completed: AtomicU32,
}

impl ScriptedResolver {
    /// Replays `replies` in order, then answers `98` forever.
    pub fn new(replies: Vec<Result<StatusResult>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: ResponseCode::Processing,
            latency: Duration::ZERO,
            calls: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        }
    }

    /// Answers `98` on every query.
    pub fn always_processing() -> Self {
        Self::new(Vec::new())
    }

    /// Delay applied before every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries started.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries that ran to completion (not dropped mid-flight).
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusResolver for ScriptedResolver {
    async fn status(&self, _token: &AccessToken, _ticket: &Ticket) -> Result<StatusResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusResult::with_code(self.fallback.clone())));
        self.completed.fetch_add(1, Ordering::SeqCst);
        reply
    }
}

pub fn processing() -> Result<StatusResult> {
    Ok(StatusResult::with_code(ResponseCode::Processing))
}

pub fn success(cdr: &str) -> Result<StatusResult> {
    Ok(StatusResult {
        response_code: ResponseCode::Success,
        error: None,
        cdr: Some(cdr.to_string()),
        cdr_generated: Some("1".to_string()),
    })
}
