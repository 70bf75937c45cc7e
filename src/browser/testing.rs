//! Scripted in-memory browser for tests
//!
//! Pages are served by a closure from `(url, attempt)` to either a document or
//! an error, where `attempt` counts earlier navigations to the same URL.
//! The mock tracks open contexts, the peak number open at once, and every
//! close, so tests can assert on resource handling. A "wave" is a run of
//! context openings between two moments when no context was open.

use super::{with_suffix, Browser, BrowserError, BrowsingContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&str, usize) -> Result<String, BrowserError> + Send + Sync;

#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    peak: AtomicUsize,
    waves: Mutex<Vec<usize>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    snapshots: Mutex<Vec<PathBuf>>,
    navigations: Mutex<HashMap<String, usize>>,
    order: Mutex<Vec<String>>,
}

pub(crate) struct MockBrowser {
    responder: Option<Arc<Responder>>,
    latency: Duration,
    counters: Arc<Counters>,
}

impl MockBrowser {
    /// Serves every navigation through `respond`, ignoring the attempt number
    pub(crate) fn serving<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<String, BrowserError> + Send + Sync + 'static,
    {
        Self::scripted(move |url, _| respond(url))
    }

    /// Serves navigations through `respond(url, attempt)`
    pub(crate) fn scripted<F>(respond: F) -> Self
    where
        F: Fn(&str, usize) -> Result<String, BrowserError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(respond)),
            latency: Duration::from_millis(5),
            counters: Arc::new(Counters::default()),
        }
    }

    /// A browser that cannot open any context
    pub(crate) fn unavailable() -> Self {
        Self {
            responder: None,
            latency: Duration::ZERO,
            counters: Arc::new(Counters::default()),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Contexts opened and not yet closed
    pub(crate) fn active_contexts(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Contexts opened per wave, in order
    pub(crate) fn waves(&self) -> Vec<usize> {
        self.counters.waves.lock().unwrap().clone()
    }

    /// Navigations made to `url` so far
    pub(crate) fn navigations_to(&self, url: &str) -> usize {
        let navigations = self.counters.navigations.lock().unwrap();
        navigations.get(url).copied().unwrap_or(0)
    }

    /// Every navigated URL in the order navigation started
    pub(crate) fn navigation_order(&self) -> Vec<String> {
        self.counters.order.lock().unwrap().clone()
    }

    pub(crate) fn snapshots(&self) -> Vec<PathBuf> {
        self.counters.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        let Some(responder) = &self.responder else {
            return Err(BrowserError::Unavailable("mock browser is down".to_string()));
        };

        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(active, Ordering::SeqCst);
        {
            let mut waves = self.counters.waves.lock().unwrap();
            match waves.last_mut() {
                Some(opened) if active > 1 => *opened += 1,
                _ => waves.push(1),
            }
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockContext {
            responder: Arc::clone(responder),
            latency: self.latency,
            counters: Arc::clone(&self.counters),
            body: None,
        }))
    }
}

struct MockContext {
    responder: Arc<Responder>,
    latency: Duration,
    counters: Arc<Counters>,
    body: Option<String>,
}

#[async_trait]
impl BrowsingContext for MockContext {
    async fn navigate(&mut self, url: &str, _timeout: Option<Duration>) -> Result<(), BrowserError> {
        let attempt = {
            let mut navigations = self.counters.navigations.lock().unwrap();
            let count = navigations.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };
        self.counters.order.lock().unwrap().push(url.to_string());

        tokio::time::sleep(self.latency).await;

        self.body = Some((self.responder)(url, attempt)?);
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.body.clone().ok_or(BrowserError::NotNavigated)
    }

    async fn snapshot(&self, stem: &Path) -> Result<PathBuf, BrowserError> {
        let path = with_suffix(stem, "html");
        self.counters.snapshots.lock().unwrap().push(path.clone());
        Ok(path)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
