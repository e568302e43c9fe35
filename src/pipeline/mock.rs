use crate::error::{CompletionError, SearchError};
use crate::pipeline::traits::{
    CompletionRequest, CompletionService, SearchHit, SearchProvider, SearchQuery,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Handler =
    Box<dyn Fn(&CompletionRequest) -> Result<serde_json::Value, CompletionError> + Send + Sync>;

/// Completion service driven by per-schema closures. Unscripted schemas fail
/// with [`CompletionError::Service`].
#[derive(Default)]
pub struct ScriptedCompletion {
    handlers: HashMap<String, Handler>,
    stalled: HashSet<String>,
    latency_yields: usize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<T, F>(mut self, handler: F) -> Self
    where
        T: JsonSchema,
        F: Fn(&CompletionRequest) -> Result<serde_json::Value, CompletionError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(T::schema_name(), Box::new(handler));
        self
    }

    /// Requests for `T` never complete.
    pub fn stall<T: JsonSchema>(mut self) -> Self {
        self.stalled.insert(T::schema_name());
        self
    }

    /// Yields to the scheduler this many times per call, so concurrent calls
    /// overlap.
    pub fn with_latency(mut self, yields: usize) -> Self {
        self.latency_yields = yields;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<serde_json::Value, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        for _ in 0..self.latency_yields {
            tokio::task::yield_now().await;
        }
        if self.stalled.contains(&request.schema_name) {
            std::future::pending::<()>().await;
        }

        match self.handlers.get(&request.schema_name) {
            Some(handler) => handler(&request),
            None => Err(CompletionError::Service(format!(
                "no script for {}",
                request.schema_name
            ))),
        }
    }
}

/// Search provider returning a fixed hit list, or a fixed failure.
pub struct StaticSearch {
    outcome: Result<Vec<SearchHit>, String>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            outcome: Ok(hits),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.text.clone());
        }
        match &self.outcome {
            Ok(hits) => Ok(hits.clone()),
            Err(message) => Err(SearchError::Provider(message.clone())),
        }
    }
}

/// Convenience constructor for a well-formed hit.
pub fn hit(url: &str, title: &str, content: &str, score: f32) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: Some(title.to_string()),
        content: Some(content.to_string()),
        raw_content: None,
        score: Some(score),
        published_date: None,
    }
}
