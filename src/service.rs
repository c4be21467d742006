//! Graph service: the single owner of query, cache and aggregation state.
//!
//! One `GraphService` is built at startup and shared through `AppState`.
//! It holds the graph store handle, a TTL response cache keyed by
//! `(mode, top_n)`, hit/miss counters and the request id sequence.
//!
//! Concurrent misses on the same key are collapsed into one query by the
//! cache's `try_get_with`; only the request that runs the query counts as a
//! miss, the ones waiting on it count as deduped. Failed queries are never
//! cached.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde::Serialize;
use thiserror::Error;

use crate::graph::filter::{self, FilterState, FilteredGraph};
use crate::graph::{AggregateOptions, GraphAggregator, GraphData, GraphMode, Sizing};
use crate::neo4j::GraphStore;

/// Runtime settings of the graph service.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphServiceConfig {
    /// Mode used when a request does not name one
    pub default_mode: GraphMode,
    /// Topic limit used by the ranked mode when a request does not set one
    pub default_top_n: usize,
    pub sizing: Sizing,
    pub query_timeout: Duration,
    /// Zero disables caching
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
}

impl Default for GraphServiceConfig {
    fn default() -> Self {
        Self {
            default_mode: GraphMode::Enriched,
            default_top_n: AggregateOptions::DEFAULT_TOP_N,
            sizing: Sizing::default(),
            query_timeout: Duration::from_millis(10_000),
            cache_ttl: Duration::from_secs(60),
            cache_max_entries: 100,
        }
    }
}

/// Errors surfaced to API callers. Aggregation itself never fails.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("[{request_id}] graph query timed out after {millis}ms")]
    Timeout { request_id: String, millis: u64 },
    #[error("[{request_id}] graph query failed: {message}")]
    Query { request_id: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GraphCacheKey {
    mode: GraphMode,
    top_n: usize,
}

/// Cache counters reported by `GET /api/cache/stats`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub enabled: bool,
    pub hits: u64,
    /// Requests that ran a query
    pub misses: u64,
    /// Requests served by a query another request had already started
    pub deduped: u64,
    /// Queries that failed or timed out
    pub errors: u64,
    /// `hits / (hits + misses)`
    pub hit_rate: f64,
    pub entries: u64,
    /// Queries currently running
    pub inflight: u64,
    pub requests: u64,
}

pub struct GraphService {
    store: Arc<dyn GraphStore>,
    config: GraphServiceConfig,
    cache: Option<Cache<GraphCacheKey, Arc<GraphData>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    deduped: AtomicU64,
    errors: AtomicU64,
    inflight: AtomicU64,
    request_counter: AtomicU64,
}

/// Keeps the in-flight gauge right even when a load is cancelled.
struct InflightGuard<'a>(&'a AtomicU64);

impl<'a> InflightGuard<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl GraphService {
    pub fn new(store: Arc<dyn GraphStore>, config: GraphServiceConfig) -> Self {
        let cache = if config.cache_ttl.is_zero() {
            tracing::info!("Graph response cache disabled");
            None
        } else {
            Some(
                Cache::builder()
                    .max_capacity(config.cache_max_entries)
                    .time_to_live(config.cache_ttl)
                    .build(),
            )
        };

        Self {
            store,
            config,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            deduped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            inflight: AtomicU64::new(0),
            request_counter: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn config(&self) -> &GraphServiceConfig {
        &self.config
    }

    fn next_request_id(&self) -> String {
        let n = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("req_{}", n)
    }

    fn cache_key(&self, mode: Option<GraphMode>, top_n: Option<usize>) -> GraphCacheKey {
        let mode = mode.unwrap_or(self.config.default_mode);
        // Only the ranked query depends on top_n; normalizing keeps one
        // cache entry per mode for the others.
        let top_n = match mode {
            GraphMode::Ranked => top_n.unwrap_or(self.config.default_top_n),
            _ => 0,
        };
        GraphCacheKey { mode, top_n }
    }

    /// Aggregated graph for a mode, served from cache when fresh.
    pub async fn graph(
        &self,
        mode: Option<GraphMode>,
        top_n: Option<usize>,
    ) -> Result<Arc<GraphData>, ServiceError> {
        let key = self.cache_key(mode, top_n);

        let Some(cache) = &self.cache else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return self.load(key).await.map(Arc::new);
        };

        if let Some(graph) = cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit: {}:{}", key.mode, key.top_n);
            return Ok(graph);
        }

        let ran_query = AtomicBool::new(false);
        let result = cache
            .try_get_with(key, async {
                ran_query.store(true, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.load(key).await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone());

        if !ran_query.load(Ordering::Relaxed) {
            self.deduped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Request deduped: {}:{}", key.mode, key.top_n);
        }
        result
    }

    /// Graph for a mode with `state` applied.
    pub async fn filtered(
        &self,
        mode: Option<GraphMode>,
        top_n: Option<usize>,
        state: &FilterState,
    ) -> Result<FilteredGraph, ServiceError> {
        let graph = self.graph(mode, top_n).await?;
        Ok(filter::apply(&graph, state))
    }

    /// Query and aggregate, bypassing the cache.
    async fn load(&self, key: GraphCacheKey) -> Result<GraphData, ServiceError> {
        let request_id = self.next_request_id();
        let _inflight = InflightGuard::enter(&self.inflight);
        let started = Instant::now();
        tracing::info!(
            "[{}] Fetching graph (mode: {}, top_n: {})",
            request_id,
            key.mode,
            key.top_n
        );

        let top_n = if key.mode == GraphMode::Ranked {
            key.top_n
        } else {
            self.config.default_top_n
        };
        let fetch = self.store.fetch_edge_rows(key.mode, top_n);
        let rows = match tokio::time::timeout(self.config.query_timeout, fetch).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!("[{}] Graph query failed: {:#}", request_id, e);
                return Err(ServiceError::Query {
                    request_id,
                    message: format!("{:#}", e),
                });
            }
            Err(_) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                let millis = self.config.query_timeout.as_millis() as u64;
                tracing::error!("[{}] Graph query timed out after {}ms", request_id, millis);
                return Err(ServiceError::Timeout { request_id, millis });
            }
        };

        let options = AggregateOptions::for_mode(key.mode, Some(top_n), self.config.sizing);
        let graph = GraphAggregator::new(options).aggregate(&rows);

        tracing::info!(
            "[{}] Graph ready: {} rows → {} nodes, {} links in {:?}",
            request_id,
            rows.len(),
            graph.nodes.len(),
            graph.links.len(),
            started.elapsed()
        );
        Ok(graph)
    }

    /// Drop every cached graph.
    pub async fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
            tracing::info!("Graph cache cleared");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = match &self.cache {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        };
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            enabled: self.cache.is_some(),
            hits,
            misses,
            deduped: self.deduped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
            entries,
            inflight: self.inflight.load(Ordering::Relaxed),
            requests: self.request_counter.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::mock::MockGraphStore;
    use crate::test_helpers::{edge_row, service_with};

    fn seeded_store() -> Arc<MockGraphStore> {
        Arc::new(MockGraphStore::with_rows(vec![
            edge_row("B1", "T1", Some("A1"), Some("x")),
            edge_row("B1", "T1", Some("A2"), Some("y")),
            edge_row("B2", "T2", Some("A3"), Some("z")),
        ]))
    }

    #[tokio::test]
    async fn test_graph_is_aggregated_and_cached() {
        let store = seeded_store();
        let service = service_with(store.clone(), GraphServiceConfig::default());

        let first = service.graph(None, None).await.unwrap();
        assert_eq!(first.nodes.len(), 4);
        assert_eq!(first.links.len(), 2);

        let second = service.graph(Some(GraphMode::Enriched), None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.fetch_count(), 1);

        let stats = service.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deduped, 0);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.inflight, 0);
        assert_eq!(stats.requests, 1);
    }

    #[tokio::test]
    async fn test_modes_are_cached_separately() {
        let store = seeded_store();
        let service = service_with(store.clone(), GraphServiceConfig::default());

        service.graph(Some(GraphMode::Enriched), None).await.unwrap();
        let ranked = service.graph(Some(GraphMode::Ranked), Some(1)).await.unwrap();
        service.graph(Some(GraphMode::Ranked), Some(5)).await.unwrap();
        // top_n does not split non-ranked modes
        service.graph(Some(GraphMode::Generic), Some(1)).await.unwrap();
        service.graph(Some(GraphMode::Generic), Some(7)).await.unwrap();

        assert_eq!(store.fetch_count(), 4);
        assert_eq!(ranked.nodes.iter().filter(|n| n.radius.is_some()).count(), 2);
        assert_eq!(
            *store.last_request.read().await,
            Some((GraphMode::Generic, AggregateOptions::DEFAULT_TOP_N))
        );
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let store = seeded_store();
        store.set_failing(true);
        let service = service_with(store.clone(), GraphServiceConfig::default());

        let err = service.graph(None, None).await.unwrap_err();
        match err {
            ServiceError::Query {
                request_id,
                message,
            } => {
                assert_eq!(request_id, "req_1");
                assert!(message.contains("unavailable"));
            }
            other => panic!("Expected Query error, got {:?}", other),
        }

        store.set_failing(false);
        assert!(service.graph(None, None).await.is_ok());
        assert_eq!(store.fetch_count(), 2);

        let stats = service.stats().await;
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let store = seeded_store();
        store.set_delay(Duration::from_millis(200)).await;
        let config = GraphServiceConfig {
            query_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let service = service_with(store, config);

        let err = service.graph(None, None).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Timeout {
                request_id: "req_1".into(),
                millis: 20
            }
        );

        let stats = service.stats().await;
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.inflight, 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_query() {
        let store = seeded_store();
        store.set_delay(Duration::from_millis(50)).await;
        let service = Arc::new(service_with(store.clone(), GraphServiceConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.graph(None, None).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(store.fetch_count(), 1);

        let stats = service.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deduped, 7);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.inflight, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_queries() {
        let store = seeded_store();
        let config = GraphServiceConfig {
            cache_ttl: Duration::ZERO,
            ..Default::default()
        };
        let service = service_with(store.clone(), config);

        service.graph(None, None).await.unwrap();
        service.graph(None, None).await.unwrap();
        assert_eq!(store.fetch_count(), 2);

        let stats = service.stats().await;
        assert!(!stats.enabled);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_refetch() {
        let store = seeded_store();
        let service = service_with(store.clone(), GraphServiceConfig::default());

        service.graph(None, None).await.unwrap();
        service.invalidate_all().await;
        service.graph(None, None).await.unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_filtered_applies_state() {
        let service = service_with(seeded_store(), GraphServiceConfig::default());
        let state = FilterState {
            brands: vec!["B2".into()],
            ..Default::default()
        };
        let filtered = service.filtered(None, None, &state).await.unwrap();
        let ids: Vec<&str> = filtered.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "T2"]);
    }
}
