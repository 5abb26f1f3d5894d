//! Thin HTTP client over `reqwest` for the remote catalog's GET contract.
//!
//! One [`CatalogClient`] is built per run and shared (cheaply cloned, the
//! inner `reqwest::Client` is itself an `Arc`) across every worker task —
//! connection pooling and the response cache are both keyed off that single
//! instance.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tis_common::config::ResolvedConfig;
use tracing::{debug, warn};

/// Outcome of a single catalog GET: the parsed body (if any) and whether
/// the failure, if there was one, was specifically a read timeout — the
/// adaptive fetcher treats that case differently from a connect failure or
/// a retryable status code.
pub struct FetchOutcome {
    pub body: Option<Value>,
    pub timed_out: bool,
}

/// Race-free counters surfaced for diagnostics/logging at the end of a run.
#[derive(Debug, Default)]
pub struct ClientStats {
    pub api_calls: AtomicU64,
    pub cache_hits: AtomicU64,
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_retries: u32,
    backoff_factor: f64,
    retry_status_codes: Vec<u16>,
    cache_max_size: usize,
    cache: Mutex<HashMap<String, Value>>,
    stats: ClientStats,
}

impl CatalogClient {
    pub fn new(config: &ResolvedConfig) -> reqwest::Result<Self> {
        let pool_size = (config.optimization.concurrent_requests * 2).max(1);
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(pool_size)
            .connect_timeout(Duration::from_secs_f64(config.api.connect_timeout))
            .gzip(true)
            .deflate(true)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.clone(),
            connect_timeout: Duration::from_secs_f64(config.api.connect_timeout),
            read_timeout: Duration::from_secs_f64(config.api.read_timeout),
            max_retries: config.api.max_retries,
            backoff_factor: config.api.backoff_factor,
            retry_status_codes: config.api.retry_status_codes.clone(),
            cache_max_size: config.optimization.cache_max_size,
            cache: Mutex::new(HashMap::new()),
            stats: ClientStats::default(),
        })
    }

    pub fn stats(&self) -> (u64, u64) {
        (
            self.stats.api_calls.load(Ordering::Relaxed),
            self.stats.cache_hits.load(Ordering::Relaxed),
        )
    }

    fn node_url(&self, node_id: &str, children_level: i64) -> String {
        format!(
            "{}{}?mappingType=TCI&childrenlevel={}&attributes=true",
            self.base_url, node_id, children_level
        )
    }

    /// Fetch one node's subtree at a given depth, using and populating the
    /// response cache. Read timeouts are surfaced (not retried here) so
    /// the adaptive fetcher can decide whether a depth reduction or a final
    /// long-timeout attempt is the right next move.
    pub async fn get_node(
        &self,
        node_id: &str,
        children_level: i64,
        timeout_override: Option<Duration>,
        bypass_cache: bool,
    ) -> FetchOutcome {
        let url = self.node_url(node_id, children_level);

        if !bypass_cache {
            if let Some(hit) = self.cache_lookup(&url) {
                return FetchOutcome {
                    body: Some(hit),
                    timed_out: false,
                };
            }
        }

        let read_timeout = timeout_override.unwrap_or(self.read_timeout);
        let mut attempt = 0;

        loop {
            self.stats.api_calls.fetch_add(1, Ordering::Relaxed);
            let request = self
                .http
                .get(&url)
                .timeout(self.connect_timeout + read_timeout);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<Value>().await {
                            Ok(body) => {
                                if !bypass_cache {
                                    self.cache_insert(url, body.clone());
                                }
                                return FetchOutcome {
                                    body: Some(body),
                                    timed_out: false,
                                };
                            }
                            Err(e) => {
                                warn!(node_id, error = %e, "catalog response body was not valid JSON");
                                return FetchOutcome {
                                    body: None,
                                    timed_out: false,
                                };
                            }
                        }
                    }

                    let code = status.as_u16();
                    if self.retry_status_codes.contains(&code) && attempt < self.max_retries {
                        let delay = self.backoff_delay(attempt);
                        debug!(node_id, status = code, attempt, ?delay, "retrying catalog fetch");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    warn!(node_id, status = code, "catalog fetch failed with non-retryable status");
                    return FetchOutcome {
                        body: None,
                        timed_out: false,
                    };
                }
                Err(e) if e.is_timeout() => {
                    debug!(node_id, "catalog fetch timed out");
                    return FetchOutcome {
                        body: None,
                        timed_out: true,
                    };
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = self.backoff_delay(attempt);
                        warn!(node_id, error = %e, attempt, ?delay, "transport error, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    warn!(node_id, error = %e, "catalog fetch failed after exhausting retries");
                    return FetchOutcome {
                        body: None,
                        timed_out: false,
                    };
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn cache_lookup(&self, url: &str) -> Option<Value> {
        let cache = self.cache.lock().unwrap();
        let hit = cache.get(url).cloned();
        if hit.is_some() {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn cache_insert(&self, url: String, body: Value) {
        let mut cache = self.cache.lock().unwrap();
        if cache.len() < self.cache_max_size {
            cache.entry(url).or_insert(body);
        }
    }
}
