use std::sync::Once;
use tis_common::config::ResolvedConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer().with_target(true).with_line_number(true))
            .with(filter)
            .init();
    });
}

/// A [`ResolvedConfig`] pointed at a mock server, with fast-fail timeouts so
/// tests exercising retries or depth narrowing don't actually wait seconds.
pub fn config_for(base_url: &str) -> ResolvedConfig {
    let mut config = ResolvedConfig::default();
    config.api.base_url = format!("{base_url}/");
    config.api.root_node_id = "1".to_string();
    config.api.connect_timeout = 1.0;
    config.api.read_timeout = 2.0;
    config.api.max_retries = 1;
    config.api.backoff_factor = 0.001;
    config.optimization.concurrent_requests = 4;
    config.optimization.cache_max_size = 64;
    config.optimization.children_level = 3;
    config.optimization.min_children_level = 1;
    config.optimization.depth_reduction_step = 1;
    config.optimization.adaptive_timeout_threshold = 0.2;
    config.optimization.retry_backoff_seconds = vec![0.001, 0.001];
    config.optimization.final_timeout_seconds = 0.2;
    config.optimization.rate_limit_delay = 0.0;
    config
}
