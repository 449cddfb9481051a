//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`
//! to expose the monitor's counters and gauges.
//!
//! # Usage
//!
//! ```ignore
//! let config = MetricsConfig::default();
//! install_metrics_recorder(&config)?;
//! // After this, all metrics::counter!() and metrics::gauge!() calls are recorded
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use logbell_core::config::MetricsConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the global metrics recorder and start the HTTP listener.
///
/// This function should be called once per process.
///
/// # Errors
///
/// - The endpoint is not `/metrics`
/// - `listen_addr:port` is not a valid socket address
/// - Socket binding fails or a global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is currently supported",
            config.endpoint
        ));
    }

    let addr = listen_socket_addr(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    logbell_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");

    Ok(())
}

fn listen_socket_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_custom_endpoint() {
        let config = MetricsConfig {
            endpoint: "/stats".to_owned(),
            ..Default::default()
        };
        let err = install_metrics_recorder(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported metrics endpoint"));
    }

    #[test]
    fn parses_listen_address() {
        let addr = listen_socket_addr(&MetricsConfig::default()).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9464");
    }

    #[test]
    fn rejects_invalid_listen_address() {
        let config = MetricsConfig {
            listen_addr: "not an address".to_owned(),
            ..Default::default()
        };
        assert!(listen_socket_addr(&config).is_err());
    }
}
