// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time health probes.
//!
//! A probe is a pure function of the check definition: no shared state,
//! safe to run concurrently for many workers, and never blocks the caller
//! past the given timeout. Ambiguous network failures map to `Unhealthy`
//! so callers can retry; `Error` is reserved for misconfiguration.

use muster_core::HealthCheck;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Result of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy { reason: String },
    /// Misconfigured check (e.g. malformed URL). Not retryable.
    Error { reason: String },
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }
}

/// Stateless health-probe runner. `Clone` shares the underlying HTTP client.
#[derive(Clone)]
pub struct Probe {
    http: reqwest::Client,
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe {
    pub fn new() -> Self {
        // Per-request timeouts are applied at call sites; the client-level
        // timeout is a backstop only.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Run one health check attempt, bounded by `timeout`.
    ///
    /// `HealthCheck::None` reports Healthy: process existence is the whole
    /// contract for such workers.
    pub async fn check(&self, check: &HealthCheck, timeout: Duration) -> ProbeOutcome {
        match check {
            HealthCheck::None => ProbeOutcome::Healthy,
            HealthCheck::TcpPort { port } => self.check_tcp(*port, timeout).await,
            HealthCheck::HttpGet { url, expect_status } => {
                self.check_http(url, *expect_status, timeout).await
            }
        }
    }

    async fn check_tcp(&self, port: u16, timeout: Duration) -> ProbeOutcome {
        let addr = ("127.0.0.1", port);
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => ProbeOutcome::Healthy,
            Ok(Err(e)) => {
                debug!(port, error = %e, "tcp probe refused");
                ProbeOutcome::Unhealthy { reason: format!("connect to port {}: {}", port, e) }
            }
            Err(_) => {
                ProbeOutcome::Unhealthy { reason: format!("connect to port {} timed out", port) }
            }
        }
    }

    async fn check_http(
        &self,
        url: &str,
        expect_status: Option<u16>,
        timeout: Duration,
    ) -> ProbeOutcome {
        let request = match self.http.get(url).timeout(timeout).build() {
            Ok(req) => req,
            // A URL the client cannot even build is configuration, not a
            // transient network condition.
            Err(e) => return ProbeOutcome::Error { reason: format!("bad probe url {}: {}", url, e) },
        };

        match self.http.execute(request).await {
            Ok(response) => {
                let status = response.status();
                let healthy = match expect_status {
                    Some(want) => status.as_u16() == want,
                    None => status.is_success(),
                };
                if healthy {
                    ProbeOutcome::Healthy
                } else {
                    debug!(url, status = status.as_u16(), "http probe bad status");
                    ProbeOutcome::Unhealthy {
                        reason: format!("GET {} returned {}", url, status.as_u16()),
                    }
                }
            }
            Err(e) if e.is_builder() => {
                ProbeOutcome::Error { reason: format!("bad probe url {}: {}", url, e) }
            }
            Err(e) => {
                debug!(url, error = %e, "http probe failed");
                ProbeOutcome::Unhealthy { reason: format!("GET {}: {}", url, e) }
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
