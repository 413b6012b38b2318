//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_fund_total` - Total number of committed fund calls
//! - `ledger_transfers_total` - Total number of committed transfers
//! - `ledger_rejections_total{kind}` - Rejected invocations by error kind
//! - `ledger_acknowledgments_total{outcome}` - Receiver hook outcomes
//! - `ledger_total_supply` - Current total supply (saturates at `i64::MAX`)

use crate::types::Amount;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Committed fund calls
    pub fund_total: IntCounter,

    /// Committed transfers
    pub transfers_total: IntCounter,

    /// Rejections by kind
    pub rejections_total: IntCounterVec,

    /// Receiver hook outcomes
    pub acknowledgments_total: IntCounterVec,

    /// Total supply gauge
    pub total_supply: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let fund_total = IntCounter::new("ledger_fund_total", "Total number of committed fund calls")?;
        registry.register(Box::new(fund_total.clone()))?;

        let transfers_total =
            IntCounter::new("ledger_transfers_total", "Total number of committed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("ledger_rejections_total", "Rejected invocations by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let acknowledgments_total = IntCounterVec::new(
            Opts::new("ledger_acknowledgments_total", "Receiver hook outcomes"),
            &["outcome"],
        )?;
        registry.register(Box::new(acknowledgments_total.clone()))?;

        let total_supply = IntGauge::new("ledger_total_supply", "Current total supply")?;
        registry.register(Box::new(total_supply.clone()))?;

        Ok(Self {
            fund_total,
            transfers_total,
            rejections_total,
            acknowledgments_total,
            total_supply,
            registry,
        })
    }

    /// Record a committed fund call
    pub fn record_fund(&self, total_supply: Amount) {
        self.fund_total.inc();
        self.update_total_supply(total_supply);
    }

    /// Record a committed transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record a rejected invocation
    pub fn record_rejection(&self, kind: &str) {
        self.rejections_total.with_label_values(&[kind]).inc();
    }

    /// Record a receiver hook outcome (`accepted` or `failed`)
    pub fn record_acknowledgment(&self, outcome: &str) {
        self.acknowledgments_total.with_label_values(&[outcome]).inc();
    }

    /// Update total supply gauge
    pub fn update_total_supply(&self, total_supply: Amount) {
        self.total_supply
            .set(i64::try_from(total_supply).unwrap_or(i64::MAX));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::Error::Config(format!("Metrics output is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.fund_total.get(), 0);
        assert_eq!(metrics.transfers_total.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        // Private registries never collide on metric names
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_transfer();
        assert_eq!(first.transfers_total.get(), 1);
        assert_eq!(second.transfers_total.get(), 0);
    }

    #[test]
    fn test_record_rejection_by_kind() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection("insufficient_balance");
        metrics.record_rejection("insufficient_balance");
        metrics.record_rejection("unauthorized");

        assert_eq!(
            metrics
                .rejections_total
                .with_label_values(&["insufficient_balance"])
                .get(),
            2
        );
        assert_eq!(
            metrics.rejections_total.with_label_values(&["unauthorized"]).get(),
            1
        );
    }

    #[test]
    fn test_total_supply_saturates() {
        let metrics = Metrics::new().unwrap();
        metrics.record_fund(100);
        assert_eq!(metrics.total_supply.get(), 100);

        metrics.update_total_supply(u128::MAX);
        assert_eq!(metrics.total_supply.get(), i64::MAX);
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_fund(42);
        let text = metrics.encode().unwrap();
        assert!(text.contains("ledger_fund_total 1"));
        assert!(text.contains("ledger_total_supply 42"));
    }
}
