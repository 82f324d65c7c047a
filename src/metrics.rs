//! prometheus meters for the webhook receiver

use prometheus::{
	exponential_buckets, histogram_opts, opts, Histogram, HistogramTimer, IntCounterVec, Registry,
};

/// why an alert wasn't forwarded
#[derive(Debug, Clone, Copy)]
pub enum SkipReason {
	/// neither firing nor resolved
	Status,
	/// no severity label
	MissingSeverity,
	/// severity doesn't page
	Severity,
}

impl SkipReason {
	fn as_str(self) -> &'static str {
		match self {
			Self::Status => "status",
			Self::MissingSeverity => "missing_severity",
			Self::Severity => "severity",
		}
	}
}

#[derive(Debug, Clone)]
/// prometheus meters for forwarded alerts
pub struct BridgeMetrics {
	/// total number of deserialized alerts
	received: IntCounterVec,
	/// alerts that didn't qualify for forwarding
	skipped: IntCounterVec,
	/// forwarded alerts by outcome
	forwarded: IntCounterVec,
	/// time spent waiting on the alarm server
	forward_duration: Histogram,
}

impl BridgeMetrics {
	/// construct prometheus meters and register them in `registry`
	pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
		let received = IntCounterVec::new(
			opts!("received_alerts_total", "total number of deserialized alerts")
				.namespace("fe2_bridge")
				.subsystem("webhook"),
			&["status"],
		)?;

		let skipped = IntCounterVec::new(
			opts!("skipped_alerts_total", "alerts that were not forwarded to fe2")
				.namespace("fe2_bridge")
				.subsystem("webhook"),
			&["reason"],
		)?;

		let forwarded = IntCounterVec::new(
			opts!("forwarded_alerts_total", "alerts forwarded to fe2")
				.namespace("fe2_bridge")
				.subsystem("webhook"),
			&["outcome"],
		)?;

		let forward_duration = Histogram::with_opts(
			histogram_opts!(
				"forward_duration_seconds",
				"time of a request to fe2 in seconds",
				exponential_buckets(0.01, 2., 12)?
			)
			.namespace("fe2_bridge")
			.subsystem("webhook"),
		)?;

		registry.register(Box::new(received.clone()))?;
		registry.register(Box::new(skipped.clone()))?;
		registry.register(Box::new(forwarded.clone()))?;
		registry.register(Box::new(forward_duration.clone()))?;

		Ok(Self { received, skipped, forwarded, forward_duration })
	}

	pub fn record_received(&self, status: &str) {
		self.received.with_label_values(&[status]).inc();
	}

	pub fn record_skipped(&self, reason: SkipReason) {
		self.skipped.with_label_values(&[reason.as_str()]).inc();
	}

	pub fn record_forwarded(&self, success: bool) {
		let outcome = if success { "success" } else { "failure" };
		self.forwarded.with_label_values(&[outcome]).inc();
	}

	/// starts timing a request to fe2, observed on drop
	pub fn forward_timer(&self) -> HistogramTimer {
		self.forward_duration.start_timer()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registers_in_given_registry() {
		let registry = Registry::new();
		let metrics = BridgeMetrics::new(&registry).unwrap();

		metrics.record_received("firing");
		metrics.record_skipped(SkipReason::Severity);
		metrics.record_forwarded(true);
		drop(metrics.forward_timer());

		let names: Vec<_> = registry.gather().iter().map(|family| family.get_name().to_owned()).collect();
		assert!(names.contains(&"fe2_bridge_webhook_received_alerts_total".to_owned()));
		assert!(names.contains(&"fe2_bridge_webhook_skipped_alerts_total".to_owned()));
		assert!(names.contains(&"fe2_bridge_webhook_forwarded_alerts_total".to_owned()));
		assert!(names.contains(&"fe2_bridge_webhook_forward_duration_seconds".to_owned()));

		// registering twice in the same registry fails
		assert!(BridgeMetrics::new(&registry).is_err());
	}
}
