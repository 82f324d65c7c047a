//! data structures for deserializing incoming alerts and the rules for turning
//! them into alarms
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// prefix of the keyword of alarms for resolved alerts
pub const RESOLVED_PREFIX: &str = "Resolved: ";

/// keyword used if an alert has neither a summary nor an alertname
const FALLBACK_KEYWORD: &str = "Alert";

/// start time used for hashing if an alert carries none
const ZERO_START_TIME: &str = "00010101000000";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// data from prometheus received by the alertmanager webhook receiver
#[allow(clippy::missing_docs_in_private_items)]
pub struct Data {
	#[serde(default)]
	pub version: String,
	#[serde(default)]
	pub group_key: String,
	#[serde(default)]
	pub receiver: String,
	#[serde(default)]
	pub status: String,
	pub alerts: Vec<Alert>,
	#[serde(default)]
	pub group_labels: HashMap<String, String>,
	#[serde(default)]
	pub common_labels: HashMap<String, String>,
	#[serde(default)]
	pub common_annotations: HashMap<String, String>,
	#[serde(rename = "externalURL", default)]
	pub external_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// state of a single alert. Anything alertmanager might add in the future ends
/// up in [AlertStatus::Unknown]
pub enum AlertStatus {
	Firing,
	Resolved,
	#[serde(other)]
	Unknown,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// alert labels. `severity` decides whether an alert gets forwarded,
/// `alertname` and `instance` are used for keyword, message and external id
pub struct Labels {
	pub severity: Option<String>,
	pub alertname: Option<String>,
	pub instance: Option<String>,
	#[serde(flatten)]
	pub other: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// alert annotations
pub struct Annotations {
	pub summary: Option<String>,
	pub description: Option<String>,
	#[serde(flatten)]
	pub other: HashMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Alert {
	pub status: AlertStatus,
	#[serde(default)]
	pub labels: Labels,
	#[serde(default)]
	pub annotations: Annotations,
	#[serde(default)]
	pub fingerprint: String,
	pub starts_at: Option<DateTime<FixedOffset>>,
	pub ends_at: Option<DateTime<FixedOffset>>,
	#[serde(rename = "generatorURL", default)]
	pub generator_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// outcome of checking an alert against the forwarding rules
pub enum Qualification {
	/// the alert pages and has to be forwarded
	Forward,
	/// status is neither firing nor resolved
	IgnoredStatus,
	/// the alert has no severity label
	MissingSeverity,
	/// the severity doesn't page
	IgnoredSeverity(String),
}

/// returns the value if it contains anything but whitespace
fn non_blank(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|value| !value.trim().is_empty())
}

impl Alert {
	/// decide whether this alert gets forwarded
	///
	/// * `page_severity` - the severity (compared case insensitive) that triggers an alarm
	pub fn qualify(&self, page_severity: &str) -> Qualification {
		if !matches!(self.status, AlertStatus::Firing | AlertStatus::Resolved) {
			return Qualification::IgnoredStatus;
		}

		match self.labels.severity.as_deref() {
			None => Qualification::MissingSeverity,
			Some(severity) if severity.to_lowercase() == page_severity.to_lowercase() => {
				Qualification::Forward
			}
			Some(severity) => Qualification::IgnoredSeverity(severity.to_owned()),
		}
	}

	/// alarm title: the summary annotation, falling back to the alertname.
	/// Resolved alerts get prefixed with [RESOLVED_PREFIX]
	pub fn keyword(&self) -> String {
		let title = non_blank(&self.annotations.summary)
			.or_else(|| non_blank(&self.labels.alertname))
			.unwrap_or(FALLBACK_KEYWORD);

		match self.status {
			AlertStatus::Resolved => format!("{RESOLVED_PREFIX}{title}"),
			_ => title.to_owned(),
		}
	}

	/// alarm text lines: the description annotation or the instance
	pub fn message(&self) -> Vec<String> {
		match non_blank(&self.annotations.description) {
			Some(description) => vec![description.to_owned()],
			None => vec![format!("Instance: {}", self.labels.instance.as_deref().unwrap_or_default())],
		}
	}

	/// id used by the alarm server to correlate firing and resolved
	/// notifications. This is the fingerprint if alertmanager sent one,
	/// otherwise a sha256 over start time, alertname and instance.
	pub fn external_id(&self) -> String {
		if !self.fingerprint.is_empty() {
			return self.fingerprint.clone();
		}

		let start = self
			.starts_at
			.map(|starts_at| starts_at.format("%Y%m%d%H%M%S").to_string())
			.unwrap_or_else(|| ZERO_START_TIME.to_owned());

		let mut hasher = Sha256::new();
		for part in [
			start.as_str(),
			self.labels.alertname.as_deref().unwrap_or_default(),
			self.labels.instance.as_deref().unwrap_or_default(),
		] {
			hasher.update(part.as_bytes());
			// separator so "ab" + "c" and "a" + "bc" don't collide
			hasher.update([0u8]);
		}

		hex::encode(hasher.finalize())
	}
}
