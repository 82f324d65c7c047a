//! Everything needed to talk to an alamos fe2 server: the message format of
//! its external http interface (v2) and the [AlarmSender] seam used by the
//! [webhook receiver][crate::alertmanager_webhook_receiver].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::alert::Alert;

pub mod client;
pub mod dumping;
pub mod settings;

pub use client::AlarmClient;
pub use dumping::DumpingSender;
pub use settings::AlarmSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
/// kind of alarm, fe2 doesn't page anyone for [MessageType::Test]
pub enum MessageType {
	Alarm,
	Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// destination of an alarm
pub struct Unit {
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// per alert part of an alarm
pub struct AlarmData {
	pub message: Vec<String>,
	pub keyword: String,
	pub external_id: String,
	pub units: Vec<Unit>,
}

impl AlarmData {
	/// Builds the alarm for an alert that passed [Alert::qualify]
	///
	/// # Arguments
	///
	/// * `alert` - the alert to forward
	///
	/// * `address` - address of the unit that gets alarmed
	pub fn from_alert(alert: &Alert, address: &str) -> Self {
		Self {
			message: alert.message(),
			keyword: alert.keyword(),
			external_id: alert.external_id(),
			units: vec![Unit { address: address.to_owned() }],
		}
	}
}

#[derive(Debug, Clone, Serialize)]
/// the complete request body sent to fe2
pub struct AlarmMessage<'a> {
	#[serde(rename = "type")]
	pub kind: MessageType,
	pub timestamp: String,
	pub sender: &'a str,
	pub authorization: &'a str,
	pub data: &'a AlarmData,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// answer of fe2, e.g. `{"Status": "OK"}` or `{"Status": "ERROR", "Error": "..."}`
pub struct AlarmResponse {
	#[serde(rename = "Status", alias = "status")]
	pub status: String,
	#[serde(rename = "Error", alias = "error", default)]
	pub error: Option<String>,
}

impl AlarmResponse {
	pub fn is_ok(&self) -> bool {
		self.status == "OK"
	}
}

/// Reasons an alarm couldn't be delivered. Callers only care that it failed,
/// the variants exist for logging.
#[derive(Debug, Error)]
pub enum SendError {
	#[error("failed to serialize alarm message")]
	Serialize(#[source] serde_json::Error),
	#[error("request to alarm server failed")]
	Transport(#[source] reqwest::Error),
	#[error("alarm server sent an unparsable response (http status {status})")]
	InvalidResponse {
		status: u16,
		body: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("alarm server rejected alarm (http status {status}, status {response_status:?}, error {error:?})")]
	Rejected { status: u16, response_status: String, error: Option<String> },
}

/// Delivers alarms. Implemented by [AlarmClient] and [DumpingSender]; the
/// webhook receiver only depends on this trait.
#[async_trait]
pub trait AlarmSender: Send + Sync + 'static {
	/// Sends a single alarm.
	///
	/// # Arguments
	///
	/// * `data` - the alarm to send
	///
	/// * `request_id` - id of the webhook request the alarm originates from
	async fn send_alert(&self, data: &AlarmData, request_id: Uuid) -> Result<(), SendError>;
}

#[async_trait]
impl AlarmSender for Box<dyn AlarmSender> {
	async fn send_alert(&self, data: &AlarmData, request_id: Uuid) -> Result<(), SendError> {
		(**self).send_alert(data, request_id).await
	}
}

/// The two halves of sending an alarm, split so [DumpingSender] can look at
/// the request body in between.
#[async_trait]
pub trait AlarmTransport: Send + Sync + 'static {
	/// builds the request body for `data`
	fn encode(&self, data: &AlarmData) -> Result<Vec<u8>, SendError>;

	/// posts an encoded body and checks the answer
	async fn deliver(&self, body: Vec<u8>) -> Result<(), SendError>;
}
