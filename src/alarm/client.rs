//! http client for the external http interface of fe2

use async_trait::async_trait;
use chrono::Local;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use uuid::Uuid;

use super::{
	AlarmData, AlarmMessage, AlarmResponse, AlarmSender, AlarmSettings, AlarmTransport, MessageType,
	SendError,
};

/// format of [AlarmMessage::timestamp], ISO 8601 with offset
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, Clone)]
/// Sends alarms to fe2. Only holds immutable configuration and a pooled
/// [reqwest::Client], share it via [Arc](std::sync::Arc).
pub struct AlarmClient {
	client: reqwest::Client,
	settings: AlarmSettings,
	kind: MessageType,
}

impl AlarmClient {
	/// Constructs the client.
	///
	/// # Arguments
	///
	/// * `settings` - endpoint and identity
	///
	/// * `test` - send [MessageType::Test] alarms instead of real ones
	pub fn new(settings: AlarmSettings, test: bool) -> Result<Self, reqwest::Error> {
		let client = reqwest::Client::builder().timeout(settings.request_timeout).build()?;
		let kind = if test { MessageType::Test } else { MessageType::Alarm };

		Ok(Self { client, settings, kind })
	}

	pub fn kind(&self) -> MessageType {
		self.kind
	}

	/// wraps `data` with our identity, a fresh timestamp and the message type
	pub fn message<'a>(&'a self, data: &'a AlarmData) -> AlarmMessage<'a> {
		AlarmMessage {
			kind: self.kind,
			timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
			sender: &self.settings.sender,
			authorization: &self.settings.authorization,
			data,
		}
	}

	/// checks a fe2 answer: it has to be http 200 with status `OK`
	fn validate(status: StatusCode, body: &[u8]) -> Result<(), SendError> {
		let response: AlarmResponse = serde_json::from_slice(body).map_err(|source| {
			tracing::error!(
				http_status = status.as_u16(),
				body = %String::from_utf8_lossy(body),
				"couldn't parse response from alarm server"
			);
			SendError::InvalidResponse {
				status: status.as_u16(),
				body: String::from_utf8_lossy(body).into_owned(),
				source,
			}
		})?;

		if status != StatusCode::OK || !response.is_ok() {
			if status == StatusCode::BAD_REQUEST {
				tracing::error!(
					http_status = status.as_u16(),
					"alarm server rejected alarm: {}",
					response.error.as_deref().unwrap_or_default()
				);
			} else {
				tracing::error!(
					http_status = status.as_u16(),
					status = %response.status,
					"bad response from alarm server"
				);
			}

			return Err(SendError::Rejected {
				status: status.as_u16(),
				response_status: response.status,
				error: response.error,
			});
		}

		Ok(())
	}
}

#[async_trait]
impl AlarmTransport for AlarmClient {
	fn encode(&self, data: &AlarmData) -> Result<Vec<u8>, SendError> {
		serde_json::to_vec(&self.message(data)).map_err(|err| {
			tracing::error!("couldn't turn alarm into json: {err}");
			SendError::Serialize(err)
		})
	}

	async fn deliver(&self, body: Vec<u8>) -> Result<(), SendError> {
		let response = self
			.client
			.post(self.settings.endpoint.clone())
			.header(CONTENT_TYPE, "application/json")
			.body(body)
			.send()
			.await
			.map_err(|err| {
				tracing::error!(timeout = err.is_timeout(), "request to alarm server failed: {err}");
				SendError::Transport(err)
			})?;

		let status = response.status();
		let body = response.bytes().await.map_err(|err| {
			tracing::error!(http_status = status.as_u16(), "failed to read alarm server response: {err}");
			SendError::Transport(err)
		})?;

		Self::validate(status, &body)
	}
}

#[async_trait]
impl AlarmSender for AlarmClient {
	#[tracing::instrument(skip_all, fields(request_id = %request_id, external_id = %data.external_id))]
	async fn send_alert(&self, data: &AlarmData, request_id: Uuid) -> Result<(), SendError> {
		let body = self.encode(data)?;
		self.deliver(body).await?;

		tracing::info!(keyword = %data.keyword, "successfully sent alarm to fe2");

		Ok(())
	}
}
