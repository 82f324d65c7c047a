//! Writes raw request bodies to disk when `debug` is enabled, so alerts and
//! alarms can be inspected later. Only observes, errors are logged and dropped.

use std::path::PathBuf;

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DebugDump {
	dir: PathBuf,
}

impl DebugDump {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// path of the dumped webhook body of request `request_id`
	pub fn inbound_path(&self, request_id: Uuid) -> PathBuf {
		self.dir.join(format!("alert-inbound-{request_id}.json"))
	}

	/// path of a dumped fe2 request body
	pub fn outbound_path(&self, request_id: Uuid, message_id: Uuid) -> PathBuf {
		self.dir.join(format!("alert-outbound-{request_id}-{message_id}.json"))
	}

	/// dump body received from alertmanager
	pub async fn inbound(&self, request_id: Uuid, body: &[u8]) {
		Self::write(self.inbound_path(request_id), body).await;
	}

	/// dump body sent to fe2
	pub async fn outbound(&self, request_id: Uuid, message_id: Uuid, body: &[u8]) {
		Self::write(self.outbound_path(request_id, message_id), body).await;
	}

	async fn write(path: PathBuf, body: &[u8]) {
		match tokio::fs::write(&path, body).await {
			Ok(()) => tracing::debug!(path = %path.display(), "wrote debug dump"),
			Err(err) => {
				tracing::warn!(path = %path.display(), "failed to write debug dump: {err}")
			}
		}
	}
}
