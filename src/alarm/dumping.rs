//! [AlarmSender] decorator that dumps every request body before it is sent

use async_trait::async_trait;
use uuid::Uuid;

use super::{AlarmData, AlarmSender, AlarmTransport, SendError};
use crate::debug_dump::DebugDump;

#[derive(Debug, Clone)]
pub struct DumpingSender<T> {
	inner: T,
	dump: DebugDump,
}

impl<T: AlarmTransport> DumpingSender<T> {
	pub fn new(inner: T, dump: DebugDump) -> Self {
		Self { inner, dump }
	}
}

#[async_trait]
impl<T: AlarmTransport> AlarmSender for DumpingSender<T> {
	#[tracing::instrument(skip_all, fields(request_id = %request_id, external_id = %data.external_id))]
	async fn send_alert(&self, data: &AlarmData, request_id: Uuid) -> Result<(), SendError> {
		let body = self.inner.encode(data)?;

		self.dump.outbound(request_id, Uuid::new_v4(), &body).await;

		self.inner.deliver(body).await?;

		tracing::info!(keyword = %data.keyword, "successfully sent alarm to fe2");

		Ok(())
	}
}
