//! prometheus alertmanager receiver that forwards alerts to an alamos fe2
//! server
//!
//! Features:
//! - forwards alerts with a paging severity as fe2 alarms
//! - resolved alerts share the external id of the firing alarm
//! - debug mode sending TEST alarms and dumping all request bodies

use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::Registry;
use settings::Settings;

use crate::{
	alarm::{AlarmClient, AlarmSender, DumpingSender},
	alertmanager_webhook_receiver::State,
	debug_dump::DebugDump,
	metrics::BridgeMetrics,
};

mod alarm;
mod alert;
mod alertmanager_webhook_receiver;
mod debug_dump;
mod log;
mod metrics;
mod settings;
mod telemetry_endpoint;

/// exit the complete program if one thread panics
fn setup_panic_handler() {
	let default_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		default_panic(info);
		std::process::exit(1);
	}));
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
	setup_panic_handler();

	let settings = Settings::load().context("failed to load config and command line arguments")?;

	log::setup_logging(&settings.log).context("could not setup logging")?;

	let dump = settings.debug.then(|| DebugDump::new(&settings.dump_dir));

	let client = AlarmClient::new(settings.alarm.clone(), settings.debug)
		.context("failed to construct alarm client")?;

	if settings.debug {
		tracing::info!(
			endpoint = %settings.alarm.endpoint,
			sender = %settings.alarm.sender,
			kind = ?client.kind(),
			"alarm client"
		);
	}

	let sender: Box<dyn AlarmSender> = match &dump {
		Some(dump) => Box::new(DumpingSender::new(client, dump.clone())),
		None => Box::new(client),
	};

	let registry = Registry::new();
	let metrics = BridgeMetrics::new(&registry).context("failed to register metrics")?;

	let state = Arc::new(State {
		sender,
		address: settings.alarm.address.clone(),
		page_severity: settings.page_severity.clone(),
		metrics,
	});

	if let Some(telemetry) = settings.telemetry_endpoint.clone() {
		tokio::spawn(async move {
			if let Err(err) = telemetry_endpoint::run_telemetry_endpoint(&telemetry, registry).await {
				tracing::error!("{err:#}");
			}
		});
	}

	alertmanager_webhook_receiver::run_prometheus_receiver(&settings.alert_webhook_receiver, state, dump)
		.await
		.context("prometheus alertmanager receiver endpoint failed to start or crashed")
}
