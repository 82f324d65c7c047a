//! config file options for the alarm client

use std::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use url::Url;

/// timeout for requests to fe2 if none is configured
fn default_request_timeout() -> Duration {
	Duration::from_secs(5)
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
/// connection and identity data for the fe2 server
pub struct AlarmSettings {
	/// full url of the external http interface, e.g. `https://fe2/rest/external/http/v2`
	pub endpoint: Url,
	/// sender name shown in fe2
	pub sender: String,
	/// secret of the external http interface
	pub authorization: String,
	/// address of the unit that gets alarmed
	pub address: String,
	#[serde_as(as = "DurationSeconds<f64>")]
	#[serde(default = "default_request_timeout")]
	pub request_timeout: Duration,
}
