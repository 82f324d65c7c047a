use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use config::Config;
use serde::Deserialize;

use crate::{
    alarm::AlarmSettings, alertmanager_webhook_receiver::AlertReceiverSettings, log::LogSettings,
    telemetry_endpoint::TelemetryEndpointSettings,
};

fn default_dump_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_page_severity() -> String {
    String::from("page")
}

/// Configuration, loaded once in `main` and handed to the components.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// send TEST alarms and dump request bodies into `dump_dir`
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
    /// severity label value that triggers an alarm
    #[serde(default = "default_page_severity")]
    pub page_severity: String,
    pub log: LogSettings,
    pub alert_webhook_receiver: AlertReceiverSettings,
    pub telemetry_endpoint: Option<TelemetryEndpointSettings>,
    pub alarm: AlarmSettings,
}

impl Settings {
    /// parses the command line and loads the config file it points to
    pub fn load() -> Result<Self> {
        let opts = Command::new(clap::crate_name!())
            .version(clap::crate_version!())
            .about(clap::crate_description!())
            .author(clap::crate_authors!())
            .args(&[
                Arg::new("config")
                    .help("path of config file")
                    .takes_value(true)
                    .short('c')
                    .long("config")
                    .default_value("./config.yaml"),
                Arg::new("level")
                    .help("log level")
                    .possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
                    .ignore_case(true)
                    .takes_value(true)
                    .long("log"),
            ])
            .get_matches();

        let config_path = opts.value_of("config").context("no config path given")?;

        let mut settings = Self::from_source(config::File::with_name(config_path))?;

        if let Some(level) = opts.value_of("level") {
            settings.log.level = level.to_string();
        }

        Ok(settings)
    }

    /// deserializes settings from a single config source
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .build()
            .context("can't load config")?
            .try_deserialize()
            .context("can't load config")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use config::{File, FileFormat};

    use super::*;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let settings = Settings::from_source(File::from_str(
            r#"
log:
  level: info
alert_webhook_receiver:
  bind_address: 0.0.0.0
  port: 8080
alarm:
  endpoint: https://fe2.example.com/rest/external/http/v2
  sender: alertmanager
  authorization: secret
  address: unit-1
"#,
            FileFormat::Yaml,
        ))
        .unwrap();

        assert!(!settings.debug);
        assert_eq!(settings.dump_dir, PathBuf::from("/tmp"));
        assert_eq!(settings.page_severity, "page");
        assert_eq!(settings.alert_webhook_receiver.path, "/input");
        assert_eq!(settings.alert_webhook_receiver.to_socket_addr().port(), 8080);
        assert!(settings.telemetry_endpoint.is_none());
        assert_eq!(settings.alarm.endpoint.host_str(), Some("fe2.example.com"));
        assert_eq!(settings.alarm.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn loads_full_config() {
        let settings = Settings::from_source(File::from_str(
            r#"
debug: true
dump_dir: /var/tmp/fe2
page_severity: critical
log:
  level: debug
alert_webhook_receiver:
  bind_address: 127.0.0.1
  port: 9000
  path: /alerts
telemetry_endpoint:
  bind_address: 127.0.0.1
  port: 9090
alarm:
  endpoint: http://localhost:83/rest/external/http/v2
  sender: prometheus
  authorization: token
  address: unit-2
  request_timeout: 2.5
"#,
            FileFormat::Yaml,
        ))
        .unwrap();

        assert!(settings.debug);
        assert_eq!(settings.dump_dir, PathBuf::from("/var/tmp/fe2"));
        assert_eq!(settings.page_severity, "critical");
        assert_eq!(settings.alert_webhook_receiver.path, "/alerts");
        assert_eq!(settings.telemetry_endpoint.map(|t| t.port), Some(9090));
        assert_eq!(settings.alarm.address, "unit-2");
        assert_eq!(settings.alarm.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let result = Settings::from_source(File::from_str(
            r#"
log:
  level: info
alert_webhook_receiver:
  bind_address: 0.0.0.0
  port: 8080
alarm:
  endpoint: not a url
  sender: alertmanager
  authorization: secret
  address: unit-1
"#,
            FileFormat::Yaml,
        ));

        assert!(result.is_err());
    }
}
