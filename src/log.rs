use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{
    filter::LevelFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

/// filter for our own level plus quieter http crates
fn filter_layer(settings: &LogSettings) -> Result<EnvFilter> {
    let level = tracing::Level::from_str(settings.level.as_str())
        .with_context(|| format!("invalid log level {}", settings.level))?;

    Ok(EnvFilter::default()
        .add_directive(LevelFilter::from_level(level).into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

pub fn setup_logging(settings: &LogSettings) -> Result<()> {
    let fmt_layer = fmt::layer();

    tracing_subscriber::registry().with(filter_layer(settings)?).with(fmt_layer).init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_case_level() {
        for level in ["info", "Debug", "TRACE"] {
            assert!(filter_layer(&LogSettings { level: level.to_owned() }).is_ok());
        }
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(filter_layer(&LogSettings { level: "loud".to_owned() }).is_err());
    }
}
