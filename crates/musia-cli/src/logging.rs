use anyhow::{anyhow, Result};
use twyg::{LogLevel, OptsBuilder};

use musia_etl::config::LoggingConfig;

/// Install the global logger from the `[logging]` config section.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(config.coloured)
        .level(parse_level(&config.level)?)
        .report_caller(config.report_caller)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {e}"))?;

    twyg::setup(opts).map_err(|e| anyhow!("Failed to set up logging: {e}"))?;
    Ok(())
}

fn parse_level(level: &str) -> Result<LogLevel> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(anyhow!(
            "Unknown log level '{other}' (expected trace, debug, info, warn or error)"
        )),
    }
}
