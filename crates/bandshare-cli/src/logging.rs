use anyhow::{anyhow, Result};

use crate::config::LoggingConfig;

/// Install the twyg logger for the configured level.
pub fn setup(config: &LoggingConfig) -> Result<()> {
    let opts = twyg::OptsBuilder::new()
        .coloured(config.coloured)
        .level(parse_level(&config.level)?)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {:?}", e))?;

    twyg::setup(opts).map_err(|e| anyhow!("Failed to set up logging: {:?}", e))?;
    Ok(())
}

fn parse_level(level: &str) -> Result<twyg::LogLevel> {
    match level {
        "trace" => Ok(twyg::LogLevel::Trace),
        "debug" => Ok(twyg::LogLevel::Debug),
        "info" => Ok(twyg::LogLevel::Info),
        "warn" => Ok(twyg::LogLevel::Warn),
        "error" => Ok(twyg::LogLevel::Error),
        other => Err(anyhow!("Unknown log level: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOG_LEVELS;

    #[test]
    fn test_every_configurable_level_parses() {
        for level in LOG_LEVELS {
            assert!(parse_level(level).is_ok(), "{}", level);
        }
        assert!(parse_level("loud").is_err());
    }
}
