//! Subscriber setup for hosts that do not install their own.

use barks_core::config::GeneralConfig;
use barks_core::error::{BarksError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `general.log_level`. `log_format = "json"` switches to JSON lines.
///
/// # Errors
/// Returns `BarksError::Config` if the level is not a valid filter or a
/// global subscriber is already installed.
pub fn init(general: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&general.log_level)
            .map_err(|e| BarksError::Config(format!("log_level: {e}")))?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if general.log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| BarksError::Config(e.to_string()))?;
    tracing::debug!(level = %general.log_level, format = %general.log_format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error() {
        let general = GeneralConfig::default();
        let _ = init(&general);
        assert!(init(&general).is_err());
    }
}
