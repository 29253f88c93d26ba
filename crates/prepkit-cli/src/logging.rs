//! Tracing subscriber setup from the `logging` config section.

use prepkit_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter directives: the base level followed by per-target overrides.
///
/// `--verbose` forces the base level to `debug`.
pub fn directives(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        config.level.as_deref().unwrap_or("info")
    };

    std::iter::once(level.to_string())
        .chain(config.filters.iter().cloned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init(config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives(config, verbose))?,
    };

    let json = config.format == "json";
    let stdout = config.output == "stdout";
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (json, stdout) {
        (true, true) => builder.json().with_writer(std::io::stdout).try_init(),
        (true, false) => builder.json().with_writer(std::io::stderr).try_init(),
        (false, true) => builder.with_writer(std::io::stdout).try_init(),
        (false, false) => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(directives(&LoggingConfig::default(), false), "info");
    }

    #[test]
    fn test_level_and_filters() {
        let config = LoggingConfig {
            level: Some("warn".into()),
            filters: vec!["prepkit_gateway=debug".into(), "tower_http=trace".into()],
            ..LoggingConfig::default()
        };
        assert_eq!(
            directives(&config, false),
            "warn,prepkit_gateway=debug,tower_http=trace"
        );
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig {
            level: Some("error".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(directives(&config, true), "debug");
    }
}
