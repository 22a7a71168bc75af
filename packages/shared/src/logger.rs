//! Logging setup shared by every geolive binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose logs follow the binary's default level.
const LIBRARY_TARGETS: [&str; 3] = ["geolive_shared", "geolive_sync", "geolive_canvas"];

/// Build the default filter directive for `binary_name` and the geolive libraries.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    LIBRARY_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level applies to the binary and to the geolive library crates. It can
/// be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "geolive-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use geolive_shared::logger::setup_logger;
///
/// setup_logger("geolive-client", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_libraries_and_binary() {
        // テスト項目: ライブラリとバイナリの両方にデフォルトレベルが設定される
        // given (前提条件):
        let binary_name = "geolive-client";

        // when (操作):
        let directive = default_directive(binary_name, "debug");

        // then (期待する結果):
        assert!(directive.contains("geolive_sync=debug"));
        assert!(directive.contains("geolive_canvas=debug"));
        assert!(directive.ends_with("geolive_client=debug"));
    }
}
