//! Logging integration for hotaru.
//!
//! The ORM emits SQL text and execution outcomes through [`tracing`]; this
//! module provides a small helper for installing a subscriber in binaries
//! and integration tests that want to see those logs.

/// Installs a global tracing subscriber with the given filter directive
/// (e.g. `"hotaru_orm=debug"`).
///
/// With `pretty` set, output is human-readable; otherwise structured JSON is
/// emitted. Installing twice is a no-op.
pub fn setup_logging(filter: &str, pretty: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if pretty {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a span covering one statement execution.
///
/// All log entries emitted while the span is entered carry the target table,
/// which makes interleaved session logs attributable.
pub fn statement_span(table: &str) -> tracing::Span {
    tracing::debug_span!("statement", table = table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging("info", true);
        setup_logging("info", false); // second install must not panic
    }

    #[test]
    fn test_statement_span() {
        let span = statement_span("blog_article");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
