//! Tracing setup for hosts embedding the content tree

use tracing_subscriber::EnvFilter;

use crate::config::ContentConfig;

/// Install a formatted `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise `config.log_filter` is used. Calling
/// this more than once (or after the host installed its own subscriber) is
/// harmless: the existing subscriber stays in place and `false` is returned.
pub fn init_tracing(config: &ContentConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let config = ContentConfig::default();
        let _first = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
